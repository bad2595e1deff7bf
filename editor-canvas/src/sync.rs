//! # Canvas Synchronizer
//!
//! Keeps the live [`Surface`] consistent with the [`Design`].
//!
//! ```text
//!   Design ──reconcile()──▶ Surface          (outbound, every mutation)
//!     ▲                        │
//!     └──── read_back() ◀──────┘              (inbound, settled gestures only)
//! ```
//!
//! Raster loads run as boxed futures that only make progress while the
//! session awaits them. Every completion is checked against the surface
//! generation, element membership and element content before it is applied.

use std::collections::HashMap;
use std::sync::Arc;

use editor_core::{Design, ElementId, ElementPatch, Product};
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};

use crate::error::RenderResult;
use crate::image::{create_placeholder, resize_to_fit, TextureData};
use crate::loader::ImageLoader;
use crate::surface::{Background, PlaceholderReason, Surface, SurfaceObject};

/// What a finished load was for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadTarget {
    Element(ElementId),
    Background { fallback: bool },
}

/// A resolved raster load, not yet applied.
#[derive(Debug)]
pub struct LoadOutcome {
    generation: u64,
    target: LoadTarget,
    src: String,
    result: RenderResult<TextureData>,
}

impl LoadOutcome {
    /// Source that was loaded.
    #[must_use]
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Element the load was for, or `None` for the background.
    #[must_use]
    pub fn element(&self) -> Option<ElementId> {
        match self.target {
            LoadTarget::Element(id) => Some(id),
            LoadTarget::Background { .. } => None,
        }
    }
}

/// What applying a [`LoadOutcome`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadEffect {
    /// A raster object was built for the element.
    Applied(ElementId),
    /// The load failed; a placeholder marker stands in for the element.
    Placeholder(ElementId),
    /// The result no longer matched the document and was dropped.
    Stale,
    /// The background was resolved; the surface is ready.
    SurfaceReady,
    /// The primary background failed; the fallback is being loaded.
    Retrying,
}

/// Object churn caused by one outbound pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Objects removed (element gone or source changed).
    pub removed: usize,
    /// Objects built synchronously.
    pub created: usize,
    /// Objects patched in place.
    pub patched: usize,
    /// Raster loads started.
    pub queued: usize,
}

impl ReconcileReport {
    /// Whether the pass added or removed any object or started any load.
    #[must_use]
    pub fn has_churn(&self) -> bool {
        self.removed + self.created + self.queued > 0
    }
}

/// Owns the surface for the current product and reconciles it against the
/// document.
pub struct CanvasSynchronizer {
    loader: Arc<dyn ImageLoader>,
    surface: Option<Surface>,
    product: Option<Product>,
    generation: u64,
    in_flight: HashMap<ElementId, String>,
    pending: FuturesUnordered<BoxFuture<'static, LoadOutcome>>,
    ready: bool,
}

impl std::fmt::Debug for CanvasSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasSynchronizer")
            .field("product", &self.product.as_ref().map(|p| &p.id))
            .field("generation", &self.generation)
            .field("in_flight", &self.in_flight.len())
            .field("pending", &self.pending.len())
            .field("ready", &self.ready)
            .finish_non_exhaustive()
    }
}

impl CanvasSynchronizer {
    /// Create a synchronizer with no surface.
    #[must_use]
    pub fn new(loader: Arc<dyn ImageLoader>) -> Self {
        Self {
            loader,
            surface: None,
            product: None,
            generation: 0,
            in_flight: HashMap::new(),
            pending: FuturesUnordered::new(),
            ready: false,
        }
    }

    /// Tear down any current surface and create one for `product`, starting
    /// the background load. Loads issued for the previous surface are
    /// dropped.
    pub fn attach(&mut self, product: &Product) {
        self.teardown();
        let ctx = product.context();
        self.surface = Some(Surface::new(
            ctx.canvas_width,
            ctx.canvas_height,
            self.generation,
        ));
        self.product = Some(product.clone());
        tracing::info!(
            "Attached surface for product {} ({}x{})",
            product.id,
            ctx.canvas_width,
            ctx.canvas_height
        );
        self.queue(
            LoadTarget::Background { fallback: false },
            product.background_url.clone(),
        );
    }

    /// Drop the surface and every pending load.
    pub fn detach(&mut self) {
        self.teardown();
        self.product = None;
    }

    fn teardown(&mut self) {
        // Release the old surface before anything replaces it.
        self.surface = None;
        self.generation += 1;
        self.in_flight.clear();
        self.pending = FuturesUnordered::new();
        self.ready = false;
    }

    /// Live surface, if a product is attached.
    #[must_use]
    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// Mutable surface, for feeding user interaction.
    pub fn surface_mut(&mut self) -> Option<&mut Surface> {
        self.surface.as_mut()
    }

    /// Attached product.
    #[must_use]
    pub fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    /// Current surface generation. Bumped on every attach/detach.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the background has resolved for the current surface.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Number of element loads in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of unresolved loads, background included.
    #[must_use]
    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    fn queue(&mut self, target: LoadTarget, src: String) {
        let loader = Arc::clone(&self.loader);
        let generation = self.generation;
        tracing::debug!("Queueing load of {src} for {target:?}");
        self.pending.push(
            async move {
                let result = loader.load(&src).await;
                LoadOutcome {
                    generation,
                    target,
                    src,
                    result,
                }
            }
            .boxed(),
        );
    }

    /// Outbound pass: make the surface mirror `design`.
    pub fn reconcile(&mut self, design: &Design) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let Some(surface) = self.surface.as_mut() else {
            tracing::debug!("No surface attached, skipping reconciliation");
            return report;
        };

        // 1. Drop objects whose element is gone or needs a rebuild.
        let stale: Vec<ElementId> = surface
            .objects()
            .iter()
            .filter(|o| design.get(o.tag()).map_or(true, |e| o.needs_rebuild(e)))
            .map(SurfaceObject::tag)
            .collect();
        for tag in stale {
            surface.remove(tag);
            report.removed += 1;
        }

        self.in_flight.retain(|id, src| {
            design
                .get(*id)
                .is_some_and(|e| e.kind.is_raster() && e.content == *src)
        });

        // 2-3. Patch mirrored objects, build or load the rest.
        let mut to_load = Vec::new();
        for element in design.elements() {
            let manipulating = surface.is_manipulating(element.id);
            if let Some(object) = surface.object_mut(element.id) {
                if !manipulating {
                    object.patch_from(element);
                    report.patched += 1;
                }
            } else if element.kind.is_text() {
                surface.insert(SurfaceObject::text(element));
                report.created += 1;
            } else if element.content.is_empty() {
                surface.insert(SurfaceObject::placeholder(element, PlaceholderReason::Empty));
                report.created += 1;
            } else if self.in_flight.get(&element.id) != Some(&element.content) {
                self.in_flight.insert(element.id, element.content.clone());
                to_load.push((element.id, element.content.clone()));
            }
        }

        let order: Vec<ElementId> = design.ids().collect();
        surface.order_by(&order);

        // 4. Mirror selection.
        surface.set_active(design.selected());

        for (id, src) in to_load {
            self.queue(LoadTarget::Element(id), src);
            report.queued += 1;
        }

        if report.has_churn() {
            tracing::debug!(
                "Reconciled: {} removed, {} created, {} patched, {} queued",
                report.removed,
                report.created,
                report.patched,
                report.queued
            );
        }
        report
    }

    /// Wait for the next load to resolve. `None` when nothing is pending.
    pub async fn next_completion(&mut self) -> Option<LoadOutcome> {
        self.pending.next().await
    }

    /// Apply every load that has already resolved, without waiting.
    pub fn poll_loads(&mut self, design: &Design) -> Vec<LoadEffect> {
        let mut effects = Vec::new();
        while let Some(Some(outcome)) = self.pending.next().now_or_never() {
            effects.push(self.apply_load(outcome, design));
        }
        effects
    }

    /// Await every pending load, including retries, and apply them.
    pub async fn settle(&mut self, design: &Design) -> Vec<LoadEffect> {
        let mut effects = Vec::new();
        while let Some(outcome) = self.next_completion().await {
            effects.push(self.apply_load(outcome, design));
        }
        effects
    }

    /// Apply a resolved load if it still matches the current surface and
    /// document.
    pub fn apply_load(&mut self, outcome: LoadOutcome, design: &Design) -> LoadEffect {
        if outcome.generation != self.generation || self.surface.is_none() {
            tracing::debug!(
                "Dropping load of {} from surface generation {}",
                outcome.src,
                outcome.generation
            );
            return LoadEffect::Stale;
        }

        match outcome.target {
            LoadTarget::Element(id) => {
                self.apply_element_load(id, outcome.src, outcome.result, design)
            }
            LoadTarget::Background { fallback } => {
                self.apply_background_load(fallback, outcome.result)
            }
        }
    }

    fn apply_element_load(
        &mut self,
        id: ElementId,
        src: String,
        result: RenderResult<TextureData>,
        design: &Design,
    ) -> LoadEffect {
        if self.in_flight.get(&id) != Some(&src) {
            tracing::debug!("Dropping superseded load of {src} for {id}");
            return LoadEffect::Stale;
        }
        self.in_flight.remove(&id);

        let Some(element) = design
            .get(id)
            .filter(|e| e.kind.is_raster() && e.content == src)
        else {
            tracing::debug!("Dropping load of {src}: element {id} changed or was removed");
            return LoadEffect::Stale;
        };
        let Some(surface) = self.surface.as_mut() else {
            return LoadEffect::Stale;
        };
        if surface.object(id).is_some_and(|o| !o.needs_rebuild(element)) {
            return LoadEffect::Stale;
        }

        let effect = match result {
            Ok(texture) => {
                surface.insert(SurfaceObject::raster(element, texture));
                LoadEffect::Applied(id)
            }
            Err(e) => {
                tracing::warn!("Image {src} for element {id} failed to load: {e}");
                surface.insert(SurfaceObject::placeholder(
                    element,
                    PlaceholderReason::LoadFailed(e.to_string()),
                ));
                LoadEffect::Placeholder(id)
            }
        };

        let order: Vec<ElementId> = design.ids().collect();
        surface.order_by(&order);
        surface.set_active(design.selected());
        effect
    }

    fn apply_background_load(
        &mut self,
        fallback: bool,
        result: RenderResult<TextureData>,
    ) -> LoadEffect {
        let Some(product) = self.product.clone() else {
            return LoadEffect::Stale;
        };
        let ctx = product.context();

        let texture = match result {
            Ok(texture) => texture,
            Err(e) => match product.fallback_url.clone() {
                Some(url) if !fallback => {
                    tracing::warn!("Background for {} failed ({e}), trying fallback", product.id);
                    self.queue(LoadTarget::Background { fallback: true }, url);
                    return LoadEffect::Retrying;
                }
                _ => {
                    tracing::warn!(
                        "Background for {} unavailable ({e}), using placeholder",
                        product.id
                    );
                    create_placeholder(ctx.canvas_width, ctx.canvas_height)
                }
            },
        };

        let texture =
            resize_to_fit(&texture, ctx.canvas_width, ctx.canvas_height).unwrap_or(texture);
        if let Some(surface) = self.surface.as_mut() {
            surface.set_background(Background::fitted(
                product.id.clone(),
                &texture,
                ctx.canvas_width,
                ctx.canvas_height,
            ));
        }
        self.ready = true;
        tracing::info!("Surface ready for product {}", product.id);
        LoadEffect::SurfaceReady
    }

    /// Inbound pass: rounded geometry of a manipulated object.
    #[must_use]
    pub fn read_back(&self, tag: ElementId) -> Option<ElementPatch> {
        self.surface.as_ref()?.object(tag).map(SurfaceObject::read_geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::create_solid_color;
    use crate::loader::MemoryImageLoader;
    use editor_core::{DesignElement, ElementKind};

    fn product(fallback: Option<&str>) -> Product {
        Product {
            id: "card".to_string(),
            name: "Cartão".to_string(),
            description: String::new(),
            canvas_width: 200,
            canvas_height: 100,
            background_url: "bg.png".to_string(),
            fallback_url: fallback.map(str::to_string),
        }
    }

    fn loader() -> MemoryImageLoader {
        MemoryImageLoader::new()
            .with_image("logo.png", create_solid_color(10, 10, [0, 0, 255, 255]))
            .with_image("fallback.png", create_solid_color(40, 20, [0, 255, 0, 255]))
    }

    #[tokio::test]
    async fn test_background_falls_back_then_placeholder() {
        let design = Design::new();

        let mut sync = CanvasSynchronizer::new(Arc::new(loader()));
        sync.attach(&product(Some("fallback.png")));
        let effects = sync.settle(&design).await;
        assert_eq!(effects, vec![LoadEffect::Retrying, LoadEffect::SurfaceReady]);
        let bg = sync.surface().and_then(Surface::background).expect("background");
        assert_eq!(bg.bounds(), (0.0, 0.0, 200.0, 100.0));

        let mut sync = CanvasSynchronizer::new(Arc::new(loader()));
        sync.attach(&product(None));
        assert_eq!(sync.settle(&design).await, vec![LoadEffect::SurfaceReady]);
        assert!(sync.is_ready());
        assert!(sync.surface().and_then(Surface::background).is_some());
    }

    #[tokio::test]
    async fn test_attach_drops_previous_generation_loads() {
        let mut design = Design::new();
        let logo = DesignElement::new(ElementKind::Logo, "logo.png", 0.0, 0.0, 50.0, 50.0);
        design.insert(logo).expect("insert");

        let mut sync = CanvasSynchronizer::new(Arc::new(loader()));
        sync.attach(&product(None));
        assert_eq!(sync.reconcile(&design).queued, 1);
        let first = sync.generation();

        sync.attach(&product(None));
        assert!(sync.generation() > first);
        assert_eq!(sync.in_flight(), 0);
        assert_eq!(sync.pending_loads(), 1, "only the new background load");
    }

    #[tokio::test]
    async fn test_changed_source_rebuilds_raster() {
        let mut design = Design::new();
        let logo = DesignElement::new(ElementKind::Logo, "logo.png", 0.0, 0.0, 50.0, 50.0);
        let id = design.insert(logo).expect("insert");

        let mut sync = CanvasSynchronizer::new(Arc::new(loader()));
        sync.attach(&product(None));
        sync.reconcile(&design);
        sync.settle(&design).await;
        assert_eq!(sync.surface().map(Surface::object_count), Some(1));

        design
            .update(id, &ElementPatch::content("missing.png"))
            .expect("update");
        let report = sync.reconcile(&design);
        assert_eq!((report.removed, report.queued), (1, 1));

        let effects = sync.settle(&design).await;
        assert_eq!(effects, vec![LoadEffect::Placeholder(id)]);
    }
}
