//! The editing session.
//!
//! [`Editor`] owns the design, its history and the synchronizer for one open
//! document. Every committed mutation records exactly one history snapshot
//! and runs exactly one outbound reconciliation pass. Failures inside a
//! session are logged and reported as `false`/`None`; only exports return an
//! error the caller must handle.

use std::sync::Arc;

use chrono::NaiveDate;
use editor_core::{
    Design, DesignElement, ElementId, ElementKind, ElementPatch, History, HistoryConfig,
    HistoryState, Product, ProductContext, ReorderDirection, SavedDesign, SurfaceEvent,
};

use crate::catalog::ProductCatalog;
use crate::error::{EditorError, ExportError};
use crate::export::{ExportArtifact, ExportCompositor, ExportConfig, ExportInput};
use crate::loader::ImageLoader;
use crate::surface::Surface;
use crate::sync::{CanvasSynchronizer, LoadEffect, LoadOutcome};

/// Session configuration.
#[derive(Debug, Clone, Default)]
pub struct EditorConfig {
    /// Undo history settings.
    pub history: HistoryConfig,
    /// Print page settings.
    pub export: ExportConfig,
}

/// Result of [`Editor::request_product`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSwitch {
    /// The product changed.
    Switched,
    /// The document has elements; call [`Editor::confirm_product_switch`]
    /// to discard them and switch.
    ConfirmationRequired,
    /// The product was already active.
    Unchanged,
}

#[derive(Debug, Clone)]
struct TextEdit {
    id: ElementId,
    original: String,
}

/// One open document.
#[derive(Debug)]
pub struct Editor {
    products: Vec<Product>,
    design: Design,
    history: History,
    sync: CanvasSynchronizer,
    exporter: ExportCompositor,
    pending_switch: Option<String>,
    seed_for: Option<String>,
    text_edit: Option<TextEdit>,
}

impl Editor {
    /// Open a session over the products of `catalog`.
    ///
    /// A failing or empty catalog leaves the editor in the empty state: no
    /// product can be selected and no surface is created.
    pub async fn open(
        catalog: &dyn ProductCatalog,
        loader: Arc<dyn ImageLoader>,
        config: EditorConfig,
    ) -> Self {
        let products = catalog.products().await.unwrap_or_else(|e| {
            tracing::warn!("Product catalog unavailable: {e}");
            Vec::new()
        });
        if products.is_empty() {
            tracing::info!("No products available, editor is in the empty state");
        }
        Self::with_products(products, loader, config)
    }

    /// Open a session over a known product list.
    #[must_use]
    pub fn with_products(
        products: Vec<Product>,
        loader: Arc<dyn ImageLoader>,
        config: EditorConfig,
    ) -> Self {
        let design = Design::new();
        let mut history = History::with_config(config.history);
        history.record_design(&design);
        Self {
            products,
            design,
            history,
            sync: CanvasSynchronizer::new(Arc::clone(&loader)),
            exporter: ExportCompositor::new(config.export, loader),
            pending_switch: None,
            seed_for: None,
            text_edit: None,
        }
    }

    /// Replace the session with a saved design.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::UnknownProduct`] if the design's product is not
    /// in the catalog, or [`EditorError::InvalidDesign`] if it has duplicate
    /// element ids. The session is unchanged on error.
    pub fn load_design(&mut self, saved: SavedDesign) -> Result<(), EditorError> {
        let design = saved.into_design()?;
        let product = match design.product_id.as_deref() {
            Some(id) => Some(
                self.product(id)
                    .cloned()
                    .ok_or_else(|| EditorError::UnknownProduct(id.to_string()))?,
            ),
            None => None,
        };

        self.design = design;
        self.pending_switch = None;
        self.seed_for = None;
        self.text_edit = None;
        self.history.clear();
        self.history.record_design(&self.design);
        match product {
            Some(product) => self.sync.attach(&product),
            None => self.sync.detach(),
        }
        self.sync.reconcile(&self.design);
        tracing::info!(
            "Loaded design {} with {} elements",
            self.design.meta.id,
            self.design.len()
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Selectable products.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by id.
    #[must_use]
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Product the design is placed on.
    #[must_use]
    pub fn current_product(&self) -> Option<&Product> {
        self.design.product_id.as_deref().and_then(|id| self.product(id))
    }

    /// Whether the catalog gave us nothing to edit.
    #[must_use]
    pub fn is_empty_state(&self) -> bool {
        self.products.is_empty()
    }

    /// The document.
    #[must_use]
    pub fn design(&self) -> &Design {
        &self.design
    }

    /// The selected element, for property panels.
    #[must_use]
    pub fn active_element(&self) -> Option<&DesignElement> {
        self.design.selected_element()
    }

    /// The document in its persisted form.
    #[must_use]
    pub fn saved_design(&self) -> SavedDesign {
        SavedDesign::from(&self.design)
    }

    /// Rename the project. Not an undoable change.
    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.design.meta.name = name.into();
    }

    /// Undo history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether [`Editor::undo`] would do anything.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether [`Editor::redo`] would do anything.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The live surface.
    #[must_use]
    pub fn surface(&self) -> Option<&Surface> {
        self.sync.surface()
    }

    /// The live surface, for feeding pointer interaction. Events it returns
    /// go back through [`Editor::handle_surface_event`].
    pub fn surface_mut(&mut self) -> Option<&mut Surface> {
        self.sync.surface_mut()
    }

    /// The synchronizer.
    #[must_use]
    pub fn synchronizer(&self) -> &CanvasSynchronizer {
        &self.sync
    }

    fn context(&self) -> ProductContext {
        self.current_product()
            .map(Product::context)
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    fn commit(&mut self) {
        self.history.record_design(&self.design);
        self.sync.reconcile(&self.design);
    }

    /// Add an element of `kind` with its defaults and select it.
    pub fn add(&mut self, kind: ElementKind) -> DesignElement {
        self.finish_text_edit();
        let ctx = self.context();
        let element = self.design.add(kind, ctx);
        self.commit();
        element
    }

    /// Apply a sparse update. Returns `false` if `id` is unknown.
    pub fn update(&mut self, id: ElementId, patch: &ElementPatch) -> bool {
        self.finish_text_edit();
        match self.design.update(id, patch) {
            Ok(()) => {
                self.commit();
                true
            }
            Err(e) => {
                tracing::warn!("Ignoring update: {e}");
                false
            }
        }
    }

    /// Remove an element. Returns `false` if `id` is unknown.
    pub fn remove(&mut self, id: ElementId) -> bool {
        self.finish_text_edit();
        match self.design.remove(id) {
            Ok(_) => {
                self.commit();
                true
            }
            Err(e) => {
                tracing::warn!("Ignoring remove: {e}");
                false
            }
        }
    }

    /// Duplicate an element, offset and selected.
    pub fn duplicate(&mut self, id: ElementId) -> Option<DesignElement> {
        self.finish_text_edit();
        match self.design.duplicate(id) {
            Ok(copy) => {
                self.commit();
                Some(copy)
            }
            Err(e) => {
                tracing::warn!("Ignoring duplicate: {e}");
                None
            }
        }
    }

    /// Move an element one step in paint order. Returns `false` when nothing
    /// moved.
    pub fn reorder(&mut self, id: ElementId, direction: ReorderDirection) -> bool {
        self.finish_text_edit();
        match self.design.reorder(id, direction) {
            Ok(true) => {
                self.commit();
                true
            }
            Ok(false) => false,
            Err(e) => {
                tracing::warn!("Ignoring reorder: {e}");
                false
            }
        }
    }

    /// Change the selection and mirror it on the surface.
    pub fn select(&mut self, id: Option<ElementId>) {
        self.design.select(id);
        let selected = self.design.selected();
        if let Some(surface) = self.sync.surface_mut() {
            surface.set_active(selected);
        }
    }

    // -----------------------------------------------------------------------
    // Text edit sessions
    // -----------------------------------------------------------------------

    /// Start editing the text of `id`. Keystrokes go through
    /// [`Editor::edit_text`] and are snapshotted once on commit.
    pub fn begin_text_edit(&mut self, id: ElementId) -> bool {
        if self.text_edit.as_ref().is_some_and(|t| t.id == id) {
            return true;
        }
        self.finish_text_edit();
        let Some(element) = self.design.get(id).filter(|e| e.kind.is_text()) else {
            tracing::warn!("Cannot edit text of {id}: not a text element");
            return false;
        };
        self.text_edit = Some(TextEdit {
            id,
            original: element.content.clone(),
        });
        true
    }

    /// Live text change without a history snapshot.
    pub fn edit_text(&mut self, id: ElementId, content: impl Into<String>) -> bool {
        if !self.begin_text_edit(id) {
            return false;
        }
        if let Err(e) = self.design.update(id, &ElementPatch::content(content)) {
            tracing::warn!("Ignoring text edit: {e}");
            return false;
        }
        self.sync.reconcile(&self.design);
        true
    }

    /// End the text edit session. Records one snapshot if the text changed.
    pub fn commit_text_edit(&mut self) -> bool {
        let Some(edit) = self.text_edit.take() else {
            return false;
        };
        let changed = self
            .design
            .get(edit.id)
            .is_some_and(|e| e.content != edit.original);
        if changed {
            self.history.record_design(&self.design);
        }
        changed
    }

    fn finish_text_edit(&mut self) {
        if self.text_edit.is_some() {
            self.commit_text_edit();
        }
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Step back one snapshot.
    pub fn undo(&mut self) -> bool {
        self.finish_text_edit();
        match self.history.undo().cloned() {
            Some(state) => {
                self.restore(state);
                true
            }
            None => false,
        }
    }

    /// Step forward one snapshot.
    pub fn redo(&mut self) -> bool {
        self.finish_text_edit();
        match self.history.redo().cloned() {
            Some(state) => {
                self.restore(state);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, state: HistoryState) {
        if state.product_id != self.design.product_id {
            let product = state
                .product_id
                .as_deref()
                .and_then(|id| self.product(id))
                .cloned();
            match product {
                Some(product) => self.sync.attach(&product),
                None => self.sync.detach(),
            }
            self.design.product_id = state.product_id;
        }
        self.seed_for = None;
        self.design.replace_elements(state.elements);
        self.sync.reconcile(&self.design);
    }

    // -----------------------------------------------------------------------
    // Product switching
    // -----------------------------------------------------------------------

    /// Ask to place the design on another product.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::UnknownProduct`] if `id` is not in the catalog.
    pub fn request_product(&mut self, id: &str) -> Result<ProductSwitch, EditorError> {
        let product = self
            .product(id)
            .cloned()
            .ok_or_else(|| EditorError::UnknownProduct(id.to_string()))?;

        if self.design.product_id.as_deref() == Some(id) {
            return Ok(ProductSwitch::Unchanged);
        }
        if self.design.is_empty() {
            self.switch_to(&product);
            return Ok(ProductSwitch::Switched);
        }

        tracing::debug!("Switch to {id} needs confirmation");
        self.pending_switch = Some(product.id);
        Ok(ProductSwitch::ConfirmationRequired)
    }

    /// Product awaiting confirmation.
    #[must_use]
    pub fn pending_product_switch(&self) -> Option<&str> {
        self.pending_switch.as_deref()
    }

    /// Discard the document and switch to the pending product.
    pub fn confirm_product_switch(&mut self) -> bool {
        let Some(product) = self
            .pending_switch
            .take()
            .and_then(|id| self.product(&id).cloned())
        else {
            return false;
        };
        self.switch_to(&product);
        true
    }

    /// Drop the pending switch.
    pub fn cancel_product_switch(&mut self) -> bool {
        self.pending_switch.take().is_some()
    }

    fn switch_to(&mut self, product: &Product) {
        self.text_edit = None;
        self.pending_switch = None;
        self.design.clear();
        self.design.product_id = Some(product.id.clone());
        self.history.record_design(&self.design);
        self.sync.attach(product);
        self.sync.reconcile(&self.design);
        self.seed_for = Some(product.id.clone());
        tracing::info!("Switched to product {}", product.id);
    }

    // -----------------------------------------------------------------------
    // Inbound events and async completion
    // -----------------------------------------------------------------------

    /// Feed a settled surface interaction back into the document.
    ///
    /// Returns `false` when a modification leaves the element as it was.
    pub fn handle_surface_event(&mut self, event: &SurfaceEvent) -> bool {
        match event {
            SurfaceEvent::SelectionChanged { tag } => {
                self.design.select(*tag);
                true
            }
            SurfaceEvent::ObjectModified { tag, action } => {
                let Some(patch) = self.sync.read_back(*tag) else {
                    tracing::warn!("Modified object {tag} is not on the surface");
                    return false;
                };
                let unchanged = self.design.get(*tag).is_some_and(|element| {
                    let mut settled = element.clone();
                    settled.apply(&patch);
                    settled == *element
                });
                if unchanged {
                    tracing::debug!("Object {tag} {action:?} settled without changes");
                    return false;
                }
                tracing::debug!("Object {tag} {action:?} settled");
                self.update(*tag, &patch)
            }
        }
    }

    /// Await every pending load and apply it. Seeds the default text element
    /// once a freshly selected product's surface is ready.
    pub async fn settle(&mut self) -> Vec<LoadEffect> {
        let mut effects = Vec::new();
        while let Some(outcome) = self.sync.next_completion().await {
            effects.push(self.complete(outcome));
        }
        effects
    }

    /// Apply loads that have already resolved, without waiting.
    pub fn poll_loads(&mut self) -> Vec<LoadEffect> {
        let effects = self.sync.poll_loads(&self.design);
        if effects.contains(&LoadEffect::SurfaceReady) {
            self.seed_default();
        }
        effects
    }

    fn complete(&mut self, outcome: LoadOutcome) -> LoadEffect {
        let effect = self.sync.apply_load(outcome, &self.design);
        if effect == LoadEffect::SurfaceReady {
            self.seed_default();
        }
        effect
    }

    fn seed_default(&mut self) {
        let Some(product_id) = self.seed_for.take() else {
            return;
        };
        if self.design.product_id.as_deref() == Some(product_id.as_str()) && self.design.is_empty()
        {
            let element = self.add(ElementKind::Text);
            tracing::debug!("Seeded default text {} for {product_id}", element.id);
        }
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Export the print page dated today.
    ///
    /// # Errors
    ///
    /// See [`Editor::export_on`].
    pub async fn export(&self) -> Result<ExportArtifact, ExportError> {
        self.export_on(chrono::Local::now().date_naive()).await
    }

    /// Export the print page with a fixed date.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NoSurface`] with no product selected, or a
    /// render error if rasterization fails.
    pub async fn export_on(&self, date: NaiveDate) -> Result<ExportArtifact, ExportError> {
        self.exporter
            .compose(ExportInput {
                surface: self.sync.surface(),
                product: self.current_product(),
                project_name: &self.design.meta.name,
                date,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryImageLoader;

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            canvas_width: 300,
            canvas_height: 200,
            background_url: format!("{id}.png"),
            fallback_url: None,
        }
    }

    fn editor() -> Editor {
        Editor::with_products(
            vec![product("mug"), product("shirt")],
            Arc::new(MemoryImageLoader::new()),
            EditorConfig::default(),
        )
    }

    #[test]
    fn test_unknown_id_takes_no_snapshot() {
        let mut editor = editor();
        let before = editor.history().len();
        assert!(!editor.update(ElementId::new(), &ElementPatch::content("x")));
        assert!(!editor.remove(ElementId::new()));
        assert!(editor.duplicate(ElementId::new()).is_none());
        assert_eq!(editor.history().len(), before);
    }

    #[test]
    fn test_text_edit_batches_into_one_snapshot() {
        let mut editor = editor();
        let id = editor.add(ElementKind::Text).id;
        let before = editor.history().len();

        for text in ["O", "Ol", "Olá"] {
            assert!(editor.edit_text(id, text));
        }
        assert_eq!(editor.history().len(), before);
        assert!(editor.commit_text_edit());
        assert_eq!(editor.history().len(), before + 1);

        assert!(editor.undo());
        assert_eq!(
            editor.design().get(id).map(|e| e.content.as_str()),
            Some("Seu texto aqui")
        );
    }

    #[test]
    fn test_text_edit_rejects_raster() {
        let mut editor = editor();
        let id = editor.add(ElementKind::Logo).id;
        assert!(!editor.begin_text_edit(id));
        assert!(!editor.edit_text(id, "nope"));
    }

    #[test]
    fn test_unknown_product_is_error() {
        let mut editor = editor();
        assert!(matches!(
            editor.request_product("hat"),
            Err(EditorError::UnknownProduct(_))
        ));
        assert!(editor.design().product_id.is_none());
    }

    #[tokio::test]
    async fn test_export_without_product_is_no_surface() {
        let editor = editor();
        assert!(matches!(editor.export().await, Err(ExportError::NoSurface)));
    }
}
