//! The design document and the mutation API over it.
//!
//! Element order in the sequence is the paint order: later elements are drawn
//! on top. Every change to the sequence goes through the methods here.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::{
    CoreError, CoreResult, DesignElement, ElementId, ElementKind, ElementPatch, ProductContext,
    TextStyle,
};

/// Offset applied to both axes when duplicating an element.
pub const DUPLICATE_OFFSET: f32 = 20.0;

/// Size of a freshly added raster element.
const RASTER_DEFAULT_SIZE: f32 = 150.0;

/// Position of a freshly added raster element.
const RASTER_DEFAULT_ORIGIN: f32 = 50.0;

/// Direction for [`Design::reorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderDirection {
    /// Towards the top of the paint order.
    Up,
    /// Towards the bottom of the paint order.
    Down,
}

/// Free-form document metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignMeta {
    /// Document identifier.
    pub id: String,
    /// Project name shown on exports.
    pub name: String,
    /// Creation time in milliseconds since epoch.
    pub created_at: u64,
    /// Last modification time in milliseconds since epoch.
    pub updated_at: u64,
}

impl Default for DesignMeta {
    fn default() -> Self {
        let now = now_ms();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: "Meu Projeto".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The document: ordered elements plus the product they are placed on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Design {
    /// Elements in paint order.
    elements: Vec<DesignElement>,
    /// Selected product, if any.
    pub product_id: Option<String>,
    /// Document metadata.
    pub meta: DesignMeta,
    /// Currently selected element.
    #[serde(skip)]
    selected: Option<ElementId>,
}

impl Design {
    /// Create an empty design.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty design bound to a product.
    #[must_use]
    pub fn for_product(product_id: impl Into<String>) -> Self {
        Self {
            product_id: Some(product_id.into()),
            ..Self::default()
        }
    }

    /// Add a new element of `kind` with its defaults and select it.
    pub fn add(&mut self, kind: ElementKind, ctx: ProductContext) -> DesignElement {
        let element = default_element(kind, ctx);
        self.push(element.clone());
        self.selected = Some(element.id);
        tracing::debug!("Added {} element {}", kind.label(), element.id);
        element
    }

    /// Append an already-built element without changing the selection.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if an element with the same id
    /// already exists.
    pub fn insert(&mut self, mut element: DesignElement) -> CoreResult<ElementId> {
        if self.contains(element.id) {
            return Err(CoreError::InvalidOperation(format!(
                "duplicate element id {}",
                element.id
            )));
        }
        element.normalize();
        let id = element.id;
        self.push(element);
        Ok(id)
    }

    /// Apply a sparse update to one element. Order is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ElementNotFound`] if `id` is absent; the design is
    /// left untouched.
    pub fn update(&mut self, id: ElementId, patch: &ElementPatch) -> CoreResult<()> {
        let element = self
            .get_mut(id)
            .ok_or_else(|| CoreError::ElementNotFound(id.to_string()))?;
        element.apply(patch);
        self.touch();
        Ok(())
    }

    /// Remove an element, clearing the selection if it was selected.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ElementNotFound`] if `id` is absent.
    pub fn remove(&mut self, id: ElementId) -> CoreResult<DesignElement> {
        let index = self
            .index_of(id)
            .ok_or_else(|| CoreError::ElementNotFound(id.to_string()))?;
        let removed = self.elements.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.touch();
        Ok(removed)
    }

    /// Copy an element under a new id, offset by [`DUPLICATE_OFFSET`], on top.
    ///
    /// The copy becomes the selection.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ElementNotFound`] if `id` is absent.
    pub fn duplicate(&mut self, id: ElementId) -> CoreResult<DesignElement> {
        let source = self
            .get(id)
            .ok_or_else(|| CoreError::ElementNotFound(id.to_string()))?;
        let mut copy = source.clone();
        copy.id = ElementId::new();
        copy.x += DUPLICATE_OFFSET;
        copy.y += DUPLICATE_OFFSET;
        copy.normalize();
        self.push(copy.clone());
        self.selected = Some(copy.id);
        Ok(copy)
    }

    /// Swap an element with its neighbour in `direction`.
    ///
    /// Returns `Ok(false)` when the element is already at that end.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ElementNotFound`] if `id` is absent.
    pub fn reorder(&mut self, id: ElementId, direction: ReorderDirection) -> CoreResult<bool> {
        let index = self
            .index_of(id)
            .ok_or_else(|| CoreError::ElementNotFound(id.to_string()))?;
        let target = match direction {
            ReorderDirection::Up if index + 1 < self.elements.len() => index + 1,
            ReorderDirection::Down if index > 0 => index - 1,
            _ => return Ok(false),
        };
        self.elements.swap(index, target);
        self.touch();
        Ok(true)
    }

    /// Drop every element and the selection.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.selected = None;
        self.touch();
    }

    /// Replace the element sequence wholesale (history restore, loading).
    ///
    /// The selection is kept only if the selected id survives.
    pub fn replace_elements(&mut self, elements: Vec<DesignElement>) {
        self.elements = elements;
        if let Some(selected) = self.selected {
            if !self.contains(selected) {
                self.selected = None;
            }
        }
        self.touch();
    }

    /// Set or clear the selection. Unknown ids clear it.
    pub fn select(&mut self, id: Option<ElementId>) {
        self.selected = id.filter(|id| self.contains(*id));
    }

    /// Currently selected id.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    /// Currently selected element.
    #[must_use]
    pub fn selected_element(&self) -> Option<&DesignElement> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Get an element by ID.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&DesignElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn get_mut(&mut self, id: ElementId) -> Option<&mut DesignElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Position of an element in paint order.
    #[must_use]
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    /// Whether an element with this id exists.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.index_of(id).is_some()
    }

    /// Elements in paint order.
    #[must_use]
    pub fn elements(&self) -> &[DesignElement] {
        &self.elements
    }

    /// Element ids in paint order.
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.iter().map(|e| e.id)
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the design has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn push(&mut self, element: DesignElement) {
        self.elements.push(element);
        self.touch();
    }

    fn touch(&mut self) {
        self.meta.updated_at = now_ms();
    }
}

/// Build a new element of `kind` with defaults sized for the product canvas.
///
/// Text-like kinds are centered with a font size proportional to the canvas
/// width; raster kinds get a fixed-size box near the origin.
#[must_use]
pub fn default_element(kind: ElementKind, ctx: ProductContext) -> DesignElement {
    if kind.is_raster() {
        return DesignElement::new(
            kind,
            kind.placeholder(),
            RASTER_DEFAULT_ORIGIN,
            RASTER_DEFAULT_ORIGIN,
            RASTER_DEFAULT_SIZE,
            RASTER_DEFAULT_SIZE,
        );
    }

    let font_size = (ctx.width() * 0.06).round().max(12.0);
    let width = (ctx.width() * 0.6).round();
    let height = (font_size * 1.4).round();
    let x = ((ctx.width() - width) / 2.0).round();
    let y = ((ctx.height() - height) / 2.0).round();

    DesignElement::new(kind, kind.placeholder(), x, y, width, height).with_style(TextStyle {
        font_size,
        ..TextStyle::default()
    })
}

/// Current time in milliseconds since epoch.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Timestamps won't exceed u64 for billions of years
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
