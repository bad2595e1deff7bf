//! Product descriptors supplied by the catalog.

use serde::{Deserialize, Serialize};

/// A printable product the user can personalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Stable catalog identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display description.
    #[serde(default)]
    pub description: String,
    /// Canvas width in pixels.
    pub canvas_width: u32,
    /// Canvas height in pixels.
    pub canvas_height: u32,
    /// Background artwork URL.
    pub background_url: String,
    /// Artwork used when `background_url` cannot be loaded.
    #[serde(default)]
    pub fallback_url: Option<String>,
}

impl Product {
    /// Canvas dimensions used for element defaults.
    #[must_use]
    pub fn context(&self) -> ProductContext {
        ProductContext {
            canvas_width: self.canvas_width.max(1),
            canvas_height: self.canvas_height.max(1),
        }
    }
}

/// The bits of a product that element defaults depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductContext {
    /// Canvas width in pixels.
    pub canvas_width: u32,
    /// Canvas height in pixels.
    pub canvas_height: u32,
}

impl ProductContext {
    /// Create a context for the given canvas size.
    #[must_use]
    pub fn new(canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            canvas_width: canvas_width.max(1),
            canvas_height: canvas_height.max(1),
        }
    }

    /// Canvas width as `f32`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // canvas sizes are far below f32 precision limits
    pub fn width(&self) -> f32 {
        self.canvas_width as f32
    }

    /// Canvas height as `f32`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn height(&self) -> f32 {
        self.canvas_height as f32
    }
}

impl Default for ProductContext {
    fn default() -> Self {
        Self::new(800, 600)
    }
}
