//! Error types for the canvas layer.

use thiserror::Error;

/// Result type for surface and asset operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while loading assets or drawing the surface.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// SVG intermediate could not be parsed or rasterized.
    #[error("Rasterization failed: {0}")]
    Rasterize(String),

    /// Encoding the output image failed.
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Errors surfaced by an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// There is no live surface (no product selected, or catalog empty).
    #[error("Nothing to export: no active surface")]
    NoSurface,

    /// The surface or page could not be rendered.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Errors from the product catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog source could not be read.
    #[error("Catalog IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog source is not a valid product list.
    #[error("Catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors from editor session operations that the caller must handle.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The product id is not in the catalog.
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    /// A saved design could not be materialized.
    #[error("Invalid design: {0}")]
    InvalidDesign(#[from] editor_core::CoreError),
}
