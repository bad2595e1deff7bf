//! # Print Editor Canvas
//!
//! The live drawing surface, model/surface reconciliation and print export.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  Editor                     │
//! │   mutations · history · product switching   │
//! ├─────────────────────┬───────────────────────┤
//! │ CanvasSynchronizer  │   ExportCompositor    │
//! │ reconcile / loads   │   print page → PNG    │
//! ├─────────────────────┴───────────────────────┤
//! │   Surface  →  SVG  →  resvg / tiny-skia     │
//! ├─────────────────────────────────────────────┤
//! │   ImageLoader (data URI · http · file)      │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod color;
pub mod editor;
pub mod error;
pub mod export;
pub mod image;
pub mod loader;
pub mod surface;
pub mod svg;
pub mod sync;

pub use catalog::{JsonCatalog, ProductCatalog, StaticCatalog};
pub use editor::{Editor, EditorConfig, ProductSwitch};
pub use error::{CatalogError, EditorError, ExportError, RenderError, RenderResult};
pub use export::{
    export_filename, ExportArtifact, ExportCompositor, ExportConfig, ExportInput, ExportKind,
    PRINT_PAGE_HEIGHT, PRINT_PAGE_WIDTH,
};
pub use image::{ImageFormat, TextureData};
pub use loader::{DefaultImageLoader, ImageLoader, MemoryImageLoader};
pub use surface::{
    Background, Placeholder, PlaceholderReason, RasterImage, Surface, SurfaceBody, SurfaceObject,
    SurfaceStats, TextBox,
};
pub use sync::{CanvasSynchronizer, LoadEffect, LoadOutcome, ReconcileReport};
