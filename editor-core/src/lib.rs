//! # Print Editor Core
//!
//! Document logic for the print-product personalization editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 editor-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Element Model   │  Mutation API            │
//! │  - Kinds/style   │  - add / update / remove │
//! │  - Geometry      │  - duplicate / reorder   │
//! ├─────────────────────────────────────────────┤
//! │  History Engine  │  Persistence             │
//! │  - Snapshots     │  - Saved design JSON     │
//! │  - Undo / redo   │  - Product descriptors   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Nothing here knows about drawing surfaces; `editor-canvas` consumes these
//! types and reconciles them against a live surface.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod document;
pub mod element;
pub mod error;
pub mod event;
pub mod history;
pub mod product;
pub mod schema;

pub use document::{default_element, Design, DesignMeta, ReorderDirection, DUPLICATE_OFFSET};
pub use element::{
    normalize_angle, DesignElement, ElementId, ElementKind, ElementPatch, FontStyle, FontWeight,
    TextAlign, TextStyle,
};
pub use error::{CoreError, CoreResult};
pub use event::{Manipulation, SurfaceEvent};
pub use history::{History, HistoryConfig, HistoryState, DEFAULT_HISTORY_CAPACITY};
pub use product::{Product, ProductContext};
pub use schema::SavedDesign;

/// Editor core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
