//! SVG intermediate and the resvg/tiny-skia rasterization pipeline.

use std::sync::{Arc, OnceLock};

use crate::error::{RenderError, RenderResult};

/// System fonts, loaded once per process.
fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    Arc::clone(FONTS.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!("Loaded {} font faces for text rendering", db.len());
        Arc::new(db)
    }))
}

/// Rasterize an SVG string to a tiny-skia Pixmap at its declared size.
///
/// # Errors
///
/// Returns an error if the SVG cannot be parsed or the pixmap allocated.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rasterize_svg(svg_string: &str) -> RenderResult<tiny_skia::Pixmap> {
    let opt = usvg::Options {
        fontdb: font_database(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg_string, &opt)
        .map_err(|e| RenderError::Rasterize(format!("SVG parsing failed: {e}")))?;

    let px_w = tree.size().width().ceil() as u32;
    let px_h = tree.size().height().ceil() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
        .ok_or_else(|| RenderError::Rasterize("Failed to create pixmap".to_string()))?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    Ok(pixmap)
}

/// Encode a pixmap as PNG.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn encode_pixmap(pixmap: &tiny_skia::Pixmap) -> RenderResult<Vec<u8>> {
    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))
}

/// Escape special XML characters.
pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
