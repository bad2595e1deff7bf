//! Print export.
//!
//! Composes the live surface onto a fixed-size print page: background fill,
//! decorative border, brand mark, the rasterized design, a separator and the
//! product/date/project annotations. The page goes through the same SVG
//! intermediate and resvg/tiny-skia pipeline as the surface itself.
//!
//! ```text
//! ┌─────────────────────────┐
//! │        [brand mark]     │
//! │  ┌───────────────────┐  │
//! │  │      design       │  │
//! │  └───────────────────┘  │
//! │  ─────────────────────  │
//! │  Product name           │
//! │  description            │
//! │  Data: dd/mm/yyyy       │
//! │  Projeto: name          │
//! └─────────────────────────┘
//! ```

use std::fmt::Write;
use std::sync::Arc;

use chrono::NaiveDate;
use editor_core::Product;

use crate::error::{ExportError, RenderError, RenderResult};
use crate::image::{fit_within, png_data_uri, to_data_uri};
use crate::loader::ImageLoader;
use crate::surface::Surface;
use crate::svg::{encode_pixmap, escape_xml, rasterize_svg};

/// A4 at 300 dpi.
pub const PRINT_PAGE_WIDTH: u32 = 2480;
/// A4 at 300 dpi.
pub const PRINT_PAGE_HEIGHT: u32 = 3508;

/// Page layout and decoration.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Page width in pixels.
    pub page_width: u32,
    /// Page height in pixels.
    pub page_height: u32,
    /// Page fill color.
    pub background: String,
    /// Border stroke color.
    pub border_color: String,
    /// Border stroke width.
    pub border_width: u32,
    /// Distance from the page edge to the content.
    pub margin: u32,
    /// Brand mark drawn at the top of the page.
    pub brand_mark_url: Option<String>,
    /// Height reserved for the brand mark.
    pub brand_height: u32,
    /// Annotation text color.
    pub text_color: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_width: PRINT_PAGE_WIDTH,
            page_height: PRINT_PAGE_HEIGHT,
            background: "#ffffff".to_string(),
            border_color: "#1f3a5f".to_string(),
            border_width: 12,
            margin: 120,
            brand_mark_url: None,
            brand_height: 280,
            text_color: "#333333".to_string(),
        }
    }
}

impl ExportConfig {
    /// Footer height: separator plus four annotation lines.
    fn footer_height(&self) -> u32 {
        self.font_size() * 6
    }

    fn font_size(&self) -> u32 {
        (self.page_width / 40).max(8)
    }
}

/// Everything an export reads.
#[derive(Debug, Clone, Copy)]
pub struct ExportInput<'a> {
    /// Live surface, if any.
    pub surface: Option<&'a Surface>,
    /// Product the design is placed on.
    pub product: Option<&'a Product>,
    /// Project name, also used for the filename.
    pub project_name: &'a str,
    /// Date printed on the page.
    pub date: NaiveDate,
}

/// What the artifact contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// The full decorated print page.
    Composite,
    /// Only the design surface, because a decoration failed to load.
    BareSurface,
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    /// Suggested download filename.
    pub filename: String,
    /// PNG bytes.
    pub png: Vec<u8>,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Whether this is the decorated page or the bare surface.
    pub kind: ExportKind,
}

impl ExportArtifact {
    /// `data:image/png;base64,...` URL of the PNG.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        png_data_uri(&self.png)
    }
}

/// Builds print artifacts from the live surface.
pub struct ExportCompositor {
    config: ExportConfig,
    loader: Arc<dyn ImageLoader>,
}

impl std::fmt::Debug for ExportCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportCompositor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ExportCompositor {
    /// Create a compositor.
    #[must_use]
    pub fn new(config: ExportConfig, loader: Arc<dyn ImageLoader>) -> Self {
        Self { config, loader }
    }

    /// Page configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Compose the print page.
    ///
    /// If the brand mark cannot be loaded the artifact is the bare surface.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NoSurface`] when there is no surface or
    /// product, and [`ExportError::Render`] if rasterization fails.
    pub async fn compose(&self, input: ExportInput<'_>) -> Result<ExportArtifact, ExportError> {
        let (Some(surface), Some(product)) = (input.surface, input.product) else {
            tracing::warn!("Export requested with no active surface");
            return Err(ExportError::NoSurface);
        };
        let filename = export_filename(input.project_name);
        let design_png = render_png(surface.render_svg(), "Design").await?;

        let brand = match &self.config.brand_mark_url {
            Some(url) => match self.loader.load(url).await.and_then(|t| {
                let uri = to_data_uri(&t)?;
                Ok((t.width, t.height, uri))
            }) {
                Ok(brand) => Some(brand),
                Err(e) => {
                    tracing::warn!("Brand mark {url} failed ({e}), exporting bare design");
                    let (width, height) = surface.dimensions();
                    return Ok(ExportArtifact {
                        filename,
                        png: design_png,
                        width,
                        height,
                        kind: ExportKind::BareSurface,
                    });
                }
            },
            None => None,
        };

        let page = PageLayout {
            config: &self.config,
            design: (surface.dimensions(), png_data_uri(&design_png)),
            brand,
            product,
            project_name: input.project_name,
            date: input.date,
        }
        .to_svg();

        let png = render_png(page, "Page").await?;

        tracing::info!("Exported {filename} ({} bytes)", png.len());
        Ok(ExportArtifact {
            filename,
            png,
            width: self.config.page_width,
            height: self.config.page_height,
            kind: ExportKind::Composite,
        })
    }
}

/// Rasterize an SVG document to PNG on the blocking pool.
async fn render_png(svg: String, what: &'static str) -> RenderResult<Vec<u8>> {
    tokio::task::spawn_blocking(move || encode_pixmap(&rasterize_svg(&svg)?))
        .await
        .map_err(|e| RenderError::Rasterize(format!("{what} render task failed: {e}")))?
}

struct PageLayout<'a> {
    config: &'a ExportConfig,
    design: ((u32, u32), String),
    brand: Option<(u32, u32, String)>,
    product: &'a Product,
    project_name: &'a str,
    date: NaiveDate,
}

impl PageLayout<'_> {
    #[allow(clippy::cast_precision_loss)]
    fn to_svg(&self) -> String {
        let c = self.config;
        let (pw, ph) = (c.page_width, c.page_height);
        let margin = c.margin;
        let font = c.font_size();
        let mut svg = String::with_capacity(self.design.1.len() + 4096);

        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{pw}\" height=\"{ph}\" viewBox=\"0 0 {pw} {ph}\">",
        );
        let _ = write!(
            svg,
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            escape_xml(&c.background)
        );

        let inset = margin / 2;
        let _ = write!(
            svg,
            "<rect x=\"{inset}\" y=\"{inset}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>",
            pw.saturating_sub(inset * 2),
            ph.saturating_sub(inset * 2),
            escape_xml(&c.border_color),
            c.border_width,
        );

        if let Some((bw, bh, href)) = &self.brand {
            let (w, h) = fit_within(*bw, *bh, pw.saturating_sub(margin * 2), c.brand_height);
            let _ = write!(
                svg,
                "<image x=\"{}\" y=\"{margin}\" width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"none\" href=\"{href}\"/>",
                (pw.saturating_sub(w)) / 2,
            );
        }

        // Design area between the brand band and the footer.
        let top = margin + c.brand_height + margin / 2;
        let footer = c.footer_height();
        let area_w = pw.saturating_sub(margin * 2).max(1);
        let area_h = ph.saturating_sub(top + footer + margin * 2).max(1);
        let ((dw, dh), href) = &self.design;
        let (w, h) = fit_within(*dw, *dh, area_w, area_h);
        let design_x = (pw.saturating_sub(w)) / 2;
        let design_y = top + (area_h.saturating_sub(h)) / 2;
        let _ = write!(
            svg,
            "<image x=\"{design_x}\" y=\"{design_y}\" width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"none\" href=\"{href}\"/>",
        );

        let separator_y = top + area_h + margin / 2;
        let _ = write!(
            svg,
            "<line x1=\"{margin}\" y1=\"{separator_y}\" x2=\"{}\" y2=\"{separator_y}\" stroke=\"{}\" stroke-width=\"{}\"/>",
            pw.saturating_sub(margin),
            escape_xml(&c.border_color),
            (c.border_width / 2).max(1),
        );

        let lines = [
            (font * 3 / 2, "bold", self.product.name.clone()),
            (font, "normal", self.product.description.clone()),
            (font, "normal", format!("Data: {}", self.date.format("%d/%m/%Y"))),
            (font, "normal", format!("Projeto: {}", self.project_name)),
        ];
        let mut baseline = separator_y + font * 2;
        for (size, weight, text) in lines {
            if !text.is_empty() {
                let _ = write!(
                    svg,
                    "<text x=\"{margin}\" y=\"{baseline}\" font-size=\"{size}\" font-weight=\"{weight}\" font-family=\"sans-serif\" fill=\"{}\">{}</text>",
                    escape_xml(&c.text_color),
                    escape_xml(&text),
                );
            }
            baseline += size + size / 2;
        }

        svg.push_str("</svg>");
        svg
    }
}

/// Download filename for a project: lowercase, non-alphanumeric runs
/// collapsed to one hyphen, edge hyphens trimmed, `.png` appended.
#[must_use]
pub fn export_filename(project_name: &str) -> String {
    let mut slug = String::with_capacity(project_name.len());
    let mut pending_hyphen = false;
    for c in project_name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("design");
    }
    slug.push_str(".png");
    slug
}
