//! The live drawing surface.
//!
//! A retained list of renderable objects, each tagged with the id of the
//! design element it mirrors, above a locked background artwork. The surface
//! owns the interaction state for direct manipulation (drag, resize, rotate)
//! and only reports a manipulation once it ends.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ objects (paint order)        │  tagged: text box | raster | placeholder
//! │ ...                          │
//! ├──────────────────────────────┤
//! │ background (locked, untagged)│
//! └──────────────────────────────┘
//! ```

use std::fmt::Write;

use editor_core::{
    normalize_angle, DesignElement, ElementId, ElementPatch, FontStyle, FontWeight, Manipulation,
    SurfaceEvent, TextAlign, TextStyle,
};

use crate::color::invert_color;
use crate::error::RenderResult;
use crate::image::{fit_within, invert_colors, to_data_uri, TextureData};
use crate::svg::{encode_pixmap, escape_xml, rasterize_svg};

/// Smallest scale factor a resize gesture may reach.
const MIN_SCALE: f32 = 0.01;

/// Styled text box mirroring a text-like element.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    /// Literal text.
    pub content: String,
    /// Style as stored on the element.
    pub style: TextStyle,
    /// Fill actually drawn (channel-inverted when the element is inverted).
    pub fill: String,
}

/// Decoded raster image mirroring a logo/image element.
#[derive(Debug, Clone)]
pub struct RasterImage {
    /// Source the pixels were loaded from.
    pub src: String,
    /// Decoded pixels, before any filter.
    texture: TextureData,
    /// Whether the tone-inversion filter is applied.
    inverted: bool,
    /// PNG data URI of the filtered pixels, embedded when rendering.
    href: String,
}

impl RasterImage {
    fn new(src: String, texture: TextureData, inverted: bool) -> Self {
        let mut raster = Self {
            src,
            texture,
            inverted: !inverted,
            href: String::new(),
        };
        raster.set_inverted(inverted);
        raster
    }

    /// Intrinsic pixel size.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.texture.width, self.texture.height)
    }

    /// Whether the inversion filter is on.
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    fn set_inverted(&mut self, inverted: bool) {
        if self.inverted == inverted {
            return;
        }
        self.inverted = inverted;
        let encoded = if inverted {
            to_data_uri(&invert_colors(&self.texture))
        } else {
            to_data_uri(&self.texture)
        };
        self.href = encoded.unwrap_or_else(|e| {
            tracing::warn!("Failed to encode raster {}: {e}", self.src);
            String::new()
        });
    }
}

/// Why a placeholder marker is shown instead of content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderReason {
    /// No image chosen yet.
    Empty,
    /// The image could not be loaded.
    LoadFailed(String),
}

/// Visible marker standing in for missing raster content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Source that was (or would be) loaded.
    pub src: String,
    /// Why the marker is shown.
    pub reason: PlaceholderReason,
}

/// What a surface object draws.
#[derive(Debug, Clone)]
pub enum SurfaceBody {
    /// Text box.
    Text(TextBox),
    /// Raster image.
    Raster(RasterImage),
    /// Placeholder/error marker.
    Placeholder(Placeholder),
}

/// A renderable proxy for one design element.
#[derive(Debug, Clone)]
pub struct SurfaceObject {
    tag: ElementId,
    /// Left edge in canvas pixels.
    pub left: f32,
    /// Top edge in canvas pixels.
    pub top: f32,
    /// Clockwise rotation in degrees around the top-left corner.
    pub angle: f32,
    /// Unscaled box width.
    pub width: f32,
    /// Unscaled box height.
    pub height: f32,
    /// Horizontal scale.
    pub scale_x: f32,
    /// Vertical scale.
    pub scale_y: f32,
    /// Drawn content.
    pub body: SurfaceBody,
}

impl SurfaceObject {
    /// Build a text box for a text-like element.
    #[must_use]
    pub fn text(element: &DesignElement) -> Self {
        let style = element.text_style();
        let fill = effective_fill(&style.fill, element.inverted);
        Self::with_body(
            element,
            element.width,
            element.height,
            SurfaceBody::Text(TextBox {
                content: element.content.clone(),
                style,
                fill,
            }),
        )
    }

    /// Build a raster image scaled to the element's box.
    #[must_use]
    pub fn raster(element: &DesignElement, texture: TextureData) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let (width, height) = (texture.width.max(1) as f32, texture.height.max(1) as f32);
        let raster = RasterImage::new(element.content.clone(), texture, element.inverted);
        let mut object = Self::with_body(element, width, height, SurfaceBody::Raster(raster));
        object.scale_x = element.width / width;
        object.scale_y = element.height / height;
        object
    }

    /// Build a placeholder marker in the element's box.
    #[must_use]
    pub fn placeholder(element: &DesignElement, reason: PlaceholderReason) -> Self {
        Self::with_body(
            element,
            element.width,
            element.height,
            SurfaceBody::Placeholder(Placeholder {
                src: element.content.clone(),
                reason,
            }),
        )
    }

    fn with_body(element: &DesignElement, width: f32, height: f32, body: SurfaceBody) -> Self {
        Self {
            tag: element.id,
            left: element.x,
            top: element.y,
            angle: element.angle,
            width,
            height,
            scale_x: 1.0,
            scale_y: 1.0,
            body,
        }
    }

    /// Element id this object mirrors.
    #[must_use]
    pub fn tag(&self) -> ElementId {
        self.tag
    }

    /// Rendered width.
    #[must_use]
    pub fn scaled_width(&self) -> f32 {
        self.width * self.scale_x
    }

    /// Rendered height.
    #[must_use]
    pub fn scaled_height(&self) -> f32 {
        self.height * self.scale_y
    }

    /// Whether this object can no longer represent `element` and must be
    /// rebuilt. Raster objects are rebuilt when their source changes; every
    /// other change is patched in place.
    #[must_use]
    pub fn needs_rebuild(&self, element: &DesignElement) -> bool {
        match &self.body {
            SurfaceBody::Text(_) => !element.kind.is_text(),
            SurfaceBody::Raster(raster) => !element.kind.is_raster() || raster.src != element.content,
            SurfaceBody::Placeholder(placeholder) => {
                !element.kind.is_raster() || placeholder.src != element.content
            }
        }
    }

    /// Bring position, size, rotation and style in line with `element`.
    pub fn patch_from(&mut self, element: &DesignElement) {
        self.patch_geometry(element);
        match &mut self.body {
            SurfaceBody::Text(text) => {
                text.content.clone_from(&element.content);
                text.style = element.text_style();
                text.fill = effective_fill(&text.style.fill, element.inverted);
            }
            SurfaceBody::Raster(raster) => raster.set_inverted(element.inverted),
            SurfaceBody::Placeholder(_) => {}
        }
    }

    fn patch_geometry(&mut self, element: &DesignElement) {
        self.left = element.x;
        self.top = element.y;
        self.angle = element.angle;
        match self.body {
            SurfaceBody::Raster(_) => {
                self.scale_x = element.width / self.width;
                self.scale_y = element.height / self.height;
            }
            SurfaceBody::Text(_) | SurfaceBody::Placeholder(_) => {
                self.width = element.width;
                self.height = element.height;
                self.scale_x = 1.0;
                self.scale_y = 1.0;
            }
        }
    }

    /// Read back geometry after direct manipulation, rounded to whole pixels
    /// and degrees.
    #[must_use]
    pub fn read_geometry(&self) -> ElementPatch {
        ElementPatch::geometry(
            self.left.round(),
            self.top.round(),
            self.scaled_width().round().max(1.0),
            self.scaled_height().round().max(1.0),
            normalize_angle(self.angle.round()),
        )
    }

    fn write_svg(&self, svg: &mut String) {
        let _ = write!(
            svg,
            "<g transform=\"translate({},{}) rotate({})\">",
            self.left, self.top, self.angle
        );
        let (w, h) = (self.scaled_width(), self.scaled_height());

        match &self.body {
            SurfaceBody::Text(text) => write_text_svg(svg, text, w, h),
            SurfaceBody::Raster(raster) => {
                let _ = write!(
                    svg,
                    "<image width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"none\" href=\"{}\"/>",
                    raster.href
                );
            }
            SurfaceBody::Placeholder(placeholder) => {
                let (stroke, label) = match placeholder.reason {
                    PlaceholderReason::Empty => ("#999999", "Image"),
                    PlaceholderReason::LoadFailed(_) => ("#d32f2f", "!"),
                };
                let _ = write!(
                    svg,
                    "<rect width=\"{w}\" height=\"{h}\" fill=\"#e0e0e0\" stroke=\"{stroke}\" stroke-width=\"2\" stroke-dasharray=\"6 4\"/>",
                );
                let font_size = (h * 0.3).clamp(8.0, 48.0);
                let _ = write!(
                    svg,
                    "<text x=\"{}\" y=\"{}\" font-size=\"{font_size}\" fill=\"{stroke}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-family=\"sans-serif\">{label}</text>",
                    w / 2.0,
                    h / 2.0,
                );
            }
        }
        svg.push_str("</g>");
    }
}

fn effective_fill(fill: &str, inverted: bool) -> String {
    if inverted {
        invert_color(fill)
    } else {
        fill.to_string()
    }
}

fn write_text_svg(svg: &mut String, text: &TextBox, width: f32, height: f32) {
    let style = &text.style;
    let (anchor, x) = match style.text_align {
        TextAlign::Left | TextAlign::Justify => ("start", 0.0),
        TextAlign::Center => ("middle", width / 2.0),
        TextAlign::Right => ("end", width),
    };
    let weight = match style.font_weight {
        FontWeight::Normal => "normal",
        FontWeight::Bold => "bold",
    };
    let slant = match style.font_style {
        FontStyle::Normal => "normal",
        FontStyle::Italic => "italic",
    };

    let lines: Vec<&str> = text.content.lines().collect();
    let line_height = style.font_size * 1.2;
    #[allow(clippy::cast_precision_loss)]
    let block = line_height * lines.len().max(1) as f32;
    let first_baseline = (height - block) / 2.0 + style.font_size;

    let _ = write!(
        svg,
        "<text font-size=\"{}\" font-family=\"{}\" font-weight=\"{weight}\" font-style=\"{slant}\" fill=\"{}\" text-anchor=\"{anchor}\">",
        style.font_size,
        escape_xml(&style.font_family),
        escape_xml(&text.fill),
    );
    for (i, line) in lines.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let y = first_baseline + line_height * i as f32;
        let _ = write!(svg, "<tspan x=\"{x}\" y=\"{y}\">{}</tspan>", escape_xml(line));
    }
    svg.push_str("</text>");
}

/// The product artwork under all elements. Never selectable or movable.
#[derive(Debug, Clone)]
pub struct Background {
    product_id: String,
    left: f32,
    top: f32,
    width: f32,
    height: f32,
    href: String,
}

impl Background {
    /// Fit `texture` inside the canvas, preserving aspect ratio, centered.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fitted(
        product_id: impl Into<String>,
        texture: &TextureData,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Self {
        let (w, h) = fit_within(texture.width, texture.height, canvas_width, canvas_height);
        let href = to_data_uri(texture).unwrap_or_else(|e| {
            tracing::warn!("Failed to encode background: {e}");
            String::new()
        });
        Self {
            product_id: product_id.into(),
            left: (canvas_width as f32 - w as f32) / 2.0,
            top: (canvas_height as f32 - h as f32) / 2.0,
            width: w as f32,
            height: h as f32,
            href,
        }
    }

    /// Product this artwork belongs to.
    #[must_use]
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// `(left, top, width, height)` on the canvas.
    #[must_use]
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        (self.left, self.top, self.width, self.height)
    }

    /// Background artwork is always locked against selection and transforms.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        true
    }
}

/// Object churn counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    /// Objects added over the surface's lifetime.
    pub objects_created: u64,
    /// Objects removed over the surface's lifetime.
    pub objects_removed: u64,
}

/// An in-progress direct manipulation.
#[derive(Debug, Clone, Copy)]
struct ActiveGesture {
    tag: ElementId,
    action: Manipulation,
}

/// The live drawing surface for one open document.
///
/// Dropping the surface releases every decoded buffer it holds.
#[derive(Debug)]
pub struct Surface {
    width: u32,
    height: u32,
    generation: u64,
    background: Option<Background>,
    objects: Vec<SurfaceObject>,
    active: Option<ElementId>,
    gesture: Option<ActiveGesture>,
    stats: SurfaceStats,
}

impl Surface {
    /// Create an empty surface of the given canvas size.
    #[must_use]
    pub fn new(width: u32, height: u32, generation: u64) -> Self {
        tracing::debug!("Creating {width}x{height} surface (generation {generation})");
        Self {
            width: width.max(1),
            height: height.max(1),
            generation,
            background: None,
            objects: Vec::new(),
            active: None,
            gesture: None,
            stats: SurfaceStats::default(),
        }
    }

    /// Canvas size.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Generation this surface was created for.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Tagged objects in paint order.
    #[must_use]
    pub fn objects(&self) -> &[SurfaceObject] {
        &self.objects
    }

    /// Tags in paint order.
    pub fn tags(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.objects.iter().map(SurfaceObject::tag)
    }

    /// Number of tagged objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Object mirroring `tag`.
    #[must_use]
    pub fn object(&self, tag: ElementId) -> Option<&SurfaceObject> {
        self.objects.iter().find(|o| o.tag == tag)
    }

    pub(crate) fn object_mut(&mut self, tag: ElementId) -> Option<&mut SurfaceObject> {
        self.objects.iter_mut().find(|o| o.tag == tag)
    }

    pub(crate) fn insert(&mut self, object: SurfaceObject) {
        if self.object(object.tag).is_some() {
            self.remove(object.tag);
        }
        self.objects.push(object);
        self.stats.objects_created += 1;
    }

    pub(crate) fn remove(&mut self, tag: ElementId) -> Option<SurfaceObject> {
        let index = self.objects.iter().position(|o| o.tag == tag)?;
        let removed = self.objects.remove(index);
        self.stats.objects_removed += 1;
        if self.active == Some(tag) {
            self.active = None;
        }
        if self.gesture.is_some_and(|g| g.tag == tag) {
            self.gesture = None;
        }
        Some(removed)
    }

    /// Sort objects to match `order`. Objects not listed go last.
    pub(crate) fn order_by(&mut self, order: &[ElementId]) {
        self.objects.sort_by_key(|o| {
            order
                .iter()
                .position(|id| *id == o.tag)
                .unwrap_or(usize::MAX)
        });
    }

    /// Installed background artwork.
    #[must_use]
    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub(crate) fn set_background(&mut self, background: Background) {
        self.background = Some(background);
    }

    /// Active (focused) object.
    #[must_use]
    pub fn active(&self) -> Option<ElementId> {
        self.active
    }

    pub(crate) fn set_active(&mut self, tag: Option<ElementId>) {
        self.active = tag.filter(|t| self.object(*t).is_some());
    }

    /// Churn counters.
    #[must_use]
    pub fn stats(&self) -> SurfaceStats {
        self.stats
    }

    // -----------------------------------------------------------------------
    // Interaction
    // -----------------------------------------------------------------------

    /// User clicked an object. Returns the selection event, or `None` if no
    /// object carries `tag`.
    pub fn click_object(&mut self, tag: ElementId) -> Option<SurfaceEvent> {
        self.object(tag)?;
        self.active = Some(tag);
        Some(SurfaceEvent::SelectionChanged { tag: Some(tag) })
    }

    /// User clicked the background or empty canvas.
    pub fn click_background(&mut self) -> SurfaceEvent {
        self.active = None;
        SurfaceEvent::SelectionChanged { tag: None }
    }

    /// Start dragging/resizing/rotating an object. Activates it.
    pub fn begin_manipulation(&mut self, tag: ElementId, action: Manipulation) -> bool {
        if self.object(tag).is_none() {
            return false;
        }
        self.active = Some(tag);
        self.gesture = Some(ActiveGesture { tag, action });
        true
    }

    /// Whether `tag` is being manipulated right now.
    #[must_use]
    pub fn is_manipulating(&self, tag: ElementId) -> bool {
        self.gesture.is_some_and(|g| g.tag == tag)
    }

    fn gesture_object(&mut self) -> Option<&mut SurfaceObject> {
        let tag = self.gesture?.tag;
        self.object_mut(tag)
    }

    /// Intermediate drag frame.
    pub fn drag_to(&mut self, left: f32, top: f32) -> bool {
        self.gesture_object().map_or(false, |o| {
            o.left = left;
            o.top = top;
            true
        })
    }

    /// Intermediate resize frame.
    pub fn scale_to(&mut self, scale_x: f32, scale_y: f32) -> bool {
        self.gesture_object().map_or(false, |o| {
            o.scale_x = scale_x.max(MIN_SCALE);
            o.scale_y = scale_y.max(MIN_SCALE);
            true
        })
    }

    /// Intermediate rotation frame.
    pub fn rotate_to(&mut self, angle: f32) -> bool {
        self.gesture_object().map_or(false, |o| {
            o.angle = angle;
            true
        })
    }

    /// Finish the gesture. Emits exactly one modification event.
    pub fn end_manipulation(&mut self) -> Option<SurfaceEvent> {
        let gesture = self.gesture.take()?;
        self.object(gesture.tag)?;
        Some(SurfaceEvent::ObjectModified {
            tag: gesture.tag,
            action: gesture.action,
        })
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Emit the surface as an SVG document.
    #[must_use]
    pub fn render_svg(&self) -> String {
        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
            w = self.width,
            h = self.height,
        );
        svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>");

        if let Some(bg) = &self.background {
            let _ = write!(
                svg,
                "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\" href=\"{}\"/>",
                bg.left, bg.top, bg.width, bg.height, bg.href
            );
        }

        for object in &self.objects {
            object.write_svg(&mut svg);
        }

        svg.push_str("</svg>");
        svg
    }

    /// Rasterize the surface at canvas size.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization fails.
    pub fn rasterize(&self) -> RenderResult<tiny_skia::Pixmap> {
        rasterize_svg(&self.render_svg())
    }

    /// Rasterize and encode as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization or encoding fails.
    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        encode_pixmap(&self.rasterize()?)
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        tracing::debug!(
            "Disposing surface generation {} ({} objects)",
            self.generation,
            self.objects.len()
        );
    }
}
