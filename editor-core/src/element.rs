//! Design elements - the items a user places on a product.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Smallest width/height an element may have, in pixels.
pub const MIN_EXTENT: f32 = 1.0;

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an element ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidId`] if the string is not a UUID.
    pub fn parse(s: &str) -> CoreResult<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| CoreError::InvalidId(format!("{s}: {e}")))
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of content an element carries.
///
/// `Logo` and `Image` render identically (raster). The remaining kinds are
/// all text and differ only in their placeholder copy and UI labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    /// Free text.
    Text,
    /// Company logo (raster).
    Logo,
    /// Arbitrary picture (raster).
    Image,
    /// Phone number.
    PhoneContact,
    /// Email address.
    Email,
    /// Social network handle.
    SocialHandle,
}

impl ElementKind {
    /// Whether this kind renders as a raster image.
    #[must_use]
    pub const fn is_raster(self) -> bool {
        matches!(self, Self::Logo | Self::Image)
    }

    /// Whether this kind renders as a styled text box.
    #[must_use]
    pub const fn is_text(self) -> bool {
        !self.is_raster()
    }

    /// Placeholder content for a freshly added element.
    #[must_use]
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Text => "Seu texto aqui",
            Self::PhoneContact => "(00) 00000-0000",
            Self::Email => "contato@empresa.com",
            Self::SocialHandle => "@suaempresa",
            Self::Logo | Self::Image => "",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Logo => "Logo",
            Self::Image => "Image",
            Self::PhoneContact => "Phone",
            Self::Email => "Email",
            Self::SocialHandle => "Social",
        }
    }
}

/// Font weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    /// Regular weight.
    #[default]
    Normal,
    /// Bold weight.
    Bold,
}

/// Font slant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// Upright.
    #[default]
    Normal,
    /// Italic.
    Italic,
}

/// Horizontal text alignment inside the element box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Flush left.
    Left,
    /// Centered.
    #[default]
    Center,
    /// Flush right.
    Right,
    /// Justified.
    Justify,
}

/// Styling for text-like elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextStyle {
    /// Text color as hex.
    pub fill: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// Font family name.
    pub font_family: String,
    /// Font weight.
    pub font_weight: FontWeight,
    /// Font slant.
    pub font_style: FontStyle,
    /// Alignment.
    pub text_align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            fill: "#000000".to_string(),
            font_size: 24.0,
            font_family: "Arial".to_string(),
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            text_align: TextAlign::Center,
        }
    }
}

/// One placed item on the design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignElement {
    /// Unique identifier.
    pub id: ElementId,
    /// Element content type.
    pub kind: ElementKind,
    /// Text for text-like kinds, URL or data URI for raster kinds.
    pub content: String,
    /// Left edge in canvas pixels.
    pub x: f32,
    /// Top edge in canvas pixels.
    pub y: f32,
    /// Box width in pixels.
    pub width: f32,
    /// Box height in pixels.
    pub height: f32,
    /// Clockwise rotation in degrees, `[0, 360)`.
    pub angle: f32,
    /// Text styling; only meaningful for text-like kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
    /// Render with color/tone inverted.
    #[serde(default)]
    pub inverted: bool,
}

impl DesignElement {
    /// Create a new element with a fresh id and the given geometry.
    ///
    /// Geometry is normalized: extents are clamped to [`MIN_EXTENT`] and the
    /// angle is wrapped into `[0, 360)`.
    #[must_use]
    pub fn new(
        kind: ElementKind,
        content: impl Into<String>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Self {
        let mut element = Self {
            id: ElementId::new(),
            kind,
            content: content.into(),
            x,
            y,
            width,
            height,
            angle: 0.0,
            style: kind.is_text().then(TextStyle::default),
            inverted: false,
        };
        element.normalize();
        element
    }

    /// Set the text style.
    #[must_use]
    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = Some(style);
        self.normalize();
        self
    }

    /// Set the rotation.
    #[must_use]
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = normalize_angle(angle);
        self
    }

    /// Effective text style, falling back to defaults.
    #[must_use]
    pub fn text_style(&self) -> TextStyle {
        self.style.clone().unwrap_or_default()
    }

    /// Clamp extents and wrap the angle.
    ///
    /// Non-finite positions reset to the origin and a non-finite font size
    /// falls back to the default, so the element always serializes.
    pub fn normalize(&mut self) {
        self.x = finite_or_zero(self.x);
        self.y = finite_or_zero(self.y);
        if let Some(style) = &mut self.style {
            style.font_size = if style.font_size.is_finite() {
                style.font_size.max(1.0)
            } else {
                TextStyle::default().font_size
            };
        }
        self.width = clamp_extent(self.width);
        self.height = clamp_extent(self.height);
        self.angle = normalize_angle(self.angle);
    }

    /// Apply a sparse update.
    ///
    /// Style fields are ignored for raster kinds.
    pub fn apply(&mut self, patch: &ElementPatch) {
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        if let Some(x) = patch.x.filter(|x| x.is_finite()) {
            self.x = x;
        }
        if let Some(y) = patch.y.filter(|y| y.is_finite()) {
            self.y = y;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(angle) = patch.angle {
            self.angle = angle;
        }
        if let Some(inverted) = patch.inverted {
            self.inverted = inverted;
        }
        if self.kind.is_text() && patch.touches_style() {
            let style = self.style.get_or_insert_with(TextStyle::default);
            if let Some(fill) = &patch.fill {
                style.fill.clone_from(fill);
            }
            if let Some(font_size) = patch.font_size {
                style.font_size = font_size.max(1.0);
            }
            if let Some(family) = &patch.font_family {
                style.font_family.clone_from(family);
            }
            if let Some(weight) = patch.font_weight {
                style.font_weight = weight;
            }
            if let Some(slant) = patch.font_style {
                style.font_style = slant;
            }
            if let Some(align) = patch.text_align {
                style.text_align = align;
            }
        }
        self.normalize();
    }
}

/// Sparse update for an element. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPatch {
    /// New content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// New left edge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    /// New top edge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    /// New width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// New height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    /// New rotation in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
    /// New text color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    /// New font size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// New font family.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// New font weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    /// New font slant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
    /// New alignment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    /// New inversion flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inverted: Option<bool>,
}

impl ElementPatch {
    /// Patch that moves, resizes and rotates an element.
    #[must_use]
    pub fn geometry(x: f32, y: f32, width: f32, height: f32, angle: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            angle: Some(angle),
            ..Self::default()
        }
    }

    /// Patch that replaces the content.
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    fn touches_style(&self) -> bool {
        self.fill.is_some()
            || self.font_size.is_some()
            || self.font_family.is_some()
            || self.font_weight.is_some()
            || self.font_style.is_some()
            || self.text_align.is_some()
    }
}

/// Wrap an angle in degrees into `[0, 360)`.
#[must_use]
pub fn normalize_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn clamp_extent(value: f32) -> f32 {
    if value.is_finite() && value >= MIN_EXTENT {
        value
    } else {
        MIN_EXTENT
    }
}
