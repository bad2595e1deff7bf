//! Fill color helpers.
//!
//! Fills accept any SVG/CSS color: `#rgb`, `#rrggbb`, `#rrggbbaa`, named
//! colors, `rgb()`/`rgba()` and `hsl()`. Parsing goes through `svgtypes`, the
//! same parser the renderer applies to fills.

use std::str::FromStr;

/// Parse a color into RGBA channels.
#[must_use]
pub fn parse_color(color: &str) -> Option<[u8; 4]> {
    svgtypes::Color::from_str(color.trim())
        .ok()
        .map(|c| [c.red, c.green, c.blue, c.alpha])
}

/// Format channels as `#rrggbb`, or `#rrggbbaa` when translucent.
#[must_use]
pub fn to_hex([r, g, b, a]: [u8; 4]) -> String {
    if a == u8::MAX {
        format!("#{r:02x}{g:02x}{b:02x}")
    } else {
        format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

/// Channel-invert a color, keeping its alpha. Unparseable colors are
/// returned unchanged.
#[must_use]
pub fn invert_color(color: &str) -> String {
    match parse_color(color) {
        Some([r, g, b, a]) => to_hex([255 - r, 255 - g, 255 - b, a]),
        None => {
            tracing::debug!("Cannot invert color {color:?}, leaving as is");
            color.to_string()
        }
    }
}
