//! Image decoding and pixel utilities.
//!
//! Supports decoding raw bytes and data URIs, tone inversion, fit-to-box
//! resizing and PNG/data-URI encoding for embedding in the SVG intermediate.

use std::io::Cursor;

use base64::Engine;

use crate::error::{RenderError, RenderResult};

/// Decoded RGBA pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel).
    pub data: Vec<u8>,
    /// Original format of the image.
    pub format: ImageFormat,
}

/// Source image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }
}

impl TextureData {
    fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
    }
}

/// Decode an image from raw bytes.
///
/// # Errors
///
/// Returns an error if the image cannot be decoded.
pub fn load_image_from_bytes(data: &[u8]) -> RenderResult<TextureData> {
    let format = ImageFormat::from_magic_bytes(data);

    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(TextureData {
        width,
        height,
        data: rgba.into_raw(),
        format,
    })
}

/// Decode an image from a data URI.
///
/// Supports base64 (`data:image/png;base64,iVBOR...`) and percent-encoded
/// payloads.
///
/// # Errors
///
/// Returns an error if the data URI is malformed or the image cannot be decoded.
pub fn load_image_from_data_uri(uri: &str) -> RenderResult<TextureData> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    let (metadata, encoded_data) = uri_data
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    let bytes = if metadata.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(encoded_data.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(encoded_data)?
    };

    load_image_from_bytes(&bytes)
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(hex);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}

/// Invert the color channels, keeping alpha.
#[must_use]
pub fn invert_colors(texture: &TextureData) -> TextureData {
    let mut data = texture.data.clone();
    for pixel in data.chunks_exact_mut(4) {
        pixel[0] = 255 - pixel[0];
        pixel[1] = 255 - pixel[1];
        pixel[2] = 255 - pixel[2];
    }
    TextureData {
        data,
        ..texture.clone()
    }
}

/// Resize an image to fit within max dimensions while preserving aspect ratio.
///
/// Returns `None` if the image is already smaller than the max dimensions.
#[must_use]
pub fn resize_to_fit(texture: &TextureData, max_width: u32, max_height: u32) -> Option<TextureData> {
    if texture.width <= max_width && texture.height <= max_height {
        return None;
    }

    let (new_width, new_height) = fit_within(texture.width, texture.height, max_width, max_height);
    let img = texture.to_rgba_image()?;

    let resized = image::imageops::resize(
        &img,
        new_width,
        new_height,
        image::imageops::FilterType::Lanczos3,
    );

    Some(TextureData {
        width: new_width,
        height: new_height,
        data: resized.into_raw(),
        format: texture.format,
    })
}

/// Largest `(width, height)` with the source aspect ratio inside the box.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let scale_x = f64::from(max_width) / f64::from(width.max(1));
    let scale_y = f64::from(max_height) / f64::from(height.max(1));
    let scale = scale_x.min(scale_y);

    let new_width = (f64::from(width) * scale).round() as u32;
    let new_height = (f64::from(height) * scale).round() as u32;
    (new_width.max(1), new_height.max(1))
}

/// Create a solid color texture.
#[must_use]
pub fn create_solid_color(width: u32, height: u32, rgba: [u8; 4]) -> TextureData {
    let pixel_count = (width * height) as usize;
    let data = rgba.repeat(pixel_count);

    TextureData {
        width,
        height,
        data,
        format: ImageFormat::Unknown,
    }
}

/// Create a placeholder texture with a checkerboard pattern.
#[must_use]
pub fn create_placeholder(width: u32, height: u32) -> TextureData {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    let cell_size = 16u32;

    for y in 0..height {
        for x in 0..width {
            let is_light = ((x / cell_size) + (y / cell_size)) % 2 == 0;
            if is_light {
                data.extend_from_slice(&[220, 220, 220, 255]);
            } else {
                data.extend_from_slice(&[180, 180, 180, 255]);
            }
        }
    }

    TextureData {
        width,
        height,
        data,
        format: ImageFormat::Unknown,
    }
}

/// Encode a texture as PNG bytes.
///
/// # Errors
///
/// Returns an error if the pixel buffer is inconsistent or encoding fails.
pub fn encode_png(texture: &TextureData) -> RenderResult<Vec<u8>> {
    let img = texture
        .to_rgba_image()
        .ok_or_else(|| RenderError::Encode("Invalid texture data".to_string()))?;

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}

/// Encode PNG bytes as a `data:image/png;base64,` URI.
#[must_use]
pub fn png_data_uri(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

/// Encode a texture as a PNG data URI.
///
/// # Errors
///
/// Returns an error if PNG encoding fails.
pub fn to_data_uri(texture: &TextureData) -> RenderResult<String> {
    encode_png(texture).map(|png| png_data_uri(&png))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED_PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_format_detection_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            ImageFormat::Jpeg
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBP"),
            ImageFormat::WebP
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GI"), ImageFormat::Unknown);
    }

    #[test]
    fn test_data_uri_parsing() {
        let data_uri = format!("data:image/png;base64,{RED_PIXEL_PNG}");
        let texture = load_image_from_data_uri(&data_uri).expect("valid data uri");
        assert_eq!(texture.width, 1);
        assert_eq!(texture.height, 1);
        assert_eq!(texture.format, ImageFormat::Png);
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(load_image_from_data_uri("not a data uri").is_err());
        assert!(load_image_from_data_uri("data:image/png").is_err());
        assert!(load_image_from_data_uri("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("a%20b").expect("decode"), b"a b");
        assert!(percent_decode("bad%zz").is_err());
        assert!(percent_decode("short%2").is_err());
    }

    #[test]
    fn test_invert_keeps_alpha() {
        let texture = create_solid_color(2, 1, [255, 0, 10, 128]);
        let inverted = invert_colors(&texture);
        assert_eq!(&inverted.data[0..4], &[0, 255, 245, 128]);
        assert_eq!(inverted.width, 2);
    }

    #[test]
    fn test_fit_within_preserves_aspect() {
        assert_eq!(fit_within(400, 200, 100, 100), (100, 50));
        assert_eq!(fit_within(100, 400, 200, 200), (50, 200));
        assert_eq!(fit_within(10, 10, 100, 50), (50, 50));
    }

    #[test]
    fn test_resize_to_fit_only_shrinks() {
        let small = create_solid_color(10, 10, [0, 0, 0, 255]);
        assert!(resize_to_fit(&small, 20, 20).is_none());

        let large = create_solid_color(40, 20, [0, 0, 0, 255]);
        let resized = resize_to_fit(&large, 20, 20).expect("resized");
        assert_eq!((resized.width, resized.height), (20, 10));
    }

    #[test]
    fn test_png_round_trip_through_data_uri() {
        let texture = create_placeholder(32, 32);
        let uri = to_data_uri(&texture).expect("encode");
        assert!(uri.starts_with("data:image/png;base64,"));
        let decoded = load_image_from_data_uri(&uri).expect("decode");
        assert_eq!(decoded.data, texture.data);
    }
}
