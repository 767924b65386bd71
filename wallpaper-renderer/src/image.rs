//! Image decoding and data URI utilities.
//!
//! Supports loading images from raw upload bytes and base64 data URIs, and
//! re-encoding filtered pixels for embedding in exports.

use std::io::Cursor;

use image::RgbaImage;
use wallpaper_core::upload::{decode_data_uri, encode_data_uri};
use wallpaper_core::{CanvasError, CanvasResult, FilterKind, ImageFormat, ImageProbe};

use crate::error::{RenderError, RenderResult};
use crate::filter::apply_filters;

/// Decoded RGBA pixels.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel data.
    pub pixels: RgbaImage,
    /// Format detected from the magic bytes, if recognized.
    pub format: Option<ImageFormat>,
}

/// Load an image from raw bytes.
///
/// # Errors
///
/// Returns an error if the image cannot be decoded.
pub fn load_image_from_bytes(data: &[u8]) -> RenderResult<DecodedImage> {
    let format = ImageFormat::from_magic_bytes(data);

    let img = image::load_from_memory(data).map_err(|e| RenderError::Decode(e.to_string()))?;

    let pixels = img.to_rgba8();
    let (width, height) = pixels.dimensions();

    Ok(DecodedImage {
        width,
        height,
        pixels,
        format,
    })
}

/// Load an image from a base64 data URI.
///
/// Supports formats like: `data:image/png;base64,iVBORw0KGgo...`
///
/// # Errors
///
/// Returns an error if the data URI is malformed or the image cannot be decoded.
pub fn load_image_from_data_uri(uri: &str) -> RenderResult<DecodedImage> {
    let (_, bytes) = decode_data_uri(uri)?;
    load_image_from_bytes(&bytes)
}

/// Encode pixels as a PNG data URI.
///
/// # Errors
///
/// Returns an error if PNG encoding fails.
pub fn encode_png_data_uri(pixels: &RgbaImage) -> RenderResult<String> {
    let mut buf = Cursor::new(Vec::new());
    pixels
        .write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))?;
    Ok(encode_data_uri("image/png", buf.get_ref()))
}

/// Run an image source through its filter list.
///
/// Sources without active filters are returned unchanged; filtered ones are
/// re-encoded as PNG.
///
/// # Errors
///
/// Returns an error if the source cannot be decoded or re-encoded.
pub fn filtered_data_uri(src: &str, filters: &[FilterKind]) -> RenderResult<String> {
    if filters.iter().all(|f| *f == FilterKind::None) {
        return Ok(src.to_string());
    }
    let mut image = load_image_from_data_uri(src)?;
    apply_filters(&mut image.pixels, filters);
    tracing::trace!(
        width = image.width,
        height = image.height,
        ?filters,
        "filtered image source"
    );
    encode_png_data_uri(&image.pixels)
}

/// [`ImageProbe`] that reads dimensions from the image header.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodingProbe;

impl ImageProbe for DecodingProbe {
    fn dimensions(&self, format: ImageFormat, bytes: &[u8]) -> CanvasResult<(u32, u32)> {
        let format = match format {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::WebP => image::ImageFormat::WebP,
        };
        let (width, height) = image::ImageReader::with_format(Cursor::new(bytes), format)
            .into_dimensions()
            .map_err(|e| CanvasError::UnreadableImage(e.to_string()))?;
        if width == 0 || height == 0 {
            return Err(CanvasError::UnreadableImage("zero-sized image".to_string()));
        }
        Ok((width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 PNG.
    const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn data_uri() -> String {
        format!("data:image/png;base64,{PNG_1X1}")
    }

    #[test]
    fn test_data_uri_parsing() {
        let image = load_image_from_data_uri(&data_uri()).expect("decode");
        assert_eq!(image.width, 1);
        assert_eq!(image.height, 1);
        assert_eq!(image.format, Some(ImageFormat::Png));
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(load_image_from_data_uri("not a data uri").is_err());
        assert!(load_image_from_data_uri("data:image/png").is_err());
        assert!(matches!(
            load_image_from_bytes(&[0x89, 0x50, 0x4E, 0x47]),
            Err(RenderError::Decode(_))
        ));
    }

    #[test]
    fn test_unfiltered_source_is_passed_through() {
        let uri = data_uri();
        assert_eq!(filtered_data_uri(&uri, &[]).expect("filter"), uri);
        assert_eq!(
            filtered_data_uri(&uri, &[FilterKind::None]).expect("filter"),
            uri
        );
    }

    #[test]
    fn test_filtered_source_is_reencoded() {
        let uri = data_uri();
        let before = load_image_from_data_uri(&uri).expect("decode").pixels;
        let filtered = filtered_data_uri(&uri, &[FilterKind::Invert]).expect("filter");
        assert!(filtered.starts_with("data:image/png;base64,"));
        let after = load_image_from_data_uri(&filtered).expect("decode").pixels;
        let (b, a) = (before.get_pixel(0, 0).0, after.get_pixel(0, 0).0);
        assert_eq!(a[0], 255 - b[0]);
        assert_eq!(a[3], b[3]);
    }

    #[test]
    fn test_decoding_probe() {
        let (_, bytes) = decode_data_uri(&data_uri()).expect("decode");
        assert_eq!(
            DecodingProbe
                .dimensions(ImageFormat::Png, &bytes)
                .expect("dims"),
            (1, 1)
        );
        assert!(DecodingProbe
            .dimensions(ImageFormat::Png, &[0x89, 0x50, 0x4E, 0x47, 0, 0])
            .is_err());
    }
}
