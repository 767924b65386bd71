//! Validation of uploaded and generated images, and data URI handling.

use base64::Engine;

use crate::{CanvasError, CanvasResult, ImageFormat};

/// Largest accepted upload in bytes (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Reads the pixel dimensions of encoded image bytes.
///
/// The editing core never decodes pixels itself; the host supplies a probe
/// (the renderer's decoder natively, or dimensions already known to the
/// browser).
pub trait ImageProbe {
    /// Return `(width, height)` of the encoded image.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::UnreadableImage`] if the bytes cannot be read.
    fn dimensions(&self, format: ImageFormat, bytes: &[u8]) -> CanvasResult<(u32, u32)>;
}

/// Probe for dimensions that are already known.
#[derive(Debug, Clone, Copy)]
pub struct KnownDimensions(pub u32, pub u32);

impl ImageProbe for KnownDimensions {
    fn dimensions(&self, _format: ImageFormat, _bytes: &[u8]) -> CanvasResult<(u32, u32)> {
        if self.0 == 0 || self.1 == 0 {
            return Err(CanvasError::UnreadableImage("zero-sized image".to_string()));
        }
        Ok((self.0, self.1))
    }
}

/// An upload that passed validation.
#[derive(Debug, Clone, Copy)]
pub struct UploadedImage<'a> {
    /// Validated format.
    pub format: ImageFormat,
    /// Encoded bytes.
    pub bytes: &'a [u8],
}

impl<'a> UploadedImage<'a> {
    /// Validate an upload by declared MIME type and content.
    ///
    /// Only JPEG, PNG and WebP are accepted, the file must be non-empty and
    /// at most [`MAX_UPLOAD_BYTES`], and its magic bytes must agree with the
    /// declared type.
    ///
    /// # Errors
    ///
    /// Returns the matching user-facing [`CanvasError`] for each rejection.
    pub fn validate(mime: &str, bytes: &'a [u8]) -> CanvasResult<Self> {
        let format = ImageFormat::from_mime(mime)
            .ok_or_else(|| CanvasError::UnsupportedUpload(mime.to_string()))?;
        if bytes.is_empty() {
            return Err(CanvasError::EmptyUpload);
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(CanvasError::UploadTooLarge {
                size: bytes.len(),
                max: MAX_UPLOAD_BYTES,
            });
        }
        if ImageFormat::from_magic_bytes(bytes) != Some(format) {
            return Err(CanvasError::UploadMismatch(format.mime().to_string()));
        }
        Ok(Self { format, bytes })
    }

    /// Encode as a base64 data URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        encode_data_uri(self.format.mime(), self.bytes)
    }
}

/// A validated image, encoded and measured, ready to be placed on a surface.
///
/// Preparing does all the per-byte work up front so it can happen away from
/// the session it is added to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    /// Base64 data URI of the image.
    pub src: String,
    /// Validated format.
    pub format: ImageFormat,
    /// Decoded width in pixels.
    pub natural_width: u32,
    /// Decoded height in pixels.
    pub natural_height: u32,
}

impl PreparedImage {
    /// Validate, measure and encode an uploaded file.
    ///
    /// # Errors
    ///
    /// Returns the validation error from [`UploadedImage::validate`] or the
    /// probe's error.
    pub fn from_upload(mime: &str, bytes: &[u8], probe: &dyn ImageProbe) -> CanvasResult<Self> {
        let upload = UploadedImage::validate(mime, bytes)?;
        let (natural_width, natural_height) = probe.dimensions(upload.format, upload.bytes)?;
        Ok(Self {
            src: upload.to_data_uri(),
            format: upload.format,
            natural_width,
            natural_height,
        })
    }

    /// Decode and prepare an image given as a data URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is malformed or not an accepted image.
    pub fn from_data_uri(uri: &str, probe: &dyn ImageProbe) -> CanvasResult<Self> {
        let (mime, bytes) = decode_data_uri(uri)?;
        Self::from_upload(&mime, &bytes, probe)
    }
}

/// Encode bytes as a base64 data URI.
#[must_use]
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

/// Split a base64 data URI into MIME type and decoded bytes.
///
/// Supports URIs like `data:image/png;base64,iVBORw0KGgo...`.
///
/// # Errors
///
/// Returns [`CanvasError::UnreadableImage`] if the URI is malformed or not
/// base64-encoded.
pub fn decode_data_uri(uri: &str) -> CanvasResult<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| CanvasError::UnreadableImage("not a data URI".to_string()))?;
    let (metadata, encoded) = rest
        .split_once(',')
        .ok_or_else(|| CanvasError::UnreadableImage("data URI missing comma".to_string()))?;
    let mime = metadata
        .strip_suffix(";base64")
        .ok_or_else(|| CanvasError::UnreadableImage("data URI is not base64".to_string()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| CanvasError::UnreadableImage(format!("invalid base64: {e}")))?;
    Ok((mime.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn png_bytes() -> Vec<u8> {
        base64::engine::general_purpose::STANDARD
            .decode(PNG_1X1)
            .expect("fixture")
    }

    #[test]
    fn accepts_png() {
        let bytes = png_bytes();
        let upload = UploadedImage::validate("image/png", &bytes).expect("valid");
        assert_eq!(upload.format, ImageFormat::Png);
        assert!(upload.to_data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn rejects_text_file() {
        let err = UploadedImage::validate("text/plain", b"hello").unwrap_err();
        assert!(matches!(err, CanvasError::UnsupportedUpload(_)));
    }

    #[test]
    fn rejects_empty_and_mismatched() {
        assert!(matches!(
            UploadedImage::validate("image/png", &[]),
            Err(CanvasError::EmptyUpload)
        ));
        let bytes = png_bytes();
        assert!(matches!(
            UploadedImage::validate("image/jpeg", &bytes),
            Err(CanvasError::UploadMismatch(_))
        ));
    }

    #[test]
    fn rejects_oversized() {
        let mut bytes = vec![0u8; MAX_UPLOAD_BYTES + 1];
        bytes[..4].copy_from_slice(&[0x89, 0x50, 0x4E, 0x47]);
        assert!(matches!(
            UploadedImage::validate("image/png", &bytes),
            Err(CanvasError::UploadTooLarge { .. })
        ));
    }

    #[test]
    fn data_uri_decoding() {
        let (mime, bytes) =
            decode_data_uri(&format!("data:image/png;base64,{PNG_1X1}")).expect("decode");
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, png_bytes());

        assert!(decode_data_uri("not a data uri").is_err());
        assert!(decode_data_uri("data:image/png").is_err());
        assert!(decode_data_uri("data:image/png,abc").is_err());
    }

    #[test]
    fn prepared_image_is_encoded_and_measured() {
        let bytes = png_bytes();
        let image =
            PreparedImage::from_upload("image/png", &bytes, &KnownDimensions(1, 1)).expect("ok");
        assert_eq!((image.natural_width, image.natural_height), (1, 1));
        assert_eq!(image.src, format!("data:image/png;base64,{PNG_1X1}"));

        let again = PreparedImage::from_data_uri(&image.src, &KnownDimensions(1, 1)).expect("ok");
        assert_eq!(again, image);
        assert!(matches!(
            PreparedImage::from_upload("text/plain", b"notes", &KnownDimensions(1, 1)),
            Err(CanvasError::UnsupportedUpload(_))
        ));
    }

    #[test]
    fn known_dimensions_rejects_zero() {
        assert!(KnownDimensions(0, 10)
            .dimensions(ImageFormat::Png, &[])
            .is_err());
        assert_eq!(
            KnownDimensions(4, 3)
                .dimensions(ImageFormat::Png, &[])
                .expect("dims"),
            (4, 3)
        );
    }
}
