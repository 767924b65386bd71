//! Pixel filters for image objects.
//!
//! Each filter maps RGB per pixel and leaves alpha untouched.

use image::RgbaImage;
use wallpaper_core::FilterKind;

/// Apply a filter in place.
pub fn apply_filter(image: &mut RgbaImage, filter: FilterKind) {
    match filter {
        FilterKind::None => {}
        FilterKind::Grayscale => grayscale(image),
        FilterKind::Sepia => sepia(image),
        FilterKind::Invert => invert(image),
    }
}

/// Apply a filter list in order.
pub fn apply_filters(image: &mut RgbaImage, filters: &[FilterKind]) {
    for &filter in filters {
        apply_filter(image, filter);
    }
}

/// Replace each channel with the average of R, G and B.
#[allow(clippy::cast_possible_truncation)]
pub fn grayscale(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let avg = ((u16::from(r) + u16::from(g) + u16::from(b)) / 3) as u8;
        pixel.0[0] = avg;
        pixel.0[1] = avg;
        pixel.0[2] = avg;
    }
}

/// Standard sepia tone matrix, clamped to 255.
pub fn sepia(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
        pixel.0[0] = clamp_channel(0.393 * r + 0.769 * g + 0.189 * b);
        pixel.0[1] = clamp_channel(0.349 * r + 0.686 * g + 0.168 * b);
        pixel.0[2] = clamp_channel(0.272 * r + 0.534 * g + 0.131 * b);
    }
}

/// `255 - c` per color channel.
pub fn invert(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        pixel.0[0] = 255 - pixel.0[0];
        pixel.0[1] = 255 - pixel.0[1];
        pixel.0[2] = 255 - pixel.0[2];
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_channel(value: f32) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use proptest::prelude::*;

    fn one_pixel(rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(1, 1, Rgba(rgba))
    }

    #[test]
    fn grayscale_averages_channels() {
        let mut image = one_pixel([30, 60, 90, 128]);
        grayscale(&mut image);
        assert_eq!(image.get_pixel(0, 0).0, [60, 60, 60, 128]);
    }

    #[test]
    fn sepia_matrix_and_clamp() {
        let mut image = one_pixel([100, 100, 100, 255]);
        sepia(&mut image);
        // 0.393+0.769+0.189 = 1.351, 0.349+0.686+0.168 = 1.203, 0.272+0.534+0.131 = 0.937
        assert_eq!(image.get_pixel(0, 0).0, [135, 120, 93, 255]);

        let mut white = one_pixel([255, 255, 255, 7]);
        sepia(&mut white);
        assert_eq!(white.get_pixel(0, 0).0, [255, 255, 238, 7]);
    }

    #[test]
    fn invert_flips_channels() {
        let mut image = one_pixel([0, 100, 255, 42]);
        invert(&mut image);
        assert_eq!(image.get_pixel(0, 0).0, [255, 155, 0, 42]);
    }

    #[test]
    fn none_is_noop() {
        let mut image = one_pixel([1, 2, 3, 4]);
        apply_filters(&mut image, &[FilterKind::None]);
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3, 4]);
    }

    proptest! {
        #[test]
        fn invert_twice_is_identity(rgba in any::<[u8; 4]>()) {
            let mut image = one_pixel(rgba);
            apply_filters(&mut image, &[FilterKind::Invert, FilterKind::Invert]);
            prop_assert_eq!(image.get_pixel(0, 0).0, rgba);
        }

        #[test]
        fn filters_keep_alpha(rgba in any::<[u8; 4]>()) {
            for filter in [FilterKind::Grayscale, FilterKind::Sepia, FilterKind::Invert] {
                let mut image = one_pixel(rgba);
                apply_filter(&mut image, filter);
                prop_assert_eq!(image.get_pixel(0, 0).0[3], rgba[3]);
            }
        }
    }
}
