//! sRGB <-> linear-light transfer functions (IEC 61966-2-1).

use image::{Rgb, Rgb32FImage, RgbImage};

/// Decode an 8-bit sRGB sample to linear light in 0.0..=1.0.
#[inline]
pub fn to_linear(sample: u8) -> f32 {
    let c = sample as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Encode a linear-light sample back to an 8-bit sRGB value.
///
/// Rounds to nearest and saturates, so out-of-range input (e.g. Lanczos
/// overshoot) lands on 0 or 255.
#[inline]
pub fn to_srgb(sample: f32) -> u8 {
    let c = if sample <= 0.0031308 {
        12.92 * sample
    } else {
        1.055 * sample.powf(1.0 / 2.4) - 0.055
    };
    (c * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

/// Convert a whole sRGB buffer to linear light.
pub fn linearize(image: &RgbImage) -> Rgb32FImage {
    Rgb32FImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgb([r, g, b]) = *image.get_pixel(x, y);
        Rgb([to_linear(r), to_linear(g), to_linear(b)])
    })
}

/// Convert a linear-light buffer back to 8-bit sRGB.
pub fn encode_srgb(image: &Rgb32FImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgb([r, g, b]) = *image.get_pixel(x, y);
        Rgb([to_srgb(r), to_srgb(g), to_srgb(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_every_byte() {
        for c in 0..=255u8 {
            assert_eq!(to_srgb(to_linear(c)), c, "round trip failed for {c}");
        }
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(to_linear(0), 0.0);
        assert!((to_linear(255) - 1.0).abs() < 1e-6);
        assert_eq!(to_srgb(0.0), 0);
        assert_eq!(to_srgb(1.0), 255);
    }

    #[test]
    fn test_linear_segment_below_breakpoint() {
        // 10/255 = 0.0392 sits under the 0.04045 knee
        let expected = (10.0 / 255.0) / 12.92;
        assert!((to_linear(10) - expected).abs() < 1e-7);
    }

    #[test]
    fn test_mid_gray_is_darker_in_linear_light() {
        let mid = to_linear(128);
        assert!(mid > 0.21 && mid < 0.22, "got {mid}");
    }

    #[test]
    fn test_to_srgb_saturates() {
        assert_eq!(to_srgb(-0.5), 0);
        assert_eq!(to_srgb(1.7), 255);
    }

    #[test]
    fn test_buffer_round_trip() {
        let image = RgbImage::from_fn(4, 3, |x, y| Rgb([(x * 60) as u8, (y * 90) as u8, 17]));
        let back = encode_srgb(&linearize(&image));
        assert_eq!(back, image);
    }
}
