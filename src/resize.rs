//! Target grid computation and resampling, in gamma or linear light.

use crate::{color, RenderError, Result};
use clap::ValueEnum;
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, Rgb, Rgb32FImage, RgbImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

type Plane = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Upper bound on the resized pixel height.
pub const MAX_PIXEL_HEIGHT: u32 = 1 << 16;

/// Resize strategy: color space the kernel runs in, and which kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ResizeMethod {
    /// Lanczos3 in linear light. Most accurate, can ring on hard edges.
    #[value(name = "linear_lanczos")]
    LinearLanczos,
    /// Catmull-Rom bicubic in linear light. Soft and color-accurate.
    #[default]
    #[value(name = "linear_bicubic")]
    LinearBicubic,
    /// Lanczos3 on gamma-encoded samples.
    #[value(name = "lanczos")]
    Lanczos,
    /// Catmull-Rom bicubic on gamma-encoded samples.
    #[value(name = "bicubic")]
    Bicubic,
}

impl ResizeMethod {
    pub fn is_linear(self) -> bool {
        matches!(self, Self::LinearLanczos | Self::LinearBicubic)
    }

    pub fn filter(self) -> FilterType {
        match self {
            Self::LinearLanczos | Self::Lanczos => FilterType::Lanczos3,
            Self::LinearBicubic | Self::Bicubic => FilterType::CatmullRom,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LinearLanczos => "linear_lanczos",
            Self::LinearBicubic => "linear_bicubic",
            Self::Lanczos => "lanczos",
            Self::Bicubic => "bicubic",
        }
    }
}

impl fmt::Display for ResizeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The pixel grid the rest of the pipeline works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// Output width in characters (= pixel width).
    pub columns: u32,
    /// Output height in characters.
    pub rows: u32,
    /// Pixel height fed to the resize: `2 * rows` in half-block mode.
    pub pixel_height: u32,
}

impl Dimensions {
    /// Derive the character grid for a `src_w`x`src_h` source rendered
    /// `width` characters wide.
    ///
    /// `cell_aspect` is the height/width ratio of one terminal cell; the
    /// caller guarantees it is finite and positive. Grids taller than
    /// [`MAX_PIXEL_HEIGHT`] are rejected.
    pub fn compute(src_w: u32, src_h: u32, width: u32, cell_aspect: f64, half_block: bool) -> Result<Self> {
        let ratio = src_h as f64 / src_w as f64;
        let rows = (width as f64 * ratio / cell_aspect).round_ties_even().max(1.0);
        let per_row = if half_block { 2.0 } else { 1.0 };
        if !(rows * per_row <= MAX_PIXEL_HEIGHT as f64) {
            return Err(RenderError::InvalidImage(format!(
                "{src_w}x{src_h} at width {width} and cell aspect {cell_aspect} needs {rows} rows"
            )));
        }
        let rows = rows as u32;

        let pixel_height = if half_block {
            let h = rows * 2;
            if h % 2 == 1 {
                h + 1
            } else {
                h
            }
        } else {
            rows
        };

        Ok(Self { columns: width, rows, pixel_height })
    }

    pub fn pixel_width(&self) -> u32 {
        self.columns
    }
}

/// Resize `image` to exactly `columns` x `pixel_height`.
pub fn resize(image: &RgbImage, dims: Dimensions, method: ResizeMethod) -> RgbImage {
    let (w, h) = (dims.pixel_width(), dims.pixel_height);
    if method.is_linear() {
        let linear = color::linearize(image);
        color::encode_srgb(&resize_linear(&linear, w, h, method.filter()))
    } else {
        imageops::resize(image, w, h, method.filter())
    }
}

/// Resize each channel plane on its own, in parallel.
fn resize_linear(image: &Rgb32FImage, w: u32, h: u32, filter: FilterType) -> Rgb32FImage {
    let planes: Vec<Plane> = (0..3usize)
        .into_par_iter()
        .map(|c| {
            let plane = Plane::from_fn(image.width(), image.height(), |x, y| {
                Luma([image.get_pixel(x, y)[c]])
            });
            imageops::resize(&plane, w, h, filter)
        })
        .collect();

    Rgb32FImage::from_fn(w, h, |x, y| {
        Rgb([
            planes[0].get_pixel(x, y)[0],
            planes[1].get_pixel(x, y)[0],
            planes[2].get_pixel(x, y)[0],
        ])
    })
}

/// Drop the last row if the height is odd, so rows pair up.
pub fn crop_to_even_height(image: RgbImage) -> RgbImage {
    let (w, h) = image.dimensions();
    if h % 2 == 0 {
        return image;
    }
    imageops::crop_imm(&image, 0, 0, w, h - 1).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_square_source() {
        let d = Dimensions::compute(100, 100, 40, 2.0, true).unwrap();
        assert_eq!(d.columns, 40);
        assert_eq!(d.rows, 20);
        assert_eq!(d.pixel_height, 40);
    }

    #[test]
    fn test_dimensions_full_block() {
        let d = Dimensions::compute(200, 100, 60, 2.0, false).unwrap();
        assert_eq!(d.rows, 15);
        assert_eq!(d.pixel_height, 15);
    }

    #[test]
    fn test_dimensions_minimum_one_row() {
        // Very wide source rounds to zero rows
        let d = Dimensions::compute(10_000, 10, 5, 2.0, true).unwrap();
        assert_eq!(d.rows, 1);
        assert_eq!(d.pixel_height, 2);
    }

    #[test]
    fn test_half_block_height_always_even() {
        for width in 1..=200 {
            for aspect in [0.5, 1.0, 1.7, 2.0, 2.5, 3.3] {
                for (sw, sh) in [(1, 1), (3, 7), (640, 480), (17, 1000), (1000, 3)] {
                    let d = Dimensions::compute(sw, sh, width, aspect, true).unwrap();
                    assert_eq!(d.pixel_height % 2, 0);
                    assert!(d.pixel_height >= 2);
                }
            }
        }
    }

    #[test]
    fn test_tiny_cell_aspect_is_rejected() {
        let err = Dimensions::compute(1, 1, 200, 1e-9, true).unwrap_err();
        assert_eq!(err.kind(), "invalid-image");
        assert!(Dimensions::compute(1, 1, 200, 1e-9, false).is_err());
    }

    #[test]
    fn test_tallest_allowed_grid() {
        // 200 * 1 / (200 / 32768) = 32768 rows -> 65536 pixels, exactly the cap
        let d = Dimensions::compute(1, 1, 200, 200.0 / 32768.0, true).unwrap();
        assert_eq!(d.pixel_height, MAX_PIXEL_HEIGHT);
        assert!(Dimensions::compute(1, 1, 200, 200.0 / 32769.0, true).is_err());
    }

    #[test]
    fn test_rounding_ties_to_even() {
        // 5 * 1.0 / 2.0 = 2.5 -> 2
        assert_eq!(Dimensions::compute(10, 10, 5, 2.0, false).unwrap().rows, 2);
        // 7 * 1.0 / 2.0 = 3.5 -> 4
        assert_eq!(Dimensions::compute(10, 10, 7, 2.0, false).unwrap().rows, 4);
    }

    #[test]
    fn test_resize_exact_dimensions_every_method() {
        let src = RgbImage::from_fn(37, 23, |x, y| Rgb([(x * 7) as u8, (y * 11) as u8, 200]));
        let dims = Dimensions::compute(37, 23, 12, 2.0, true).unwrap();
        for method in ResizeMethod::value_variants() {
            let out = resize(&src, dims, *method);
            assert_eq!(out.dimensions(), (12, dims.pixel_height), "{method}");
        }
    }

    #[test]
    fn test_resize_solid_color_is_preserved() {
        let src = RgbImage::from_pixel(50, 50, Rgb([255, 0, 0]));
        let dims = Dimensions::compute(50, 50, 10, 2.0, true).unwrap();
        for method in ResizeMethod::value_variants() {
            let out = resize(&src, dims, *method);
            assert!(out.pixels().all(|p| *p == Rgb([255, 0, 0])), "{method}");
        }
    }

    #[test]
    fn test_linear_downscale_keeps_checkerboard_brightness() {
        // Black/white checkerboard averages to 50% light, which is ~188 in sRGB,
        // whereas naive gamma averaging gives ~128.
        let src = RgbImage::from_fn(64, 64, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let dims = Dimensions { columns: 4, rows: 2, pixel_height: 4 };
        let linear = resize(&src, dims, ResizeMethod::LinearBicubic);
        let gamma = resize(&src, dims, ResizeMethod::Bicubic);
        let lin_px = linear.get_pixel(1, 1)[0];
        let gam_px = gamma.get_pixel(1, 1)[0];
        assert!(lin_px > 170, "linear-light result too dark: {lin_px}");
        assert!(gam_px < 150, "gamma result unexpectedly bright: {gam_px}");
    }

    #[test]
    fn test_crop_to_even_height() {
        let odd = RgbImage::new(3, 5);
        assert_eq!(crop_to_even_height(odd).dimensions(), (3, 4));
        let even = RgbImage::new(3, 4);
        assert_eq!(crop_to_even_height(even).dimensions(), (3, 4));
    }

    #[test]
    fn test_method_names_match_cli_values() {
        for method in ResizeMethod::value_variants() {
            let value = method.to_possible_value().map(|v| v.get_name().to_string());
            assert_eq!(value.as_deref(), Some(method.name()));
        }
    }
}
