//! Post-resize corrections: denoise, then saturation/contrast, then sharpen.

use clap::ValueEnum;
use image::imageops;
use image::{Rgb, RgbImage};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unsharp-mask parameters for one named strength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnsharpParams {
    /// Gaussian sigma of the blur the mask is built from.
    pub radius: f32,
    /// How much of the difference is added back, in percent.
    pub percent: i32,
    /// Differences at or below this are left alone.
    pub threshold: i32,
}

const LIGHT: UnsharpParams = UnsharpParams { radius: 0.7, percent: 80, threshold: 3 };
const MEDIUM: UnsharpParams = UnsharpParams { radius: 1.0, percent: 110, threshold: 2 };
const STRONG: UnsharpParams = UnsharpParams { radius: 1.2, percent: 140, threshold: 1 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Sharpen {
    None,
    #[default]
    Light,
    Medium,
    Strong,
}

impl Sharpen {
    pub fn params(self) -> Option<UnsharpParams> {
        match self {
            Self::None => None,
            Self::Light => Some(LIGHT),
            Self::Medium => Some(MEDIUM),
            Self::Strong => Some(STRONG),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Strong => "strong",
        }
    }
}

impl fmt::Display for Sharpen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The fixed-order correction chain. Disabled stages are skipped outright.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterChain {
    pub denoise: u32,
    pub saturation: f32,
    pub contrast: f32,
    pub sharpen: Sharpen,
}

impl Default for FilterChain {
    fn default() -> Self {
        Self { denoise: 0, saturation: 1.0, contrast: 1.0, sharpen: Sharpen::None }
    }
}

impl FilterChain {
    pub fn apply(&self, mut image: RgbImage) -> RgbImage {
        if self.denoise > 0 {
            debug!("denoise: radius {}", self.denoise);
            image = denoise(&image, self.denoise);
        } else {
            debug!("denoise: skipped");
        }

        if self.saturation != 1.0 || self.contrast != 1.0 {
            debug!("enhance: saturation {} contrast {}", self.saturation, self.contrast);
            image = enhance(&image, self.saturation, self.contrast);
        } else {
            debug!("enhance: skipped");
        }

        match self.sharpen.params() {
            Some(params) => {
                debug!("sharpen: {} {:?}", self.sharpen, params);
                image = unsharp_mask(&image, params);
            }
            None => debug!("sharpen: skipped"),
        }

        image
    }
}

/// Per-channel median over a `min(5, 2r+1)` square window, edges replicated.
pub fn denoise(image: &RgbImage, radius: u32) -> RgbImage {
    let size = (2 * radius.max(1) + 1).min(5);
    let half = (size / 2) as i64;
    let (w, h) = image.dimensions();
    let (max_x, max_y) = (w as i64 - 1, h as i64 - 1);
    let mut window = Vec::with_capacity((size * size) as usize);

    RgbImage::from_fn(w, h, |x, y| {
        let mut out = [0u8; 3];
        for (c, slot) in out.iter_mut().enumerate() {
            window.clear();
            for dy in -half..=half {
                let sy = (y as i64 + dy).clamp(0, max_y) as u32;
                for dx in -half..=half {
                    let sx = (x as i64 + dx).clamp(0, max_x) as u32;
                    window.push(image.get_pixel(sx, sy)[c]);
                }
            }
            let mid = window.len() / 2;
            *slot = *window.select_nth_unstable(mid).1;
        }
        Rgb(out)
    })
}

/// ITU-R 601 luma, 16-bit fixed point, rounded.
#[inline]
fn luma(p: &Rgb<u8>) -> u8 {
    let [r, g, b] = p.0;
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// `base + factor * (value - base)`, saturated and truncated.
#[inline]
fn blend(base: u8, value: u8, factor: f32) -> u8 {
    let t = base as f32 + factor * (value as f32 - base as f32);
    if t <= 0.0 {
        0
    } else if t >= 255.0 {
        255
    } else {
        t as u8
    }
}

/// Saturation (around each pixel's gray) then contrast (around the mean gray).
/// A factor of exactly 1.0 skips that half.
pub fn enhance(image: &RgbImage, saturation: f32, contrast: f32) -> RgbImage {
    let mut out = image.clone();

    if saturation != 1.0 {
        for px in out.pixels_mut() {
            let gray = luma(px);
            px.0 = px.0.map(|c| blend(gray, c, saturation));
        }
    }

    if contrast != 1.0 && out.width() > 0 && out.height() > 0 {
        let count = (out.width() as u64) * (out.height() as u64);
        let sum: u64 = out.pixels().map(|p| luma(p) as u64).sum();
        let mean = (sum as f64 / count as f64 + 0.5) as u8;
        for px in out.pixels_mut() {
            px.0 = px.0.map(|c| blend(mean, c, contrast));
        }
    }

    out
}

/// Gaussian unsharp mask; only differences above the threshold are boosted.
pub fn unsharp_mask(image: &RgbImage, params: UnsharpParams) -> RgbImage {
    let blurred = imageops::blur(image, params.radius);
    let mut out = image.clone();

    for (px, soft) in out.pixels_mut().zip(blurred.pixels()) {
        for c in 0..3 {
            let value = px[c] as i32;
            let diff = value - soft[c] as i32;
            if diff.abs() > params.threshold {
                px[c] = (value + diff * params.percent / 100).clamp(0, 255) as u8;
            }
        }
    }

    out
}
