//! Render settings, loadable from a JSON settings file.

use crate::cell::{CellMode, FULL_BLOCK};
use crate::filter::{FilterChain, Sharpen};
use crate::output::OutputFormat;
use crate::resize::ResizeMethod;
use crate::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MIN_WIDTH: u32 = 1;
pub const MAX_WIDTH: u32 = 200;
pub const MAX_DENOISE: u32 = 3;
pub const DEFAULT_CELL_ASPECT: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Output width in characters.
    pub width: u32,
    pub half_block: bool,
    /// `▀` when true, `▄` otherwise. Half-block mode only.
    pub upper_half: bool,
    /// Glyph for full-block mode.
    pub full_glyph: char,
    /// Emit real `ESC[` sequences; when false only `[` is written.
    pub use_csi: bool,
    /// Height/width ratio of one terminal cell.
    pub cell_aspect: f64,
    pub resize_method: ResizeMethod,
    pub sharpen: Sharpen,
    /// Median denoise radius, 0 disables.
    pub denoise: u32,
    pub saturation: f32,
    pub contrast: f32,
    /// Name of the generated Verilog task.
    pub task_name: String,
    pub format: OutputFormat,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 60,
            half_block: true,
            upper_half: true,
            full_glyph: FULL_BLOCK,
            use_csi: true,
            cell_aspect: DEFAULT_CELL_ASPECT,
            resize_method: ResizeMethod::LinearBicubic,
            sharpen: Sharpen::Light,
            denoise: 0,
            saturation: 1.0,
            contrast: 1.0,
            task_name: "display_image".to_string(),
            format: OutputFormat::Auto,
        }
    }
}

impl RenderOptions {
    /// Read settings from a JSON file; missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Clamp out-of-range values, warning about each one.
    pub fn sanitized(mut self) -> Self {
        if !(MIN_WIDTH..=MAX_WIDTH).contains(&self.width) {
            let clamped = self.width.clamp(MIN_WIDTH, MAX_WIDTH);
            warn!("width should be in {MIN_WIDTH}-{MAX_WIDTH}; {} clamped to {clamped}", self.width);
            self.width = clamped;
        }
        if self.denoise > MAX_DENOISE {
            warn!("denoise should be in 0-{MAX_DENOISE}; {} clamped to {MAX_DENOISE}", self.denoise);
            self.denoise = MAX_DENOISE;
        }
        if !(self.cell_aspect.is_finite() && self.cell_aspect > 0.0) {
            warn!("cell aspect must be positive; {} replaced by {DEFAULT_CELL_ASPECT}", self.cell_aspect);
            self.cell_aspect = DEFAULT_CELL_ASPECT;
        }
        if !(self.saturation.is_finite() && self.saturation >= 0.0) {
            warn!("saturation must be non-negative; {} replaced by 1.0", self.saturation);
            self.saturation = 1.0;
        }
        if !(self.contrast.is_finite() && self.contrast >= 0.0) {
            warn!("contrast must be non-negative; {} replaced by 1.0", self.contrast);
            self.contrast = 1.0;
        }
        self
    }

    pub fn cell_mode(&self) -> CellMode {
        if self.half_block {
            CellMode::HalfBlock { upper: self.upper_half }
        } else {
            CellMode::FullBlock { glyph: self.full_glyph }
        }
    }

    pub fn filters(&self) -> FilterChain {
        FilterChain {
            denoise: self.denoise,
            saturation: self.saturation,
            contrast: self.contrast,
            sharpen: self.sharpen,
        }
    }
}
