//! Cell encoding - turns the final pixel grid into rows of colored glyph cells.

use image::{Rgb, RgbImage};
use rayon::prelude::*;

pub const UPPER_HALF: char = '▀';
pub const LOWER_HALF: char = '▄';
pub const FULL_BLOCK: char = '█';

/// One terminal glyph with its colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Two stacked pixels: foreground = top, background = bottom, whichever
    /// half glyph is drawn.
    Half { top: Rgb<u8>, bottom: Rgb<u8>, glyph: char },
    /// One pixel drawn as a solid glyph in the foreground color.
    Full { color: Rgb<u8>, glyph: char },
}

/// How pixels map onto cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMode {
    /// Two pixel rows per cell row, drawn with `▀` (upper) or `▄` (lower).
    HalfBlock { upper: bool },
    /// One pixel row per cell row, drawn with the given glyph.
    FullBlock { glyph: char },
}

impl CellMode {
    pub fn is_half_block(&self) -> bool {
        matches!(self, CellMode::HalfBlock { .. })
    }

    /// Source pixel rows consumed per cell row.
    pub fn rows_per_cell(&self) -> u32 {
        if self.is_half_block() {
            2
        } else {
            1
        }
    }
}

impl Default for CellMode {
    fn default() -> Self {
        CellMode::HalfBlock { upper: true }
    }
}

pub struct CellEncoder {
    image: RgbImage,
    mode: CellMode,
}

impl CellEncoder {
    /// In half-block mode the image height must be even; a trailing odd row
    /// is never read.
    pub fn new(image: RgbImage, mode: CellMode) -> Self {
        Self { image, mode }
    }

    /// Number of cell rows this image produces.
    pub fn rows(&self) -> u32 {
        self.image.height() / self.mode.rows_per_cell()
    }

    pub fn columns(&self) -> u32 {
        self.image.width()
    }

    /// Cells of cell-row `row`, left to right.
    pub fn row(&self, row: u32) -> Vec<Cell> {
        let y = row * self.mode.rows_per_cell();
        (0..self.image.width())
            .map(|x| match self.mode {
                CellMode::HalfBlock { upper } => Cell::Half {
                    top: *self.image.get_pixel(x, y),
                    bottom: *self.image.get_pixel(x, y + 1),
                    glyph: if upper { UPPER_HALF } else { LOWER_HALF },
                },
                CellMode::FullBlock { glyph } => Cell::Full { color: *self.image.get_pixel(x, y), glyph },
            })
            .collect()
    }

    /// All rows, top to bottom.
    pub fn encode(&self) -> Vec<Vec<Cell>> {
        (0..self.rows()).into_par_iter().map(|r| self.row(r)).collect()
    }
}
