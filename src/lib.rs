//! Image to true-color ANSI block art, or a Verilog task that prints it.
//!
//! The pipeline is strictly linear: resize (optionally in linear light),
//! filter, encode into half- or full-block cells, then serialize.

pub mod cell;
pub mod color;
pub mod filter;
pub mod options;
pub mod output;
pub mod resize;

pub use cell::{Cell, CellEncoder, CellMode};
pub use filter::{FilterChain, Sharpen};
pub use options::RenderOptions;
pub use output::{Destination, OutputFormat};
pub use resize::{Dimensions, ResizeMethod};

use image::DynamicImage;
use log::{debug, info};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("image file not found: '{}'", .0.display())]
    NotFound(PathBuf),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Settings error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Short stable tag for the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::NotFound(_) => "not-found",
            RenderError::Image(_) => "decode",
            RenderError::InvalidImage(_) => "invalid-image",
            RenderError::Config(_) => "config",
            RenderError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// A rendered image: one ANSI string per character row.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendering {
    pub source_size: (u32, u32),
    pub columns: u32,
    pub rows: u32,
    pub lines: Vec<String>,
}

/// Main renderer
pub struct Renderer {
    options: RenderOptions,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self { options: RenderOptions::default() }
    }

    pub fn from_options(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.options.width = width;
        self
    }

    pub fn with_resize_method(mut self, method: ResizeMethod) -> Self {
        self.options.resize_method = method;
        self
    }

    pub fn with_sharpen(mut self, sharpen: Sharpen) -> Self {
        self.options.sharpen = sharpen;
        self
    }

    pub fn with_denoise(mut self, radius: u32) -> Self {
        self.options.denoise = radius;
        self
    }

    pub fn with_color(mut self, saturation: f32, contrast: f32) -> Self {
        self.options.saturation = saturation;
        self.options.contrast = contrast;
        self
    }

    pub fn with_cell_mode(mut self, mode: CellMode) -> Self {
        match mode {
            CellMode::HalfBlock { upper } => {
                self.options.half_block = true;
                self.options.upper_half = upper;
            }
            CellMode::FullBlock { glyph } => {
                self.options.half_block = false;
                self.options.full_glyph = glyph;
            }
        }
        self
    }

    pub fn with_csi(mut self, enabled: bool) -> Self {
        self.options.use_csi = enabled;
        self
    }

    pub fn with_cell_aspect(mut self, aspect: f64) -> Self {
        self.options.cell_aspect = aspect;
        self
    }

    /// Run the pipeline on a decoded image.
    pub fn render(&self, image: &DynamicImage) -> Result<Rendering> {
        let opts = self.options.clone().sanitized();
        let src = image.to_rgb8();
        let (src_w, src_h) = src.dimensions();
        if src_w == 0 || src_h == 0 {
            return Err(RenderError::InvalidImage(format!("empty image ({src_w}x{src_h})")));
        }

        let dims = Dimensions::compute(src_w, src_h, opts.width, opts.cell_aspect, opts.half_block)?;
        debug!(
            "{src_w}x{src_h} -> {}x{} pixels ({} rows) via {}",
            dims.pixel_width(),
            dims.pixel_height,
            dims.rows,
            opts.resize_method
        );

        let mut pixels = resize::resize(&src, dims, opts.resize_method);
        pixels = opts.filters().apply(pixels);

        let mode = opts.cell_mode();
        if mode.is_half_block() {
            pixels = resize::crop_to_even_height(pixels);
        }

        let encoder = CellEncoder::new(pixels, mode);
        let lines: Vec<String> = encoder
            .encode()
            .iter()
            .map(|row| output::ansi_line(row, opts.use_csi))
            .collect();

        Ok(Rendering {
            source_size: (src_w, src_h),
            columns: encoder.columns(),
            rows: encoder.rows(),
            lines,
        })
    }

    /// Load `path` and render it. A missing file is reported before decoding.
    pub fn render_path(&self, path: impl AsRef<Path>) -> Result<Rendering> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RenderError::NotFound(path.to_path_buf()));
        }
        let image = image::open(path)?;
        self.render(&image)
    }

    /// Serialize a rendering for `format` (already resolved, not `Auto`).
    ///
    /// Verilog written to a file gets the header and task wrapper; on
    /// standard output only the `$display` lines are produced.
    pub fn format(&self, rendering: &Rendering, source: &Path, format: OutputFormat, destination: &Destination) -> Vec<String> {
        match (format, destination) {
            (OutputFormat::Verilog, Destination::File(_)) => {
                let opts = self.options.clone().sanitized();
                let header = output::VerilogHeader {
                    source_name: source
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    source_size: rendering.source_size,
                    output_size: (rendering.columns, rendering.rows),
                    resize_method: opts.resize_method,
                    sharpen: opts.sharpen,
                    denoise: opts.denoise,
                    saturation: opts.saturation,
                    contrast: opts.contrast,
                };
                output::verilog_task(&rendering.lines, &opts.task_name, &header)
            }
            (OutputFormat::Verilog, Destination::Stdout) => {
                rendering.lines.iter().map(|l| output::display_statement(l)).collect()
            }
            _ => rendering.lines.clone(),
        }
    }
}

/// Render `input` and write it to `destination`, choosing the format from
/// the options or, for `auto`, from the destination's extension.
///
/// All-or-nothing: nothing is written unless every stage succeeded.
pub fn render_file(input: &Path, destination: &Destination, options: RenderOptions) -> Result<OutputFormat> {
    let renderer = Renderer::from_options(options.sanitized());
    let rendering = renderer.render_path(input)?;

    let path = match destination {
        Destination::File(p) => Some(p.as_path()),
        Destination::Stdout => None,
    };
    let format = output::resolve_format(renderer.options().format, path);
    let lines = renderer.format(&rendering, input, format, destination);
    output::write_lines(&lines, destination)?;

    if let Some(p) = path {
        info!("Wrote output file: {} (format={format})", p.display());
    }
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(w: u32, h: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(color)))
    }

    #[test]
    fn test_solid_red_two_by_two() {
        let r = Renderer::new()
            .with_width(2)
            .with_sharpen(Sharpen::None)
            .render(&solid(2, 2, [255, 0, 0]))
            .unwrap();
        assert_eq!((r.columns, r.rows), (2, 1));
        assert_eq!(r.lines.len(), 1);
        let cell = "\x1b[38;2;255;0;0m\x1b[48;2;255;0;0m▀\x1b[0m";
        assert_eq!(r.lines[0], cell.repeat(2));
    }

    #[test]
    fn test_full_block_without_csi() {
        let r = Renderer::new()
            .with_width(3)
            .with_cell_aspect(1.0)
            .with_cell_mode(CellMode::FullBlock { glyph: '█' })
            .with_csi(false)
            .render(&solid(6, 4, [10, 20, 30]))
            .unwrap();
        assert_eq!(r.rows, 2);
        assert_eq!(r.lines[0], "[38;2;10;20;30m█[0m".repeat(3));
    }

    #[test]
    fn test_width_clamped_during_render() {
        let r = Renderer::new().with_width(0).render(&solid(4, 4, [0, 0, 0])).unwrap();
        assert_eq!(r.columns, 1);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = Renderer::new().render_path("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, RenderError::NotFound(_)));
        assert_eq!(err.kind(), "not-found");
    }

    #[test]
    fn test_undecodable_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.png");
        std::fs::write(&path, b"not an image").unwrap();
        let err = Renderer::new().render_path(&path).unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn test_verilog_to_stdout_has_no_wrapper() {
        let renderer = Renderer::new().with_width(2);
        let r = renderer.render(&solid(2, 2, [1, 2, 3])).unwrap();
        let lines = renderer.format(&r, Path::new("x.png"), OutputFormat::Verilog, &Destination::Stdout);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("$display(\""));
    }

    #[test]
    fn test_tiny_cell_aspect_fails_instead_of_overflowing() {
        let err = Renderer::new()
            .with_width(200)
            .with_cell_aspect(1e-9)
            .render(&solid(1, 1, [0, 0, 0]))
            .unwrap_err();
        assert_eq!(err.kind(), "invalid-image");
    }

    #[test]
    fn test_verilog_header_shows_clamped_denoise() {
        let renderer = Renderer::from_options(RenderOptions { width: 2, denoise: 7, ..Default::default() });
        let r = renderer.render(&solid(2, 2, [1, 2, 3])).unwrap();
        let dest = Destination::File(PathBuf::from("x.sv"));
        let lines = renderer.format(&r, Path::new("x.png"), OutputFormat::Verilog, &dest);
        assert_eq!(lines[6], "//          denoise=3 saturation=1.0 contrast=1.0");
    }
}
