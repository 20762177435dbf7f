//! picansi CLI - Convert images to true-color ANSI art or Verilog $display tasks

use clap::Parser;
use log::error;
use picansi::output::default_output_path;
use picansi::{render_file, Destination, OutputFormat, RenderOptions, ResizeMethod, Sharpen};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "picansi",
    about = "Image -> ANSI color output (default .ans, optional Verilog $display)",
    after_help = "Half-block mode is on by default; the upper half block (▀) is used \
                  unless --lower-half is given."
)]
struct Args {
    /// Input image file
    image: PathBuf,
    /// Output width in characters (1-200) [default: 60]
    #[arg(short, long, allow_negative_numbers = true)]
    width: Option<i64>,
    /// Output file (default: <image>.ans, or <image>.sv with --format verilog)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Write to standard output instead of a file
    #[arg(long, conflicts_with = "output")]
    stdout: bool,
    /// Verilog task name [default: display_image]
    #[arg(short, long)]
    name: Option<String>,
    /// Output format; auto picks verilog for .sv/.v/.svh/.vh outputs
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,
    /// JSON settings file; command-line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a bare `[` instead of the ESC CSI prefix
    #[arg(long, help_heading = "Render Options")]
    no_csi: bool,
    /// Use full blocks instead of half blocks
    #[arg(long, help_heading = "Render Options")]
    no_half_block: bool,
    /// Use the upper half block ▀
    #[arg(long, help_heading = "Render Options")]
    upper_half: bool,
    /// Use the lower half block ▄
    #[arg(long, help_heading = "Render Options")]
    lower_half: bool,
    /// Glyph for full-block mode [default: █]
    #[arg(long = "char", help_heading = "Render Options")]
    glyph: Option<char>,
    /// Character cell height/width ratio [default: 2.0]
    #[arg(long, help_heading = "Render Options")]
    cell_aspect: Option<f64>,

    /// Resize method [default: linear_bicubic]
    #[arg(long, value_enum, help_heading = "Resize Options")]
    resize_method: Option<ResizeMethod>,

    /// Sharpen strength [default: light]
    #[arg(long, value_enum, help_heading = "Quality Options")]
    sharpen: Option<Sharpen>,
    /// Denoise strength (0-3, 0 or negative disables) [default: 0]
    #[arg(long, allow_negative_numbers = true, help_heading = "Quality Options")]
    denoise: Option<i64>,

    /// Saturation, 1.0 leaves colors unchanged (0.8-1.2 typical)
    #[arg(long, help_heading = "Color Adjustment")]
    saturation: Option<f32>,
    /// Contrast, 1.0 leaves colors unchanged (0.9-1.1 typical)
    #[arg(long, help_heading = "Color Adjustment")]
    contrast: Option<f32>,
}

impl Args {
    /// Layer explicit flags over `base`.
    fn apply(&self, mut o: RenderOptions) -> RenderOptions {
        if let Some(w) = self.width {
            // Out-of-range values are clamped, with a warning, by `sanitized`
            o.width = w.clamp(0, u32::MAX as i64) as u32;
        }
        if let Some(name) = &self.name {
            o.task_name = name.clone();
        }
        if let Some(f) = self.format {
            o.format = f;
        }
        if self.no_csi {
            o.use_csi = false;
        }
        if self.no_half_block {
            o.half_block = false;
        }
        if self.upper_half {
            o.upper_half = true;
        } else if self.lower_half {
            o.upper_half = false;
        }
        if let Some(c) = self.glyph {
            o.full_glyph = c;
        }
        if let Some(a) = self.cell_aspect {
            o.cell_aspect = a;
        }
        if let Some(m) = self.resize_method {
            o.resize_method = m;
        }
        if let Some(s) = self.sharpen {
            o.sharpen = s;
        }
        if let Some(d) = self.denoise {
            o.denoise = d.clamp(0, u32::MAX as i64) as u32;
        }
        if let Some(s) = self.saturation {
            o.saturation = s;
        }
        if let Some(c) = self.contrast {
            o.contrast = c;
        }
        o
    }
}

fn run(args: &Args) -> picansi::Result<()> {
    let base = match &args.config {
        Some(path) => RenderOptions::from_file(path)?,
        None => RenderOptions::default(),
    };
    let options = args.apply(base).sanitized();

    let destination = if args.stdout {
        Destination::Stdout
    } else {
        let path = args
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&args.image, options.format));
        Destination::File(path)
    };

    render_file(&args.image, &destination, options)?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}: {e}", e.kind());
            ExitCode::FAILURE
        }
    }
}
