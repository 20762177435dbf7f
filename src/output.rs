//! Serializing cell rows as ANSI text or a Verilog `$display` task, and
//! writing the result out.

use crate::cell::Cell;
use crate::filter::Sharpen;
use crate::resize::ResizeMethod;
use clap::ValueEnum;
use image::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// File extensions that select Verilog output in `auto` mode.
pub const VERILOG_EXTENSIONS: [&str; 4] = ["sv", "v", "svh", "vh"];

const RULE: &str = "//============================================================================";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Ansi,
    Verilog,
    #[default]
    Auto,
}

impl OutputFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Ansi => "ansi",
            Self::Verilog => "verilog",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Settle `auto` from the output path's extension. Never returns `Auto`.
pub fn resolve_format(requested: OutputFormat, output: Option<&Path>) -> OutputFormat {
    if requested != OutputFormat::Auto {
        return requested;
    }
    let is_verilog = output
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .map(|e| VERILOG_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if is_verilog {
        OutputFormat::Verilog
    } else {
        OutputFormat::Ansi
    }
}

/// `<stem>.sv` for explicit Verilog, `<stem>.ans` otherwise, in the current
/// directory.
pub fn default_output_path(image: &Path, format: OutputFormat) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "output".to_string());
    let ext = if format == OutputFormat::Verilog { "sv" } else { "ans" };
    PathBuf::from(format!("{stem}.{ext}"))
}

/// Escape prefix: real CSI, or a bare `[` that terminals print verbatim.
#[inline]
fn prefix(use_csi: bool) -> &'static str {
    if use_csi {
        "\x1b["
    } else {
        "["
    }
}

fn push_color(out: &mut String, pre: &str, layer: u8, Rgb([r, g, b]): Rgb<u8>) {
    // Writing into a String cannot fail
    let _ = write!(out, "{pre}{layer};2;{r};{g};{b}m");
}

/// Append one cell: colors, glyph, reset.
pub fn push_cell(out: &mut String, cell: &Cell, use_csi: bool) {
    let pre = prefix(use_csi);
    match *cell {
        Cell::Half { top, bottom, glyph } => {
            push_color(out, pre, 38, top);
            push_color(out, pre, 48, bottom);
            out.push(glyph);
        }
        Cell::Full { color, glyph } => {
            push_color(out, pre, 38, color);
            out.push(glyph);
        }
    }
    out.push_str(pre);
    out.push_str("0m");
}

pub fn ansi_cell(cell: &Cell, use_csi: bool) -> String {
    let mut out = String::with_capacity(48);
    push_cell(&mut out, cell, use_csi);
    out
}

/// One rendered row, without the trailing newline.
pub fn ansi_line(cells: &[Cell], use_csi: bool) -> String {
    let mut out = String::with_capacity(cells.len() * 48);
    for cell in cells {
        push_cell(&mut out, cell, use_csi);
    }
    out
}

/// Make `text` safe inside a Verilog string literal.
pub fn escape_verilog(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

pub fn display_statement(line: &str) -> String {
    format!("$display(\"{}\");", escape_verilog(line))
}

/// Facts recorded in the comment block above the generated task.
#[derive(Debug, Clone)]
pub struct VerilogHeader {
    pub source_name: String,
    pub source_size: (u32, u32),
    pub output_size: (u32, u32),
    pub resize_method: ResizeMethod,
    pub sharpen: Sharpen,
    pub denoise: u32,
    pub saturation: f32,
    pub contrast: f32,
}

impl VerilogHeader {
    pub fn lines(&self) -> Vec<String> {
        vec![
            RULE.to_string(),
            format!("// Auto-generated image display code - {}", self.source_name),
            format!("// Source size: {}x{}", self.source_size.0, self.source_size.1),
            format!("// Output size: {}x{}", self.output_size.0, self.output_size.1),
            format!("// Output format: {}", OutputFormat::Verilog),
            format!("// Options: resize_method={} sharpen={}", self.resize_method, self.sharpen),
            format!(
                "//          denoise={} saturation={:?} contrast={:?}",
                self.denoise, self.saturation, self.contrast
            ),
            RULE.to_string(),
            String::new(),
        ]
    }
}

/// Wrap ANSI rows as `$display` calls inside `task <name>; begin ... end endtask`.
pub fn verilog_task(ansi_lines: &[String], task_name: &str, header: &VerilogHeader) -> Vec<String> {
    let mut out = header.lines();
    out.reserve(ansi_lines.len() + 4);
    out.push(format!("task {task_name};"));
    out.push("begin".to_string());
    out.extend(ansi_lines.iter().map(|l| format!("  {}", display_statement(l))));
    out.push("end".to_string());
    out.push("endtask".to_string());
    out
}

/// Where formatted lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

/// Write every line followed by `\n`. The file is closed on all paths.
pub fn write_lines(lines: &[String], destination: &Destination) -> io::Result<()> {
    match destination {
        Destination::Stdout => {
            let stdout = io::stdout();
            write_all(&mut stdout.lock(), lines)
        }
        Destination::File(path) => {
            let mut file = BufWriter::new(File::create(path)?);
            write_all(&mut file, lines)
        }
    }
}

fn write_all<W: Write>(out: &mut W, lines: &[String]) -> io::Result<()> {
    for line in lines {
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")?;
    }
    out.flush()
}
