/// Output rendering for estimate results
use clap::ValueEnum;
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::{self, Write};
use std::path::Path;
use stlvol_core::{to_json, StlError, VolumeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per run
    #[default]
    Json,
    /// Human-readable summary
    Text,
}

/// Writes an estimate outcome in the selected format
pub struct Reporter {
    format: OutputFormat,
    color: bool,
}

impl Reporter {
    pub fn new(format: OutputFormat, color: bool) -> Self {
        Self { format, color }
    }

    pub fn write<W: Write>(
        &self,
        out: &mut W,
        path: &Path,
        outcome: &Result<VolumeResult, StlError>,
    ) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                writeln!(out, "{}", to_json(outcome))?;
            }
            OutputFormat::Text => match outcome {
                Ok(result) => self.write_text(out, path, result)?,
                Err(err) => {
                    self.paint(out, "error", Color::Red)?;
                    writeln!(out, ": {}", err)?;
                }
            },
        }
        out.flush()
    }

    fn write_text<W: Write>(&self, out: &mut W, path: &Path, result: &VolumeResult) -> io::Result<()> {
        self.paint(out, &path.display().to_string(), Color::Yellow)?;
        writeln!(out)?;

        let material = result.material.material;
        if result.material.used_default {
            writeln!(out, "  material   {} (default)", material)?;
        } else {
            writeln!(out, "  material   {}", material)?;
        }

        if i64::try_from(result.facets_read).ok() == Some(i64::from(result.triangle_count)) {
            writeln!(out, "  triangles  {}", result.triangle_count)?;
        } else {
            writeln!(
                out,
                "  triangles  {} declared, {} decoded",
                result.triangle_count, result.facets_read
            )?;
        }

        writeln!(
            out,
            "  volume     {:.3} {}",
            result.display_volume(),
            result.unit.volume_suffix()
        )?;
        write!(out, "  mass       ")?;
        self.paint(out, &format!("{:.3} g", result.mass_grams), Color::Green)?;
        writeln!(out)
    }

    fn paint<W: Write>(&self, out: &mut W, text: &str, color: Color) -> io::Result<()> {
        if self.color {
            out.queue(SetForegroundColor(color))?
                .queue(Print(text))?
                .queue(ResetColor)?;
            Ok(())
        } else {
            write!(out, "{}", text)
        }
    }
}
