use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use ctg_io::{open_sink, ReportFormat, ReportSheet, ReportSink, RowKind};
use serde::Serialize;
use tabwriter::TabWriter;

/// Where a command's report goes: a file sink, or stdout as an aligned table
/// (CSV format) or a JSON document.
pub enum ReportOutput {
    Stdout {
        format: ReportFormat,
        sheets: Vec<ReportSheet>,
    },
    Sink(Box<dyn ReportSink>),
}

#[derive(Serialize)]
struct StdoutReport<'a> {
    sheets: &'a [ReportSheet],
}

impl ReportOutput {
    pub fn open(out: Option<&Path>, format: ReportFormat) -> Result<Self> {
        Ok(match out {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                ReportOutput::Sink(open_sink(format, path)?)
            }
            None => ReportOutput::Stdout {
                format,
                sheets: Vec::new(),
            },
        })
    }

    pub fn supports_outline(&self) -> bool {
        match self {
            ReportOutput::Stdout { format, .. } => *format == ReportFormat::Json,
            ReportOutput::Sink(sink) => sink.supports_outline(),
        }
    }

    pub fn write_sheet(&mut self, sheet: ReportSheet) -> Result<()> {
        match self {
            ReportOutput::Stdout { sheets, .. } => {
                sheets.push(sheet);
                Ok(())
            }
            ReportOutput::Sink(sink) => sink.write_sheet(&sheet),
        }
    }

    /// Flush everything; returns the files written (none for stdout).
    pub fn finish(self) -> Result<Vec<PathBuf>> {
        match self {
            ReportOutput::Sink(sink) => sink.finish(),
            ReportOutput::Stdout { format, sheets } => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                match format {
                    ReportFormat::Json => {
                        serde_json::to_writer_pretty(&mut handle, &StdoutReport { sheets: &sheets })
                            .context("serializing report to JSON")?;
                        writeln!(handle)?;
                    }
                    ReportFormat::Csv => {
                        for (idx, sheet) in sheets.iter().enumerate() {
                            if idx > 0 {
                                writeln!(handle)?;
                            }
                            print_sheet(&mut handle, sheet)?;
                        }
                    }
                }
                Ok(Vec::new())
            }
        }
    }
}

/// Tab-aligned rendering; title rows print alone above their block.
pub fn print_sheet<W: Write>(out: &mut W, sheet: &ReportSheet) -> Result<()> {
    let mut block = TabWriter::new(Vec::new());
    for row in &sheet.rows {
        match row.kind {
            RowKind::Title => {
                let done = std::mem::replace(&mut block, TabWriter::new(Vec::new()));
                out.write_all(&aligned(done)?)?;
                writeln!(out, "== {} ==", row.cells.join(" "))?;
            }
            _ => writeln!(block, "{}", row.cells.join("\t"))?,
        }
    }
    out.write_all(&aligned(block)?)?;
    Ok(())
}

fn aligned(writer: TabWriter<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|_| anyhow!("aligning table output"))
}
