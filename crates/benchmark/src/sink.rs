//! Report sinks: where finished result tables go.

use crate::error::ReportError;
use crate::result::{Aggregation, ResultTable};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Destination for a finished result table.
pub trait ReportSink {
    /// Persists or displays the table.
    fn write(&mut self, table: &ResultTable) -> Result<(), ReportError>;

    /// Human-readable destination, used in log lines.
    fn destination(&self) -> String;
}

fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Writes `table` as CSV: a header line, then one line per row in grid order.
pub fn write_csv<W: Write>(table: &ResultTable, mut out: W) -> io::Result<()> {
    let header: Vec<String> = table.columns().iter().map(|c| csv_field(c)).collect();
    writeln!(out, "{}", header.join(","))?;

    for row in &table.rows {
        let cells: Vec<String> = row.cells().iter().map(|c| csv_field(c)).collect();
        writeln!(out, "{}", cells.join(","))?;
    }
    Ok(())
}

/// Writes a CSV file.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for CsvSink {
    fn write(&mut self, table: &ResultTable) -> Result<(), ReportError> {
        create_parent(&self.path)?;
        let mut buffer = Vec::new();
        write_csv(table, &mut buffer)?;
        fs::write(&self.path, buffer)?;
        log::info!("Wrote {} rows to {}", table.len(), self.path.display());
        Ok(())
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }
}

/// Writes the full table, diagnostics included, as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for JsonSink {
    fn write(&mut self, table: &ResultTable) -> Result<(), ReportError> {
        create_parent(&self.path)?;
        let json = serde_json::to_string_pretty(table)?;
        fs::write(&self.path, json)?;
        log::info!("Wrote {} rows to {}", table.len(), self.path.display());
        Ok(())
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }
}

/// Prints a fixed-width summary table.
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, table: &ResultTable) -> io::Result<()> {
        let columns = table.columns();
        let key_len = table.variant.key_columns().len();
        let mean_view = table.variant.aggregation() == Aggregation::Mean;

        let mut header: Vec<String> = columns.iter().take(key_len).cloned().collect();
        if mean_view {
            header.extend(
                ["mean", "lower_bd", "large", "standard", "fill"]
                    .iter()
                    .map(|s| s.to_string()),
            );
        } else {
            header.extend(columns.iter().skip(key_len).cloned());
            header.push("mean".to_string());
        }

        let lines: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| {
                let mut cells = row.key.cells();
                if mean_view {
                    let d = &row.diagnostics;
                    cells.push(format!("{:.2}", row.outcome.mean()));
                    cells.push(format!("{:.2}", d.lower_bound));
                    cells.push(format!("{:.3}", d.large_items_ratio));
                    cells.push(format!("{:.3}", d.standard_ratio));
                    cells.push(format!("{:.1}%", d.fill_rate * 100.0));
                } else {
                    cells.extend(row.outcome.cells());
                    cells.push(format!("{:.2}", row.outcome.mean()));
                }
                cells
            })
            .collect();

        let widths: Vec<usize> = header
            .iter()
            .enumerate()
            .map(|(i, h)| {
                lines
                    .iter()
                    .filter_map(|l| l.get(i).map(String::len))
                    .chain(std::iter::once(h.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let total: usize = widths.iter().map(|w| w + 2).sum::<usize>().max(40);

        writeln!(self.out)?;
        writeln!(self.out, "{:=<width$}", "", width = total)?;
        writeln!(
            self.out,
            "{} ({} rows, {} repetitions{})",
            table.name,
            table.len(),
            table.repetitions,
            table
                .seed
                .map(|s| format!(", seed {}", s))
                .unwrap_or_default()
        )?;
        writeln!(self.out, "{:=<width$}", "", width = total)?;

        let format_line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:>width$}", c, width = w))
                .collect::<Vec<_>>()
                .join("  ")
        };

        writeln!(self.out, "{}", format_line(&header))?;
        writeln!(self.out, "{:-<width$}", "", width = total)?;
        for line in &lines {
            writeln!(self.out, "{}", format_line(line))?;
        }
        writeln!(self.out, "{:=<width$}", "", width = total)?;
        self.out.flush()
    }
}

impl<W: Write> ReportSink for ConsoleSink<W> {
    fn write(&mut self, table: &ResultTable) -> Result<(), ReportError> {
        self.render(table)?;
        Ok(())
    }

    fn destination(&self) -> String {
        "console".to_string()
    }
}
