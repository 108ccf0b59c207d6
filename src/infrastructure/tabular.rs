//! CSV input and per-pair export files

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::domain::merge::AlignedTable;
use crate::domain::pair_row::{PairRow, RawRow, columns};

/// Read the whole input table into pair rows before any processing starts
pub fn load_pair_rows(path: &Path) -> Result<Vec<PairRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .with_context(|| format!("Failed to open input file {path:?}"))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header of {path:?}"))?
        .iter()
        .map(str::to_string)
        .collect();

    let missing: Vec<&str> = columns::REQUIRED
        .iter()
        .copied()
        .filter(|required| !headers.iter().any(|h| h == required))
        .collect();
    if !missing.is_empty() {
        bail!("Input file {:?} is missing required columns: {}", path, missing.join(", "));
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read row {} of {path:?}", index + 1))?;
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), record.get(i).unwrap_or_default().to_string()))
            .collect();
        rows.push(PairRow::from_raw(index, RawRow::new(fields)));
    }

    info!("📄 Loaded {} rows from {:?}", rows.len(), path);
    Ok(rows)
}

/// First `*.csv` in `dir` (by name), ignoring the retry-queue store
pub fn discover_input_file(dir: &Path, retry_queue_path: &Path) -> Result<Option<PathBuf>> {
    let queue_name = retry_queue_path.file_name();
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list {dir:?}"))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .filter(|path| path.file_name() != queue_name)
        .collect();
    candidates.sort();
    Ok(candidates.into_iter().next())
}

/// Replace characters that would break a file name
pub fn sanitize_file_component(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() { "unnamed".to_string() } else { cleaned }
}

/// `{channel}_{index+1}_{row_count}.csv`
pub fn export_file_name(row: &PairRow, row_count: usize) -> String {
    format!(
        "{}_{}_{}.csv",
        sanitize_file_component(&row.channel_name),
        row.index + 1,
        row_count
    )
}

/// Writes one CSV file per exported pair
#[derive(Debug, Clone)]
pub struct ExportWriter {
    export_dir: PathBuf,
}

impl ExportWriter {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self { export_dir: export_dir.into() }
    }

    /// Write the table. The file only appears under its final name once it is
    /// complete.
    pub fn write(&self, row: &PairRow, table: &AlignedTable) -> Result<PathBuf> {
        fs::create_dir_all(&self.export_dir)
            .with_context(|| format!("Failed to create export directory {:?}", self.export_dir))?;

        let final_path = self.export_dir.join(export_file_name(row, table.len()));
        let partial_path = final_path.with_extension("csv.partial");

        let written = write_table(&partial_path, table).and_then(|()| {
            fs::rename(&partial_path, &final_path)
                .with_context(|| format!("Failed to move export into place at {final_path:?}"))
        });
        if let Err(e) = written {
            if partial_path.exists() {
                if let Err(cleanup) = fs::remove_file(&partial_path) {
                    warn!("Could not remove {:?}: {}", partial_path, cleanup);
                }
            }
            return Err(e);
        }

        debug!("Export written: {:?}", final_path);
        Ok(final_path)
    }
}

fn write_table(path: &Path, table: &AlignedTable) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {path:?}"))?;
    writer.write_record(table.header())?;
    for (i, record) in table.rows.iter().enumerate() {
        writer
            .write_record(record)
            .with_context(|| format!("Failed to write row {} of {path:?}", i + 1))?;
    }
    writer.flush().with_context(|| format!("Failed to flush {path:?}"))?;
    Ok(())
}
