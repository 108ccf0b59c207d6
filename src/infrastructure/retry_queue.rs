//! Retry queue - persisted store of deferred pair rows
//!
//! Rows whose videos could not be fetched on the primary pass are appended
//! to a CSV file with their original columns. The deferred pass drains the
//! file once; nothing drained is ever written back.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::domain::pair_row::{PairRow, RawRow, columns};

/// File-backed retry queue (single writer)
#[derive(Debug, Clone)]
pub struct RetryQueue {
    path: PathBuf,
}

impl RetryQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Discard a store left behind by an earlier run. Returns how many
    /// entries it held; unreadable stores are removed all the same.
    pub fn reset(&self) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }
        let stale = self.read_rows().map_or(0, |rows| rows.len());
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove stale retry queue {:?}", self.path))?;
        warn!("🧹 Discarded {} stale entries from retry queue {:?}", stale, self.path);
        Ok(stale)
    }

    /// Append a row. The first enqueue after a reset creates the store and
    /// its header (`Row_Index` followed by the row's columns); later ones
    /// reuse it.
    pub fn enqueue(&self, row: &PairRow) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create retry queue directory {parent:?}"))?;
        }

        let header = if self.path.exists() {
            self.read_header()?
        } else {
            let mut header = vec![columns::ROW_INDEX.to_string()];
            header.extend(row.raw_row.column_names().map(str::to_string));
            header
        };
        let write_header = !self.path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open retry queue {:?}", self.path))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_header {
            writer.write_record(&header)?;
        }

        let record: Vec<String> = header
            .iter()
            .map(|column| {
                if column == columns::ROW_INDEX {
                    row.index.to_string()
                } else {
                    row.raw_row.get(column).unwrap_or_default().to_string()
                }
            })
            .collect();
        writer.write_record(&record)?;
        writer.flush().context("Failed to flush retry queue")?;

        info!("🔄 Row {} deferred to retry queue {:?}", row.index + 1, self.path);
        Ok(())
    }

    /// Number of rows currently waiting
    pub fn len(&self) -> Result<usize> {
        Ok(self.read_rows()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Read every queued row and remove the store
    pub fn drain(&self) -> Result<Vec<PairRow>> {
        let rows = self.read_rows()?;
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to clear retry queue {:?}", self.path))?;
        }
        if !rows.is_empty() {
            info!("📤 Drained {} rows from retry queue", rows.len());
        }
        Ok(rows)
    }

    fn read_header(&self) -> Result<Vec<String>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open retry queue {:?}", self.path))?;
        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if header.first().map(String::as_str) != Some(columns::ROW_INDEX) {
            bail!("Retry queue {:?} does not start with a {} column", self.path, columns::ROW_INDEX);
        }
        Ok(header)
    }

    fn read_rows(&self) -> Result<Vec<PairRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let header = self.read_header()?;
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open retry queue {:?}", self.path))?;

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read retry queue entry {}", line + 1))?;
            let Some(index) = record.get(0).and_then(|v| v.trim().parse::<usize>().ok()) else {
                warn!("Retry queue entry {} has no row index, dropping it", line + 1);
                continue;
            };
            let fields = header
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, name)| (name.clone(), record.get(i).unwrap_or_default().to_string()))
                .collect();
            rows.push(PairRow::from_raw(index, RawRow::new(fields)));
        }
        Ok(rows)
    }
}
