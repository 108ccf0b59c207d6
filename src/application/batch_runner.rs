//! Batch runner
//!
//! Drives every input row through the pair processor in two passes. The
//! primary pass exports, skips or defers each row; the deferred pass drains
//! the retry queue once and drops whatever still fails. A row is exported at
//! most once and queued at most once per run.

use std::path::PathBuf;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::application::pair_processor::{PairProcessor, ProcessOutcome};
use crate::domain::pair_row::PairRow;
use crate::infrastructure::retry_queue::RetryQueue;
use crate::infrastructure::tabular::ExportWriter;

/// Final decision for one row in one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Disposition {
    Exported,
    Skipped,
    Deferred,
    /// Exported by the deferred pass
    Recovered,
    /// Deferred again in the deferred pass; not retried
    Dropped,
    /// Local I/O fault while exporting or queueing
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowReport {
    pub index: usize,
    pub channel: String,
    pub disposition: Disposition,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_rows: usize,
    pub exported: usize,
    pub skipped: usize,
    pub deferred: usize,
    pub recovered: usize,
    pub dropped: usize,
    pub failed: usize,
    pub reports: Vec<RowReport>,
}

impl RunSummary {
    fn record(&mut self, row: &PairRow, disposition: Disposition, detail: impl Into<String>) {
        match disposition {
            Disposition::Exported => self.exported += 1,
            Disposition::Skipped => self.skipped += 1,
            Disposition::Deferred => self.deferred += 1,
            Disposition::Recovered => self.recovered += 1,
            Disposition::Dropped => self.dropped += 1,
            Disposition::Failed => self.failed += 1,
        }
        self.reports.push(RowReport {
            index: row.index,
            channel: row.channel_name.clone(),
            disposition,
            detail: detail.into(),
        });
    }

    /// Files written across both passes
    pub fn files_written(&self) -> usize {
        self.exported + self.recovered
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Primary,
    Deferred,
}

pub struct BatchRunner {
    processor: PairProcessor,
    writer: ExportWriter,
    retry_queue: RetryQueue,
    retry_pass_enabled: bool,
}

impl BatchRunner {
    pub fn new(
        processor: PairProcessor,
        writer: ExportWriter,
        retry_queue: RetryQueue,
        retry_pass_enabled: bool,
    ) -> Self {
        Self {
            processor,
            writer,
            retry_queue,
            retry_pass_enabled,
        }
    }

    pub async fn run(&self, rows: &[PairRow]) -> RunSummary {
        let mut summary = RunSummary {
            total_rows: rows.len(),
            ..Default::default()
        };

        // The store belongs to this run only.
        let reset = self.retry_queue.reset();

        info!("🚀 Primary pass over {} rows", rows.len());
        let mut deferred = Vec::new();
        for row in rows {
            if self.handle_row(row, Pass::Primary, &mut summary).await == Disposition::Deferred {
                deferred.push(row);
            }
        }

        if let Err(e) = reset {
            error!("❌ Could not reset retry queue {:?}: {:#}", self.retry_queue.path(), e);
            drop_all(&deferred, &format!("retry queue unusable: {e:#}"), &mut summary);
        } else if self.retry_pass_enabled {
            self.run_deferred_pass(&deferred, &mut summary).await;
        } else if !deferred.is_empty() {
            info!(
                "Deferred pass disabled, {} rows left in {:?}",
                deferred.len(),
                self.retry_queue.path()
            );
        }

        info!(
            "🏁 Run finished: exported={} recovered={} skipped={} deferred={} dropped={} failed={}",
            summary.exported,
            summary.recovered,
            summary.skipped,
            summary.deferred,
            summary.dropped,
            summary.failed
        );
        summary
    }

    async fn run_deferred_pass(&self, deferred: &[&PairRow], summary: &mut RunSummary) {
        let queued = match self.retry_queue.drain() {
            Ok(queued) => queued,
            Err(e) => {
                error!("❌ Could not drain retry queue: {:#}", e);
                drop_all(deferred, &format!("retry queue unreadable: {e:#}"), summary);
                return;
            }
        };
        if queued.is_empty() {
            return;
        }

        info!("🔁 Deferred pass over {} rows", queued.len());
        for row in &queued {
            self.handle_row(row, Pass::Deferred, summary).await;
        }
    }

    async fn handle_row(&self, row: &PairRow, pass: Pass, summary: &mut RunSummary) -> Disposition {
        let row_no = row.index + 1;
        let (disposition, detail) = match self.processor.process(row).await {
            ProcessOutcome::Exported(table) => match self.writer.write(row, &table) {
                Ok(path) => {
                    info!(row = row_no, "💾 Exported {} rows to {:?}", table.len(), path);
                    let disposition = match pass {
                        Pass::Primary => Disposition::Exported,
                        Pass::Deferred => Disposition::Recovered,
                    };
                    (disposition, path.display().to_string())
                }
                Err(e) => {
                    error!(row = row_no, "❌ Export failed: {:#}", e);
                    (Disposition::Failed, format!("{e:#}"))
                }
            },
            ProcessOutcome::Skipped(reason) => (Disposition::Skipped, reason.to_string()),
            ProcessOutcome::Deferred(failure) => match pass {
                Pass::Primary => match self.retry_queue.enqueue(row) {
                    Ok(()) => (Disposition::Deferred, failure.to_string()),
                    Err(e) => {
                        error!(row = row_no, "❌ Could not queue row for retry: {:#}", e);
                        (Disposition::Failed, format!("{e:#}"))
                    }
                },
                Pass::Deferred => {
                    warn!(row = row_no, reason = failure.reason.label(), "🗑️ Row dropped after retry: {}", failure);
                    (Disposition::Dropped, failure.to_string())
                }
            },
        };
        summary.record(row, disposition, detail);
        disposition
    }

    pub fn retry_queue_path(&self) -> PathBuf {
        self.retry_queue.path().to_path_buf()
    }
}

/// Drop rows whose retry never ran
fn drop_all(rows: &[&PairRow], detail: &str, summary: &mut RunSummary) {
    for row in rows {
        warn!(row = row.index + 1, "🗑️ Row dropped without retry: {}", detail);
        summary.record(row, Disposition::Dropped, detail);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use super::*;
    use crate::application::video_fetcher::{FetchPolicy, VideoFetcher};
    use crate::domain::pair_row::RawRow;
    use crate::test_utils::{ScriptedPrimer, ScriptedService, VideoScript};

    fn row(index: usize, id_a: &str, id_b: &str) -> PairRow {
        PairRow::from_raw(
            index,
            RawRow::new(vec![
                ("Channel_Name_A".into(), format!("Channel{index}")),
                ("Video_URL_A".into(), format!("https://youtu.be/{id_a}")),
                ("Video_URL_B".into(), format!("https://youtu.be/{id_b}")),
            ]),
        )
    }

    fn runner(service: &Arc<ScriptedService>, dir: &std::path::Path, retry_pass_enabled: bool) -> BatchRunner {
        let fetcher = VideoFetcher::new(service.clone(), Arc::new(ScriptedPrimer::ready()), FetchPolicy::default());
        BatchRunner::new(
            PairProcessor::new(service.clone(), fetcher, 50),
            ExportWriter::new(dir.join("exports")),
            RetryQueue::new(dir.join("retry_queue.csv")),
            retry_pass_enabled,
        )
    }

    #[tokio::test]
    async fn test_cold_row_recovers_in_deferred_pass() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(ScriptedService::new());
        // Two cold probes fail the primary pass; the third probe is warm.
        service.add_video(VideoScript::with_comments("aaaaaaaaaaa", "Alpha", 60).cold_probes(2));
        service.add_video(VideoScript::with_comments("bbbbbbbbbbb", "Beta", 60));

        let summary = runner(&service, dir.path(), true)
            .run(&[row(0, "aaaaaaaaaaa", "bbbbbbbbbbb")])
            .await;

        assert_eq!(summary.deferred, 1);
        assert_eq!(summary.recovered, 1);
        assert_eq!(summary.files_written(), 1);
        assert!(dir.path().join("exports").join("Channel0_1_60.csv").exists());
        assert!(!dir.path().join("retry_queue.csv").exists());
    }

    #[tokio::test]
    async fn test_disabled_retry_pass_leaves_queue() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(ScriptedService::new());
        service.add_video(VideoScript::with_comments("aaaaaaaaaaa", "Alpha", 60).cold_probes(2));
        service.add_video(VideoScript::with_comments("bbbbbbbbbbb", "Beta", 60));

        let runner = runner(&service, dir.path(), false);
        let summary = runner.run(&[row(0, "aaaaaaaaaaa", "bbbbbbbbbbb")]).await;

        assert_eq!(summary.deferred, 1);
        assert_eq!(summary.recovered + summary.dropped, 0);
        assert_eq!(RetryQueue::new(runner.retry_queue_path()).len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_export_failure_counts_as_failed_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the export directory should be makes every write fail.
        std::fs::write(dir.path().join("exports"), "").unwrap();
        let service = Arc::new(ScriptedService::new());
        service.add_video(VideoScript::with_comments("aaaaaaaaaaa", "Alpha", 60));
        service.add_video(VideoScript::with_comments("bbbbbbbbbbb", "Beta", 60));

        let summary = runner(&service, dir.path(), true)
            .run(&[row(0, "aaaaaaaaaaa", "bbbbbbbbbbb"), row(1, "aaaaaaaaaaa", "bbbbbbbbbbb")])
            .await;

        assert_eq!(summary.failed, 2);
        assert_eq!(summary.reports.len(), 2);
        assert!(summary.reports.iter().all(|r| r.disposition == Disposition::Failed));
    }

    #[tokio::test]
    async fn test_stale_queue_from_earlier_run_is_not_replayed() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(ScriptedService::new());
        service.add_video(VideoScript::with_comments("aaaaaaaaaaa", "Alpha", 60));
        service.add_video(VideoScript::with_comments("bbbbbbbbbbb", "Beta", 70));

        let stale = RetryQueue::new(dir.path().join("retry_queue.csv"));
        stale.enqueue(&row(0, "aaaaaaaaaaa", "bbbbbbbbbbb")).unwrap();
        stale.enqueue(&row(5, "aaaaaaaaaaa", "bbbbbbbbbbb")).unwrap();

        let summary = runner(&service, dir.path(), true)
            .run(&[row(0, "aaaaaaaaaaa", "bbbbbbbbbbb")])
            .await;

        assert_eq!(summary.exported, 1);
        assert_eq!(summary.recovered, 0);
        assert_eq!(summary.reports.len(), 1);
        let files: Vec<_> = std::fs::read_dir(dir.path().join("exports")).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert!(!dir.path().join("retry_queue.csv").exists());
    }

    #[tokio::test]
    async fn test_unreadable_queue_drops_deferred_rows_with_reason() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(ScriptedService::new());
        let runner = runner(&service, dir.path(), true);
        let first = row(0, "aaaaaaaaaaa", "bbbbbbbbbbb");
        let second = row(3, "ccccccccccc", "bbbbbbbbbbb");
        runner.retry_queue.enqueue(&first).unwrap();
        runner.retry_queue.enqueue(&second).unwrap();
        // Header no longer starts with the row index column.
        std::fs::write(runner.retry_queue_path(), "Bogus,Header\n0,x\n").unwrap();

        let mut summary = RunSummary::default();
        runner.run_deferred_pass(&[&first, &second], &mut summary).await;

        assert_eq!(summary.dropped, 2);
        assert_eq!(
            summary.reports.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![0, 3]
        );
        assert!(summary.reports.iter().all(|r| {
            r.disposition == Disposition::Dropped && r.detail.contains("Row_Index")
        }));
        assert!(service.page_requests("aaaaaaaaaaa").is_empty());
    }
}
