//! Sync Executor
//!
//! Applies approved suggestions to the remote store one record at a time.
//! A failure on one file marks that record `error` and the run continues.

use super::applier::MutationApplier;
use super::resolver::{is_root_path, FolderPathResolver};
use crate::drive::RemoteStore;
use crate::error::ReorgError;
use crate::review::{ReviewState, ReviewSummary};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Called after every record with `(current, total)`
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Live view of a sync run, shareable with other tasks
#[derive(Debug, Default)]
pub struct SyncMonitor {
    running: AtomicBool,
    stop_requested: AtomicBool,
    current: AtomicUsize,
    total: AtomicUsize,
}

impl SyncMonitor {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// `(current, total)` of the current or most recent run
    pub fn progress(&self) -> (usize, usize) {
        (
            self.current.load(Ordering::SeqCst),
            self.total.load(Ordering::SeqCst),
        )
    }

    /// Ask the running sync to stop before its next record.
    /// The record in flight always completes.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    fn begin(&self, total: usize) {
        self.stop_requested.store(false, Ordering::SeqCst);
        self.current.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
    }

    fn advance(&self) -> usize {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn finish(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Outcome of one sync run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub synced_count: usize,
    pub failed_count: usize,
    /// Approved records without an analysis; left untouched
    pub skipped_count: usize,
    /// `"<file id>: <message>"` per failed record
    pub errors: Vec<String>,
    /// The run ended early on `request_stop`
    pub stopped: bool,
    /// At least one file failed because the store rejected the credential
    pub reauth_required: bool,
    /// Review state after the run
    pub summary: ReviewSummary,
}

impl SyncReport {
    pub fn success(&self) -> bool {
        self.failed_count == 0 && !self.stopped
    }
}

pub struct SyncExecutor {
    resolver: FolderPathResolver,
    applier: MutationApplier,
    monitor: Arc<SyncMonitor>,
    progress_callback: Option<ProgressCallback>,
}

impl SyncExecutor {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            resolver: FolderPathResolver::new(store.clone()),
            applier: MutationApplier::new(store),
            monitor: Arc::new(SyncMonitor::default()),
            progress_callback: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn set_progress_callback(&mut self, callback: Option<ProgressCallback>) {
        self.progress_callback = callback;
    }

    pub fn monitor(&self) -> Arc<SyncMonitor> {
        Arc::clone(&self.monitor)
    }

    pub fn resolver(&self) -> &FolderPathResolver {
        &self.resolver
    }

    /// Sync every `approved` record in `state`, in selection order
    pub async fn run(&mut self, state: &mut ReviewState) -> SyncReport {
        let approved = state.approved_ids();
        if approved.is_empty() {
            return SyncReport {
                summary: state.summary(),
                ..SyncReport::default()
            };
        }

        let total = approved.len();
        self.monitor.begin(total);
        tracing::info!(total, "Starting sync");

        let mut report = SyncReport::default();

        for file_id in approved {
            if self.monitor.stop_requested() {
                tracing::info!(
                    processed = self.monitor.progress().0,
                    total,
                    "Sync stopped on request"
                );
                report.stopped = true;
                break;
            }

            match self.sync_one(state, &file_id).await {
                Ok(true) => {
                    if let Err(e) = state.mark_synced(&file_id) {
                        tracing::warn!(file_id = %file_id, error = %e, "Could not mark record synced");
                    }
                    report.synced_count += 1;
                }
                Ok(false) => {
                    tracing::debug!(file_id = %file_id, "Approved record has no analysis, skipping");
                    report.skipped_count += 1;
                }
                Err(err) => {
                    tracing::warn!(file_id = %file_id, error = %err, "Sync failed for file");
                    report.reauth_required |= err.requires_reauth();
                    let message = err.to_string();
                    if let Err(e) = state.mark_error(&file_id, message.clone()) {
                        tracing::warn!(file_id = %file_id, error = %e, "Could not mark record failed");
                    }
                    report.failed_count += 1;
                    report.errors.push(format!("{}: {}", file_id, message));
                }
            }

            let current = self.monitor.advance();
            if let Some(ref callback) = self.progress_callback {
                callback(current, total);
            }
        }

        self.monitor.finish();
        report.summary = state.summary();

        tracing::info!(
            synced = report.synced_count,
            failed = report.failed_count,
            skipped = report.skipped_count,
            stopped = report.stopped,
            reauth_required = report.reauth_required,
            "Sync finished"
        );
        report
    }

    /// `Ok(false)` when there is nothing to apply
    async fn sync_one(&mut self, state: &ReviewState, file_id: &str) -> Result<bool, ReorgError> {
        let Some(record) = state.get(file_id) else {
            return Ok(false);
        };
        let Some(analysis) = record.analysis.as_ref() else {
            return Ok(false);
        };

        let target = if is_root_path(&analysis.suggested_path) {
            None
        } else {
            Some(self.resolver.resolve(&analysis.suggested_path).await?)
        };

        self.applier
            .apply_update(
                file_id,
                &analysis.suggested_name,
                &record.descriptor.parents,
                target.as_deref(),
            )
            .await?;
        Ok(true)
    }
}
