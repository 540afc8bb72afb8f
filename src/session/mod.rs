//! One user reorganization session: select → analyze → review → sync
//!
//! `analyze` and `sync` take `&mut self`, so the two can never overlap.

use crate::ai::ClassificationGateway;
use crate::config::ReorgConfig;
use crate::drive::RemoteStore;
use crate::error::ReorgError;
use crate::execution::{ProgressCallback, SyncExecutor, SyncMonitor, SyncReport};
use crate::models::{AnalysisUpdate, FileDescriptor};
use crate::review::{ReviewState, ReviewSummary, DEFAULT_REVIEW_THRESHOLD};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

pub struct ReorgSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    gateway: Arc<dyn ClassificationGateway>,
    review: ReviewState,
    executor: SyncExecutor,
}

impl ReorgSession {
    pub fn new(gateway: Arc<dyn ClassificationGateway>, store: Arc<dyn RemoteStore>) -> Self {
        Self::with_threshold(gateway, store, DEFAULT_REVIEW_THRESHOLD)
    }

    pub fn from_config(
        config: &ReorgConfig,
        gateway: Arc<dyn ClassificationGateway>,
        store: Arc<dyn RemoteStore>,
    ) -> Self {
        Self::with_threshold(gateway, store, config.review_threshold)
    }

    fn with_threshold(
        gateway: Arc<dyn ClassificationGateway>,
        store: Arc<dyn RemoteStore>,
        review_threshold: f32,
    ) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session_id = %id, "Session created");
        Self {
            id,
            started_at: Utc::now(),
            gateway,
            review: ReviewState::with_threshold(review_threshold),
            executor: SyncExecutor::new(store),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Replace the selection; every file starts `pending` and unanalyzed
    pub fn select(&mut self, descriptors: Vec<FileDescriptor>) {
        self.review.ingest(descriptors);
        tracing::info!(session_id = %self.id, files = self.review.len(), "Selection loaded");
    }

    /// Classify every open record of the selection in one batch.
    ///
    /// Earlier suggestions on open records are discarded first; `synced` and
    /// `rejected` records are neither reset nor resubmitted. If the batch
    /// fails, every open record is left `pending` with no analysis. Returns
    /// how many records received a suggestion.
    pub async fn analyze(&mut self, credential: &str) -> Result<usize, ReorgError> {
        self.review.reset_analysis();

        let batch: Vec<FileDescriptor> = self
            .review
            .records()
            .iter()
            .filter(|r| !r.is_final())
            .map(|r| r.descriptor.clone())
            .collect();
        if batch.is_empty() {
            return Ok(0);
        }

        let started = Instant::now();
        match self.gateway.classify(&batch, credential).await {
            Ok(results) => {
                let matched = self.review.merge_results(results);
                tracing::info!(
                    session_id = %self.id,
                    files = batch.len(),
                    analyzed = matched,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Analysis complete"
                );
                Ok(matched)
            }
            Err(e) => {
                self.review.reset_analysis();
                tracing::warn!(session_id = %self.id, error = %e, "Analysis failed for the whole batch");
                Err(ReorgError::GatewayFailure(e))
            }
        }
    }

    pub fn review(&self) -> &ReviewState {
        &self.review
    }

    pub fn approve(&mut self, file_id: &str) -> Result<(), ReorgError> {
        self.review.approve(file_id)
    }

    pub fn reject(&mut self, file_id: &str) -> Result<(), ReorgError> {
        self.review.reject(file_id)
    }

    pub fn reapprove(&mut self, file_id: &str) -> Result<(), ReorgError> {
        self.review.reapprove(file_id)
    }

    pub fn approve_all(&mut self) -> Vec<String> {
        self.review.approve_all()
    }

    pub fn edit_analysis(&mut self, file_id: &str, update: AnalysisUpdate) -> Result<(), ReorgError> {
        self.review.edit_analysis(file_id, update)
    }

    pub fn summary(&self) -> ReviewSummary {
        self.review.summary()
    }

    pub fn monitor(&self) -> Arc<SyncMonitor> {
        self.executor.monitor()
    }

    pub fn set_progress_callback(&mut self, callback: Option<ProgressCallback>) {
        self.executor.set_progress_callback(callback);
    }

    /// Apply every approved record to the remote store
    pub async fn sync(&mut self) -> SyncReport {
        let report = self.executor.run(&mut self.review).await;
        tracing::info!(session_id = %self.id, summary = %report.summary, "Session sync done");
        report
    }
}
