//! Review state machine
//!
//! Owns the ordered list of file records for a session and every status
//! transition they go through. Nothing outside this module assigns
//! `FileRecord::status` directly; the sync executor reports outcomes through
//! `mark_synced` / `mark_error`.
//!
//! ```text
//! pending ──approve──▶ approved ──sync ok──▶ synced
//!    │                    │  ▲
//!    └─reject─▶ rejected  │  └──reapprove── error
//!                         └──sync failed──▶ error
//! ```

mod summary;

pub use summary::ReviewSummary;

use crate::error::ReorgError;
use crate::models::{AnalysisResult, AnalysisUpdate, FileDescriptor, Sensitivity};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default confidence below which a suggestion needs a human look
pub const DEFAULT_REVIEW_THRESHOLD: f32 = 0.8;

static MANUAL_REVIEW_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(manual|human)\s+review\b|\bneeds?\s+review\b|\bverify\s+manually\b")
        .expect("manual review pattern is valid")
});

/// Review status of a single record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Synced,
    /// Last sync attempt failed; needs explicit re-approval
    Error,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Synced => "synced",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selected file, its classifier suggestion (if any) and its review status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub descriptor: FileDescriptor,
    pub analysis: Option<AnalysisResult>,
    pub status: FileStatus,
    /// Message from the most recent failed sync attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl FileRecord {
    fn new(descriptor: FileDescriptor) -> Self {
        Self {
            descriptor,
            analysis: None,
            status: FileStatus::Pending,
            last_error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    /// `synced` and `rejected` records never change status again
    pub fn is_final(&self) -> bool {
        matches!(self.status, FileStatus::Synced | FileStatus::Rejected)
    }

    pub fn should_archive(&self) -> bool {
        self.analysis.as_ref().is_some_and(|a| a.should_archive)
    }

    pub fn sensitivity(&self) -> Option<Sensitivity> {
        self.analysis.as_ref().map(|a| a.sensitivity)
    }

    /// Low confidence, or the classifier itself asked for a human look.
    /// Records without an analysis are not flagged; they cannot be synced anyway.
    pub fn needs_manual_review(&self, threshold: f32) -> bool {
        match &self.analysis {
            Some(analysis) => {
                analysis.confidence < threshold
                    || MANUAL_REVIEW_PATTERN.is_match(&analysis.reasoning)
            }
            None => false,
        }
    }
}

/// Ordered set of records for one review session
#[derive(Debug, Clone)]
pub struct ReviewState {
    records: Vec<FileRecord>,
    index: HashMap<String, usize>,
    review_threshold: f32,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewState {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_REVIEW_THRESHOLD)
    }

    pub fn with_threshold(review_threshold: f32) -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            review_threshold,
        }
    }

    /// Replace the current records with fresh `pending` ones.
    /// A repeated descriptor id keeps its first occurrence.
    pub fn ingest(&mut self, descriptors: Vec<FileDescriptor>) {
        self.records.clear();
        self.index.clear();

        for descriptor in descriptors {
            if self.index.contains_key(&descriptor.id) {
                tracing::warn!(file_id = %descriptor.id, "Duplicate file id in selection, ignoring");
                continue;
            }
            self.index
                .insert(descriptor.id.clone(), self.records.len());
            self.records.push(FileRecord::new(descriptor));
        }

        tracing::debug!(records = self.records.len(), "Ingested selection");
    }

    /// Attach classifier results by file id. Returns how many records matched.
    pub fn merge_results(&mut self, results: Vec<AnalysisResult>) -> usize {
        let mut matched = 0;
        for result in results {
            match self.index.get(&result.file_id) {
                Some(&idx) if self.records[idx].is_final() => {
                    tracing::debug!(file_id = %result.file_id, "Record is final, keeping its suggestion");
                }
                Some(&idx) => {
                    self.records[idx].analysis = Some(result);
                    matched += 1;
                }
                None => {
                    tracing::warn!(file_id = %result.file_id, "Result for unknown file, discarding");
                }
            }
        }

        let unmatched = self.records.len() - self.analyzed_count();
        if unmatched > 0 {
            tracing::info!(unmatched, "Some files came back without a suggestion");
        }
        matched
    }

    /// Drop suggestions and return open records to `pending`.
    /// `synced` and `rejected` records are final and keep their state.
    pub(crate) fn reset_analysis(&mut self) {
        for record in self.records.iter_mut().filter(|r| !r.is_final()) {
            record.analysis = None;
            record.status = FileStatus::Pending;
            record.last_error = None;
        }
    }

    pub fn approve(&mut self, file_id: &str) -> Result<(), ReorgError> {
        let record = self.record_mut(file_id)?;
        if record.status != FileStatus::Pending {
            return Err(invalid(record, "approve"));
        }
        if record.analysis.is_none() {
            return Err(ReorgError::MissingAnalysis {
                file_id: file_id.to_string(),
            });
        }
        record.status = FileStatus::Approved;
        Ok(())
    }

    pub fn reject(&mut self, file_id: &str) -> Result<(), ReorgError> {
        let record = self.record_mut(file_id)?;
        if record.status != FileStatus::Pending {
            return Err(invalid(record, "reject"));
        }
        record.status = FileStatus::Rejected;
        Ok(())
    }

    /// Explicit user retry of a record whose last sync failed
    pub fn reapprove(&mut self, file_id: &str) -> Result<(), ReorgError> {
        let record = self.record_mut(file_id)?;
        if record.status != FileStatus::Error {
            return Err(invalid(record, "re-approve"));
        }
        if record.analysis.is_none() {
            return Err(ReorgError::MissingAnalysis {
                file_id: file_id.to_string(),
            });
        }
        record.status = FileStatus::Approved;
        record.last_error = None;
        Ok(())
    }

    /// Approve every `pending` record that has an analysis.
    /// Returns the ids that changed; a second call returns nothing.
    pub fn approve_all(&mut self) -> Vec<String> {
        let mut approved = Vec::new();
        for record in &mut self.records {
            if record.status == FileStatus::Pending && record.analysis.is_some() {
                record.status = FileStatus::Approved;
                approved.push(record.descriptor.id.clone());
            }
        }
        approved
    }

    /// Merge a user edit into the record's suggestion
    pub fn edit_analysis(&mut self, file_id: &str, update: AnalysisUpdate) -> Result<(), ReorgError> {
        let record = self.record_mut(file_id)?;
        if matches!(record.status, FileStatus::Synced | FileStatus::Rejected) {
            return Err(invalid(record, "edit"));
        }
        let analysis = record
            .analysis
            .as_mut()
            .ok_or_else(|| ReorgError::MissingAnalysis {
                file_id: file_id.to_string(),
            })?;
        update.apply_to(analysis);
        Ok(())
    }

    pub(crate) fn mark_synced(&mut self, file_id: &str) -> Result<(), ReorgError> {
        let record = self.record_mut(file_id)?;
        if record.status != FileStatus::Approved {
            return Err(invalid(record, "mark synced"));
        }
        record.status = FileStatus::Synced;
        record.last_error = None;
        Ok(())
    }

    pub(crate) fn mark_error(&mut self, file_id: &str, message: String) -> Result<(), ReorgError> {
        let record = self.record_mut(file_id)?;
        if record.status != FileStatus::Approved {
            return Err(invalid(record, "mark failed"));
        }
        record.status = FileStatus::Error;
        record.last_error = Some(message);
        Ok(())
    }

    pub fn get(&self, file_id: &str) -> Option<&FileRecord> {
        self.index.get(file_id).map(|&idx| &self.records[idx])
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn review_threshold(&self) -> f32 {
        self.review_threshold
    }

    pub fn with_status(&self, status: FileStatus) -> impl Iterator<Item = &FileRecord> {
        self.records.iter().filter(move |r| r.status == status)
    }

    /// Ids of `approved` records, in selection order
    pub fn approved_ids(&self) -> Vec<String> {
        self.with_status(FileStatus::Approved)
            .map(|r| r.descriptor.id.clone())
            .collect()
    }

    pub fn archive_recommended(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter().filter(|r| r.should_archive())
    }

    pub fn with_sensitivity(&self, level: Sensitivity) -> impl Iterator<Item = &FileRecord> {
        self.records
            .iter()
            .filter(move |r| r.sensitivity() == Some(level))
    }

    pub fn needs_manual_review(&self) -> impl Iterator<Item = &FileRecord> {
        let threshold = self.review_threshold;
        self.records
            .iter()
            .filter(move |r| r.needs_manual_review(threshold))
    }

    pub fn summary(&self) -> ReviewSummary {
        ReviewSummary::from_records(&self.records, self.review_threshold)
    }

    fn analyzed_count(&self) -> usize {
        self.records.iter().filter(|r| r.analysis.is_some()).count()
    }

    fn record_mut(&mut self, file_id: &str) -> Result<&mut FileRecord, ReorgError> {
        match self.index.get(file_id) {
            Some(&idx) => Ok(&mut self.records[idx]),
            None => Err(ReorgError::UnknownFile {
                file_id: file_id.to_string(),
            }),
        }
    }
}

fn invalid(record: &FileRecord, action: &'static str) -> ReorgError {
    ReorgError::InvalidTransition {
        file_id: record.descriptor.id.clone(),
        from: record.status,
        action,
    }
}
