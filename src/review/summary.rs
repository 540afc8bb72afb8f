//! Aggregate counts over a review session

use super::{FileRecord, FileStatus};
use crate::models::{Category, Sensitivity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub synced: usize,
    pub error: usize,
    /// Records the classifier returned nothing for
    pub unanalyzed: usize,
    pub archive_recommended: usize,
    pub confidential: usize,
    pub high_risk: usize,
    pub needs_manual_review: usize,
    pub by_category: BTreeMap<Category, usize>,
}

impl ReviewSummary {
    pub(crate) fn from_records(records: &[FileRecord], review_threshold: f32) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };

        for record in records {
            match record.status {
                FileStatus::Pending => summary.pending += 1,
                FileStatus::Approved => summary.approved += 1,
                FileStatus::Rejected => summary.rejected += 1,
                FileStatus::Synced => summary.synced += 1,
                FileStatus::Error => summary.error += 1,
            }

            let Some(analysis) = &record.analysis else {
                summary.unanalyzed += 1;
                continue;
            };

            *summary.by_category.entry(analysis.category).or_insert(0) += 1;
            if analysis.should_archive {
                summary.archive_recommended += 1;
            }
            match analysis.sensitivity {
                Sensitivity::Confidential => summary.confidential += 1,
                Sensitivity::HighRisk => summary.high_risk += 1,
                Sensitivity::Normal => {}
            }
            if record.needs_manual_review(review_threshold) {
                summary.needs_manual_review += 1;
            }
        }

        summary
    }

    /// Records still waiting on the user or on a sync run
    pub fn remaining(&self) -> usize {
        self.pending + self.approved
    }
}

impl std::fmt::Display for ReviewSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} synced, {} failed, {} remaining ({} pending, {} approved), {} rejected",
            self.synced,
            self.error,
            self.remaining(),
            self.pending,
            self.approved,
            self.rejected
        )
    }
}
