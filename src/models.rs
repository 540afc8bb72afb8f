//! Shared data types for the reorganization pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard ceiling on the content snippet passed to the classifier
pub const MAX_SNIPPET_CHARS: usize = 1000;

/// Immutable snapshot of a remote file taken at selection time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    /// Stable identifier, unique within a session
    pub id: String,
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// MIME type or store-specific type label
    pub mime_type: String,
    /// Last modification time (unix timestamp ms)
    pub last_modified: i64,
    /// Bounded text excerpt used only as classifier context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_snippet: Option<String>,
    /// Current containing-folder identifiers; needed for reparenting
    #[serde(default)]
    pub parents: Vec<String>,
}

impl FileDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size: 0,
            mime_type: String::new(),
            last_modified: 0,
            content_snippet: None,
            parents: Vec::new(),
        }
    }

    /// Attach a snippet, truncated to `MAX_SNIPPET_CHARS`
    pub fn with_snippet(mut self, snippet: &str) -> Self {
        self.content_snippet = Some(truncate_chars(snippet, MAX_SNIPPET_CHARS));
        self
    }

    pub fn with_parents(mut self, parents: Vec<String>) -> Self {
        self.parents = parents;
        self
    }

    /// Last modification time as RFC 3339, falling back to the epoch
    pub fn last_modified_iso(&self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.last_modified)
            .unwrap_or_default()
            .to_rfc3339()
    }
}

/// Truncate to at most `max_chars` characters without splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Closed taxonomy the classifier must choose from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "01_Finance")]
    Finance,
    #[serde(rename = "02_Legal_Contracts")]
    LegalContracts,
    #[serde(rename = "03_Work_Projects")]
    WorkProjects,
    #[serde(rename = "04_Personal_Documents")]
    PersonalDocuments,
    #[serde(rename = "05_Photos_Videos")]
    PhotosVideos,
    #[serde(rename = "06_Education")]
    Education,
    #[serde(rename = "07_Health_Medical")]
    HealthMedical,
    #[serde(rename = "08_Travel")]
    Travel,
    #[serde(rename = "09_Software_Code")]
    SoftwareCode,
    #[serde(rename = "10_Archive_Misc")]
    ArchiveMisc,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Finance,
        Category::LegalContracts,
        Category::WorkProjects,
        Category::PersonalDocuments,
        Category::PhotosVideos,
        Category::Education,
        Category::HealthMedical,
        Category::Travel,
        Category::SoftwareCode,
        Category::ArchiveMisc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finance => "01_Finance",
            Self::LegalContracts => "02_Legal_Contracts",
            Self::WorkProjects => "03_Work_Projects",
            Self::PersonalDocuments => "04_Personal_Documents",
            Self::PhotosVideos => "05_Photos_Videos",
            Self::Education => "06_Education",
            Self::HealthMedical => "07_Health_Medical",
            Self::Travel => "08_Travel",
            Self::SoftwareCode => "09_Software_Code",
            Self::ArchiveMisc => "10_Archive_Misc",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier-assigned risk tag, independent of category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sensitivity {
    #[default]
    Normal,
    Confidential,
    #[serde(rename = "High Risk")]
    HighRisk,
}

impl Sensitivity {
    pub const ALL: [Sensitivity; 3] = [
        Sensitivity::Normal,
        Sensitivity::Confidential,
        Sensitivity::HighRisk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Confidential => "Confidential",
            Self::HighRisk => "High Risk",
        }
    }
}

/// Classifier output for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub file_id: String,
    pub category: Category,
    /// Slash-delimited logical destination; empty means root
    pub suggested_path: String,
    pub suggested_name: String,
    pub should_archive: bool,
    pub sensitivity: Sensitivity,
    pub reasoning: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
}

/// User edit to a suggestion; only the name and destination can change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisUpdate {
    pub suggested_name: Option<String>,
    pub suggested_path: Option<String>,
}

impl AnalysisUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            suggested_name: Some(name.into()),
            suggested_path: None,
        }
    }

    pub fn path(path: impl Into<String>) -> Self {
        Self {
            suggested_name: None,
            suggested_path: Some(path.into()),
        }
    }

    pub(crate) fn apply_to(self, analysis: &mut AnalysisResult) {
        if let Some(name) = self.suggested_name {
            analysis.suggested_name = name;
        }
        if let Some(path) = self.suggested_path {
            analysis.suggested_path = path;
        }
    }
}
