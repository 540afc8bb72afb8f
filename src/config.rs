//! Runtime configuration
//!
//! Defaults target the public Gemini and Drive endpoints. Every value can be
//! overridden from the environment (a `.env` file is loaded first).

use crate::error::ReorgError;
use crate::models::MAX_SNIPPET_CHARS;
use crate::review::DEFAULT_REVIEW_THRESHOLD;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ReorgConfig {
    /// Base URL for the classification API (default: https://generativelanguage.googleapis.com)
    pub gemini_base_url: String,

    /// Model to use (default: gemini-2.5-flash)
    pub gemini_model: String,

    /// Base URL for the Drive API (default: https://www.googleapis.com)
    pub drive_base_url: String,

    /// Identifier the store uses for its root folder
    pub root_folder_id: String,

    /// Confidence below which a suggestion is flagged for manual review
    pub review_threshold: f32,

    /// Characters of file content sent as classifier context (max 1000)
    pub snippet_chars: usize,

    /// Timeout for a single classification request
    pub request_timeout: Duration,
}

impl Default for ReorgConfig {
    fn default() -> Self {
        Self {
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            gemini_model: "gemini-2.5-flash".to_string(),
            drive_base_url: "https://www.googleapis.com".to_string(),
            root_folder_id: "root".to_string(),
            review_threshold: DEFAULT_REVIEW_THRESHOLD,
            snippet_chars: MAX_SNIPPET_CHARS,
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl ReorgConfig {
    /// Load `.env` (current dir, then parent) and apply environment overrides
    pub fn from_env() -> Result<Self, ReorgError> {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_path("../.env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ReorgError> {
        let mut config = Self::default();

        if let Some(url) = lookup("GEMINI_BASE_URL") {
            config.gemini_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            config.gemini_model = model;
        }
        if let Some(url) = lookup("DRIVE_BASE_URL") {
            config.drive_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(root) = lookup("DRIVE_ROOT_FOLDER_ID") {
            config.root_folder_id = root;
        }
        if let Some(raw) = lookup("REORG_REVIEW_THRESHOLD") {
            let threshold: f32 = parse_value("REORG_REVIEW_THRESHOLD", &raw)?;
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ReorgError::Config(format!(
                    "REORG_REVIEW_THRESHOLD must be between 0 and 1, got {}",
                    threshold
                )));
            }
            config.review_threshold = threshold;
        }
        if let Some(raw) = lookup("REORG_SNIPPET_CHARS") {
            let chars: usize = parse_value("REORG_SNIPPET_CHARS", &raw)?;
            config.snippet_chars = chars.min(MAX_SNIPPET_CHARS);
        }
        if let Some(raw) = lookup("REORG_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_value("REORG_REQUEST_TIMEOUT_SECS", &raw)?;
            if secs == 0 {
                return Err(ReorgError::Config(
                    "REORG_REQUEST_TIMEOUT_SECS must be positive".to_string(),
                ));
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ReorgError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ReorgError::Config(format!("{} = '{}': {}", key, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = ReorgConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ReorgConfig::default());
        assert_eq!(config.snippet_chars, 1000);
        assert_eq!(config.root_folder_id, "root");
    }

    #[test]
    fn test_overrides() {
        let config = ReorgConfig::from_lookup(lookup_from(&[
            ("GEMINI_BASE_URL", "http://localhost:9000/"),
            ("GEMINI_MODEL", "gemini-2.5-pro"),
            ("REORG_REVIEW_THRESHOLD", "0.65"),
            ("REORG_SNIPPET_CHARS", "5000"),
            ("REORG_REQUEST_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.gemini_base_url, "http://localhost:9000");
        assert_eq!(config.gemini_model, "gemini-2.5-pro");
        assert!((config.review_threshold - 0.65).abs() < f32::EPSILON);
        assert_eq!(config.snippet_chars, 1000);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_values_are_errors() {
        for pairs in [
            [("REORG_REVIEW_THRESHOLD", "high")],
            [("REORG_REVIEW_THRESHOLD", "1.5")],
            [("REORG_SNIPPET_CHARS", "-3")],
            [("REORG_REQUEST_TIMEOUT_SECS", "0")],
        ] {
            assert!(matches!(
                ReorgConfig::from_lookup(lookup_from(&pairs)),
                Err(ReorgError::Config(_))
            ));
        }
    }
}
