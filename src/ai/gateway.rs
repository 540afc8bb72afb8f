//! Classification Gateway
//!
//! Sends a whole selection to the classifier in one request and returns one
//! suggestion per file. The batch succeeds or fails as a unit: a transport
//! error, an auth failure or a payload that does not match the schema all
//! fail the batch, and no partial results are salvaged.

use super::http_client::{classifier_client, client_with_timeout};
use super::json::extract_json_array;
use super::prompts::{build_classification_prompt, CLASSIFIER_SYSTEM_PROMPT};
use crate::config::ReorgConfig;
use crate::error::{GatewayError, ReorgError};
use crate::models::{AnalysisResult, Category, FileDescriptor, Sensitivity};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

#[async_trait]
pub trait ClassificationGateway: Send + Sync {
    /// Classify `batch` with `credential`. An empty batch returns an empty
    /// result without contacting the service.
    async fn classify(
        &self,
        batch: &[FileDescriptor],
        credential: &str,
    ) -> Result<Vec<AnalysisResult>, GatewayError>;
}

/// One file as the classifier sees it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationItem<'a> {
    pub id: &'a str,
    pub name: &'a str,
    #[serde(rename = "type")]
    pub mime_type: &'a str,
    pub last_modified_iso: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<&'a str>,
}

impl<'a> From<&'a FileDescriptor> for ClassificationItem<'a> {
    fn from(descriptor: &'a FileDescriptor) -> Self {
        Self {
            id: &descriptor.id,
            name: &descriptor.name,
            mime_type: &descriptor.mime_type,
            last_modified_iso: descriptor.last_modified_iso(),
            snippet: descriptor.content_snippet.as_deref(),
        }
    }
}

/// Gemini `generateContent` adapter with structured JSON output
pub struct GeminiGateway {
    client: Client,
    base_url: String,
    model: String,
}

impl GeminiGateway {
    pub fn new() -> Self {
        let defaults = ReorgConfig::default();
        Self {
            client: classifier_client().clone(),
            base_url: defaults.gemini_base_url,
            model: defaults.gemini_model,
        }
    }

    pub fn from_config(config: &ReorgConfig) -> Result<Self, ReorgError> {
        let client = if config.request_timeout == ReorgConfig::default().request_timeout {
            classifier_client().clone()
        } else {
            client_with_timeout(config.request_timeout)
                .map_err(|e| ReorgError::Config(format!("Failed to create HTTP client: {}", e)))?
        };
        Ok(Self {
            client,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn request_body(&self, batch: &[FileDescriptor]) -> Result<serde_json::Value, GatewayError> {
        let items: Vec<ClassificationItem> = batch.iter().map(ClassificationItem::from).collect();
        let files_json = serde_json::to_string_pretty(&items)
            .map_err(|e| GatewayError::Transport(format!("Failed to encode request: {}", e)))?;

        Ok(serde_json::json!({
            "systemInstruction": {
                "parts": [{ "text": CLASSIFIER_SYSTEM_PROMPT }]
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": build_classification_prompt(&files_json) }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
                "temperature": 0.2
            }
        }))
    }
}

impl Default for GeminiGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClassificationGateway for GeminiGateway {
    async fn classify(
        &self,
        batch: &[FileDescriptor],
        credential: &str,
    ) -> Result<Vec<AnalysisResult>, GatewayError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        tracing::info!(files = batch.len(), model = %self.model, "Classifying batch");

        let body = self.request_body(batch)?;
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Unauthorized);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
        let text = payload.text().ok_or_else(|| {
            GatewayError::MalformedResponse("response contained no candidate text".to_string())
        })?;

        let results = parse_results(&text, batch)?;
        tracing::info!(
            files = batch.len(),
            results = results.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Classification complete"
        );
        Ok(results)
    }
}

/// Parse and correlate classifier output against the submitted batch.
///
/// Any record that fails the schema fails the batch. Results for ids that were
/// not submitted are dropped, as are repeats of an id already seen.
pub fn parse_results(
    text: &str,
    batch: &[FileDescriptor],
) -> Result<Vec<AnalysisResult>, GatewayError> {
    let json = extract_json_array(text).map_err(GatewayError::MalformedResponse)?;
    let raw: Vec<AnalysisResult> =
        serde_json::from_str(json).map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

    let submitted: HashSet<&str> = batch.iter().map(|d| d.id.as_str()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut results = Vec::with_capacity(raw.len());

    for mut result in raw {
        if !submitted.contains(result.file_id.as_str()) {
            tracing::warn!(file_id = %result.file_id, "Classifier returned an id that was not submitted");
            continue;
        }
        if !seen.insert(result.file_id.clone()) {
            tracing::warn!(file_id = %result.file_id, "Duplicate classification, keeping the first");
            continue;
        }
        result.confidence = if result.confidence.is_finite() {
            result.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        results.push(result);
    }

    Ok(results)
}

fn response_schema() -> serde_json::Value {
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    let sensitivities: Vec<&str> = Sensitivity::ALL.iter().map(|s| s.as_str()).collect();
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "fileId": { "type": "STRING" },
                "category": { "type": "STRING", "enum": categories },
                "suggestedPath": { "type": "STRING" },
                "suggestedName": { "type": "STRING" },
                "shouldArchive": { "type": "BOOLEAN" },
                "sensitivity": { "type": "STRING", "enum": sensitivities },
                "reasoning": { "type": "STRING" },
                "confidence": { "type": "NUMBER" }
            },
            "required": [
                "fileId", "category", "suggestedPath", "suggestedName",
                "shouldArchive", "sensitivity", "reasoning", "confidence"
            ]
        }
    })
}

// API response types

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
