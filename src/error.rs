//! Error types for the reorganization pipeline
//!
//! Remote failures are split by boundary: `StoreError` for the file store and
//! `GatewayError` for the classification service. `ReorgError` is what the
//! orchestrator surfaces, and wraps either one with the file or path it
//! happened to.

use crate::review::FileStatus;
use thiserror::Error;

/// Failure talking to the remote file store
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// 401-class response; the caller should prompt re-authentication
    #[error("remote store rejected the credential")]
    Unauthorized,

    #[error("remote store error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("remote store request failed: {0}")]
    Transport(String),

    #[error("unexpected remote store response: {0}")]
    Decode(String),
}

/// Failure of a whole classification batch
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("classification service rejected the credential")]
    Unauthorized,

    #[error("classification service error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("classification request failed: {0}")]
    Transport(String),

    #[error("classification response did not match the expected schema: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum ReorgError {
    /// The entire classification batch was rejected; no file was analyzed
    #[error("analysis failed: {0}")]
    GatewayFailure(#[source] GatewayError),

    #[error("could not resolve folder path '{path}': {source}")]
    PathResolutionFailure {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("could not update file {file_id}: {source}")]
    MutationFailure {
        file_id: String,
        #[source]
        source: StoreError,
    },

    #[error("cannot {action} file {file_id} while it is {from}")]
    InvalidTransition {
        file_id: String,
        from: FileStatus,
        action: &'static str,
    },

    #[error("file {file_id} has no analysis")]
    MissingAnalysis { file_id: String },

    #[error("unknown file {file_id}")]
    UnknownFile { file_id: String },

    #[error("credential unavailable: {0}")]
    Credential(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReorgError {
    /// Whether the failure came from a rejected credential on either boundary
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            ReorgError::GatewayFailure(GatewayError::Unauthorized)
                | ReorgError::PathResolutionFailure {
                    source: StoreError::Unauthorized,
                    ..
                }
                | ReorgError::MutationFailure {
                    source: StoreError::Unauthorized,
                    ..
                }
                | ReorgError::Store(StoreError::Unauthorized)
        )
    }
}

impl From<GatewayError> for ReorgError {
    fn from(err: GatewayError) -> Self {
        ReorgError::GatewayFailure(err)
    }
}
