pub mod ai;
pub mod config;
pub mod drive;
pub mod error;
pub mod execution;
pub mod models;
pub mod review;
pub mod session;

pub use ai::{ClassificationGateway, CredentialKind, CredentialManager, GeminiGateway};
pub use config::ReorgConfig;
pub use drive::{DriveStore, RemoteStore, SnippetProvider};
pub use error::{GatewayError, ReorgError, StoreError};
pub use execution::{FolderPathResolver, MutationApplier, SyncExecutor, SyncMonitor, SyncReport};
pub use models::{AnalysisResult, AnalysisUpdate, Category, FileDescriptor, Sensitivity};
pub use review::{FileRecord, FileStatus, ReviewState, ReviewSummary};
pub use session::ReorgSession;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Default: warn for most crates, info for this one (batch summaries visible).
/// Use RUST_LOG=debug for per-file and per-folder logs. Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,drive_reorganizer=info")),
        )
        .try_init();
}
