//! Sync pipeline
//!
//! Applies approved suggestions to the remote store. Everything here runs
//! strictly sequentially: one file at a time, and within a file one path
//! segment at a time, so overlapping destinations never race to create the
//! same folder.

pub mod applier;
pub mod executor;
pub mod resolver;

pub use applier::MutationApplier;
pub use executor::{ProgressCallback, SyncExecutor, SyncMonitor, SyncReport};
pub use resolver::{normalize_path, FolderPathCache, FolderPathResolver};
