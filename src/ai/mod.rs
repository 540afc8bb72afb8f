//! Classification service plumbing: credentials, HTTP clients, prompt
//! construction and the gateway that turns a file batch into suggestions.

pub mod credentials;
pub mod gateway;
pub mod http_client;
pub mod json;
pub mod prompts;

pub use credentials::{CredentialKind, CredentialManager};
pub use gateway::{ClassificationGateway, GeminiGateway};
