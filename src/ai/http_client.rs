//! Shared HTTP Client Module
//!
//! Global, lazy-initialized HTTP clients with connection pooling, one per
//! remote service. Clients are created on first use and reused for every
//! later request, so TLS sessions and TCP connections carry over between
//! classification batches and the many small Drive calls of a sync run.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

/// Global HTTP client for classification requests
///
/// A whole selection goes out in one request, so the timeout is generous:
/// - 120s timeout for large batches
/// - few idle connections (one outstanding request per batch)
pub static CLASSIFIER_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .build()
        .expect("Failed to create classifier HTTP client")
});

/// Global HTTP client for Drive API calls
///
/// Sync runs issue many short sequential requests against one host.
pub static DRIVE_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(8)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .build()
        .expect("Failed to create Drive HTTP client")
});

#[inline]
pub fn classifier_client() -> &'static Client {
    &CLASSIFIER_CLIENT
}

#[inline]
pub fn drive_client() -> &'static Client {
    &DRIVE_CLIENT
}

/// Client with a caller-chosen timeout, for configurations that override the default
pub fn client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_nodelay(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clients_are_created() {
        let _ = classifier_client();
        let _ = drive_client();
    }

    #[test]
    fn test_clients_are_same_instance() {
        let client1 = drive_client();
        let client2 = drive_client();
        assert!(std::ptr::eq(client1, client2));
    }

    #[test]
    fn test_client_with_timeout() {
        assert!(client_with_timeout(Duration::from_secs(5)).is_ok());
    }
}
