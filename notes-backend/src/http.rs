//! Shared outbound HTTP client

use once_cell::sync::Lazy;

static SHARED_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("Failed to build shared HTTP client")
});

/// Process-wide reqwest client, reused across requests for connection pooling.
pub fn shared_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}
