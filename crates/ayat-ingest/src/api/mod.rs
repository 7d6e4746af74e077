//! HTTP collaborators: the identity provider and the content service.

pub mod auth;
pub mod content;
pub mod endpoints;

pub use auth::OAuthClient;
pub use content::ContentClient;

use crate::error::Result;
use reqwest::Client;
use std::time::Duration;

/// Shared HTTP client for both collaborators.
pub fn build_http_client(timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("ayat-ingest/", env!("CARGO_PKG_VERSION")))
        .build()?;

    Ok(client)
}
