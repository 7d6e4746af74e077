//! OAuth2 client-credentials exchange

use crate::api::endpoints;
use crate::config::ApiConfig;
use crate::credentials::{AuthClient, Credential};
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Requests `content`-scoped access tokens from the identity provider.
pub struct OAuthClient {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl OAuthClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Build from config. Fails when the client id or secret is missing.
    pub fn from_config(client: Client, config: &ApiConfig) -> Result<Self> {
        let client_id = config
            .client_id
            .clone()
            .ok_or_else(|| IngestError::config("AYAT_CLIENT_ID is not set"))?;
        let client_secret = config
            .client_secret
            .clone()
            .ok_or_else(|| IngestError::config("AYAT_CLIENT_SECRET is not set"))?;

        Ok(Self::new(client, config.auth_url.clone(), client_id, client_secret))
    }
}

#[async_trait]
impl AuthClient for OAuthClient {
    async fn request_token(&self) -> Result<Credential> {
        let url = endpoints::token_url(&self.base_url);
        debug!(url = %url, "Requesting access token");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", "content")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::AuthFailure(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let body: TokenResponse = response.json().await?;
        body.access_token
            .filter(|token| !token.is_empty())
            .map(Credential::new)
            .ok_or_else(|| IngestError::AuthFailure("response had no access_token".to_string()))
    }
}

/// Auth collaborator for runs started with a fixed token and no secret:
/// every refresh fails, so an expired token ends the run.
pub struct NoRefresh;

#[async_trait]
impl AuthClient for NoRefresh {
    async fn request_token(&self) -> Result<Credential> {
        Err(IngestError::AuthFailure(
            "token expired and AYAT_CLIENT_SECRET is not set".to_string(),
        ))
    }
}
