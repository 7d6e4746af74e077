//! Content service client

use crate::api::endpoints;
use crate::catalog::VerseKey;
use crate::config::{ApiConfig, ContentQuery};
use crate::credentials::Credential;
use crate::error::{IngestError, Result};
use crate::fetcher::{ContentError, ContentSource};
use crate::models::VerseResponse;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use tracing::trace;

/// Verse lookups against the content API, one locale per request.
pub struct ContentClient {
    client: Client,
    base_url: String,
    client_id: String,
    query: ContentQuery,
}

impl ContentClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        query: ContentQuery,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            client_id: client_id.into(),
            query,
        }
    }

    pub fn from_config(client: Client, config: &ApiConfig) -> Result<Self> {
        let client_id = config
            .client_id
            .clone()
            .ok_or_else(|| IngestError::config("AYAT_CLIENT_ID is not set"))?;

        Ok(Self::new(
            client,
            config.content_url.clone(),
            client_id,
            config.query.clone(),
        ))
    }
}

#[async_trait]
impl ContentSource for ContentClient {
    async fn verse_by_key(
        &self,
        key: VerseKey,
        language: &str,
        credential: &Credential,
    ) -> std::result::Result<VerseResponse, ContentError> {
        let url = endpoints::verse_by_key_url(&self.base_url, key);
        trace!(url = %url, language, "GET verse");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .header("x-auth-token", credential.as_str())
            .header("x-client-id", &self.client_id)
            .query(&[
                ("words", "true"),
                ("language", language),
                ("translations", self.query.translations.as_str()),
                ("translation_fields", self.query.translation_fields.as_str()),
                ("fields", self.query.fields.as_str()),
                ("word_fields", self.query.word_fields.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ContentError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            return Err(ContentError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            return Err(ContentError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ContentError::Transport(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| ContentError::Decode(e.to_string()))
    }
}
