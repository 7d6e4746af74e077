//! Dual-locale verse fetch and merge
//!
//! Every verse is requested twice, once per locale, concurrently. The
//! primary response is the base record; word-level annotations from both
//! are folded onto its words by position.
//!
//! Failures are split in two. An authorization rejection surfaces as
//! [`AuthExpired`] so the orchestrator can refresh the token; everything
//! else is logged and reported as "no record", leaving the verse for a
//! later pass.

use crate::catalog::VerseKey;
use crate::config::ContentQuery;
use crate::credentials::Credential;
use crate::models::{RemoteWord, Verse, VerseRecord, VerseResponse, Word};
use async_trait::async_trait;
use futures::future;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure of a single content request.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Authorization rejected (HTTP {0})")]
    Unauthorized(u16),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Locale responses disagree on word count: primary {primary}, secondary {secondary}")]
    WordCountMismatch { primary: usize, secondary: usize },
}

impl ContentError {
    /// Whether the credential should be refreshed before trying again.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ContentError::Unauthorized(_))
    }
}

/// The content service rejected the current credential.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Access token expired or rejected")]
pub struct AuthExpired;

/// One locale-specific verse lookup.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn verse_by_key(
        &self,
        key: VerseKey,
        language: &str,
        credential: &Credential,
    ) -> Result<VerseResponse, ContentError>;
}

/// What the orchestrator needs from a fetcher.
///
/// `Ok(None)` is a transient miss: logged, not retried in this pass.
#[async_trait]
pub trait VerseFetcher: Send + Sync {
    async fn fetch(
        &self,
        key: VerseKey,
        credential: &Credential,
    ) -> Result<Option<VerseRecord>, AuthExpired>;
}

pub struct RemoteFetcher<S> {
    source: S,
    primary_language: String,
    secondary_language: String,
}

impl<S: ContentSource> RemoteFetcher<S> {
    pub fn new(source: S, query: &ContentQuery) -> Self {
        Self {
            source,
            primary_language: query.primary_language.clone(),
            secondary_language: query.secondary_language.clone(),
        }
    }

    /// Fetch both locales and merge, without classifying the failure.
    pub async fn fetch_merged(
        &self,
        key: VerseKey,
        credential: &Credential,
    ) -> Result<VerseRecord, ContentError> {
        let (primary, secondary) = future::join(
            self.source.verse_by_key(key, &self.primary_language, credential),
            self.source.verse_by_key(key, &self.secondary_language, credential),
        )
        .await;

        match (primary, secondary) {
            (Ok(primary), Ok(secondary)) => merge_verse(primary, secondary),
            // An auth rejection on either side wins over any other failure.
            (Err(p), Err(s)) => Err(if s.is_auth_expired() { s } else { p }),
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
        }
    }
}

#[async_trait]
impl<S: ContentSource> VerseFetcher for RemoteFetcher<S> {
    async fn fetch(
        &self,
        key: VerseKey,
        credential: &Credential,
    ) -> Result<Option<VerseRecord>, AuthExpired> {
        match self.fetch_merged(key, credential).await {
            Ok(record) => {
                debug!(verse = %key, words = record.verse.words.len(), "Fetched verse");
                Ok(Some(record))
            },
            Err(e) if e.is_auth_expired() => {
                warn!(verse = %key, error = %e, "Access token rejected");
                Err(AuthExpired)
            },
            Err(e) => {
                warn!(
                    verse = %key,
                    error = %e,
                    "Failed to fetch verse, leaving it for a later run"
                );
                Ok(None)
            },
        }
    }
}

/// Merge the two locale responses for one verse.
///
/// Words are paired by position. Lists of different length are refused
/// instead of being partially paired.
pub fn merge_verse(
    primary: VerseResponse,
    secondary: VerseResponse,
) -> Result<VerseRecord, ContentError> {
    let Verse {
        id,
        verse_key,
        ruku_number,
        text_imlaei,
        words: primary_words,
        extra,
    } = primary.verse;
    let secondary_words = secondary.verse.words;

    if primary_words.len() != secondary_words.len() {
        return Err(ContentError::WordCountMismatch {
            primary: primary_words.len(),
            secondary: secondary_words.len(),
        });
    }

    let words = primary_words
        .into_iter()
        .zip(secondary_words)
        .map(|(primary, secondary)| merge_word(primary, secondary))
        .collect();

    Ok(VerseRecord {
        verse: Verse {
            id,
            verse_key,
            ruku_number,
            text_imlaei,
            words,
            extra,
        },
    })
}

/// Merge one word pair: the primary word minus its single `translation`
/// and `transliteration`, plus `translation_en` and `transliteration` from
/// the primary and `translation_ur` from the secondary.
pub fn merge_word(primary: RemoteWord, secondary: RemoteWord) -> Word {
    Word {
        id: primary.id,
        char_type_name: primary.char_type_name,
        text_imlaei: primary.text_imlaei,
        location: primary.location,
        translation_en: primary.translation,
        translation_ur: secondary.translation,
        transliteration: primary.transliteration,
        extra: primary.extra,
    }
}
