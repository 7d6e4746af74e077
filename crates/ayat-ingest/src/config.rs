//! Configuration management
//!
//! Everything is read from the environment (after loading `.env` if one is
//! present) over the defaults below. The retry policy and throttle are
//! plain values handed to the orchestrator.

use crate::error::{IngestError, Result};
use crate::orchestrator::{RetryPolicy, Throttle};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Identity provider base URL.
pub const DEFAULT_AUTH_URL: &str = "https://oauth2.quran.foundation/";

/// Content service base URL.
pub const DEFAULT_CONTENT_URL: &str = "https://apis.quran.foundation/";

/// Root directory for the checkpoint and derived artifacts.
pub const DEFAULT_DATA_DIR: &str = "./data";

pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_RETRY_BACKOFF_SECS: u64 = 5;

/// Consecutive token refreshes tolerated while no new verse gets saved.
pub const DEFAULT_MAX_REFRESHES: u32 = 3;

/// Pause after every attempted verse.
pub const DEFAULT_ITEM_DELAY_MS: u64 = 100;

/// Pause after every finished surah.
pub const DEFAULT_SURAH_DELAY_MS: u64 = 1000;

pub const DEFAULT_SHARD_COUNT: usize = 10;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_PRIMARY_LANGUAGE: &str = "en";
pub const DEFAULT_SECONDARY_LANGUAGE: &str = "ur";

/// 131 = Sahih International (English), 6 = Fateh Muhammad Jalandhri (Urdu)
pub const DEFAULT_TRANSLATIONS: &str = "131,6";

pub const DEFAULT_TRANSLATION_FIELDS: &str = "text,language_name";

pub const DEFAULT_VERSE_FIELDS: &str = "chapter_id,text_indopak,text_imlaei_simple,text_imlaei,\
text_uthmani,text_uthmani_simple,text_uthmani_tajweed,text_qpc_hafs,qpc_uthmani_hafs,\
text_qpc_nastaleeq_hafs,text_qpc_nastaleeq,text_indopak_nastaleeq,image_url,image_width,\
code_v1,code_v2,page_number,v1_page,v2_page";

pub const DEFAULT_WORD_FIELDS: &str = "verse_id,chapter_id,text_uthmani,text_indopak,\
text_imlaei_simple,text_imlaei,text_uthmani_simple,text_uthmani_tajweed,text_qpc_hafs,\
verse_key,location,code_v1,code_v2,v1_page,v2_page,line_number,line_v2,line_v1";

pub const CHECKPOINT_FILE: &str = "all_ayahs.json";
pub const SURAH_DIR: &str = "surahs";
pub const MINI_DIR: &str = "mini_ayahs_parts";

/// Ingester configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub retry: RetryPolicy,
    pub throttle: Throttle,
    pub shard_count: usize,
}

/// Remote collaborator settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub auth_url: String,
    pub content_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub access_token: Option<String>,
    pub timeout_secs: u64,
    pub query: ContentQuery,
}

/// Per-request selection sent to the content service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentQuery {
    pub primary_language: String,
    pub secondary_language: String,
    pub translations: String,
    pub translation_fields: String,
    pub fields: String,
    pub word_fields: String,
}

impl Default for ContentQuery {
    fn default() -> Self {
        Self {
            primary_language: DEFAULT_PRIMARY_LANGUAGE.to_string(),
            secondary_language: DEFAULT_SECONDARY_LANGUAGE.to_string(),
            translations: DEFAULT_TRANSLATIONS.to_string(),
            translation_fields: DEFAULT_TRANSLATION_FIELDS.to_string(),
            fields: DEFAULT_VERSE_FIELDS.to_string(),
            word_fields: DEFAULT_WORD_FIELDS.to_string(),
        }
    }
}

/// On-disk locations
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub catalog_file: Option<PathBuf>,
}

impl StorageConfig {
    pub fn checkpoint_path(&self) -> PathBuf {
        self.data_dir.join(CHECKPOINT_FILE)
    }

    pub fn surah_dir(&self) -> PathBuf {
        self.data_dir.join(SURAH_DIR)
    }

    pub fn mini_dir(&self) -> PathBuf {
        self.data_dir.join(MINI_DIR)
    }
}

impl IngestConfig {
    /// Load configuration from `.env`, the environment and defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = IngestConfig {
            api: ApiConfig {
                auth_url: env_string("AYAT_AUTH_URL").unwrap_or(defaults.api.auth_url),
                content_url: env_string("AYAT_CONTENT_URL").unwrap_or(defaults.api.content_url),
                client_id: env_string("AYAT_CLIENT_ID"),
                client_secret: env_string("AYAT_CLIENT_SECRET"),
                access_token: env_string("AYAT_ACCESS_TOKEN"),
                timeout_secs: env_parse("AYAT_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
                query: ContentQuery {
                    primary_language: env_string("AYAT_PRIMARY_LANGUAGE")
                        .unwrap_or(defaults.api.query.primary_language),
                    secondary_language: env_string("AYAT_SECONDARY_LANGUAGE")
                        .unwrap_or(defaults.api.query.secondary_language),
                    translations: env_string("AYAT_TRANSLATIONS")
                        .unwrap_or(defaults.api.query.translations),
                    ..defaults.api.query
                },
            },
            storage: StorageConfig {
                data_dir: env_string("AYAT_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.data_dir),
                catalog_file: env_string("AYAT_CATALOG_FILE").map(PathBuf::from),
            },
            retry: RetryPolicy {
                max_retries: env_parse("AYAT_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
                backoff: Duration::from_secs(env_parse(
                    "AYAT_RETRY_BACKOFF_SECS",
                    DEFAULT_RETRY_BACKOFF_SECS,
                )?),
                max_refreshes: env_parse("AYAT_MAX_REFRESHES", DEFAULT_MAX_REFRESHES)?,
            },
            throttle: Throttle {
                item_delay: Duration::from_millis(env_parse(
                    "AYAT_ITEM_DELAY_MS",
                    DEFAULT_ITEM_DELAY_MS,
                )?),
                surah_delay: Duration::from_millis(env_parse(
                    "AYAT_GROUP_DELAY_MS",
                    DEFAULT_SURAH_DELAY_MS,
                )?),
            },
            shard_count: env_parse("AYAT_SHARD_COUNT", DEFAULT_SHARD_COUNT)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.auth_url.trim().is_empty() {
            return Err(IngestError::config("AYAT_AUTH_URL cannot be empty"));
        }

        if self.api.content_url.trim().is_empty() {
            return Err(IngestError::config("AYAT_CONTENT_URL cannot be empty"));
        }

        if self.retry.max_retries == 0 {
            return Err(IngestError::config("AYAT_MAX_RETRIES must be greater than 0"));
        }

        if self.retry.max_refreshes == 0 {
            return Err(IngestError::config("AYAT_MAX_REFRESHES must be greater than 0"));
        }

        if self.shard_count == 0 {
            return Err(IngestError::config("AYAT_SHARD_COUNT must be greater than 0"));
        }

        if self.api.query.primary_language == self.api.query.secondary_language {
            return Err(IngestError::config(format!(
                "Primary and secondary language are both '{}'",
                self.api.query.primary_language
            )));
        }

        Ok(())
    }

    /// Checks that only matter when talking to the remote service
    pub fn validate_for_fetch(&self) -> Result<()> {
        if self.api.client_id.is_none() {
            return Err(IngestError::config("AYAT_CLIENT_ID is required to fetch verses"));
        }

        if self.api.client_secret.is_none() && self.api.access_token.is_none() {
            return Err(IngestError::config(
                "Set AYAT_CLIENT_SECRET (preferred) or AYAT_ACCESS_TOKEN to fetch verses",
            ));
        }

        Ok(())
    }

    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.storage.data_dir = dir.as_ref().to_path_buf();
        self
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                auth_url: DEFAULT_AUTH_URL.to_string(),
                content_url: DEFAULT_CONTENT_URL.to_string(),
                client_id: None,
                client_secret: None,
                access_token: None,
                timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
                query: ContentQuery::default(),
            },
            storage: StorageConfig {
                data_dir: PathBuf::from(DEFAULT_DATA_DIR),
                catalog_file: None,
            },
            retry: RetryPolicy::default(),
            throttle: Throttle::default(),
            shard_count: DEFAULT_SHARD_COUNT,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env_string(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| IngestError::config(format!("{} has an invalid value: '{}'", name, raw))),
        None => Ok(default),
    }
}
