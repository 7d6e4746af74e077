//! Ayat Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Resumable ingestion of the Quran text, verse by verse, from a remote
//! content service into a local JSON checkpoint, and the derived layouts
//! built from that checkpoint.
//!
//! # Pieces
//!
//! - [`catalog`]: surah to verse-count table and deterministic enumeration
//! - [`checkpoint`]: durable verse store a run resumes from
//! - [`fetcher`]: dual-locale fetch and word-level merge
//! - [`orchestrator`]: pass loop with token refresh and bounded retries
//! - [`repartition`]: per-surah files, mini projection, shards
//!
//! # Example
//!
//! ```no_run
//! use ayat_ingest::api::{build_http_client, ContentClient, OAuthClient};
//! use ayat_ingest::{Catalog, CredentialManager, IngestConfig, IngestionOrchestrator};
//! use ayat_ingest::{JsonFileStore, RemoteFetcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::load()?;
//!     let http = build_http_client(config.api.timeout_secs)?;
//!
//!     let auth = OAuthClient::from_config(http.clone(), &config.api)?;
//!     let credentials = CredentialManager::bootstrap(&auth).await?;
//!     let fetcher = RemoteFetcher::new(
//!         ContentClient::from_config(http, &config.api)?,
//!         &config.api.query,
//!     );
//!     let store = JsonFileStore::new(config.storage.checkpoint_path());
//!
//!     let mut orchestrator =
//!         IngestionOrchestrator::new(Catalog::quran(), store, fetcher, auth, credentials)
//!             .with_retry_policy(config.retry)
//!             .with_throttle(config.throttle);
//!     let summary = orchestrator.run().await?;
//!     println!("{} verses fetched", summary.fetched);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod checkpoint;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod orchestrator;
pub mod repartition;

pub use catalog::{Catalog, VerseKey};
pub use checkpoint::{CheckpointStore, JsonFileStore, Snapshot};
pub use config::IngestConfig;
pub use credentials::{AuthClient, Credential, CredentialManager};
pub use error::{IngestError, Result};
pub use fetcher::{AuthExpired, ContentError, ContentSource, RemoteFetcher, VerseFetcher};
pub use models::{MiniVerseRecord, VerseRecord};
pub use orchestrator::{IngestionOrchestrator, RetryPolicy, RunState, RunSummary, Throttle};
