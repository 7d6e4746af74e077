//! Resumable ingestion run
//!
//! A run is a bounded loop of passes. Each pass reloads the checkpoint,
//! finds the first missing verse and walks the catalog from that surah on,
//! fetching and saving every verse not yet stored.
//!
//! ```text
//! Idle -> Running -> Completed
//!            |  ^
//!   403      v  |  token refreshed (retry counter reset)
//!        AwaitingRefresh
//!
//! Running -> Failed   refresh failed, or retry budget spent
//! ```
//!
//! Failure handling by level:
//! - verse: transient miss is logged and skipped; auth rejection ends the pass
//! - surah: any other fault is logged and the next surah starts
//! - pass: auth rejection refreshes the token; anything else backs off and
//!   counts against `max_retries`

use crate::catalog::{verses_of, Catalog, VerseKey};
use crate::checkpoint::CheckpointStore;
use crate::config::{
    DEFAULT_ITEM_DELAY_MS, DEFAULT_MAX_REFRESHES, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_BACKOFF_SECS, DEFAULT_SURAH_DELAY_MS,
};
use crate::credentials::{AuthClient, CredentialManager};
use crate::error::{IngestError, Result};
use crate::fetcher::{AuthExpired, VerseFetcher};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Top-level retry behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pass attempts allowed for non-auth failures before giving up
    pub max_retries: u32,
    /// Fixed wait between those attempts
    pub backoff: Duration,
    /// Consecutive refreshes allowed while passes save nothing (at least one)
    pub max_refreshes: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: Duration::from_secs(DEFAULT_RETRY_BACKOFF_SECS),
            max_refreshes: DEFAULT_MAX_REFRESHES,
        }
    }
}

/// Static request pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    /// After every verse that was actually requested
    pub item_delay: Duration,
    /// After every surah that finished without a fault
    pub surah_delay: Duration,
}

impl Throttle {
    pub fn none() -> Self {
        Self {
            item_delay: Duration::ZERO,
            surah_delay: Duration::ZERO,
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self {
            item_delay: Duration::from_millis(DEFAULT_ITEM_DELAY_MS),
            surah_delay: Duration::from_millis(DEFAULT_SURAH_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    AwaitingRefresh,
    Completed,
    Failed,
}

/// Counters accumulated over every pass of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passes: u32,
    pub refreshes: u32,
    /// Verses fetched and saved
    pub fetched: u64,
    /// Verses skipped because the checkpoint already had them
    pub already_present: u64,
    /// Transient fetch misses
    pub missed: u64,
    /// Surahs abandoned because of a fault
    pub surah_failures: u64,
    /// Catalog verses still absent from the checkpoint at the end
    pub remaining: u64,
    pub first_missing: Option<VerseKey>,
}

enum PassError {
    AuthExpired,
    Fault(IngestError),
}

impl From<AuthExpired> for PassError {
    fn from(_: AuthExpired) -> Self {
        PassError::AuthExpired
    }
}

impl From<IngestError> for PassError {
    fn from(err: IngestError) -> Self {
        PassError::Fault(err)
    }
}

/// Drives verse ingestion for one catalog into one checkpoint store.
pub struct IngestionOrchestrator<S, F, A> {
    catalog: Catalog,
    store: S,
    fetcher: F,
    auth: A,
    credentials: CredentialManager,
    policy: RetryPolicy,
    throttle: Throttle,
    state: RunState,
}

impl<S, F, A> IngestionOrchestrator<S, F, A>
where
    S: CheckpointStore,
    F: VerseFetcher,
    A: AuthClient,
{
    pub fn new(
        catalog: Catalog,
        store: S,
        fetcher: F,
        auth: A,
        credentials: CredentialManager,
    ) -> Self {
        Self {
            catalog,
            store,
            fetcher,
            auth,
            credentials,
            policy: RetryPolicy::default(),
            throttle: Throttle::default(),
            state: RunState::Idle,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    /// Run passes until one completes or the run fails.
    ///
    /// On failure everything saved so far stays in the checkpoint and a
    /// later run resumes from it.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let mut retries: u32 = 0;
        let mut idle_refreshes: u32 = 0;

        loop {
            self.state = RunState::Running;
            summary.passes += 1;
            let fetched_before = summary.fetched;

            info!(pass = summary.passes, "Starting ingestion pass");

            match self.run_pass(&mut summary).await {
                Ok(()) => {
                    self.state = RunState::Completed;
                    break;
                },
                Err(PassError::AuthExpired) => {
                    self.state = RunState::AwaitingRefresh;

                    if summary.fetched > fetched_before {
                        idle_refreshes = 0;
                    }
                    // At least one refresh is always attempted.
                    if idle_refreshes >= self.policy.max_refreshes.max(1) {
                        self.state = RunState::Failed;
                        error!(
                            refreshes = idle_refreshes,
                            "Token keeps being rejected without any progress"
                        );
                        return Err(IngestError::AuthFailure(format!(
                            "token rejected after {} consecutive refreshes with no verse saved",
                            idle_refreshes
                        )));
                    }

                    info!("Access token expired, refreshing");
                    if let Err(e) = self.credentials.refresh(&self.auth).await {
                        self.state = RunState::Failed;
                        error!(error = %e, "Could not refresh access token, aborting");
                        return Err(e);
                    }

                    summary.refreshes += 1;
                    idle_refreshes += 1;
                    retries = 0;
                },
                Err(PassError::Fault(e)) => {
                    retries += 1;
                    if retries >= self.policy.max_retries {
                        self.state = RunState::Failed;
                        error!(attempts = retries, error = %e, "Max retries reached, aborting");
                        return Err(IngestError::MaxRetriesExceeded {
                            attempts: retries,
                            last_error: e.to_string(),
                        });
                    }

                    warn!(
                        attempt = retries,
                        max_retries = self.policy.max_retries,
                        backoff_secs = self.policy.backoff.as_secs_f64(),
                        error = %e,
                        "Ingestion pass failed, retrying"
                    );
                    pause(self.policy.backoff).await;
                },
            }
        }

        summary.first_missing = self.catalog.first_missing(|k| self.store.has(k));
        summary.remaining = self
            .catalog
            .enumerate()
            .filter(|k| !self.store.has(k))
            .count() as u64;

        if summary.remaining == 0 {
            info!(
                fetched = summary.fetched,
                passes = summary.passes,
                "All verses have been fetched and saved"
            );
        } else {
            warn!(
                fetched = summary.fetched,
                missed = summary.missed,
                remaining = summary.remaining,
                first_missing = ?summary.first_missing.map(|k| k.to_string()),
                "Run finished with verses still missing; run again to retry them"
            );
        }

        Ok(summary)
    }

    async fn run_pass(&mut self, summary: &mut RunSummary) -> std::result::Result<(), PassError> {
        self.store.load()?;

        let Some(resume) = self.catalog.first_missing(|k| self.store.has(k)) else {
            info!("Checkpoint already holds every verse");
            return Ok(());
        };
        info!(from = %resume, "Resuming");

        let surahs = self.catalog.surahs().to_vec();
        for (surah, count) in surahs {
            if surah < resume.surah {
                debug!(surah, "Skipping surah (already complete)");
                continue;
            }

            match self.ingest_surah(surah, count, summary).await {
                Ok(()) => pause(self.throttle.surah_delay).await,
                Err(PassError::AuthExpired) => return Err(PassError::AuthExpired),
                Err(PassError::Fault(e)) => {
                    summary.surah_failures += 1;
                    error!(surah, error = %e, "Surah failed, continuing with next surah");
                },
            }
        }

        Ok(())
    }

    #[instrument(skip(self, summary))]
    async fn ingest_surah(
        &mut self,
        surah: u32,
        count: u32,
        summary: &mut RunSummary,
    ) -> std::result::Result<(), PassError> {
        info!("Processing surah");

        for key in verses_of(surah, count) {
            if self.store.has(&key) {
                summary.already_present += 1;
                continue;
            }

            match self.fetcher.fetch(key, self.credentials.current()).await? {
                Some(record) => {
                    self.store.put(key, record)?;
                    summary.fetched += 1;
                    info!(verse = %key, "Saved verse");
                },
                None => summary.missed += 1,
            }

            pause(self.throttle.item_delay).await;
        }

        Ok(())
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
