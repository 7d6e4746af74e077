//! Ayat Ingest - verse ingestion tool

use anyhow::{Context, Result};
use ayat_common::logging::{init_logging, LogConfig, LogLevel};
use ayat_ingest::api::auth::NoRefresh;
use ayat_ingest::api::{build_http_client, ContentClient, OAuthClient};
use ayat_ingest::repartition;
use ayat_ingest::{
    AuthClient, Catalog, Credential, CredentialManager, IngestConfig,
    IngestionOrchestrator, JsonFileStore, RemoteFetcher, VerseKey,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ayat-ingest")]
#[command(author, version, about = "Resumable Quran verse ingestion")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Data directory (overrides AYAT_DATA_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch every missing verse, resuming from the checkpoint
    Fetch,

    /// Fetch and merge one verse and print it, without saving
    Show {
        /// Verse key, e.g. 2:255
        key: VerseKey,
    },

    /// Report checkpoint progress against the catalog
    Status,

    /// Write one file per surah plus the complete file
    Surahs,

    /// Write the reduced-field projection, split into parts
    Mini {
        /// Number of parts (defaults to AYAT_SHARD_COUNT)
        #[arg(short, long)]
        parts: Option<usize>,
    },

    /// Merge mini parts back into one file
    Merge {
        /// Number of parts (defaults to AYAT_SHARD_COUNT)
        #[arg(short, long)]
        parts: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("ayat-ingest")
        .build()
        .with_env_overrides()?;

    let _guard = init_logging(&log_config)?;

    let mut config = IngestConfig::load()?;
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }

    let catalog = match &config.storage.catalog_file {
        Some(path) => Catalog::from_json_file(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => Catalog::quran(),
    };

    match cli.command {
        Command::Fetch => fetch(&config, catalog).await?,
        Command::Show { key } => show(&config, key).await?,
        Command::Status => status(&config, &catalog)?,
        Command::Surahs => {
            let snapshot = load_checkpoint(&config)?;
            let grouped = repartition::group_by_parent(&snapshot, &catalog);
            repartition::write_surah_artifacts(&config.storage.surah_dir(), &grouped)?;
        },
        Command::Mini { parts } => {
            let snapshot = load_checkpoint(&config)?;
            let mini = repartition::project_all(&snapshot);
            repartition::write_shards(
                &config.storage.mini_dir(),
                &mini,
                parts.unwrap_or(config.shard_count),
            )?;
        },
        Command::Merge { parts } => {
            repartition::merge_shards(
                &config.storage.mini_dir(),
                parts.unwrap_or(config.shard_count),
            )?;
        },
    }

    Ok(())
}

async fn fetch(config: &IngestConfig, catalog: Catalog) -> Result<()> {
    config.validate_for_fetch()?;

    if config.api.client_secret.is_some() {
        let http = build_http_client(config.api.timeout_secs)?;
        let auth = OAuthClient::from_config(http, &config.api)?;
        run_orchestrator(config, catalog, auth).await
    } else {
        warn!("AYAT_CLIENT_SECRET is not set, an expired token will end the run");
        run_orchestrator(config, catalog, NoRefresh).await
    }
}

async fn run_orchestrator<A: AuthClient>(
    config: &IngestConfig,
    catalog: Catalog,
    auth: A,
) -> Result<()> {
    let http = build_http_client(config.api.timeout_secs)?;
    let content = ContentClient::from_config(http, &config.api)?;
    let fetcher = RemoteFetcher::new(content, &config.api.query);
    let credentials = initial_credentials(config, &auth).await?;
    let store = JsonFileStore::new(config.storage.checkpoint_path());

    info!(
        verses = catalog.total_verses(),
        checkpoint = %config.storage.checkpoint_path().display(),
        "Starting ingestion"
    );

    let summary = IngestionOrchestrator::new(catalog, store, fetcher, auth, credentials)
        .with_retry_policy(config.retry)
        .with_throttle(config.throttle)
        .run()
        .await?;

    info!(
        fetched = summary.fetched,
        already_present = summary.already_present,
        missed = summary.missed,
        remaining = summary.remaining,
        "Ingestion complete"
    );
    Ok(())
}

async fn initial_credentials(
    config: &IngestConfig,
    auth: &dyn AuthClient,
) -> Result<CredentialManager> {
    match &config.api.access_token {
        Some(token) => Ok(CredentialManager::new(Credential::new(token.clone()))),
        None => Ok(CredentialManager::bootstrap(auth).await?),
    }
}

async fn show(config: &IngestConfig, key: VerseKey) -> Result<()> {
    config.validate_for_fetch()?;

    let http = build_http_client(config.api.timeout_secs)?;
    let credentials = if config.api.client_secret.is_some() {
        let auth = OAuthClient::from_config(http.clone(), &config.api)?;
        initial_credentials(config, &auth).await?
    } else {
        initial_credentials(config, &NoRefresh).await?
    };

    let content = ContentClient::from_config(http, &config.api)?;
    let fetcher = RemoteFetcher::new(content, &config.api.query);
    let record = fetcher
        .fetch_merged(key, credentials.current())
        .await
        .with_context(|| format!("Failed to fetch verse {key}"))?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn status(config: &IngestConfig, catalog: &Catalog) -> Result<()> {
    let store = JsonFileStore::new(config.storage.checkpoint_path());
    let snapshot = store.inspect()?;
    let present = catalog
        .enumerate()
        .filter(|k| snapshot.contains_key(k))
        .count();

    info!(
        checkpoint = %store.path().display(),
        stored = snapshot.len(),
        present,
        total = catalog.total_verses(),
        "Checkpoint status"
    );

    match catalog.first_missing(|k| snapshot.contains_key(k)) {
        Some(key) => info!(first_missing = %key, "Ingestion incomplete"),
        None => info!("All verses present"),
    }

    Ok(())
}

fn load_checkpoint(config: &IngestConfig) -> Result<ayat_ingest::Snapshot> {
    let store = JsonFileStore::new(config.storage.checkpoint_path());
    let snapshot = store.inspect()?;
    if snapshot.is_empty() {
        anyhow::bail!(
            "{} is empty or missing, run `ayat-ingest fetch` first",
            store.path().display()
        );
    }
    Ok(snapshot)
}
