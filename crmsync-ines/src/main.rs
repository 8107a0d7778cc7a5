//! crmsync-ines - push local contacts and companies to Ines CRM
//!
//! Subcommands:
//! - `push`: one batch push over a creation-date window (or everything)
//! - `fields`: list mappable remote fields, including remote custom fields
//! - `init`: create the local database and declare the catalog's local fields

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use crmsync_common::config::{load_config, resolve_config_path, resolve_database_path};
use crmsync_common::db::SqliteStore;
use crmsync_common::mapping::Concept;
use crmsync_ines::api::{HttpInesApi, InesApi};
use crmsync_ines::catalog::{self, FieldCatalog};
use crmsync_ines::config::resolve_ines_settings;
use crmsync_ines::{integration, BatchDriver, PushParams, SyncBranch};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", ",
    env!("BUILD_PROFILE"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

/// Command-line arguments for crmsync-ines
#[derive(Parser, Debug)]
#[command(name = "crmsync-ines")]
#[command(about = "Push local contacts and companies to Ines CRM")]
#[command(version = VERSION)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Local SQLite database
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Log filter directive; overrides the TOML logging level
    #[arg(long, global = true, env = "CRMSYNC_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one batch push
    Push {
        /// Window start (RFC 3339); defaults to now minus the configured lookback
        #[arg(long)]
        from: Option<DateTime<Utc>>,

        /// Window end (RFC 3339); defaults to now
        #[arg(long)]
        to: Option<DateTime<Utc>>,

        /// Push every record regardless of creation date
        #[arg(long)]
        full_sync: bool,

        /// Maximum records per object type
        #[arg(long)]
        limit: Option<u32>,
    },

    /// List mappable remote fields
    Fields {
        #[arg(long, value_enum, default_value = "contact")]
        concept: ConceptArg,
    },

    /// Create the local database and declare local fields
    Init,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ConceptArg {
    Contact,
    Company,
}

impl From<ConceptArg> for Concept {
    fn from(arg: ConceptArg) -> Self {
        match arg {
            ConceptArg::Contact => Concept::Contact,
            ConceptArg::Company => Concept::Company,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    let default_filter = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting {} connector v{}", integration::DISPLAY_NAME, VERSION);
    match resolve_config_path(args.config.as_deref()) {
        Some(path) => info!("Config: {}", path.display()),
        None => info!("Config: built-in defaults"),
    }

    let db_path = resolve_database_path(args.database.as_deref(), &config);
    info!("Database: {}", db_path.display());

    let store = Arc::new(
        SqliteStore::open(&db_path)
            .await
            .context("Failed to open local database")?,
    );

    match args.command {
        Command::Init => {
            for definition in catalog::local_field_definitions() {
                store.declare_field(&definition).await?;
            }
            info!("Declared catalog local fields");

            let suggested = toml::to_string_pretty(&catalog::suggested_mapping())
                .context("Failed to render suggested mapping")?;
            println!("# Suggested [mapping] section\n{}", suggested);
        }

        Command::Fields { concept } => {
            let api = connect(&config)?;
            let fields = FieldCatalog::new(api).form_fields(concept.into()).await;
            for field in fields {
                let marker = if field.required { "*" } else { " " };
                println!("{} {:<24} {}", marker, field.key, field.label);
            }
        }

        Command::Push {
            from,
            to,
            full_sync,
            limit,
        } => {
            let api = connect(&config)?;
            let driver = BatchDriver::new(
                api,
                store,
                config.mapping.clone(),
                config.sync.default_lookback(),
            );

            let params = PushParams {
                from,
                to,
                full_sync,
                limit,
            };
            let summary = driver.push_leads(&params).await.context("Batch push failed")?;

            println!("Contacts processed: {}", summary.contacts_processed);
            println!("Contacts skipped (no primary company): {}", summary.contacts_skipped);
            for branch in [
                SyncBranch::CreateBoth,
                SyncBranch::CreateClientUpdateContact,
                SyncBranch::UpdateClientCreateContact,
                SyncBranch::UpdateBoth,
            ] {
                println!("  {}: {}", branch, summary.branch_count(branch));
            }
            println!("Contacts awaiting client transfer: {}", summary.transfers_pending);
            println!("Companies pushed: {}", summary.companies_pushed);
        }
    }

    Ok(())
}

fn connect(config: &crmsync_common::config::TomlConfig) -> Result<Arc<dyn InesApi>> {
    let settings = resolve_ines_settings(config)?;
    info!(account = %settings.account, base_url = %settings.base_url, "Using Ines account");
    Ok(Arc::new(HttpInesApi::new(&settings)?))
}
