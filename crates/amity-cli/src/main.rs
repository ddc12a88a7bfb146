//! Amity CLI - Command line interface for the relationship graph

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use amity_engine::{QueryEngine, RelationshipEngine};
use amity_storage::SqliteStorage;
use commands::{admin, completions, friend, notify};
use config::Config;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "amity")]
#[command(author, version, about = "Friends, subscriptions and blocks between email identities")]
pub struct Cli {
    /// Data directory
    #[arg(short, long, global = true)]
    pub data_dir: Option<String>,

    /// Output format: table, json
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the data directory path, preferring the flag over configuration
    pub fn data_dir(&self, config: &Config) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| config.data_dir.clone())
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from(self.format.as_str())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage friend connections
    Friend(friend::FriendArgs),
    /// Manage subscriptions, blocks and update recipients
    Notify(notify::NotifyArgs),
    /// Run schema migrations and exit
    Migrate,
    /// Report version, server time and store health
    Health,
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

/// Application context with storage backend and engines
pub struct AppContext {
    pub storage: Arc<SqliteStorage>,
    pub relations: RelationshipEngine<SqliteStorage>,
    pub queries: QueryEngine<SqliteStorage>,
}

impl AppContext {
    pub async fn new(cli: &Cli, config: &Config) -> anyhow::Result<Self> {
        let data_dir = cli.data_dir(config);
        std::fs::create_dir_all(&data_dir)?;

        let db_path = data_dir.join(&config.database_file);
        tracing::debug!("Using database at: {:?}", db_path);

        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        let storage = Arc::new(SqliteStorage::open_with_timeout(&db_path, busy_timeout)?);

        Ok(Self {
            relations: RelationshipEngine::new(storage.clone()),
            queries: QueryEngine::new(storage.clone()),
            storage,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => config.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting amity CLI");

    // Commands that never touch the store
    match &cli.command {
        Commands::Completions(args) => {
            completions::run(args)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Config(args) => return commands::config::run(args),
        _ => {}
    }

    let ctx = AppContext::new(&cli, &config).await?;

    let code = match &cli.command {
        Commands::Friend(args) => friend::run(args, &cli, &ctx).await?,
        Commands::Notify(args) => notify::run(args, &cli, &ctx).await?,
        Commands::Migrate => admin::migrate(&cli, &ctx).await?,
        Commands::Health => admin::health(&cli, &ctx).await?,
        Commands::Completions(_) | Commands::Config(_) => ExitCode::SUCCESS,
    };

    Ok(code)
}
