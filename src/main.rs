//! Items API CLI - serve the item endpoints or write a starter config

use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;
use items_api::config::{self, ItemsConfig, DATABASE_URL_ENV};
use items_api::server;
use items_api::storage::connect_with_retry;
use items_api::ui::{self, Icons};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "items-api")]
#[command(version)]
#[command(about = "Minimal CRUD HTTP API for items backed by SQLite")]
#[command(long_about = r#"
Items API serves a single resource over HTTP:
  POST   /items/        create an item
  GET    /items/        list items (?skip=&limit=)
  GET    /items/{id}    fetch one item
  PUT    /items/{id}    partially update an item
  DELETE /items/{id}    delete an item

Example usage:
  items-api init --database-url sqlite://data/items.db
  items-api serve --port 8000
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the database and serve the HTTP API
    Serve {
        /// Path to the config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Connection string (overrides DATABASE_URL and the config file)
        #[arg(short, long)]
        database_url: Option<String>,

        /// Address to bind
        #[arg(long)]
        host: Option<IpAddr>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write a default config file
    Init {
        /// Path to the config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Connection string to store in the config
        #[arg(short, long)]
        database_url: Option<String>,

        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Serve { config, database_url, host, port } => {
            run_serve(config, database_url, host, port)
        }
        Commands::Init { config, database_url, force } => run_init(config, database_url, force),
    };

    if let Err(e) = &result {
        ui::error(&format!("{:#}", e));
    }
    result
}

fn run_serve(
    config_path: Option<PathBuf>,
    database_url: Option<String>,
    host: Option<IpAddr>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut config = config::load_config(config_path.as_deref())?;
    config.override_database_url(std::env::var(DATABASE_URL_ENV).ok());
    config.override_database_url(database_url);
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let source = config.data_source()?;
    let policy = config.retry_policy();
    let addr = config.socket_addr();

    ui::header("Items API");
    ui::status(Icons::GLOBE, "Listen", &addr.to_string());
    tracing::info!("Connecting to {} (up to {} attempts)", source, policy.attempts);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let database = connect_with_retry(&source, &policy).await?;
        let stored = database.session()?.count()?;
        ui::info("Items stored", &stored.to_string());
        server::start_server(addr, database).await
    })
}

fn run_init(
    config_path: Option<PathBuf>,
    database_url: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(config::default_config_path);
    let mut config = ItemsConfig::default();
    config.override_database_url(database_url);

    let source = config.data_source()?;
    config::ensure_db_dir(&source)?;
    if path.exists() && force {
        ui::warn(&format!("Overwriting {}", path.display()));
    }
    config::write_config(&path, &config, force)?;

    ui::section("Config");
    ui::status(Icons::FILE, "Written", &path.display().to_string());
    ui::status(Icons::DATABASE, "Database", &source.to_string());
    ui::success("Run `items-api serve` to start the API");
    Ok(())
}
