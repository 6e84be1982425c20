//! EPIC Events CRM server.
//!
//! ```bash
//! epic-server --config config/epic.yaml init-db
//! epic-server --config config/epic.yaml load-db --fixtures fixtures/epic.yaml
//! epic-server --config config/epic.yaml run
//! ```

mod config;
mod logging;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use crm::CrmModule;
use crm::infra::fixtures::{self, FixtureSet};
use crm_db::{Db, connect_db};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "epic-server", version, about = "EPIC Events CRM backend")]
struct Cli {
    /// YAML configuration file; `EPIC_*` environment variables override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the REST API.
    Run,
    /// Wipe all data and recreate groups, permissions and event statuses.
    InitDb,
    /// Load a YAML or JSON fixture set into an initialized database.
    LoadDb {
        #[arg(long)]
        fixtures: PathBuf,
    },
    /// Print the resolved configuration and exit.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    if matches!(cli.command, Command::Check) {
        println!("{config:#?}");
        return Ok(());
    }

    logging::init(&config.logging).context("failed to initialize logging")?;
    let db = connect(&config).await?;
    let module = CrmModule::init(db, &config.crm)
        .await
        .context("failed to initialize CRM module")?;

    match cli.command {
        Command::Run => serve(&config, &module).await,
        Command::InitDb => init_db(module.db()).await,
        Command::LoadDb { fixtures } => load_db(module.db(), &fixtures).await,
        Command::Check => Ok(()),
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<Db> {
    connect_db(&config.database.dsn, &config.database.connect_opts())
        .await
        .context("failed to connect to database")
}

async fn serve(config: &AppConfig, module: &CrmModule) -> anyhow::Result<()> {
    let router = module.router()?;
    let listener = TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    info!(addr = %config.server.bind_addr, "EPIC CRM listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("EPIC CRM stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
}

async fn init_db(db: &Db) -> anyhow::Result<()> {
    fixtures::initialize(db)
        .await
        .context("failed to wipe database")?;
    fixtures::seed_authorization(db)
        .await
        .context("failed to seed groups and permissions")?;
    info!("Database initialized");
    Ok(())
}

async fn load_db(db: &Db, path: &std::path::Path) -> anyhow::Result<()> {
    let set = FixtureSet::from_path(path)?;
    fixtures::load(db, &set)
        .await
        .with_context(|| format!("failed to load fixtures from {}", path.display()))?;
    info!(
        users = set.users.len(),
        clients = set.clients.len(),
        contracts = set.contracts.len(),
        events = set.events.len(),
        "Fixtures loaded"
    );
    Ok(())
}
