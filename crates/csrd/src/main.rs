//! `csrd`: the content-screening and URL-risk daemon binary (C2, C3, C13).
//!
//! Wires the library crates' collaborators together behind [`AppState`]
//! and drives the socket event loop. No logic lives here beyond argument
//! parsing, collaborator construction, and the accept loop — everything
//! else is `csr-core`/`csr-wire`/`csr-store`/`csr-engine`/`csr-fs`/
//! `csr-worker`/`csr-prompt` (design note "Global state": every
//! collaborator below is an explicit value, not an implicit singleton).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use csr_core::{
    AccessControl, CsrConfig, PackageManager, StaticPrivilegeResolver, UnsupportedPackageManager,
};
use csr_engine::{ContentEngineHandle, ContentEngineLibrary, EngineLifecycle, WebEngineHandle, WebEngineLibrary};
use csr_fs::Visitor;
use csr_prompt::PromptClient;
use csr_store::Store;
use csr_worker::Pool;

use csrd::dispatcher::AppState;
use csrd::job::JobRegistry;
use csrd::{eventloop, socket};

#[derive(Parser)]
#[command(name = "csrd")]
#[command(about = "Content-screening and web-protection daemon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon in the foreground (the supervised-process entry
    /// point; the supervising init system handles backgrounding/restart).
    Run {
        #[arg(short, long, default_value = "/etc/csr/csrd.toml")]
        config: PathBuf,
    },
    /// Parse and sanity-check a config file without binding any socket.
    CheckConfig {
        #[arg(short, long, default_value = "/etc/csr/csrd.toml")]
        config: PathBuf,
    },
    /// Drop and recreate the persistence store.
    ResetDb {
        #[arg(short, long, default_value = "/etc/csr/csrd.toml")]
        config: PathBuf,
    },
}

fn install_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    install_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => run(&config).await,
        Commands::CheckConfig { config } => check_config(&config),
        Commands::ResetDb { config } => reset_db(&config),
    }
}

fn check_config(path: &PathBuf) -> anyhow::Result<()> {
    let config = CsrConfig::load(path)?;
    config.validate()?;
    println!("{} is valid", path.display());
    Ok(())
}

fn reset_db(path: &PathBuf) -> anyhow::Result<()> {
    let config = CsrConfig::load(path)?;
    let store = Store::open(config.store.db_path())?;
    store.reset_database()?;
    println!("reset database at {}", config.store.db_path().display());
    Ok(())
}

async fn run(config_path: &PathBuf) -> anyhow::Result<()> {
    let config = CsrConfig::load(config_path)?;
    config.validate()?;

    let store = Arc::new(Store::open(config.store.db_path())?);

    let content_engine = ContentEngineLibrary::open(&config.engine.content_library)?;
    content_engine.global_initialize(&config.engine.ro_resource_dir, &config.engine.rw_work_dir)?;
    let content_engine: Arc<dyn ContentEngineHandle> = Arc::new(content_engine);

    let web_engine = WebEngineLibrary::open(&config.engine.web_library)?;
    web_engine.global_initialize(&config.engine.ro_resource_dir, &config.engine.rw_work_dir)?;
    let web_engine: Arc<dyn WebEngineHandle> = Arc::new(web_engine);

    let visitor = Arc::new(Visitor::default());
    let prompt = Arc::new(PromptClient::new(config.socket.prompt_path.clone()));
    let package_manager: Arc<dyn PackageManager> = Arc::new(UnsupportedPackageManager);
    let access = Arc::new(AccessControl::new(StaticPrivilegeResolver::default()));
    let pool = Arc::new(Pool::new(config.worker.into()));
    let jobs = Arc::new(JobRegistry::new());

    let state = AppState {
        store,
        content_engine,
        web_engine,
        visitor,
        prompt,
        package_manager,
        access,
        pool,
        jobs,
    };

    let endpoints = socket::bind_all(&config.socket)?;
    info!(
        min_workers = config.worker.min_workers,
        max_workers = config.worker.max_workers,
        idle_timeout_secs = config.socket.idle_timeout_secs,
        "csrd starting"
    );

    eventloop::run(state, endpoints, Duration::from_secs(config.socket.idle_timeout_secs)).await;

    warn!("event loop exited, shutting down");
    Ok(())
}
