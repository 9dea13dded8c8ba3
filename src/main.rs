use clap::Parser;
use hovertask::application::lifecycle::TaskLifecycle;
use hovertask::application::payments::{PaymentOrchestrator, PaymentPolicy};
use hovertask::application::settlement::SettlementEngine;
use hovertask::config::Config;
use hovertask::domain::ports::{DepositStore, LedgerStore, OrderStore, TaskStore};
use hovertask::infrastructure::in_memory::MemoryStore;
use hovertask::infrastructure::media::DiskMediaStore;
use hovertask::infrastructure::notify::LogNotifier;
use hovertask::infrastructure::paystack::PaystackGateway;
use hovertask::interfaces::http::{router, AppState};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(long)]
    bind: Option<String>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,
}

fn build_state<S>(store: S, config: &Config) -> Result<AppState, hovertask::error::Error>
where
    S: TaskStore + LedgerStore + OrderStore + DepositStore + Clone + 'static,
{
    let media = DiskMediaStore::new(&config.media.root, config.media.public_base.clone());
    let gateway = PaystackGateway::new(&config.gateway)?;

    let lifecycle = TaskLifecycle::new(Box::new(store.clone()), Box::new(media));
    let settlement = Arc::new(SettlementEngine::new(
        Box::new(store.clone()),
        Box::new(store.clone()),
    ));
    let payments = PaymentOrchestrator::new(
        Box::new(store),
        Box::new(gateway),
        Box::new(LogNotifier),
        settlement.clone(),
        PaymentPolicy {
            minimum_deposit: config.gateway.minimum_deposit,
            callback_url: config.gateway.callback_url.clone(),
        },
    );

    Ok(AppState {
        lifecycle: Arc::new(lifecycle),
        settlement,
        payments: Arc::new(payments),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path).into_diagnostic()?,
        None => Config::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
        config.validate().into_diagnostic()?;
    }

    #[cfg(feature = "storage-rocksdb")]
    let state = if let Some(db_path) = cli.db_path {
        let store =
            hovertask::infrastructure::rocksdb::RocksStore::open(db_path).into_diagnostic()?;
        build_state(store, &config).into_diagnostic()?
    } else {
        build_state(MemoryStore::new(), &config).into_diagnostic()?
    };
    #[cfg(not(feature = "storage-rocksdb"))]
    let state = build_state(MemoryStore::new(), &config).into_diagnostic()?;

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .into_diagnostic()?;
    info!(bind = %config.server.bind, "hovertask core listening");
    axum::serve(listener, app).await.into_diagnostic()?;

    Ok(())
}
