use clap::Parser;
use kbnb::application::engine::ReservationEngine;
use kbnb::config::GatewayConfig;
use kbnb::domain::ports::ReservationStoreBox;
use kbnb::infrastructure::bootpay::BootpayGateway;
use kbnb::infrastructure::in_memory::{InMemoryDirectory, InMemoryReservationStore};
#[cfg(feature = "storage-rocksdb")]
use kbnb::infrastructure::rocksdb::RocksDBStore;
use kbnb::interfaces::csv::seed_reader::SeedReader;
use kbnb::interfaces::http::router;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "kbnb=info,tower_http=info";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address the REST API listens on
    #[arg(long, env = "KBNB_LISTEN", default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Rooms seed CSV file
    #[arg(long)]
    rooms: Option<PathBuf>,

    /// Users seed CSV file
    #[arg(long)]
    users: Option<PathBuf>,

    /// Path to persistent database (optional). Requires the `storage-rocksdb` feature.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Credentials are required; fail before binding anything.
    let gateway_config = GatewayConfig::from_env().into_diagnostic()?;
    info!(base_url = %gateway_config.base_url, "Payment gateway configured");
    let gateway = BootpayGateway::new(gateway_config).into_diagnostic()?;

    let directory = InMemoryDirectory::new();
    if let Some(path) = &cli.rooms {
        seed_rooms(&directory, path).await?;
    }
    if let Some(path) = &cli.users {
        seed_users(&directory, path).await?;
    }
    info!(
        rooms = directory.room_count().await,
        users = directory.user_count().await,
        "Directory loaded"
    );

    let engine = ReservationEngine::new(
        Box::new(directory.clone()),
        Box::new(directory),
        open_store(cli.db_path)?,
        Box::new(gateway),
    );

    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .into_diagnostic()?;
    info!(address = %cli.listen, "Listening");
    axum::serve(listener, router(Arc::new(engine)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(db_path: Option<PathBuf>) -> Result<ReservationStoreBox> {
    match db_path {
        Some(path) => {
            info!(path = %path.display(), "Using RocksDB reservation store");
            Ok(Box::new(RocksDBStore::open(path).into_diagnostic()?))
        }
        None => Ok(Box::new(InMemoryReservationStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(db_path: Option<PathBuf>) -> Result<ReservationStoreBox> {
    if let Some(path) = db_path {
        warn!(
            path = %path.display(),
            "Built without the storage-rocksdb feature; reservations are kept in memory"
        );
    }
    Ok(Box::new(InMemoryReservationStore::new()))
}

async fn seed_rooms(directory: &InMemoryDirectory, path: &Path) -> Result<()> {
    let file = File::open(path).into_diagnostic()?;
    for (row, room) in SeedReader::new(file).rooms().enumerate() {
        match room {
            Ok(room) => directory.add_room(room).await,
            Err(e) => warn!(path = %path.display(), row = row + 1, error = %e, "Skipping room row"),
        }
    }
    Ok(())
}

async fn seed_users(directory: &InMemoryDirectory, path: &Path) -> Result<()> {
    let file = File::open(path).into_diagnostic()?;
    for (row, user) in SeedReader::new(file).users().enumerate() {
        match user {
            Ok(user) => directory.add_user(user).await,
            Err(e) => warn!(path = %path.display(), row = row + 1, error = %e, "Skipping user row"),
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
