use anyhow::Result;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use knote::config::{Cli, Command, Config};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cmd = cli.command.unwrap_or(Command::Run);

    match cmd {
        Command::Run => run_server(cli.config).await,
        Command::Check => check(&cli.config).await,
    }
}

async fn run_server(config: Config) -> Result<()> {
    info!(
        version = knote::version::VERSION,
        db_url = %config.db_url,
        minio_endpoint = %config.minio_endpoint(),
        bucket = %config.minio_bucket,
        "connecting to backing stores"
    );

    let notes = knote::connect::connect_note_store(&config).await?;
    let blobs = knote::connect::connect_blob_store(&config).await?;

    let state = knote::http::AppState::new(notes, blobs, config.minio_bucket.clone());
    let app = knote::http::build_router(state, config.max_upload_bytes)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(bind = %config.bind, "starting knote");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn check(config: &Config) -> Result<()> {
    let mut failed = false;

    match knote::connect::check_note_store(config).await {
        Ok(()) => info!(db_url = %config.db_url, "note store reachable"),
        Err(err) => {
            error!(db_url = %config.db_url, error = %err, "note store unreachable");
            failed = true;
        }
    }

    match knote::connect::check_blob_store(config).await {
        Ok(()) => info!(
            endpoint = %config.minio_endpoint(),
            bucket = %config.minio_bucket,
            "blob store reachable"
        ),
        Err(err) => {
            error!(
                endpoint = %config.minio_endpoint(),
                bucket = %config.minio_bucket,
                error = %err,
                "blob store unreachable"
            );
            failed = true;
        }
    }

    if failed {
        anyhow::bail!("connectivity check failed");
    }
    println!("ok");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).compact().init();
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
