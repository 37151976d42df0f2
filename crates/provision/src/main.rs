use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ken_provision::config::ProvisionConfig;
use ken_provision::reaper;

#[derive(Debug, Parser)]
#[command(name = "ken-provision", version, about = "Provision and maintain the chat store schema")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create any missing tables, types, triggers and indexes (default).
    Provision,
    /// Compare the live schema with the expected contract without changing it.
    Check,
    /// Delete expired and redeemed password reset tokens.
    PurgeTokens {
        /// Keep running and purge on a fixed interval until interrupted.
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ken_provision=info,ken_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // --- Configuration ---
    let config = ProvisionConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        pool_size = config.pool_size,
        create_database = config.create_database,
        "Loaded provisioning configuration"
    );

    // --- Database ---
    if config.create_database {
        ken_db::schema::ensure_database(&config.database_url)
            .await
            .context("Failed to ensure database exists")?;
    }

    let pool = ken_db::create_pool(&config.database_url, config.pool_size)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    ken_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    match cli.command.unwrap_or(Command::Provision) {
        Command::Provision => {
            ken_db::schema::apply(&pool)
                .await
                .context("Schema provisioning failed")?;
            ken_db::schema::verify(&pool)
                .await
                .context("Provisioned schema does not match the contract")?;
            tracing::info!("Schema provisioned and verified");
        }
        Command::Check => {
            ken_db::schema::verify(&pool)
                .await
                .context("Schema check failed")?;
            tracing::info!("Schema matches the contract");
        }
        Command::PurgeTokens { watch: false } => {
            let deleted = reaper::purge_once(&pool, config.retention_hours)
                .await
                .context("Token purge failed")?;
            tracing::info!(deleted, "Token purge complete");
        }
        Command::PurgeTokens { watch: true } => {
            let cancel = CancellationToken::new();
            let handle = tokio::spawn(reaper::run(
                pool.clone(),
                config.purge_interval,
                config.retention_hours,
                cancel.clone(),
            ));

            shutdown_signal().await;
            cancel.cancel();
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
            tracing::info!("Token reaper shut down");
        }
    }

    pool.close().await;
    Ok(())
}

/// Wait for SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), stopping"),
        () = terminate => tracing::info!("Received SIGTERM, stopping"),
    }
}
