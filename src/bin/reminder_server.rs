//! # Reminder Server
//!
//! Runs the webhook receiver and the reminder scheduler as one service.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin reminder-server
//!
//! # Run with specific environment
//! REMINDER_ENV=production cargo run --bin reminder-server
//! ```

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};

use reminder_core::bootstrap::ReminderSystem;
use reminder_core::config::ConfigManager;
use reminder_core::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging first
    logging::init_structured_logging();

    info!("🚀 Starting Reminder Server...");
    info!("   Version: {}", env!("CARGO_PKG_VERSION"));

    let manager = ConfigManager::load().context("Failed to load configuration")?;
    info!("   Environment: {}", manager.environment());

    let mut system = ReminderSystem::bootstrap(manager.config().clone())
        .await
        .context("Failed to bootstrap reminder system")?;

    info!("🎉 Reminder Server started on {}", system.local_addr);
    info!("   Scheduler mode: {}", system.state.scheduler.mode().await);
    info!("   Press Ctrl+C to shutdown gracefully");

    shutdown_signal().await;

    info!("🛑 Shutdown signal received, initiating graceful shutdown...");
    if let Err(e) = system.stop().await {
        error!("Failed to stop reminder system cleanly: {}", e);
    }

    info!("👋 Reminder Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received SIGTERM");
        },
    }
}
