//! # Reminder System Bootstrap
//!
//! Wires configuration, the outbound client, the scheduler, the task store,
//! and the HTTP server into one running system with lifecycle management.
//!
//! ```rust,no_run
//! use reminder_core::bootstrap::ReminderSystem;
//! use reminder_core::config::ConfigManager;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let mut system = ReminderSystem::bootstrap(manager.config().clone()).await?;
//! // ... wait for a shutdown signal ...
//! system.stop().await?;
//! # Ok(())
//! # }
//! ```

use crate::channel::{Acknowledger, CompletionAcknowledger, DeliveryError, PushClient, TemplateAcknowledger};
use crate::config::ReminderConfig;
use crate::database::{run_migrations, InMemoryTaskStore, PgTaskStore, TaskStore};
use crate::error::{ReminderError, Result};
use crate::scheduler::{LineDispatcher, ReminderDispatcher, ReminderScheduler};
use crate::web::{self, state::AppState};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::constants::queue::DEFAULT_CONNECT_TIMEOUT_SECONDS;

/// Handle to a running reminder system
#[derive(Debug)]
pub struct ReminderSystem {
    pub config: Arc<ReminderConfig>,
    pub state: AppState,
    pub local_addr: SocketAddr,
    shutdown_sender: Option<oneshot::Sender<()>>,
    server_handle: Option<JoinHandle<std::io::Result<()>>>,
}

impl ReminderSystem {
    /// Build every component, start the scheduler, and begin serving HTTP
    pub async fn bootstrap(config: ReminderConfig) -> Result<Self> {
        let config = Arc::new(config);
        let addr = config.web.socket_addr()?;

        let state = build_state(&config).await?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let app = web::create_app(state.clone());

        let (shutdown_sender, shutdown_receiver) = oneshot::channel::<()>();
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_receiver.await;
                })
                .await
        });

        info!(
            address = %local_addr,
            mode = %state.scheduler.mode().await,
            "🌐 Reminder web server listening"
        );

        Ok(Self {
            config,
            state,
            local_addr,
            shutdown_sender: Some(shutdown_sender),
            server_handle: Some(server_handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.shutdown_sender.is_some()
    }

    /// Stop accepting requests, then shut the scheduler down. Later calls do
    /// nothing.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(sender) = self.shutdown_sender.take() else {
            return Ok(());
        };

        info!("🛑 Stopping reminder web server...");
        let _ = sender.send(());
        if let Some(handle) = self.server_handle.take() {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Web server exited with error: {}", e),
                Err(e) => error!("Web server task failed: {}", e),
            }
        }

        self.state.scheduler.shutdown().await?;
        info!("✅ Reminder system stopped");
        Ok(())
    }
}

/// Assemble the shared application state without binding a socket.
///
/// A scheduler that cannot start is fatal; its fallback policy has already
/// been applied by the time the error surfaces.
pub async fn build_state(config: &ReminderConfig) -> Result<AppState> {
    let push_client = PushClient::new(&config.channel)?;
    if config.channel.channel_secret.is_empty() {
        warn!("Channel secret is empty; webhook signatures will not verify");
    }

    let dispatcher: Arc<dyn ReminderDispatcher> = Arc::new(LineDispatcher::new(
        push_client.clone(),
        config.scheduler.closing_phrase.clone(),
    ));

    let scheduler = Arc::new(ReminderScheduler::new(config, dispatcher)?);
    scheduler.initialize().await?;

    let store = build_task_store(config).await?;
    let acknowledger = build_acknowledger(config)?;

    Ok(AppState {
        scheduler,
        store,
        push_client,
        acknowledger,
        channel_secret: Arc::from(config.channel.channel_secret.as_str()),
        default_offset_minutes: config.scheduler.default_offset_minutes,
        environment: config.environment.clone(),
    })
}

async fn build_task_store(config: &ReminderConfig) -> Result<Arc<dyn TaskStore>> {
    let connected = async {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS))
            .connect(&config.database.url)
            .await?;
        run_migrations(&pool).await?;
        Ok::<_, ReminderError>(pool)
    }
    .await;

    match connected {
        Ok(pool) => {
            info!("💾 Task store backed by PostgreSQL");
            Ok(Arc::new(PgTaskStore::new(pool)))
        }
        Err(e) if config.scheduler.enable_offline_fallback => {
            warn!(error = %e, "⚠️ Task database unavailable, keeping tasks in memory");
            Ok(Arc::new(InMemoryTaskStore::new()))
        }
        Err(e) => Err(e),
    }
}

fn build_acknowledger(config: &ReminderConfig) -> Result<Arc<dyn Acknowledger>> {
    let phrase = &config.scheduler.closing_phrase;
    if !config.acknowledgement.enabled {
        return Ok(Arc::new(TemplateAcknowledger::new(phrase.clone())));
    }

    let acknowledger = CompletionAcknowledger::new(&config.acknowledgement, phrase)
        .map_err(DeliveryError::from)?;
    info!(model = %config.acknowledgement.model, "💬 Generated acknowledgements enabled");
    Ok(Arc::new(acknowledger))
}
