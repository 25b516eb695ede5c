//! Process startup: logging, store connection and the serve loop.
//!
//! ## Startup flow
//!
//! 1. [`init_tracing`] installs the subscriber (`RUST_LOG` wins over the
//!    configured level; JSON output when `logging.json` is set).
//! 2. [`connect_store`] opens the configured backend.
//! 3. [`run`] builds [`AppState`] on the system clock and serves until
//!    `Ctrl-C`.

use std::sync::Arc;

use nova_core::{ConfigError, GameConfig, LoggingConfig, StoreBackend, StoreConfig};
use nova_db::{DbError, StateStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::server::{ServerError, start_server};
use crate::state::{AppState, Clock};

/// Top-level error for the `nova-server` binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The state store could not be opened.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: DbError,
    },

    /// The HTTP server failed.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: ServerError,
    },
}

/// Install the global tracing subscriber.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Open the configured state store.
pub async fn connect_store(config: &StoreConfig) -> Result<StateStore, DbError> {
    match config.backend {
        StoreBackend::Memory => Ok(StateStore::memory(&config.key_prefix)),
        StoreBackend::Dragonfly => {
            info!(url = %config.dragonfly_url, "connecting to Dragonfly");
            StateStore::dragonfly(&config.dragonfly_url, &config.key_prefix).await
        }
    }
}

/// Serve the player API with `config` until shutdown.
pub async fn run(config: GameConfig) -> Result<(), AppError> {
    let store = connect_store(&config.store).await?;
    let global = store.load_or_init_global(config.universe.seed).await?;
    info!(
        store = store.backend_name(),
        seed = global.value.seed,
        galaxies = config.universe.galaxies,
        systems = config.universe.systems,
        npcs = global.value.npcs.len(),
        players = global.value.planets.values().filter(|p| p.is_home).count(),
        "galaxy loaded"
    );

    let server = config.server.clone();
    let state = Arc::new(AppState::new(config, store, Clock::System));
    start_server(&server, state).await?;
    Ok(())
}
