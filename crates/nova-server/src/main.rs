//! `nova-server` binary.
//!
//! Loads `nova-config.yaml` (or the file named by `NOVA_CONFIG`), starts
//! logging and serves the player API.

use std::path::PathBuf;

use nova_core::GameConfig;
use nova_server::startup::{self, AppError};
use tracing::{info, warn};

/// Default configuration path, relative to the working directory.
const DEFAULT_CONFIG: &str = "nova-config.yaml";

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let path = std::env::var("NOVA_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let (config, missing) = if path.exists() {
        (GameConfig::from_file(&path)?, false)
    } else {
        (GameConfig::parse("")?, true)
    };

    startup::init_tracing(&config.logging);
    if missing {
        warn!(path = %path.display(), "config file not found, using defaults");
    }
    info!(
        path = %path.display(),
        seed = config.universe.seed,
        port = config.server.port,
        store = ?config.store.backend,
        "nova-server starting"
    );

    startup::run(config).await
}
