//! Configuration loading and typed config structures for Nova.
//!
//! The canonical configuration lives in `nova-config.yaml` at the project
//! root. Game tuning sections are owned by the crates that read them
//! (`nova-world`, `nova-agents`) and embedded here; this module adds the
//! server, store and logging sections and the loader.

use std::path::Path;

use nova_agents::{CombatConfig, MissionConfig, NpcConfig, Ruleset};
use nova_world::{EconomyConfig, GameCatalog, UniverseConfig, WorldEventConfig};
use serde::Deserialize;
use tracing::warn;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
///
/// Mirrors the structure of `nova-config.yaml`. Every section defaults, so
/// an empty file yields a playable universe.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Seed, dimensions and speed of the universe.
    #[serde(default)]
    pub universe: UniverseConfig,

    /// Production, storage and starting-stock tuning.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Battle tuning.
    #[serde(default)]
    pub combat: CombatConfig,

    /// Fleet travel and mission outcome tuning.
    #[serde(default)]
    pub missions: MissionConfig,

    /// NPC evolution tuning.
    #[serde(default)]
    pub npc: NpcConfig,

    /// World-event timers and payloads.
    #[serde(default)]
    pub world_events: WorldEventConfig,

    /// HTTP listener.
    #[serde(default)]
    pub server: ServerConfig,

    /// State store backend.
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override connection settings:
    /// - `DRAGONFLY_URL` overrides `store.dragonfly_url`
    /// - `NOVA_PORT` overrides `server.port`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override connection settings with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DRAGONFLY_URL") {
            self.store.dragonfly_url = val;
        }
        if let Ok(val) = std::env::var("NOVA_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %val, "ignoring unparsable NOVA_PORT"),
            }
        }
    }

    /// Borrow every tuning section together with `catalog`.
    pub fn ruleset<'a>(&'a self, catalog: &'a dyn GameCatalog) -> Ruleset<'a> {
        Ruleset {
            catalog,
            universe: &self.universe,
            economy: &self.economy,
            combat: &self.combat,
            missions: &self.missions,
            npc: &self.npc,
            events: &self.world_events,
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which state store to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local maps; state is lost on restart.
    #[default]
    Memory,
    /// Dragonfly (Redis protocol).
    Dragonfly,
}

/// State store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Dragonfly (Redis-compatible) URL.
    #[serde(default = "default_dragonfly_url")]
    pub dragonfly_url: String,

    /// Prefix for every key written by the game.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Attempts at a read-advance-write cycle before giving up on a
    /// version conflict.
    #[serde(default = "default_cas_attempts")]
    pub cas_attempts: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            dragonfly_url: default_dragonfly_url(),
            key_prefix: default_key_prefix(),
            cas_attempts: default_cas_attempts(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is
    /// unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

fn default_dragonfly_url() -> String {
    "redis://localhost:6379".to_owned()
}

fn default_key_prefix() -> String {
    "nova".to_owned()
}

const fn default_cas_attempts() -> u32 {
    3
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_playable() {
        let config = GameConfig::default();
        assert_eq!(config.universe.seed, 42);
        assert_eq!(config.economy.message_cap, 200);
        assert_eq!(config.npc.max_cycles_per_catch_up, 48);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.cas_attempts, 3);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
universe:
  seed: 7
  galaxies: 2
  systems: 50
  economy_speed: 4.0

economy:
  starting_metal: 1000
  protected_fraction: 0.2

combat:
  loot_fraction: 0.4

missions:
  exploration_hold_secs: 600

npc:
  attack_probability: 0.1

world_events:
  check_interval_secs: 600
  merchant:
    trigger_probability: 0.5

server:
  port: 9090

store:
  backend: dragonfly
  key_prefix: "test"

logging:
  level: "debug"
  json: true
"#;
        let config = GameConfig::parse(yaml).unwrap();
        assert_eq!(config.universe.seed, 7);
        assert_eq!(config.universe.positions, 15);
        assert_eq!(config.economy.starting_metal, 1000);
        assert_eq!(config.missions.exploration_hold_secs, 600);
        assert_eq!(config.world_events.check_interval_secs, 600);
        assert_eq!(config.world_events.merchant.cooldown_secs, 6 * 3600);
        assert_eq!(config.store.backend, StoreBackend::Dragonfly);
        assert_eq!(config.store.key_prefix, "test");
        assert!(config.logging.json);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(GameConfig::parse("").is_ok());
        assert!(GameConfig::parse("universe: [").is_err());
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("nova-config.yaml");
        if path.exists() {
            let config = GameConfig::from_file(&path);
            assert!(config.is_ok(), "failed to load project config: {config:?}");
        }
    }
}
