//! Typed engine configuration loaded from YAML.
//!
//! Every field carries a default, so an empty document is a valid
//! configuration and partial files override only what they name.

use std::path::Path;

use serde::Deserialize;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The document is not valid YAML for this schema.
    #[error("failed to parse config: {source}")]
    Yaml {
        /// The underlying parse error.
        #[from]
        source: serde_yml::Error,
    },
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// World and tick-loop settings.
    pub world: WorldConfig,
    /// Engine tunables.
    pub engine: EventEngineConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] when the document does not match the
    /// schema.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(contents)?)
    }
}

/// World and tick-loop settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Display name for the settlement.
    pub name: String,
    /// Seed for the deterministic scheduling RNG.
    pub seed: u64,
    /// Milliseconds between ticks.
    pub tick_interval_ms: u64,
    /// Tick rate used to convert minutes-pacing into per-tick
    /// probabilities. Should agree with `tick_interval_ms`.
    pub ticks_per_second: f64,
    /// Stop after this many ticks; zero means run until interrupted.
    pub max_ticks: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            ticks_per_second: default_ticks_per_second(),
            max_ticks: 0,
        }
    }
}

/// Engine tunables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventEngineConfig {
    /// Maximum narrative log entries kept in the state.
    pub log_retention: usize,
    /// Countdown applied to timed prompts that do not set their own.
    pub default_decision_time_ms: u64,
}

impl Default for EventEngineConfig {
    fn default() -> Self {
        Self {
            log_retention: default_log_retention(),
            default_decision_time_ms: default_decision_time_ms(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default tracing filter directive (overridden by `RUST_LOG`).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_world_name() -> String {
    "Ravenmoor".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    200
}

const fn default_ticks_per_second() -> f64 {
    5.0
}

const fn default_log_retention() -> usize {
    ravenmoor_types::LOG_RETENTION
}

const fn default_decision_time_ms() -> u64 {
    15_000
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_loop() {
        let config = EngineConfig::default();
        assert_eq!(config.world.tick_interval_ms, 200);
        assert_eq!(config.world.ticks_per_second, 5.0);
        assert_eq!(config.world.seed, 42);
        assert_eq!(config.engine.log_retention, 100);
        assert_eq!(config.engine.default_decision_time_ms, 15_000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_documents_keep_defaults_elsewhere() {
        let config = EngineConfig::parse(
            "world:\n  name: Blackfen\n  seed: 7\nlogging:\n  level: debug\n",
        )
        .unwrap();
        assert_eq!(config.world.name, "Blackfen");
        assert_eq!(config.world.seed, 7);
        assert_eq!(config.world.tick_interval_ms, 200);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.engine.log_retention, 100);
    }

    #[test]
    fn empty_document_is_all_defaults() {
        let config = EngineConfig::parse("{}").unwrap();
        assert_eq!(config.world.name, "Ravenmoor");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = EngineConfig::parse("world:\n  nam: typo\n");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
