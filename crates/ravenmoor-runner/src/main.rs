//! Reference tick loop binary for the Ravenmoor narrative engine.
//!
//! Wires the authored catalog, the typed configuration, and a [`GameHost`]
//! into a fixed-interval loop: every tick the host expires due prompts and
//! runs one scheduling pass, and anything noteworthy (fired events,
//! expiries, faults, notices) lands in the structured log.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `ravenmoor-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build and validate the event catalog
//! 4. Create the game host with a fresh game
//! 5. Run the tick loop until `max_ticks` or Ctrl-C

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ravenmoor_core::{EngineConfig, GameHost};
use ravenmoor_events::content::default_catalog;

/// Default configuration path, next to the binary's working directory.
const CONFIG_PATH: &str = "ravenmoor-config.yaml";

/// Application entry point.
///
/// Loads configuration, initializes logging, validates the catalog, and
/// drives the tick loop.
///
/// # Errors
///
/// Returns an error if configuration or catalog loading fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config comes first so its logging level can seed the filter;
    // RUST_LOG still wins when set.
    let (config, config_found) = load_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with_target(true)
        .init();

    info!("ravenmoor-runner starting");
    if !config_found {
        info!(path = CONFIG_PATH, "no config file found, using defaults");
    }
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        ticks_per_second = config.world.ticks_per_second,
        max_ticks = config.world.max_ticks,
        "configuration loaded"
    );

    let catalog = Arc::new(default_catalog()?);
    info!(event_count = catalog.len(), "event catalog validated");

    let mut host = GameHost::new(catalog, &config);
    info!("game host initialized, entering tick loop");

    run_loop(&mut host, &config).await;

    info!(
        log_entries = host.state().log.len(),
        open_prompts = host.open_prompt_ids().len(),
        "ravenmoor-runner stopped"
    );
    Ok(())
}

/// Load configuration, falling back to defaults when no file is present.
/// The boolean reports whether a file was actually read.
fn load_config() -> Result<(EngineConfig, bool), ravenmoor_core::ConfigError> {
    if Path::new(CONFIG_PATH).exists() {
        Ok((EngineConfig::from_file(CONFIG_PATH)?, true))
    } else {
        Ok((EngineConfig::default(), false))
    }
}

/// Drive the host at the configured interval until the tick budget runs
/// out or the process is interrupted.
async fn run_loop(host: &mut GameHost, config: &EngineConfig) {
    let mut interval =
        tokio::time::interval(Duration::from_millis(config.world.tick_interval_ms.max(1)));
    let max_ticks = config.world.max_ticks;
    let mut ticks = 0_u64;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now_ms = Utc::now().timestamp_millis();
                match host.run_tick(now_ms) {
                    Ok(report) => {
                        if let Some(event_id) = &report.fired {
                            info!(tick = report.tick, event_id = %event_id, "event fired");
                        }
                        for entry_id in &report.expired_prompts {
                            info!(tick = report.tick, entry_id = %entry_id, "timed prompt expired");
                        }
                        if let Some(event_id) = &report.faulted {
                            tracing::warn!(tick = report.tick, event_id = %event_id, "tick discarded after effect fault");
                        }
                        for notice in &report.notices {
                            info!(tick = report.tick, notice = %notice, "notice");
                        }
                    }
                    Err(error) => {
                        tracing::error!(error = %error, "tick failed, stopping");
                        return;
                    }
                }

                ticks = ticks.saturating_add(1);
                if max_ticks > 0 && ticks >= max_ticks {
                    info!(ticks, "tick budget reached");
                    return;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                return;
            }
        }
    }
}
