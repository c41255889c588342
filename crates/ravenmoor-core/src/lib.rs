//! The Ravenmoor engine proper: tick-driven event scheduling, choice
//! resolution, and generic state merging.
//!
//! Data flow per tick: the host supplies a state snapshot, the
//! [`EventManager`] selects at most one event to fire and returns new log
//! entries plus a partial delta, and [`merge`] folds the delta back into
//! the canonical state. Player (or timer) input flows through
//! [`apply_event_choice`] and then the same merge.
//!
//! # Modules
//!
//! - [`config`] -- typed engine configuration loaded from YAML.
//! - [`error`] -- engine error taxonomy.
//! - [`host`] -- reference host loop and timed-choice supervisor.
//! - [`manager`] -- the per-tick evaluation loop.
//! - [`merge`] -- the schema-agnostic partial-update reducer.
//! - [`resolver`] -- choice resolution, including the timed fallback path.
//!
//! [`EventManager`]: manager::EventManager
//! [`merge`]: merge::merge
//! [`apply_event_choice`]: resolver::apply_event_choice

pub mod config;
pub mod error;
pub mod host;
pub mod manager;
pub mod merge;
pub mod resolver;

pub use config::{ConfigError, EngineConfig};
pub use error::{EngineError, MergeError};
pub use host::{GameHost, TickReport};
pub use manager::{CheckOutcome, EventManager};
pub use merge::merge;
pub use resolver::apply_event_choice;
