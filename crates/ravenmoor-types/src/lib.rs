//! Shared type definitions for the Ravenmoor narrative engine.
//!
//! Covers the canonical [`GameState`] tree, the visible narrative log
//! ([`LogEntry`] and its captured [`ChoiceSnapshot`]s), and the partial
//! state update type ([`StateDelta`]) that event effects produce and the
//! engine merges back into the canonical state.
//!
//! # Modules
//!
//! - [`state`] -- the game state tree and its section types.
//! - [`log`] -- narrative log entries, choice snapshots, trade terms.
//! - [`delta`] -- the partial-update type and the [`DeltaBuilder`].
//!
//! [`DeltaBuilder`]: delta::DeltaBuilder

pub mod delta;
pub mod log;
pub mod state;

pub use delta::{markers, DeltaBuilder, StateDelta};
pub use log::{ChoiceSnapshot, LogEntry, LogKind, TimedPrompt, TradeTerms};
pub use state::{GameState, Stats, Story, Timer, LOG_RETENTION};
