//! The canonical game state tree.
//!
//! The engine treats most of this tree as opaque named sections: conditions
//! read it, effects emit partial deltas against it, and the merge layer
//! reconciles those deltas generically by key. Adding a new section here
//! requires no engine changes -- only the two deep-merge namespaces
//! (`story` and `upgrades`) are special-cased, and that list lives in the
//! merge layer, not here.
//!
//! # Invariants
//!
//! - Every value under `resources` is non-negative after any merge.
//! - `triggered_events` entries are never removed by normal play; a
//!   non-repeatable event recorded here is permanently suppressed.
//! - `log` holds at most the most recent [`LOG_RETENTION`] entries
//!   (host-enforced after each merge).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::log::LogEntry;

/// Maximum number of log entries retained in [`GameState::log`].
pub const LOG_RETENTION: usize = 100;

/// Per-feature countdown pair. The host restores `end_time` into the state
/// snapshot before any tick runs; the engine never persists timers itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timer {
    /// Whether the countdown is currently running.
    pub is_active: bool,
    /// Wall-clock millisecond timestamp at which the timer elapses.
    pub end_time: i64,
}

/// Numeric character attributes read by conditions and success hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    /// Physical power; scales combat outcomes.
    pub strength: f64,
    /// Learning; gates schematic and book events.
    pub knowledge: f64,
    /// Fortune; shifts probabilistic event pacing.
    pub luck: f64,
    /// Creeping dread; raised by ambient horrors.
    pub madness: f64,
}

/// Story progression markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Story {
    /// Marker name -> boolean or number. Markers are set and, by
    /// convention, never cleared -- a small number of authored effects
    /// intentionally revoke one to re-arm a follow-up event, so the merge
    /// layer must not enforce append-only here.
    pub seen: BTreeMap<String, Value>,
}

/// The persistent world state advanced by the simulation loop.
///
/// All mutation flows through the merge layer; the engine never writes to
/// a `GameState` directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    /// Resource name -> quantity. Non-negative after any merge.
    pub resources: BTreeMap<String, f64>,
    /// Building name -> count.
    pub buildings: BTreeMap<String, u32>,
    /// Occupation name -> villager count.
    pub villagers: BTreeMap<String, u32>,
    /// Tool name -> owned.
    pub tools: BTreeMap<String, bool>,
    /// Weapon name -> count.
    pub weapons: BTreeMap<String, u32>,
    /// Clothing name -> count.
    pub clothing: BTreeMap<String, u32>,
    /// Relic name -> recovered.
    pub relics: BTreeMap<String, bool>,
    /// Blessing name -> active.
    pub blessings: BTreeMap<String, bool>,
    /// Book name -> read.
    pub books: BTreeMap<String, bool>,
    /// Schematic name -> learned.
    pub schematics: BTreeMap<String, bool>,
    /// Boolean world flags.
    pub flags: BTreeMap<String, bool>,
    /// Story progression markers (deep-merged one extra level).
    pub story: Story,
    /// Character attributes.
    pub stats: Stats,
    /// Event id -> true for non-repeatable events that have fired.
    pub triggered_events: BTreeMap<String, bool>,
    /// Button/upgrade levels per action (deep-merged one extra level).
    pub upgrades: BTreeMap<String, BTreeMap<String, u32>>,
    /// Named per-feature timers.
    pub timers: BTreeMap<String, Timer>,
    /// Visible narrative log, most recent entries last.
    pub log: Vec<LogEntry>,
}

impl GameState {
    /// Quantity of a resource, zero when absent.
    pub fn resource(&self, name: &str) -> f64 {
        self.resources.get(name).copied().unwrap_or(0.0)
    }

    /// Whether a boolean flag is set.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Count of a building, zero when absent.
    pub fn building(&self, name: &str) -> u32 {
        self.buildings.get(name).copied().unwrap_or(0)
    }

    /// Total villager population across all occupations.
    pub fn villager_total(&self) -> u32 {
        self.villagers
            .values()
            .fold(0_u32, |total, count| total.saturating_add(*count))
    }

    /// Whether a story marker is set (boolean `true` or a non-zero number).
    pub fn seen(&self, marker: &str) -> bool {
        match self.story.seen.get(marker) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            _ => false,
        }
    }

    /// Numeric value of a story marker (`true` counts as 1, absent as 0).
    pub fn seen_number(&self, marker: &str) -> f64 {
        match self.story.seen.get(marker) {
            Some(Value::Bool(true)) => 1.0,
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Whether a non-repeatable event has already fired.
    pub fn has_triggered(&self, event_id: &str) -> bool {
        self.triggered_events.get(event_id).copied().unwrap_or(false)
    }

    /// Starting snapshot for a fresh game.
    pub fn new_game() -> Self {
        let mut state = Self::default();
        state.resources.insert("wood".to_owned(), 15.0);
        state.resources.insert("food".to_owned(), 30.0);
        state.resources.insert("stone".to_owned(), 0.0);
        state.villagers.insert("unemployed".to_owned(), 4);
        state.buildings.insert("hut".to_owned(), 1);
        state
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn absent_sections_read_as_zero_or_false() {
        let state = GameState::default();
        assert_eq!(state.resource("wood"), 0.0);
        assert!(!state.flag("starvation_active"));
        assert_eq!(state.building("hut"), 0);
        assert!(!state.seen("found_crow"));
        assert_eq!(state.seen_number("marsh_replies"), 0.0);
        assert!(!state.has_triggered("old_shrine"));
        assert_eq!(state.villager_total(), 0);
    }

    #[test]
    fn villager_total_sums_occupations() {
        let mut state = GameState::default();
        state.villagers.insert("hunter".to_owned(), 12);
        state.villagers.insert("builder".to_owned(), 8);
        state.villagers.insert("unemployed".to_owned(), 30);
        assert_eq!(state.villager_total(), 50);
    }

    #[test]
    fn seen_handles_boolean_and_numeric_markers() {
        let mut state = GameState::default();
        state
            .story
            .seen
            .insert("found_crow".to_owned(), Value::Bool(true));
        state
            .story
            .seen
            .insert("marsh_replies".to_owned(), Value::from(3));
        state
            .story
            .seen
            .insert("revoked".to_owned(), Value::Bool(false));

        assert!(state.seen("found_crow"));
        assert!(state.seen("marsh_replies"));
        assert_eq!(state.seen_number("marsh_replies"), 3.0);
        assert!(!state.seen("revoked"));
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = GameState::new_game();
        let json = serde_json::to_value(&state).unwrap();
        let back: GameState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn deserialize_tolerates_missing_sections() {
        // Host save layers may carry partial snapshots from older versions.
        let state: GameState =
            serde_json::from_str(r#"{"resources":{"wood":5.0}}"#).unwrap();
        assert_eq!(state.resource("wood"), 5.0);
        assert!(state.log.is_empty());
    }
}
