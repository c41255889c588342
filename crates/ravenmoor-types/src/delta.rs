//! The partial state update type and a builder for assembling it.
//!
//! A [`StateDelta`] describes only the fields that changed. Values are
//! absolute replacements, not increments: an effect deducting 50 wood
//! writes `resources.wood = current - 50` and lets the merge layer clamp
//! the floor. Presentation-only keys ([`markers`]) ride along in the delta
//! for the host to read and are dropped by the typed merge.

use serde_json::{Map, Value};

use crate::log::LogEntry;
use crate::state::Timer;

/// A partial game state: top-level section name -> replacement or nested
/// partial record.
pub type StateDelta = Map<String, Value>;

/// Delta keys that carry presentation data rather than state.
///
/// The engine core never interprets these; hosts read them off the delta
/// before merging (a dialog to open, a sound to play, combat to start).
pub mod markers {
    /// A one-shot message for the presentation layer.
    pub const NOTICE: &str = "notice";
    /// Structured combat payload for the presentation layer.
    pub const COMBAT: &str = "combat";

    /// Whether a top-level delta key is a presentation marker.
    pub fn is_marker(key: &str) -> bool {
        key == NOTICE || key == COMBAT
    }
}

/// Insert `key = value` into the object stored at `delta[section]`,
/// creating the object as needed.
fn set_nested(delta: &mut StateDelta, section: &str, key: &str, value: Value) {
    let slot = delta
        .entry(section.to_owned())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(map) = slot {
        map.insert(key.to_owned(), value);
    } else {
        let mut map = Map::new();
        map.insert(key.to_owned(), value);
        *slot = Value::Object(map);
    }
}

/// Insert `key = value` two levels down, at `delta[outer][inner][key]`.
fn set_nested2(delta: &mut StateDelta, outer: &str, inner: &str, key: &str, value: Value) {
    let slot = delta
        .entry(outer.to_owned())
        .or_insert_with(|| Value::Object(Map::new()));
    if !matches!(slot, Value::Object(_)) {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(outer_map) = slot {
        let inner_slot = outer_map
            .entry(inner.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(inner_map) = inner_slot {
            inner_map.insert(key.to_owned(), value);
        } else {
            let mut inner_map = Map::new();
            inner_map.insert(key.to_owned(), value);
            *inner_slot = Value::Object(inner_map);
        }
    }
}

/// Fluent builder for [`StateDelta`] values used by authored effects.
///
/// Every setter writes an absolute value into the right section; nothing
/// here reads or mutates the canonical state.
#[derive(Debug, Clone, Default)]
pub struct DeltaBuilder {
    delta: StateDelta,
}

impl DeltaBuilder {
    /// Start an empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the absolute quantity of a resource.
    #[must_use]
    pub fn resource(mut self, name: &str, value: f64) -> Self {
        set_nested(&mut self.delta, "resources", name, Value::from(value));
        self
    }

    /// Set a count in one of the `u32`-valued sections (`buildings`,
    /// `villagers`, `weapons`, `clothing`).
    #[must_use]
    pub fn count(mut self, section: &str, name: &str, value: u32) -> Self {
        set_nested(&mut self.delta, section, name, Value::from(value));
        self
    }

    /// Set an ownership bit in one of the boolean sections (`tools`,
    /// `relics`, `blessings`, `books`, `schematics`).
    #[must_use]
    pub fn owned(mut self, section: &str, name: &str, value: bool) -> Self {
        set_nested(&mut self.delta, section, name, Value::from(value));
        self
    }

    /// Set a world flag.
    #[must_use]
    pub fn flag(mut self, name: &str, value: bool) -> Self {
        set_nested(&mut self.delta, "flags", name, Value::from(value));
        self
    }

    /// Set a story marker (boolean or numeric). Passing `false` revokes a
    /// marker -- rare, intentional, and allowed by the merge layer.
    #[must_use]
    pub fn seen(mut self, marker: &str, value: impl Into<Value>) -> Self {
        set_nested2(&mut self.delta, "story", "seen", marker, value.into());
        self
    }

    /// Set the absolute value of a character stat.
    #[must_use]
    pub fn stat(mut self, name: &str, value: f64) -> Self {
        set_nested(&mut self.delta, "stats", name, Value::from(value));
        self
    }

    /// Record a non-repeatable event as fired.
    #[must_use]
    pub fn triggered(mut self, event_id: &str) -> Self {
        set_nested(
            &mut self.delta,
            "triggered_events",
            event_id,
            Value::Bool(true),
        );
        self
    }

    /// Set an upgrade level two levels deep (`upgrades.<action>.<name>`).
    #[must_use]
    pub fn upgrade(mut self, action: &str, name: &str, level: u32) -> Self {
        set_nested2(&mut self.delta, "upgrades", action, name, Value::from(level));
        self
    }

    /// Replace a named timer.
    #[must_use]
    pub fn timer(mut self, name: &str, timer: &Timer) -> Self {
        let value = serde_json::to_value(timer).unwrap_or(Value::Null);
        set_nested(&mut self.delta, "timers", name, value);
        self
    }

    /// Replace the log wholesale (used by the resolver to prune entries).
    #[must_use]
    pub fn log(mut self, entries: &[LogEntry]) -> Self {
        let value = serde_json::to_value(entries).unwrap_or(Value::Array(Vec::new()));
        self.delta.insert("log".to_owned(), value);
        self
    }

    /// Attach a presentation notice (dropped by the merge).
    #[must_use]
    pub fn notice(mut self, message: &str) -> Self {
        self.delta
            .insert(markers::NOTICE.to_owned(), Value::from(message));
        self
    }

    /// Attach a structured combat payload (dropped by the merge).
    #[must_use]
    pub fn combat(mut self, payload: Value) -> Self {
        self.delta.insert(markers::COMBAT.to_owned(), payload);
        self
    }

    /// Escape hatch: set a top-level section to an arbitrary value.
    #[must_use]
    pub fn section(mut self, key: &str, value: Value) -> Self {
        self.delta.insert(key.to_owned(), value);
        self
    }

    /// Finish and return the assembled delta.
    pub fn build(self) -> StateDelta {
        self.delta
    }
}
