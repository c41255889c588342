//! Narrative log entries and the choice data captured with them.
//!
//! A [`LogEntry`] is created by the event manager at trigger time and lives
//! in `GameState::log` until a choice resolves it (the resolver filters it
//! out) or it ages past the retention cap. The `choices` snapshot is copied
//! at trigger time so later catalog changes can never alter an
//! already-presented prompt.

use serde::{Deserialize, Serialize};

use crate::delta::StateDelta;
use crate::state::GameState;

/// Category tag attached to each log entry, consumed by the presentation
/// layer to pick styling. Never alters engine behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// Narrative story beat.
    Story,
    /// Urgent crisis prompt (starvation, raids, plague).
    Crisis,
    /// Trading prompt from a wandering merchant.
    Merchant,
    /// Engine- or host-generated notice.
    #[default]
    System,
}

/// Structured trade data carried by generated merchant choices.
///
/// Affordability checks and the trade effect read these fields directly;
/// nothing ever re-derives amounts from the rendered label or cost text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeTerms {
    /// Resource credited to the player.
    pub give_resource: String,
    /// Quantity credited.
    pub give_amount: f64,
    /// Resource debited from the player.
    pub cost_resource: String,
    /// Quantity debited.
    pub cost_amount: f64,
}

impl TradeTerms {
    /// Settle the trade against the current state, producing a delta with
    /// the new absolute values of both resources.
    ///
    /// The debit is computed optimistically -- the merge layer clamps a
    /// negative result up to zero, matching how authored effects deduct
    /// without re-checking affordability.
    pub fn settle(&self, state: &GameState) -> StateDelta {
        let credited = state.resource(&self.give_resource) + self.give_amount;
        let debited = state.resource(&self.cost_resource) - self.cost_amount;

        let mut resources = StateDelta::new();
        resources.insert(self.give_resource.clone(), serde_json::Value::from(credited));
        resources.insert(self.cost_resource.clone(), serde_json::Value::from(debited));

        let mut delta = StateDelta::new();
        delta.insert(
            "resources".to_owned(),
            serde_json::Value::Object(resources),
        );
        delta
    }
}

/// Snapshot of one presented choice, captured at trigger time.
///
/// Labels and costs are resolved to plain strings here; the effect function
/// stays in the catalog (looked up by `id`), except for trade choices whose
/// semantics travel with them as [`TradeTerms`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceSnapshot {
    /// Stable choice identifier within the event.
    pub id: String,
    /// Display label, resolved against the state at trigger time.
    pub label: String,
    /// Optional display-only cost string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
    /// Structured trade data for generated merchant offers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade: Option<TradeTerms>,
}

/// Timed-choice contract mirrored from the event definition onto the entry.
///
/// The host owns the actual countdown; on expiry it resolves the prompt
/// with `fallback_choice_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedPrompt {
    /// Countdown duration in wall-clock milliseconds.
    pub base_decision_time_ms: u64,
    /// Choice id the host submits when the countdown elapses.
    pub fallback_choice_id: String,
}

/// One visible narrative log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Globally unique per firing: `<event_id>-<timestamp_ms>`.
    pub id: String,
    /// The catalog event that produced this entry.
    pub event_id: String,
    /// Optional heading shown above the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Narrative body text, resolved at trigger time.
    pub message: String,
    /// Wall-clock millisecond timestamp of the firing.
    pub timestamp: i64,
    /// Presentation category.
    #[serde(default)]
    pub kind: LogKind,
    /// Choices captured at trigger time. Immutable once created.
    #[serde(default)]
    pub choices: Vec<ChoiceSnapshot>,
    /// Present when the prompt auto-resolves on a countdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timed: Option<TimedPrompt>,
}

impl LogEntry {
    /// Build the unique entry identifier for one firing of an event.
    pub fn entry_id(event_id: &str, timestamp_ms: i64) -> String {
        format!("{event_id}-{timestamp_ms}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn entry_id_combines_event_and_timestamp() {
        assert_eq!(LogEntry::entry_id("starvation", 1700), "starvation-1700");
    }

    #[test]
    fn settle_credits_give_and_debits_cost() {
        let mut state = GameState::default();
        state.resources.insert("wood".to_owned(), 100.0);
        state.resources.insert("fur".to_owned(), 25.0);

        let terms = TradeTerms {
            give_resource: "wood".to_owned(),
            give_amount: 500.0,
            cost_resource: "fur".to_owned(),
            cost_amount: 10.0,
        };
        let delta = terms.settle(&state);

        let resources = delta.get("resources").unwrap().as_object().unwrap();
        assert_eq!(resources.get("wood").unwrap().as_f64().unwrap(), 600.0);
        assert_eq!(resources.get("fur").unwrap().as_f64().unwrap(), 15.0);
    }

    #[test]
    fn settle_is_optimistic_about_affordability() {
        // Debit may go negative here; the merge layer clamps it to zero.
        let mut state = GameState::default();
        state.resources.insert("stone".to_owned(), 3.0);

        let terms = TradeTerms {
            give_resource: "iron".to_owned(),
            give_amount: 1.0,
            cost_resource: "stone".to_owned(),
            cost_amount: 10.0,
        };
        let delta = terms.settle(&state);

        let resources = delta.get("resources").unwrap().as_object().unwrap();
        assert_eq!(resources.get("stone").unwrap().as_f64().unwrap(), -7.0);
    }

    #[test]
    fn log_entry_round_trips_through_json() {
        let entry = LogEntry {
            id: LogEntry::entry_id("stranger_at_gate", 42),
            event_id: "stranger_at_gate".to_owned(),
            title: Some("A knock at the gate".to_owned()),
            message: "A hooded figure waits outside.".to_owned(),
            timestamp: 42,
            kind: LogKind::Story,
            choices: vec![ChoiceSnapshot {
                id: "welcome".to_owned(),
                label: "Open the gate".to_owned(),
                cost: None,
                trade: None,
            }],
            timed: Some(TimedPrompt {
                base_decision_time_ms: 15_000,
                fallback_choice_id: "gates_stay_shut".to_owned(),
            }),
        };

        let json = serde_json::to_value(&entry).unwrap();
        let back: LogEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
