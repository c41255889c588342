//! Choice resolution.
//!
//! Resolves a selected (or timed-out) choice against the state the player
//! actually saw: the snapshot captured in the log entry takes precedence
//! over the catalog's current choice list, so a generated merchant offer
//! settles at the advertised terms even if the generator would roll
//! differently today.

use serde_json::Value;

use ravenmoor_events::{EventCatalog, EventChoice};
use ravenmoor_types::{ChoiceSnapshot, GameState, LogEntry, StateDelta};

use crate::error::EngineError;

/// Resolve a choice for an event and produce the delta to merge.
///
/// Lookup precedence:
///
/// 1. the snapshots captured in `current_entry` (what was presented);
/// 2. the event's fixed choice list;
/// 3. the event's fallback choice, matched by id.
///
/// A snapshot carrying trade terms settles from those terms. A snapshot
/// without terms resolves through the catalog effect of the same id. An
/// unknown event or choice id resolves to an empty delta -- stale clicks
/// from an already-pruned prompt are not errors.
///
/// When `current_entry` is given, the produced delta also rewrites the
/// log without that entry, so the answered prompt disappears in the same
/// merge that applies its consequences.
///
/// # Errors
///
/// Returns [`EngineError::Effect`] when the resolved effect faults, and
/// [`EngineError::LogSerialize`] if the pruned log cannot be serialized.
pub fn apply_event_choice(
    catalog: &EventCatalog,
    state: &GameState,
    choice_id: &str,
    event_id: &str,
    current_entry: Option<&LogEntry>,
) -> Result<StateDelta, EngineError> {
    let Some(def) = catalog.get(event_id) else {
        tracing::debug!(event_id, choice_id, "choice for unknown event ignored");
        return Ok(StateDelta::new());
    };

    let snapshot = current_entry
        .map(|entry| entry.choices.as_slice())
        .filter(|choices| !choices.is_empty())
        .map_or_else(
            || def.fixed_choice(choice_id).map(|c| c.snapshot(state)),
            |choices| choices.iter().find(|c| c.id == choice_id).cloned(),
        );

    let catalog_choice = def
        .fixed_choice(choice_id)
        .or_else(|| fallback_by_id(def.fallback_choice.as_ref(), choice_id));

    let mut delta = match (snapshot, catalog_choice) {
        // Structured trades settle from the terms the player saw.
        (Some(snap), _) if snap.trade.is_some() => resolve_trade(&snap, state),
        (_, Some(choice)) => run_effect(choice, state, event_id)?,
        (Some(snap), None) => {
            tracing::debug!(event_id, choice_id = %snap.id, "snapshot without catalog effect");
            StateDelta::new()
        }
        (None, None) => {
            tracing::debug!(event_id, choice_id, "unknown choice ignored");
            StateDelta::new()
        }
    };

    if let Some(entry) = current_entry {
        let pruned: Vec<&LogEntry> = state.log.iter().filter(|e| e.id != entry.id).collect();
        let log_value = serde_json::to_value(pruned)
            .map_err(|source| EngineError::LogSerialize { source })?;
        delta.insert("log".to_owned(), log_value);
    }

    Ok(delta)
}

/// Settle a snapshot's captured trade terms against the current state.
fn resolve_trade(snapshot: &ChoiceSnapshot, state: &GameState) -> StateDelta {
    snapshot
        .trade
        .as_ref()
        .map_or_else(StateDelta::new, |trade| trade.settle(state))
}

fn fallback_by_id<'a>(
    fallback: Option<&'a EventChoice>,
    choice_id: &str,
) -> Option<&'a EventChoice> {
    fallback.filter(|c| c.id == choice_id)
}

fn run_effect(
    choice: &EventChoice,
    state: &GameState,
    event_id: &str,
) -> Result<StateDelta, EngineError> {
    (choice.effect)(state).map_err(|source| EngineError::Effect {
        event_id: event_id.to_owned(),
        source,
    })
}

/// Read a presentation marker string off a delta before merging.
pub fn take_marker(delta: &StateDelta, key: &str) -> Option<String> {
    delta.get(key).and_then(Value::as_str).map(ToOwned::to_owned)
}
