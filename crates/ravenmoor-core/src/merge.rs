//! The generic state-reconciliation reducer.
//!
//! Takes the current state and a partial delta and produces a new state:
//! nested records merge shallowly key-by-key, lists and primitives replace
//! wholesale, and merged resource values are clamped at a floor of zero.
//!
//! The merge is driven entirely by the keys present in the delta --
//! adding a new state section requires no change here. The only
//! exceptions are the two namespaces that hold records of records
//! (`story.seen` and the `upgrades` levels), which merge one additional
//! level so updating one sub-key does not erase its siblings.

use serde_json::{Map, Value};

use ravenmoor_types::{markers, GameState, StateDelta};

use crate::error::MergeError;

/// Sections whose nested records merge two levels deep instead of one.
///
/// These are semantically distinguished (partial-record-of-records) and
/// stay explicit; everything else follows the generic one-level rule.
const DEEP_MERGE_SECTIONS: &[&str] = &["story", "upgrades"];

/// Merge a partial delta into the previous state, returning the new state.
///
/// The previous state is never mutated. Presentation marker keys in the
/// delta (`notice`, `combat`) are skipped -- hosts read those off the
/// delta before calling this.
///
/// # Errors
///
/// Returns [`MergeError`] if the state cannot round-trip through its JSON
/// representation (a malformed delta value, e.g. a string where a section
/// object belongs).
pub fn merge(prev: &GameState, delta: &StateDelta) -> Result<GameState, MergeError> {
    let serialized =
        serde_json::to_value(prev).map_err(|source| MergeError::Serialize { source })?;
    // A struct always serializes to an object; treat anything else as an
    // empty base.
    let mut root = if let Value::Object(map) = serialized {
        map
    } else {
        Map::new()
    };

    for (key, incoming) in delta {
        if markers::is_marker(key) {
            continue;
        }

        let depth = if DEEP_MERGE_SECTIONS.contains(&key.as_str()) {
            2
        } else {
            1
        };

        if let Value::Object(update) = incoming {
            if let Some(Value::Object(current)) = root.get_mut(key) {
                merge_record(current, update, depth);
                continue;
            }
        }
        root.insert(key.clone(), incoming.clone());
    }

    clamp_resources(&mut root);

    serde_json::from_value(Value::Object(root))
        .map_err(|source| MergeError::Deserialize { source })
}

/// Merge `update` into `current` key-by-key, recursing `depth` levels for
/// object values before falling back to replacement.
fn merge_record(current: &mut Map<String, Value>, update: &Map<String, Value>, depth: usize) {
    for (key, value) in update {
        if depth > 1 {
            if let (Some(Value::Object(nested)), Value::Object(nested_update)) =
                (current.get_mut(key), value)
            {
                merge_record(nested, nested_update, depth.saturating_sub(1));
                continue;
            }
        }
        current.insert(key.clone(), value.clone());
    }
}

/// Raise every negative value in the merged `resources` map to zero.
///
/// Upstream effects deduct optimistically without re-checking
/// affordability; the floor is corrected here rather than rejected.
fn clamp_resources(root: &mut Map<String, Value>) {
    if let Some(Value::Object(resources)) = root.get_mut("resources") {
        for value in resources.values_mut() {
            if value.as_f64().is_some_and(|quantity| quantity < 0.0) {
                *value = Value::from(0.0);
            }
        }
    }
}
