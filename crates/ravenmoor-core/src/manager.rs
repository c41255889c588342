//! The per-tick evaluation loop.
//!
//! Each tick the manager walks the catalog by descending priority (ties
//! keep declaration order), finds the first event that is eligible,
//! passes its probability gate, and fires it. At most one event fires per
//! tick, so a crisis is never drowned out by ambient flavor in the same
//! instant.

use std::sync::Arc;

use rand::Rng;
use serde_json::Value;

use ravenmoor_events::{ChoiceSource, EventCatalog, EventDefinition};
use ravenmoor_types::{
    ChoiceSnapshot, DeltaBuilder, GameState, LogEntry, StateDelta, TimedPrompt,
};

use crate::error::EngineError;

/// Reference tick rate, in ticks per second.
pub const DEFAULT_TICKS_PER_SECOND: f64 = 5.0;

/// What a single tick produced.
#[derive(Debug, Default)]
pub struct CheckOutcome {
    /// Partial delta to merge into the state. Empty when nothing fired.
    pub delta: StateDelta,
    /// Log entries to append, at most one per tick.
    pub entries: Vec<LogEntry>,
}

impl CheckOutcome {
    /// Whether this tick fired an event.
    pub fn fired(&self) -> bool {
        !self.entries.is_empty()
    }
}

/// Schedules events against the catalog at a fixed tick rate.
///
/// Holds no mutable state of its own; everything that varies per game
/// lives in [`GameState`], so one manager can serve any number of
/// concurrent games.
#[derive(Debug, Clone)]
pub struct EventManager {
    catalog: Arc<EventCatalog>,
    ticks_per_minute: f64,
}

impl EventManager {
    /// Build a manager over the given catalog at the reference tick rate.
    pub fn new(catalog: Arc<EventCatalog>) -> Self {
        Self::with_tick_rate(catalog, DEFAULT_TICKS_PER_SECOND)
    }

    /// Build a manager with an explicit tick rate in ticks per second.
    ///
    /// Pacing is expressed in wall-clock minutes; the tick rate converts
    /// it to per-tick probabilities, so a host running at a different
    /// rate keeps the same average minutes between triggers.
    pub fn with_tick_rate(catalog: Arc<EventCatalog>, ticks_per_second: f64) -> Self {
        Self {
            catalog,
            ticks_per_minute: ticks_per_second * 60.0,
        }
    }

    /// The catalog this manager schedules.
    pub const fn catalog(&self) -> &Arc<EventCatalog> {
        &self.catalog
    }

    /// Convert average minutes between triggers into a per-tick firing
    /// probability.
    ///
    /// A non-finite or non-positive pacing value degrades to certainty,
    /// as does an expected tick count at or below one.
    pub fn per_tick_probability(&self, minutes: f64) -> f64 {
        if !minutes.is_finite() || minutes <= 0.0 {
            return 1.0;
        }
        let expected_ticks = minutes * self.ticks_per_minute;
        if expected_ticks <= 1.0 {
            1.0
        } else {
            expected_ticks.recip()
        }
    }

    /// Run one scheduling pass over the catalog.
    ///
    /// Walks definitions by descending priority, skipping events that
    /// already fired and are not repeatable, whose condition fails, or
    /// that lose this tick's probability draw. The first survivor fires;
    /// the rest wait for a later tick.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Effect`] when the winning event's direct
    /// effect faults. The outcome built so far is discarded.
    pub fn check_events<R: Rng>(
        &self,
        state: &GameState,
        rng: &mut R,
        now_ms: i64,
    ) -> Result<CheckOutcome, EngineError> {
        let mut ordered: Vec<&EventDefinition> = self.catalog.iter().collect();
        // Stable sort keeps declaration order within a priority band.
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

        for def in ordered {
            if !def.repeatable && state.has_triggered(&def.id) {
                continue;
            }
            if !(def.condition)(state) {
                continue;
            }
            if let Some(pacing) = &def.time_probability {
                let p = self.per_tick_probability(pacing.resolve(state));
                if rng.random::<f64>() >= p {
                    continue;
                }
            }
            return Self::fire(def, state, rng, now_ms);
        }

        Ok(CheckOutcome::default())
    }

    /// Fire one event: run its direct effect (if choiceless), snapshot
    /// its choices, and produce the log entry and bookkeeping delta.
    fn fire<R: Rng>(
        def: &EventDefinition,
        state: &GameState,
        rng: &mut R,
        now_ms: i64,
    ) -> Result<CheckOutcome, EngineError> {
        let mut delta = StateDelta::new();

        let snapshots: Vec<ChoiceSnapshot> = match &def.choices {
            ChoiceSource::None => {
                if let Some(effect) = &def.effect {
                    let effect_delta = effect(state).map_err(|source| EngineError::Effect {
                        event_id: def.id.clone(),
                        source,
                    })?;
                    fold_delta(&mut delta, effect_delta);
                }
                Vec::new()
            }
            ChoiceSource::Fixed(choices) => {
                choices.iter().map(|c| c.snapshot(state)).collect()
            }
            ChoiceSource::Generated(generator) => {
                let generated = generator(state, rng);
                generated.iter().map(|c| c.snapshot(state)).collect()
            }
        };

        let timed = if def.is_timed_choice {
            def.fallback_choice.as_ref().map(|fallback| TimedPrompt {
                base_decision_time_ms: def.base_decision_time_ms,
                fallback_choice_id: fallback.id.clone(),
            })
        } else {
            None
        };

        let entry = LogEntry {
            id: LogEntry::entry_id(&def.id, now_ms),
            event_id: def.id.clone(),
            title: def.title.as_ref().map(|t| t.resolve(state)),
            message: def.message.resolve(state),
            timestamp: now_ms,
            kind: def.kind,
            choices: snapshots,
            timed,
        };

        if !def.repeatable {
            fold_delta(&mut delta, DeltaBuilder::new().triggered(&def.id).build());
        }

        tracing::debug!(event_id = %def.id, priority = def.priority, "event fired");

        Ok(CheckOutcome {
            delta,
            entries: vec![entry],
        })
    }
}

/// Fold `incoming` into `accumulated`, merging section objects one level
/// so an effect's `resources` keys coexist with the bookkeeping keys.
fn fold_delta(accumulated: &mut StateDelta, incoming: StateDelta) {
    for (key, value) in incoming {
        match value {
            Value::Object(update) => {
                if let Some(Value::Object(current)) = accumulated.get_mut(&key) {
                    for (nested_key, nested_value) in update {
                        current.insert(nested_key, nested_value);
                    }
                    continue;
                }
                accumulated.insert(key, Value::Object(update));
            }
            other => {
                accumulated.insert(key, other);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use ravenmoor_events::{EventCatalog, EventChoice, EventDefinition};
    use ravenmoor_types::DeltaBuilder;

    fn manager_of(events: Vec<EventDefinition>) -> EventManager {
        EventManager::new(Arc::new(EventCatalog::new(events).unwrap()))
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn instant_event(id: &str, priority: i32) -> EventDefinition {
        EventDefinition::builder(id)
            .message("fires at once")
            .priority(priority)
            .repeatable()
            .effect(|_state| Ok(StateDelta::new()))
            .build()
    }

    #[test]
    fn probability_follows_the_tick_rate() {
        let manager = manager_of(vec![instant_event("x", 1)]);
        // 30 minutes at 5 ticks/sec is 9000 expected ticks.
        assert_eq!(manager.per_tick_probability(30.0), 1.0 / 9000.0);
        assert_eq!(manager.per_tick_probability(0.0), 1.0);
        assert_eq!(manager.per_tick_probability(f64::NAN), 1.0);
        assert_eq!(manager.per_tick_probability(-5.0), 1.0);
        // Sub-tick pacing saturates at certainty.
        assert_eq!(manager.per_tick_probability(0.001), 1.0);
    }

    #[test]
    fn at_most_one_event_fires_per_tick() {
        let manager = manager_of(vec![instant_event("a", 5), instant_event("b", 5)]);
        let state = GameState::default();
        let outcome = manager.check_events(&state, &mut rng(), 0).unwrap();
        assert_eq!(outcome.entries.len(), 1);
    }

    #[test]
    fn higher_priority_wins() {
        let manager = manager_of(vec![instant_event("low", 1), instant_event("high", 9)]);
        let state = GameState::default();
        let outcome = manager.check_events(&state, &mut rng(), 0).unwrap();
        assert_eq!(outcome.entries.first().unwrap().event_id, "high");
    }

    #[test]
    fn priority_ties_keep_declaration_order() {
        let manager = manager_of(vec![instant_event("first", 3), instant_event("second", 3)]);
        let state = GameState::default();
        let outcome = manager.check_events(&state, &mut rng(), 0).unwrap();
        assert_eq!(outcome.entries.first().unwrap().event_id, "first");
    }

    #[test]
    fn non_repeatable_events_are_skipped_after_firing() {
        let def = EventDefinition::builder("once")
            .message("only once")
            .effect(|_state| Ok(StateDelta::new()))
            .build();
        let manager = manager_of(vec![def]);

        let state = GameState::default();
        let outcome = manager.check_events(&state, &mut rng(), 0).unwrap();
        assert!(outcome.fired());
        let state = crate::merge::merge(&state, &outcome.delta).unwrap();
        assert!(state.has_triggered("once"));

        let again = manager.check_events(&state, &mut rng(), 200).unwrap();
        assert!(!again.fired());
    }

    #[test]
    fn failing_condition_blocks_firing() {
        let def = EventDefinition::builder("gated")
            .message("never")
            .repeatable()
            .condition(|_state| false)
            .effect(|_state| Ok(StateDelta::new()))
            .build();
        let manager = manager_of(vec![def]);
        let outcome = manager
            .check_events(&GameState::default(), &mut rng(), 0)
            .unwrap();
        assert!(!outcome.fired());
    }

    #[test]
    fn choiceless_effect_lands_in_the_delta() {
        let def = EventDefinition::builder("windfall")
            .message("a fallen tree")
            .repeatable()
            .effect(|_state| Ok(DeltaBuilder::new().resource("wood", 20.0).build()))
            .build();
        let manager = manager_of(vec![def]);

        let state = GameState::default();
        let outcome = manager.check_events(&state, &mut rng(), 0).unwrap();
        let merged = crate::merge::merge(&state, &outcome.delta).unwrap();
        assert_eq!(merged.resource("wood"), 20.0);
    }

    #[test]
    fn effect_fault_discards_the_tick() {
        let def = EventDefinition::builder("broken")
            .message("faults")
            .repeatable()
            .effect(|_state| Err(ravenmoor_events::EffectError::new("boom")))
            .build();
        let manager = manager_of(vec![def]);
        let result = manager.check_events(&GameState::default(), &mut rng(), 0);
        assert!(matches!(
            result,
            Err(EngineError::Effect { event_id, .. }) if event_id == "broken"
        ));
    }

    #[test]
    fn choices_are_snapshotted_not_executed() {
        let def = EventDefinition::builder("shrine")
            .message("an old shrine")
            .repeatable()
            .choices(vec![
                EventChoice::new("offer", "Make an offering", |_state| {
                    Ok(DeltaBuilder::new().resource("stone", -50.0).build())
                })
                .with_cost("50 stone"),
                EventChoice::dismiss("leave", "Leave it be"),
            ])
            .build();
        let manager = manager_of(vec![def]);

        let state = GameState::default();
        let outcome = manager.check_events(&state, &mut rng(), 1000).unwrap();
        let entry = outcome.entries.first().unwrap();
        assert_eq!(entry.choices.len(), 2);
        assert_eq!(entry.choices.first().unwrap().id, "offer");
        // The choice effect must not have run.
        let merged = crate::merge::merge(&state, &outcome.delta).unwrap();
        assert_eq!(merged.resource("stone"), 0.0);
    }

    #[test]
    fn timed_events_carry_their_prompt_metadata() {
        let def = EventDefinition::builder("stranger")
            .message("a knock at the gate")
            .repeatable()
            .choices(vec![EventChoice::dismiss("welcome", "Open the gate")])
            .timed(15_000)
            .fallback(EventChoice::dismiss("gates_stay_shut", "The gates stay shut"))
            .build();
        let manager = manager_of(vec![def]);

        let outcome = manager
            .check_events(&GameState::default(), &mut rng(), 5000)
            .unwrap();
        let entry = outcome.entries.first().unwrap();
        let timed = entry.timed.as_ref().unwrap();
        assert_eq!(timed.base_decision_time_ms, 15_000);
        assert_eq!(timed.fallback_choice_id, "gates_stay_shut");
        // The fallback is deliberately absent from the presented list.
        assert!(entry.choices.iter().all(|c| c.id != "gates_stay_shut"));
    }

    #[test]
    fn generated_choices_are_resolved_once_at_fire_time() {
        let def = EventDefinition::builder("merchant")
            .message("a cart rolls in")
            .repeatable()
            .generated_choices(|_state, rng| {
                let mut rng = rng;
                let roll = rng.random_range(0..100_u32);
                vec![
                    EventChoice::dismiss(&format!("offer_{roll}"), "An offer"),
                    EventChoice::dismiss("turn_away", "Turn them away"),
                ]
            })
            .build();
        let manager = manager_of(vec![def]);

        let outcome = manager
            .check_events(&GameState::default(), &mut rng(), 0)
            .unwrap();
        let entry = outcome.entries.first().unwrap();
        assert_eq!(entry.choices.len(), 2);
        assert_eq!(entry.choices.last().unwrap().id, "turn_away");
    }

    #[test]
    fn identical_seeds_schedule_identically() {
        let events = || {
            vec![EventDefinition::builder("paced")
                .message("sometimes")
                .repeatable()
                .every_minutes(0.01)
                .effect(|_state| Ok(StateDelta::new()))
                .build()]
        };
        let manager_a = manager_of(events());
        let manager_b = manager_of(events());
        let state = GameState::default();

        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        for tick in 0..200_i64 {
            let a = manager_a.check_events(&state, &mut rng_a, tick).unwrap();
            let b = manager_b.check_events(&state, &mut rng_b, tick).unwrap();
            assert_eq!(a.fired(), b.fired());
        }
    }

    #[test]
    fn probability_converges_on_expected_rate() {
        // 0.1 min at 5 t/s -> p = 1/30. Over 30_000 draws, expect about
        // 1000 firings; accept a generous band.
        let def = EventDefinition::builder("paced")
            .message("sometimes")
            .repeatable()
            .every_minutes(0.1)
            .effect(|_state| Ok(StateDelta::new()))
            .build();
        let manager = manager_of(vec![def]);
        let state = GameState::default();

        let mut rng = StdRng::seed_from_u64(1234);
        let mut fired = 0_u32;
        for tick in 0..30_000_i64 {
            if manager.check_events(&state, &mut rng, tick).unwrap().fired() {
                fired = fired.saturating_add(1);
            }
        }
        assert!((800..=1200).contains(&fired), "fired {fired} times");
    }
}
