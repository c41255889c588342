//! Ambient flavor events: low priority, repeatable, probability-paced.

use ravenmoor_types::{DeltaBuilder, GameState, LogKind};

use crate::definition::{EventDefinition, TriggerType};

/// Lights over the moor. The more frayed the village's nerves, the more
/// often they appear.
fn strange_lights() -> EventDefinition {
    EventDefinition::builder("strange_lights")
        .message("Pale lights drift over the moor and wink out, one by one.")
        .kind(LogKind::Story)
        .trigger(TriggerType::Random)
        .priority(1)
        .repeatable()
        .every_minutes_fn(|state| if state.stats.madness > 5.0 { 15.0 } else { 60.0 })
        .effect(|state: &GameState| {
            Ok(DeltaBuilder::new()
                .stat("madness", state.stats.madness + 0.25)
                .notice("Some of the villagers refuse to look at the sky.")
                .build())
        })
        .build()
}

/// Wolves in the dark. Leaves a flag for the hunt feature to pick up.
fn howling_night() -> EventDefinition {
    EventDefinition::builder("howling_night")
        .message("Howling circles the village all night, never coming closer.")
        .kind(LogKind::Story)
        .trigger(TriggerType::Random)
        .priority(2)
        .repeatable()
        .condition(|state| state.villager_total() >= 1)
        .every_minutes(45.0)
        .effect(|_state: &GameState| {
            Ok(DeltaBuilder::new().flag("wolves_restless", true).build())
        })
        .build()
}

/// Pure flavor; nothing changes but the log.
fn quiet_day() -> EventDefinition {
    EventDefinition::builder("quiet_day")
        .message("Mist sits on the moor. For once, nothing stirs.")
        .kind(LogKind::Story)
        .trigger(TriggerType::Random)
        .priority(1)
        .repeatable()
        .every_minutes(90.0)
        .effect(|_state: &GameState| Ok(DeltaBuilder::new().build()))
        .build()
}

/// All ambient events in declaration order.
pub fn events() -> Vec<EventDefinition> {
    vec![strange_lights(), howling_night(), quiet_day()]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::definition::TimeProbability;

    #[test]
    fn strange_lights_pace_scales_with_madness() {
        let def = strange_lights();
        let probability = def.time_probability.as_ref().unwrap();

        let calm = GameState::default();
        assert!(matches!(probability, TimeProbability::FromState(_)));
        assert_eq!(probability.resolve(&calm), 60.0);

        let mut frayed = GameState::default();
        frayed.stats.madness = 6.0;
        assert_eq!(probability.resolve(&frayed), 15.0);
    }

    #[test]
    fn ambient_events_are_repeatable_and_low_priority() {
        for def in events() {
            assert!(def.repeatable, "{} should be repeatable", def.id);
            assert!(def.priority <= 2, "{} should stay ambient", def.id);
        }
    }
}
