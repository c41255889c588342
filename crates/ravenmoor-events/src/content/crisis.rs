//! Crisis events: starvation, plague, raiders.
//!
//! These carry the highest priorities (9-10) so they pre-empt ambient
//! flavor whenever both are satisfied in the same tick.

use serde_json::json;

use ravenmoor_types::{DeltaBuilder, GameState, LogKind};

use crate::definition::{EventChoice, EventDefinition, Text, TriggerType};

/// Shared "let them starve" choice; also the timed fallback.
fn do_nothing_choice() -> EventChoice {
    EventChoice::new("do_nothing", "Do nothing", |state: &GameState| {
        let mut builder = DeltaBuilder::new()
            .stat("madness", state.stats.madness + 1.0)
            .notice("Hunger takes one of your own in the night.");
        if let Some((occupation, count)) = state.villagers.iter().find(|(_, c)| **c > 0) {
            builder = builder.count("villagers", occupation, count.saturating_sub(1));
        }
        Ok(builder.build())
    })
}

/// The starvation crisis. Fires immediately (no time probability) while
/// the host-maintained `starvation_active` flag is up and food has fallen
/// below the population.
fn starvation() -> EventDefinition {
    EventDefinition::builder("starvation")
        .title("The granary runs low")
        .message("There is not enough food to go around. The villagers look to you.")
        .kind(LogKind::Crisis)
        .trigger(TriggerType::Resource)
        .priority(10)
        .repeatable()
        .condition(|state| {
            state.flag("starvation_active")
                && state.resource("food") < f64::from(state.villager_total())
        })
        .choices(vec![
            EventChoice::new("ration_food", "Ration the food", |state: &GameState| {
                let rations = f64::from(state.villager_total()) * 0.5;
                Ok(DeltaBuilder::new()
                    .resource("food", state.resource("food") - rations)
                    .flag("starvation_active", false)
                    .build())
            })
            .with_cost(Text::dynamic(|state| {
                format!("{} food", f64::from(state.villager_total()) * 0.5)
            })),
            do_nothing_choice(),
        ])
        .timed(20_000)
        .fallback(do_nothing_choice())
        .build()
}

/// A plague sweeping the village. Paced by luck; a high-luck village sees
/// it far less often.
fn plague_outbreak() -> EventDefinition {
    EventDefinition::builder("plague_outbreak")
        .title("Sickness in the huts")
        .message("A wet cough spreads from hut to hut. Something must be done.")
        .kind(LogKind::Crisis)
        .trigger(TriggerType::Random)
        .priority(9)
        .repeatable()
        .condition(|state| state.villager_total() >= 10 && !state.seen("plague_survived"))
        .every_minutes_fn(|state| if state.stats.luck >= 5.0 { 180.0 } else { 90.0 })
        .choices(vec![
            EventChoice::new("quarantine", "Quarantine the sick", |state: &GameState| {
                Ok(DeltaBuilder::new()
                    .resource("food", state.resource("food") - 15.0)
                    .seen("plague_survived", true)
                    .build())
            })
            .with_cost("15 food"),
            EventChoice::new("pray", "Pray at the shrine", |state: &GameState| {
                Ok(DeltaBuilder::new()
                    .seen("plague_survived", true)
                    .stat("madness", state.stats.madness + 1.0)
                    .build())
            })
            .with_hint(&["luck"], 0.35),
        ])
        .build()
}

/// Raiders spotted on the moor. Action-gated: the scouting feature raises
/// `raiders_nearby`, this event consumes it and hands the presentation
/// layer a combat payload.
fn raider_warning() -> EventDefinition {
    EventDefinition::builder("raider_warning")
        .title("Torches on the moor")
        .message("Raiders are moving toward the village. Man the palisade!")
        .kind(LogKind::Crisis)
        .trigger(TriggerType::Action)
        .priority(9)
        .repeatable()
        .condition(|state| state.flag("raiders_nearby"))
        .effect(|state: &GameState| {
            let wave = state.villager_total().checked_div(5).unwrap_or(0).max(2);
            Ok(DeltaBuilder::new()
                .flag("raiders_nearby", false)
                .flag("raid_imminent", true)
                .combat(json!({ "enemy": "raiders", "count": wave }))
                .build())
        })
        .build()
}

/// All crisis events in declaration order.
pub fn events() -> Vec<EventDefinition> {
    vec![starvation(), plague_outbreak(), raider_warning()]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn starving_state() -> GameState {
        let mut state = GameState::default();
        state.resources.insert("food".to_owned(), 40.0);
        state.villagers.insert("hunter".to_owned(), 20);
        state.villagers.insert("unemployed".to_owned(), 30);
        state.flags.insert("starvation_active".to_owned(), true);
        state
    }

    #[test]
    fn starvation_offers_ration_and_do_nothing() {
        let def = starvation();
        assert_eq!(def.priority, 10);
        assert!(def.is_timed_choice);
        assert_eq!(
            def.fallback_choice.as_ref().map(|c| c.id.as_str()),
            Some("do_nothing")
        );
        assert!(def.fixed_choice("ration_food").is_some());
        assert!(def.fixed_choice("do_nothing").is_some());
    }

    #[test]
    fn starvation_condition_requires_flag_and_shortfall() {
        let def = starvation();
        let state = starving_state();
        assert!((def.condition)(&state));

        let mut fed = state.clone();
        fed.resources.insert("food".to_owned(), 200.0);
        assert!(!(def.condition)(&fed));

        let mut unflagged = state;
        unflagged.flags.insert("starvation_active".to_owned(), false);
        assert!(!(def.condition)(&unflagged));
    }

    #[test]
    fn ration_food_deducts_half_a_unit_per_villager() {
        let def = starvation();
        let state = starving_state();
        let choice = def.fixed_choice("ration_food").unwrap();
        let delta = (choice.effect)(&state).unwrap();

        let resources = delta.get("resources").unwrap().as_object().unwrap();
        assert_eq!(resources.get("food").unwrap().as_f64().unwrap(), 15.0);
        let flags = delta.get("flags").unwrap().as_object().unwrap();
        assert_eq!(flags.get("starvation_active").unwrap(), false);
    }

    #[test]
    fn do_nothing_costs_a_villager_and_sanity() {
        let state = starving_state();
        let choice = do_nothing_choice();
        let delta = (choice.effect)(&state).unwrap();

        // BTreeMap order: "hunter" sorts before "unemployed".
        let villagers = delta.get("villagers").unwrap().as_object().unwrap();
        assert_eq!(villagers.get("hunter").unwrap().as_u64().unwrap(), 19);
        let stats = delta.get("stats").unwrap().as_object().unwrap();
        assert_eq!(stats.get("madness").unwrap().as_f64().unwrap(), 1.0);
    }

    #[test]
    fn raider_warning_consumes_flag_and_emits_combat() {
        let def = raider_warning();
        let mut state = GameState::default();
        state.flags.insert("raiders_nearby".to_owned(), true);
        state.villagers.insert("unemployed".to_owned(), 25);
        assert!((def.condition)(&state));

        let delta = (def.effect.as_ref().unwrap())(&state).unwrap();
        let flags = delta.get("flags").unwrap().as_object().unwrap();
        assert_eq!(flags.get("raiders_nearby").unwrap(), false);
        assert_eq!(flags.get("raid_imminent").unwrap(), true);

        let combat = delta.get("combat").unwrap();
        assert_eq!(combat.get("count").unwrap().as_u64().unwrap(), 5);
    }
}
