//! Story events: the crow-messenger flow, the old shrine, the stranger.
//!
//! The crow flow demonstrates the one sanctioned use of marker revocation:
//! reading a reply clears `crow_sent_to_marsh` so the offer event re-arms.

use ravenmoor_types::{DeltaBuilder, GameState, LogKind};

use crate::definition::{EventChoice, EventDefinition, TriggerType};

/// A crow takes up residence. One-time story beat, choiceless.
fn found_crow() -> EventDefinition {
    EventDefinition::builder("found_crow")
        .title("A crow on the palisade")
        .message("A large crow lands on the palisade and will not be shooed away.")
        .kind(LogKind::Story)
        .trigger(TriggerType::Time)
        .priority(4)
        .condition(|state| state.villager_total() >= 3)
        .every_minutes(5.0)
        .effect(|_state: &GameState| {
            Ok(DeltaBuilder::new()
                .seen("found_crow", true)
                .notice("The crow watches you with one pale eye.")
                .build())
        })
        .build()
}

/// Offer to send the crow to the marsh settlement. Re-arms whenever the
/// sent marker is revoked by the reply event.
fn crow_offer_marsh() -> EventDefinition {
    EventDefinition::builder("crow_offer_marsh")
        .title("The crow stirs")
        .message("The crow hops to your shoulder. It could carry word to the marsh folk.")
        .kind(LogKind::Story)
        .trigger(TriggerType::Action)
        .priority(4)
        .repeatable()
        .condition(|state| state.seen("found_crow") && !state.seen("crow_sent_to_marsh"))
        .every_minutes(8.0)
        .choices(vec![
            EventChoice::new("send_crow", "Send the crow to the marsh", |_state| {
                Ok(DeltaBuilder::new().seen("crow_sent_to_marsh", true).build())
            }),
            EventChoice::dismiss("keep_it", "Keep it close"),
        ])
        .build()
}

/// The crow returns with a reply. Reading it revokes the sent marker --
/// the merge layer permits this on purpose -- and counts the exchange.
fn crow_returns_marsh() -> EventDefinition {
    EventDefinition::builder("crow_returns_marsh")
        .title("Wings at dusk")
        .message("The crow returns, a scrap of oilcloth tied to its leg.")
        .kind(LogKind::Story)
        .trigger(TriggerType::Time)
        .priority(5)
        .repeatable()
        .condition(|state| state.seen("crow_sent_to_marsh"))
        .every_minutes(10.0)
        .choices(vec![EventChoice::new(
            "read_letter",
            "Read the letter",
            |state: &GameState| {
                let replies = state.seen_number("marsh_replies") + 1.0;
                Ok(DeltaBuilder::new()
                    .seen("crow_sent_to_marsh", false)
                    .seen("marsh_replies", replies)
                    .stat("knowledge", state.stats.knowledge + 0.5)
                    .build())
            },
        )])
        .build()
}

/// An old shrine uncovered once enough stone has been quarried.
fn old_shrine() -> EventDefinition {
    EventDefinition::builder("old_shrine")
        .title("The old shrine")
        .message("Quarrying uncovers a moss-eaten shrine to something forgotten.")
        .kind(LogKind::Story)
        .trigger(TriggerType::Resource)
        .priority(2)
        .condition(|state| state.resource("stone") >= 50.0)
        .choices(vec![
            EventChoice::new("make_offering", "Make an offering", |state: &GameState| {
                Ok(DeltaBuilder::new()
                    .resource("stone", state.resource("stone") - 25.0)
                    .owned("blessings", "forest_blessing", true)
                    .stat("luck", state.stats.luck + 1.0)
                    .build())
            })
            .with_cost("25 stone")
            .with_hint(&["luck"], 0.75),
            EventChoice::dismiss("leave_it", "Leave it be"),
        ])
        .build()
}

/// A stranger knocks after dark. Timed: ignore the prompt long enough and
/// the gates simply stay shut -- the fallback id is not in the presented
/// list.
fn stranger_at_gate() -> EventDefinition {
    EventDefinition::builder("stranger_at_gate")
        .title("A knock at the gate")
        .message("A hooded figure waits outside in the rain, asking for shelter.")
        .kind(LogKind::Story)
        .trigger(TriggerType::Time)
        .priority(6)
        .condition(|state| state.villager_total() >= 5)
        .every_minutes(20.0)
        .choices(vec![
            EventChoice::new("welcome", "Open the gate", |state: &GameState| {
                let unemployed = state
                    .villagers
                    .get("unemployed")
                    .copied()
                    .unwrap_or(0)
                    .saturating_add(1);
                Ok(DeltaBuilder::new()
                    .count("villagers", "unemployed", unemployed)
                    .seen("stranger_welcomed", true)
                    .build())
            }),
            EventChoice::dismiss("turn_away", "Turn them away"),
        ])
        .timed(15_000)
        .fallback(EventChoice::new(
            "gates_stay_shut",
            "The gates stay shut",
            |state: &GameState| {
                Ok(DeltaBuilder::new()
                    .stat("madness", state.stats.madness + 0.5)
                    .notice("By morning the stranger is gone. Nobody speaks of it.")
                    .build())
            },
        ))
        .build()
}

/// All story events in declaration order.
pub fn events() -> Vec<EventDefinition> {
    vec![
        found_crow(),
        crow_offer_marsh(),
        crow_returns_marsh(),
        old_shrine(),
        stranger_at_gate(),
    ]
}
