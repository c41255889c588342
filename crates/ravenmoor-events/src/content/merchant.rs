//! The wandering merchant.
//!
//! Offers are generated fresh per firing, and every offer carries
//! structured [`TradeTerms`] next to its display label -- affordability
//! and settlement never re-derive amounts from rendered text.

use rand::{Rng, RngCore};

use ravenmoor_types::{GameState, LogKind, TradeTerms};

use crate::definition::{EventChoice, EventDefinition, TriggerType};

/// One entry in the merchant's stock table.
struct Offer {
    give: &'static str,
    give_amount: f64,
    cost: &'static str,
    cost_amount: f64,
}

/// The merchant's full stock. Two distinct rows are offered per visit.
const OFFERS: &[Offer] = &[
    Offer { give: "wood", give_amount: 500.0, cost: "fur", cost_amount: 10.0 },
    Offer { give: "stone", give_amount: 500.0, cost: "wood", cost_amount: 250.0 },
    Offer { give: "iron", give_amount: 50.0, cost: "stone", cost_amount: 100.0 },
    Offer { give: "fur", give_amount: 25.0, cost: "food", cost_amount: 50.0 },
    Offer { give: "food", give_amount: 100.0, cost: "wood", cost_amount: 75.0 },
];

/// Build the choice for one offer slot.
fn offer_choice(slot: usize, offer: &Offer) -> EventChoice {
    let terms = TradeTerms {
        give_resource: offer.give.to_owned(),
        give_amount: offer.give_amount,
        cost_resource: offer.cost.to_owned(),
        cost_amount: offer.cost_amount,
    };
    let settle_terms = terms.clone();

    EventChoice::new(
        &format!("offer_{slot}_{}", offer.give),
        format!("+{} {}", offer.give_amount, offer.give),
        move |state: &GameState| Ok(settle_terms.settle(state)),
    )
    .with_cost(format!("{} {}", offer.cost_amount, offer.cost))
    .with_trade(terms)
}

/// Generate this visit's offers: two distinct stock rows plus a dismissal.
fn generate_offers(_state: &GameState, rng: &mut dyn RngCore) -> Vec<EventChoice> {
    let mut rng = rng;
    let first = rng.random_range(0..OFFERS.len());
    let mut second = rng.random_range(0..OFFERS.len());
    if second == first {
        second = second
            .checked_add(1)
            .and_then(|next| next.checked_rem(OFFERS.len()))
            .unwrap_or(0);
    }

    let mut choices = Vec::new();
    for (slot, index) in [first, second].into_iter().enumerate() {
        if let Some(offer) = OFFERS.get(index) {
            choices.push(offer_choice(slot, offer));
        }
    }
    choices.push(EventChoice::dismiss("turn_away", "Turn the merchant away"));
    choices
}

/// The wandering merchant definition: ambient pacing, generated choices.
fn wandering_merchant() -> EventDefinition {
    EventDefinition::builder("wandering_merchant")
        .title("A wandering merchant")
        .message("A hooded trader sets a laden cart down by the gate.")
        .kind(LogKind::Merchant)
        .trigger(TriggerType::Time)
        .priority(3)
        .repeatable()
        .condition(|state| state.villager_total() >= 5)
        .every_minutes(30.0)
        .generated_choices(generate_offers)
        .build()
}

/// All merchant events.
pub fn events() -> Vec<EventDefinition> {
    vec![wandering_merchant()]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_offers_are_distinct_and_carry_trade_terms() {
        let state = GameState::default();
        for seed in 0..16_u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let choices = generate_offers(&state, &mut rng);
            assert_eq!(choices.len(), 3);

            let first = choices.first().unwrap();
            let second = choices.get(1).unwrap();
            let trade_a = first.trade.as_ref().unwrap();
            let trade_b = second.trade.as_ref().unwrap();
            assert_ne!(trade_a.give_resource, trade_b.give_resource);

            let dismiss = choices.get(2).unwrap();
            assert_eq!(dismiss.id, "turn_away");
            assert!(dismiss.trade.is_none());
        }
    }

    #[test]
    fn offer_effect_settles_the_same_terms_as_the_snapshot() {
        let mut state = GameState::default();
        state.resources.insert("fur".to_owned(), 20.0);

        let offer = OFFERS.first().unwrap();
        let choice = offer_choice(0, offer);
        let delta = (choice.effect)(&state).unwrap();

        let resources = delta.get("resources").unwrap().as_object().unwrap();
        assert_eq!(resources.get("wood").unwrap().as_f64().unwrap(), 500.0);
        assert_eq!(resources.get("fur").unwrap().as_f64().unwrap(), 10.0);

        let snap = choice.snapshot(&state);
        assert_eq!(snap.trade.as_ref().unwrap().give_amount, 500.0);
        assert_eq!(snap.label, "+500 wood");
        assert_eq!(snap.cost.as_deref(), Some("10 fur"));
    }

    #[test]
    fn merchant_waits_for_a_village() {
        let def = wandering_merchant();
        assert!(!(def.condition)(&GameState::default()));

        let mut state = GameState::default();
        state.villagers.insert("unemployed".to_owned(), 5);
        assert!((def.condition)(&state));
    }
}
