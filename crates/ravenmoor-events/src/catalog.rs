//! The validated event catalog.
//!
//! Configuration errors are caught here, at load time, so they can never
//! surface mid-tick: identifier collisions, a timed choice without a
//! fallback, an event that declares no outcome at all.

use std::collections::BTreeMap;

use crate::definition::{ChoiceSource, EventDefinition};

/// Configuration errors detected when the catalog is assembled.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Two definitions share an identifier.
    #[error("duplicate event id: {id}")]
    DuplicateEvent {
        /// The colliding identifier.
        id: String,
    },

    /// A timed-choice event declared no fallback choice.
    #[error("event {id}: timed choice without a fallback choice")]
    MissingFallback {
        /// The offending event.
        id: String,
    },

    /// A timed-choice event declared a zero countdown.
    #[error("event {id}: timed choice requires a positive decision time")]
    ZeroDecisionTime {
        /// The offending event.
        id: String,
    },

    /// An event declares neither an effect nor any choice source.
    #[error("event {id}: declares neither an effect nor choices")]
    NoOutcome {
        /// The offending event.
        id: String,
    },

    /// Two choices within one event share an identifier.
    #[error("event {id}: duplicate choice id {choice_id}")]
    DuplicateChoice {
        /// The event containing the collision.
        id: String,
        /// The colliding choice identifier.
        choice_id: String,
    },
}

/// Read-only mapping from event identifier to definition, preserving
/// declaration order for priority tie-breaks.
///
/// Built once at process start; safe to share across the process. The
/// catalog itself holds no firing state.
#[derive(Debug)]
pub struct EventCatalog {
    events: Vec<EventDefinition>,
    index: BTreeMap<String, usize>,
}

impl EventCatalog {
    /// Validate and assemble a catalog from definitions in declaration
    /// order.
    ///
    /// # Errors
    ///
    /// Returns the first [`CatalogError`] found; a misconfigured catalog
    /// must fail fast rather than misbehave at runtime.
    pub fn new(events: Vec<EventDefinition>) -> Result<Self, CatalogError> {
        let mut index = BTreeMap::new();

        for (position, def) in events.iter().enumerate() {
            if index.insert(def.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateEvent { id: def.id.clone() });
            }
            validate_definition(def)?;
        }

        Ok(Self { events, index })
    }

    /// Look up a definition by identifier.
    pub fn get(&self, event_id: &str) -> Option<&EventDefinition> {
        self.index
            .get(event_id)
            .and_then(|position| self.events.get(*position))
    }

    /// Definitions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &EventDefinition> {
        self.events.iter()
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the catalog holds no definitions.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Per-definition configuration checks.
fn validate_definition(def: &EventDefinition) -> Result<(), CatalogError> {
    if def.is_timed_choice {
        if def.fallback_choice.is_none() {
            return Err(CatalogError::MissingFallback { id: def.id.clone() });
        }
        if def.base_decision_time_ms == 0 {
            return Err(CatalogError::ZeroDecisionTime { id: def.id.clone() });
        }
    }

    if def.effect.is_none() && def.choices.is_none() && def.fallback_choice.is_none() {
        return Err(CatalogError::NoOutcome { id: def.id.clone() });
    }

    if let ChoiceSource::Fixed(choices) = &def.choices {
        let mut seen = BTreeMap::new();
        for choice in choices {
            if seen.insert(choice.id.clone(), ()).is_some() {
                return Err(CatalogError::DuplicateChoice {
                    id: def.id.clone(),
                    choice_id: choice.id.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::definition::{EventChoice, EventDefinition};
    use ravenmoor_types::StateDelta;

    fn inert_event(id: &str) -> EventDefinition {
        EventDefinition::builder(id)
            .message("test")
            .effect(|_state| Ok(StateDelta::new()))
            .build()
    }

    #[test]
    fn catalog_preserves_declaration_order() {
        let catalog = EventCatalog::new(vec![
            inert_event("first"),
            inert_event("second"),
            inert_event("third"),
        ])
        .unwrap();

        let ids: Vec<&str> = catalog.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
        assert_eq!(catalog.len(), 3);
        assert!(catalog.get("second").is_some());
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn duplicate_event_id_is_rejected() {
        let result = EventCatalog::new(vec![inert_event("twin"), inert_event("twin")]);
        assert!(matches!(
            result,
            Err(CatalogError::DuplicateEvent { id }) if id == "twin"
        ));
    }

    #[test]
    fn timed_choice_without_fallback_is_rejected() {
        let def = EventDefinition::builder("hasty")
            .message("choose quickly")
            .choices(vec![EventChoice::dismiss("wait", "Wait")])
            .timed(10_000)
            .build();

        let result = EventCatalog::new(vec![def]);
        assert!(matches!(
            result,
            Err(CatalogError::MissingFallback { id }) if id == "hasty"
        ));
    }

    #[test]
    fn timed_choice_with_zero_countdown_is_rejected() {
        let def = EventDefinition::builder("instant")
            .message("no time at all")
            .choices(vec![EventChoice::dismiss("wait", "Wait")])
            .timed(0)
            .fallback(EventChoice::dismiss("wait", "Wait"))
            .build();

        let result = EventCatalog::new(vec![def]);
        assert!(matches!(result, Err(CatalogError::ZeroDecisionTime { .. })));
    }

    #[test]
    fn event_without_any_outcome_is_rejected() {
        let def = EventDefinition::builder("hollow").message("nothing").build();
        let result = EventCatalog::new(vec![def]);
        assert!(matches!(result, Err(CatalogError::NoOutcome { .. })));
    }

    #[test]
    fn duplicate_choice_ids_are_rejected() {
        let def = EventDefinition::builder("torn")
            .message("pick one")
            .choices(vec![
                EventChoice::dismiss("yes", "Yes"),
                EventChoice::dismiss("yes", "Also yes"),
            ])
            .build();

        let result = EventCatalog::new(vec![def]);
        assert!(matches!(
            result,
            Err(CatalogError::DuplicateChoice { choice_id, .. }) if choice_id == "yes"
        ));
    }
}
