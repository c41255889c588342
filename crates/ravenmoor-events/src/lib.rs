//! Event-definition schema, catalog validation, and authored content for
//! the Ravenmoor narrative engine.
//!
//! An [`EventDefinition`] is pure declarative data: a condition predicate,
//! narrative text, choices, a priority, and an optional time-based trigger
//! probability. Definitions are assembled into an [`EventCatalog`] once at
//! process start; the catalog validates its configuration eagerly and is
//! read-only thereafter. All "has this fired" tracking lives in
//! `GameState::triggered_events`, never on the definitions.
//!
//! # Modules
//!
//! - [`definition`] -- the schema types and the [`EventBuilder`].
//! - [`catalog`] -- the validated catalog and its load-time checks.
//! - [`content`] -- the authored events (crisis, merchant, story, ambient).
//!
//! [`EventBuilder`]: definition::EventBuilder

pub mod catalog;
pub mod content;
pub mod definition;

pub use catalog::{CatalogError, EventCatalog};
pub use definition::{
    ChoiceGenerator, ChoiceSource, Condition, EffectError, EffectFn, EventBuilder, EventChoice,
    EventDefinition, Text, TimeProbability, TriggerType,
};
