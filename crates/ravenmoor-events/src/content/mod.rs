//! The authored event content, grouped by register.
//!
//! Content modules only declare data (conditions, text, effects); every
//! behavioral rule lives in the engine. New events are added here and
//! nowhere else.

pub mod ambient;
pub mod crisis;
pub mod merchant;
pub mod story;

use crate::catalog::{CatalogError, EventCatalog};
use crate::definition::EventDefinition;

/// All authored events in declaration order (the priority tie-break
/// order): crises first, then story, merchant, ambient.
pub fn all_events() -> Vec<EventDefinition> {
    let mut events = Vec::new();
    events.extend(crisis::events());
    events.extend(story::events());
    events.extend(merchant::events());
    events.extend(ambient::events());
    events
}

/// Build the default validated catalog.
///
/// # Errors
///
/// Returns a [`CatalogError`] if the authored content is misconfigured;
/// the process should fail fast rather than run with a broken catalog.
pub fn default_catalog() -> Result<EventCatalog, CatalogError> {
    EventCatalog::new(all_events())
}
