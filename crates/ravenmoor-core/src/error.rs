//! Engine error taxonomy.
//!
//! Configuration errors are caught at load time (see the catalog and
//! config modules). What remains at runtime: effect faults, which are
//! fatal for the tick but never merged half-applied, and merge
//! serialization failures, which indicate a malformed delta.

use ravenmoor_events::EffectError;

/// Errors from the generic state merge.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The previous state failed to serialize to a JSON tree.
    #[error("state serialization failed: {source}")]
    Serialize {
        /// The underlying serde error.
        source: serde_json::Error,
    },

    /// The merged tree no longer deserializes as a game state.
    #[error("merged state failed to deserialize: {source}")]
    Deserialize {
        /// The underlying serde error.
        source: serde_json::Error,
    },
}

/// Errors surfaced by the engine entry points.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A condition was satisfied but the event's (or choice's) effect
    /// faulted. The accumulated delta must be discarded, never merged.
    #[error("effect fault in event {event_id}: {source}")]
    Effect {
        /// The offending event.
        event_id: String,
        /// The underlying effect error.
        #[source]
        source: EffectError,
    },

    /// The merge layer failed.
    #[error("merge error: {source}")]
    Merge {
        /// The underlying merge error.
        #[from]
        source: MergeError,
    },

    /// The resolver could not serialize the pruned log into the delta.
    #[error("log serialization failed: {source}")]
    LogSerialize {
        /// The underlying serde error.
        source: serde_json::Error,
    },
}
