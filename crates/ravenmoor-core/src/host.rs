//! The reference host: owns the canonical state, drives the tick loop,
//! and supervises timed prompts.
//!
//! All engine entry points are pure `state -> delta` transforms; this is
//! the single place where deltas are merged back and the canonical state
//! is replaced. Timed countdowns live here too -- the engine only
//! annotates entries with their prompt metadata, and the host turns that
//! into deadlines and fallback resolutions.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use ravenmoor_events::EventCatalog;
use ravenmoor_types::{markers, GameState, LogEntry, StateDelta};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::manager::EventManager;
use crate::merge::merge;
use crate::resolver::{apply_event_choice, take_marker};

/// A timed prompt awaiting either player input or its deadline.
#[derive(Debug, Clone)]
struct OpenPrompt {
    event_id: String,
    fallback_choice_id: String,
    deadline_ms: i64,
}

/// What one tick did, for the driving loop to report.
#[derive(Debug, Default)]
pub struct TickReport {
    /// The tick counter after this tick.
    pub tick: u64,
    /// Event id fired this tick, if any.
    pub fired: Option<String>,
    /// Timed prompts auto-resolved by their fallback this tick.
    pub expired_prompts: Vec<String>,
    /// Event id whose effect faulted this tick; its delta was discarded.
    pub faulted: Option<String>,
    /// Presentation notices read off merged deltas.
    pub notices: Vec<String>,
}

/// Owns one game: canonical state, scheduling RNG, and open prompts.
#[derive(Debug)]
pub struct GameHost {
    state: GameState,
    manager: EventManager,
    rng: StdRng,
    tick: u64,
    log_retention: usize,
    default_decision_time_ms: u64,
    open_prompts: BTreeMap<String, OpenPrompt>,
}

impl GameHost {
    /// Build a host over the given catalog and configuration, starting
    /// from a fresh game.
    pub fn new(catalog: Arc<EventCatalog>, config: &EngineConfig) -> Self {
        Self::with_state(catalog, config, GameState::new_game())
    }

    /// Build a host resuming from an existing state.
    pub fn with_state(
        catalog: Arc<EventCatalog>,
        config: &EngineConfig,
        state: GameState,
    ) -> Self {
        Self {
            state,
            manager: EventManager::with_tick_rate(catalog, config.world.ticks_per_second),
            rng: StdRng::seed_from_u64(config.world.seed),
            tick: 0,
            log_retention: config.engine.log_retention,
            default_decision_time_ms: config.engine.default_decision_time_ms,
            open_prompts: BTreeMap::new(),
        }
    }

    /// The canonical state.
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Entry ids of prompts still awaiting input or expiry.
    pub fn open_prompt_ids(&self) -> Vec<String> {
        self.open_prompts.keys().cloned().collect()
    }

    /// Advance one tick at the given wall-clock instant.
    ///
    /// Expired timed prompts resolve first (their fallback consequences
    /// are visible to this tick's conditions), then one scheduling pass
    /// runs. An effect fault discards that tick's delta and is reported,
    /// not propagated; merge failures are real bugs and do propagate.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Merge`] when a produced delta cannot be
    /// folded back into the state.
    pub fn run_tick(&mut self, now_ms: i64) -> Result<TickReport, EngineError> {
        self.tick = self.tick.saturating_add(1);
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        self.expire_due(now_ms, &mut report)?;

        match self.manager.check_events(&self.state, &mut self.rng, now_ms) {
            Ok(outcome) => {
                report.fired = outcome.entries.first().map(|e| e.event_id.clone());
                self.apply_outcome(outcome.delta, outcome.entries, now_ms, &mut report)?;
            }
            Err(EngineError::Effect { event_id, source }) => {
                tracing::warn!(event_id = %event_id, error = %source, "effect fault, tick discarded");
                report.faulted = Some(event_id);
            }
            Err(other) => return Err(other),
        }

        Ok(report)
    }

    /// Resolve a player's choice on a log entry.
    ///
    /// Closes any countdown on that entry, applies the choice, and merges
    /// the result. Stale entry ids resolve to a no-op. Returns any
    /// presentation notices the choice produced.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the choice effect faults or the merge
    /// fails; the state is untouched in either case.
    pub fn resolve_choice(
        &mut self,
        entry_id: &str,
        choice_id: &str,
    ) -> Result<Vec<String>, EngineError> {
        self.open_prompts.remove(entry_id);

        let Some(entry) = self.state.log.iter().find(|e| e.id == entry_id).cloned() else {
            tracing::debug!(entry_id, choice_id, "choice for pruned entry ignored");
            return Ok(Vec::new());
        };

        let delta = apply_event_choice(
            self.manager.catalog(),
            &self.state,
            choice_id,
            &entry.event_id,
            Some(&entry),
        )?;
        let mut notices = Vec::new();
        self.merge_delta(&delta, &mut notices)?;
        Ok(notices)
    }

    /// Resolve prompts whose deadlines have passed, applying each one's
    /// fallback choice. A faulting fallback is logged and skipped; the
    /// prompt still closes so it cannot fault every tick.
    fn expire_due(&mut self, now_ms: i64, report: &mut TickReport) -> Result<(), EngineError> {
        let due: Vec<(String, OpenPrompt)> = self
            .open_prompts
            .iter()
            .filter(|(_, prompt)| prompt.deadline_ms <= now_ms)
            .map(|(id, prompt)| (id.clone(), prompt.clone()))
            .collect();

        for (entry_id, prompt) in due {
            self.open_prompts.remove(&entry_id);

            let Some(entry) = self.state.log.iter().find(|e| e.id == entry_id).cloned() else {
                continue;
            };

            let resolved = apply_event_choice(
                self.manager.catalog(),
                &self.state,
                &prompt.fallback_choice_id,
                &prompt.event_id,
                Some(&entry),
            );
            match resolved {
                Ok(delta) => {
                    self.merge_delta(&delta, &mut report.notices)?;
                    report.expired_prompts.push(entry_id);
                }
                Err(EngineError::Effect { event_id, source }) => {
                    tracing::warn!(event_id = %event_id, error = %source, "fallback effect fault");
                }
                Err(other) => return Err(other),
            }
        }

        Ok(())
    }

    /// Merge a scheduling outcome: fold the delta, append entries, trim
    /// the log to retention, and register countdowns for timed prompts.
    fn apply_outcome(
        &mut self,
        delta: StateDelta,
        entries: Vec<LogEntry>,
        now_ms: i64,
        report: &mut TickReport,
    ) -> Result<(), EngineError> {
        self.merge_delta(&delta, &mut report.notices)?;

        for entry in entries {
            if let Some(timed) = &entry.timed {
                // Entries restored from older saves may lack a countdown.
                let duration_ms = if timed.base_decision_time_ms == 0 {
                    self.default_decision_time_ms
                } else {
                    timed.base_decision_time_ms
                };
                let countdown = i64::try_from(duration_ms).unwrap_or(i64::MAX);
                self.open_prompts.insert(
                    entry.id.clone(),
                    OpenPrompt {
                        event_id: entry.event_id.clone(),
                        fallback_choice_id: timed.fallback_choice_id.clone(),
                        deadline_ms: now_ms.saturating_add(countdown),
                    },
                );
            }
            self.state.log.push(entry);
        }

        let overflow = self.state.log.len().saturating_sub(self.log_retention);
        if overflow > 0 {
            // Oldest entries go first; their open prompts go with them.
            for removed in self.state.log.drain(..overflow) {
                self.open_prompts.remove(&removed.id);
            }
        }

        Ok(())
    }

    fn merge_delta(
        &mut self,
        delta: &StateDelta,
        notices: &mut Vec<String>,
    ) -> Result<(), EngineError> {
        if let Some(notice) = take_marker(delta, markers::NOTICE) {
            notices.push(notice);
        }
        self.state = merge(&self.state, delta)?;
        Ok(())
    }
}
