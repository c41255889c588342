//! The event-definition schema.
//!
//! Conditions are pure reads of the state; effects are pure
//! `state -> partial delta` transforms. Anything that looks like a side
//! effect (a dialog, a sound, combat) is expressed as data in the returned
//! delta for a presentation collaborator to interpret -- the engine never
//! calls out to rendering or audio.

use std::fmt;
use std::sync::Arc;

use rand::RngCore;

use ravenmoor_types::{ChoiceSnapshot, GameState, LogKind, StateDelta, TradeTerms};

/// Error produced by a faulting effect function.
///
/// The engine treats this as fatal for the tick: the partial delta is
/// discarded, the fault is logged with the offending event id, and the
/// host loop continues on the next tick.
#[derive(Debug, thiserror::Error)]
#[error("{reason}")]
pub struct EffectError {
    /// Human-readable description of the fault.
    pub reason: String,
}

impl EffectError {
    /// Build an effect error from any displayable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Pure predicate over the game state.
pub type Condition = Arc<dyn Fn(&GameState) -> bool + Send + Sync>;

/// Pure `state -> partial delta` transform.
pub type EffectFn = Arc<dyn Fn(&GameState) -> Result<StateDelta, EffectError> + Send + Sync>;

/// Generator producing a fresh choice list at trigger time (the wandering
/// merchant's offers differ per firing). Resolved exactly once when the
/// event fires, never re-evaluated per render.
pub type ChoiceGenerator =
    Arc<dyn Fn(&GameState, &mut dyn RngCore) -> Vec<EventChoice> + Send + Sync>;

/// State-dependent average-minutes-between-triggers function.
pub type MinutesFn = Arc<dyn Fn(&GameState) -> f64 + Send + Sync>;

/// Display text that is either fixed or computed from the current state.
#[derive(Clone)]
pub enum Text {
    /// Literal text.
    Fixed(String),
    /// Text computed from the state at resolve time.
    Dynamic(Arc<dyn Fn(&GameState) -> String + Send + Sync>),
}

impl Text {
    /// Resolve to a plain string against the given state.
    pub fn resolve(&self, state: &GameState) -> String {
        match self {
            Self::Fixed(text) => text.clone(),
            Self::Dynamic(f) => f(state),
        }
    }

    /// Build dynamic text from a closure.
    pub fn dynamic(f: impl Fn(&GameState) -> String + Send + Sync + 'static) -> Self {
        Self::Dynamic(Arc::new(f))
    }
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Self::Fixed(text.to_owned())
    }
}

impl From<String> for Text {
    fn from(text: String) -> Self {
        Self::Fixed(text)
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(text) => f.debug_tuple("Fixed").field(text).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Average minutes between triggers, fixed or state-dependent.
///
/// The event manager converts this to a per-tick firing probability using
/// the host's fixed tick rate.
#[derive(Clone)]
pub enum TimeProbability {
    /// Fixed average minutes between triggers.
    Minutes(f64),
    /// Average minutes computed from the current state.
    FromState(MinutesFn),
}

impl TimeProbability {
    /// Resolve to average minutes between triggers.
    pub fn resolve(&self, state: &GameState) -> f64 {
        match self {
            Self::Minutes(minutes) => *minutes,
            Self::FromState(f) => f(state),
        }
    }
}

impl fmt::Debug for TimeProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minutes(minutes) => f.debug_tuple("Minutes").field(minutes).finish(),
            Self::FromState(_) => f.write_str("FromState(..)"),
        }
    }
}

/// Informational classification of what drives an event. Never alters
/// evaluation; kept for authoring and tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerType {
    /// Paced by elapsed play time.
    Time,
    /// Gated on resource levels.
    Resource,
    /// Ambient random flavor.
    Random,
    /// Armed by a player action or state-machine flag.
    Action,
}

/// One selectable option attached to an event.
#[derive(Clone)]
pub struct EventChoice {
    /// Stable identifier within the event.
    pub id: String,
    /// Display label.
    pub label: Text,
    /// Optional display-only cost string.
    pub cost: Option<Text>,
    /// Structured trade data for generated offers. When present, the
    /// resolver settles the trade from these terms; nothing parses the
    /// label or cost text.
    pub trade: Option<TradeTerms>,
    /// Stats hinted as relevant to this choice's outcome (display only).
    pub relevant_stats: Vec<String>,
    /// Advertised success chance in `[0, 1]` (display only).
    pub success_chance: Option<f64>,
    /// Effect applied when the choice resolves.
    pub effect: EffectFn,
}

impl EventChoice {
    /// Build a choice from its id, label, and effect closure.
    pub fn new(
        id: &str,
        label: impl Into<Text>,
        effect: impl Fn(&GameState) -> Result<StateDelta, EffectError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.to_owned(),
            label: label.into(),
            cost: None,
            trade: None,
            relevant_stats: Vec::new(),
            success_chance: None,
            effect: Arc::new(effect),
        }
    }

    /// A choice whose effect changes nothing (dismissals).
    pub fn dismiss(id: &str, label: impl Into<Text>) -> Self {
        Self::new(id, label, |_state| Ok(StateDelta::new()))
    }

    /// Attach a display-only cost string.
    #[must_use]
    pub fn with_cost(mut self, cost: impl Into<Text>) -> Self {
        self.cost = Some(cost.into());
        self
    }

    /// Attach structured trade terms.
    #[must_use]
    pub fn with_trade(mut self, trade: TradeTerms) -> Self {
        self.trade = Some(trade);
        self
    }

    /// Attach outcome hinting (relevant stats and advertised chance).
    #[must_use]
    pub fn with_hint(mut self, relevant_stats: &[&str], success_chance: f64) -> Self {
        self.relevant_stats = relevant_stats.iter().map(|s| (*s).to_owned()).collect();
        self.success_chance = Some(success_chance);
        self
    }

    /// Capture this choice as presented against the given state. Labels
    /// and costs are resolved to plain strings; trade terms are copied.
    pub fn snapshot(&self, state: &GameState) -> ChoiceSnapshot {
        ChoiceSnapshot {
            id: self.id.clone(),
            label: self.label.resolve(state),
            cost: self.cost.as_ref().map(|c| c.resolve(state)),
            trade: self.trade.clone(),
        }
    }
}

impl fmt::Debug for EventChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChoice")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("trade", &self.trade)
            .finish_non_exhaustive()
    }
}

/// How an event supplies its choices.
#[derive(Clone, Default)]
pub enum ChoiceSource {
    /// The event has no choices; its `effect` runs at trigger time.
    #[default]
    None,
    /// A literal, author-declared choice list.
    Fixed(Vec<EventChoice>),
    /// Choices generated fresh per firing (merchant offers).
    Generated(ChoiceGenerator),
}

impl ChoiceSource {
    /// Whether this source supplies any choices.
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Debug for ChoiceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Fixed(choices) => f.debug_tuple("Fixed").field(choices).finish(),
            Self::Generated(_) => f.write_str("Generated(..)"),
        }
    }
}

/// A declarative event definition.
///
/// Read-only data loaded once at process start. The definition table never
/// records firing state; that lives in `GameState::triggered_events`.
#[derive(Clone)]
pub struct EventDefinition {
    /// Unique, stable identifier.
    pub id: String,
    /// Optional heading shown above the message.
    pub title: Option<Text>,
    /// Narrative body text.
    pub message: Text,
    /// Presentation category for produced log entries.
    pub kind: LogKind,
    /// Informational trigger classification.
    pub trigger_type: TriggerType,
    /// Higher priorities are evaluated first; ties keep declaration order.
    pub priority: i32,
    /// Whether the event may fire more than once.
    pub repeatable: bool,
    /// Average minutes between triggers; absent means "fire immediately
    /// when the condition holds".
    pub time_probability: Option<TimeProbability>,
    /// Firing predicate.
    pub condition: Condition,
    /// Direct effect, used only when the event has no choices.
    pub effect: Option<EffectFn>,
    /// Choice supply.
    pub choices: ChoiceSource,
    /// Whether the prompt auto-resolves on a host-owned countdown.
    pub is_timed_choice: bool,
    /// Countdown duration in milliseconds for timed choices.
    pub base_decision_time_ms: u64,
    /// Choice applied when the countdown elapses. Required when
    /// `is_timed_choice` is set; validated at catalog load.
    pub fallback_choice: Option<EventChoice>,
}

impl EventDefinition {
    /// Start building a definition with the given id.
    pub fn builder(id: &str) -> EventBuilder {
        EventBuilder::new(id)
    }

    /// Find a fixed choice by id (generated choices are only reachable
    /// through log-entry snapshots).
    pub fn fixed_choice(&self, choice_id: &str) -> Option<&EventChoice> {
        if let ChoiceSource::Fixed(choices) = &self.choices {
            choices.iter().find(|c| c.id == choice_id)
        } else {
            None
        }
    }
}

impl fmt::Debug for EventDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDefinition")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("repeatable", &self.repeatable)
            .field("trigger_type", &self.trigger_type)
            .field("is_timed_choice", &self.is_timed_choice)
            .finish_non_exhaustive()
    }
}

/// Builder for [`EventDefinition`].
///
/// Defaults: `System` kind, `Random` trigger, priority 1, non-repeatable,
/// always-true condition, no probability, no choices.
#[derive(Debug)]
pub struct EventBuilder {
    definition: EventDefinition,
}

impl EventBuilder {
    fn new(id: &str) -> Self {
        Self {
            definition: EventDefinition {
                id: id.to_owned(),
                title: None,
                message: Text::Fixed(String::new()),
                kind: LogKind::System,
                trigger_type: TriggerType::Random,
                priority: 1,
                repeatable: false,
                time_probability: None,
                condition: Arc::new(|_state| true),
                effect: None,
                choices: ChoiceSource::None,
                is_timed_choice: false,
                base_decision_time_ms: 0,
                fallback_choice: None,
            },
        }
    }

    /// Set the heading text.
    #[must_use]
    pub fn title(mut self, title: impl Into<Text>) -> Self {
        self.definition.title = Some(title.into());
        self
    }

    /// Set the narrative body text.
    #[must_use]
    pub fn message(mut self, message: impl Into<Text>) -> Self {
        self.definition.message = message.into();
        self
    }

    /// Set the presentation category.
    #[must_use]
    pub fn kind(mut self, kind: LogKind) -> Self {
        self.definition.kind = kind;
        self
    }

    /// Set the informational trigger classification.
    #[must_use]
    pub fn trigger(mut self, trigger_type: TriggerType) -> Self {
        self.definition.trigger_type = trigger_type;
        self
    }

    /// Set the evaluation priority (higher first).
    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.definition.priority = priority;
        self
    }

    /// Allow the event to fire more than once.
    #[must_use]
    pub fn repeatable(mut self) -> Self {
        self.definition.repeatable = true;
        self
    }

    /// Set the firing predicate.
    #[must_use]
    pub fn condition(mut self, f: impl Fn(&GameState) -> bool + Send + Sync + 'static) -> Self {
        self.definition.condition = Arc::new(f);
        self
    }

    /// Fixed average minutes between triggers.
    #[must_use]
    pub fn every_minutes(mut self, minutes: f64) -> Self {
        self.definition.time_probability = Some(TimeProbability::Minutes(minutes));
        self
    }

    /// State-dependent average minutes between triggers.
    #[must_use]
    pub fn every_minutes_fn(
        mut self,
        f: impl Fn(&GameState) -> f64 + Send + Sync + 'static,
    ) -> Self {
        self.definition.time_probability = Some(TimeProbability::FromState(Arc::new(f)));
        self
    }

    /// Direct effect for a choiceless event.
    #[must_use]
    pub fn effect(
        mut self,
        f: impl Fn(&GameState) -> Result<StateDelta, EffectError> + Send + Sync + 'static,
    ) -> Self {
        self.definition.effect = Some(Arc::new(f));
        self
    }

    /// Literal choice list.
    #[must_use]
    pub fn choices(mut self, choices: Vec<EventChoice>) -> Self {
        self.definition.choices = ChoiceSource::Fixed(choices);
        self
    }

    /// Per-firing choice generator.
    #[must_use]
    pub fn generated_choices(
        mut self,
        f: impl Fn(&GameState, &mut dyn RngCore) -> Vec<EventChoice> + Send + Sync + 'static,
    ) -> Self {
        self.definition.choices = ChoiceSource::Generated(Arc::new(f));
        self
    }

    /// Mark the prompt as timed with the given countdown.
    #[must_use]
    pub fn timed(mut self, base_decision_time_ms: u64) -> Self {
        self.definition.is_timed_choice = true;
        self.definition.base_decision_time_ms = base_decision_time_ms;
        self
    }

    /// Choice applied when a timed prompt expires. May be absent from the
    /// presented list.
    #[must_use]
    pub fn fallback(mut self, choice: EventChoice) -> Self {
        self.definition.fallback_choice = Some(choice);
        self
    }

    /// Finish building. Configuration validation happens when the
    /// definition is loaded into an [`crate::EventCatalog`].
    pub fn build(self) -> EventDefinition {
        self.definition
    }
}
