//! Fluent builder for transition tables.

use crate::definition::{label, Event, Key, MachineDefinition, StateEntry};
use crate::error::{ActionError, CoreError, DefinitionError};

/// Builds a [`MachineDefinition`] one state group at a time.
///
/// `.state(s)` opens a group; the `.on(..)` calls that follow add rows whose
/// source is `s`. The first state opened is the initial state.
///
/// ```
/// use tabfsm_core::{Event, MachineBuilder};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Light { Off, On }
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Switch { Flip }
///
/// impl Event for Switch {
///     type Kind = Switch;
///     fn kind(&self) -> Switch { *self }
/// }
///
/// impl std::fmt::Display for Light {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         std::fmt::Debug::fmt(self, f)
///     }
/// }
///
/// impl std::fmt::Display for Switch {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         std::fmt::Debug::fmt(self, f)
///     }
/// }
///
/// let def = MachineBuilder::<Light, Switch>::new()
///     .events([Switch::Flip])
///     .state(Light::Off)
///     .on_silent(Switch::Flip, Light::On)
///     .state(Light::On)
///     .on_silent(Switch::Flip, Light::Off)
///     .build()
///     .unwrap();
///
/// assert_eq!(def.initial(), &Light::Off);
/// ```
pub struct MachineBuilder<S, E: Event> {
    events: Vec<E::Kind>,
    entries: Vec<StateEntry<S, E>>,
    orphan: Option<E::Kind>,
}

impl<S: Key, E: Event> MachineBuilder<S, E> {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            entries: Vec::new(),
            orphan: None,
        }
    }

    /// Declares events, in order.
    pub fn events(mut self, events: impl IntoIterator<Item = E::Kind>) -> Self {
        self.events.extend(events);
        self
    }

    /// Declares a single event.
    pub fn event(mut self, event: E::Kind) -> Self {
        self.events.push(event);
        self
    }

    /// Opens the group of rows leaving `state`.
    pub fn state(mut self, state: S) -> Self {
        self.entries.push(StateEntry::new(state));
        self
    }

    /// Adds a row from the open state with an action.
    pub fn on<F>(mut self, event: E::Kind, dest: S, action: F) -> Self
    where
        F: Fn(&E) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        match self.entries.pop() {
            Some(entry) => self.entries.push(entry.on(event, dest, action)),
            None => self.mark_orphan(event),
        }
        self
    }

    /// Adds a row from the open state without an action.
    pub fn on_silent(mut self, event: E::Kind, dest: S) -> Self {
        match self.entries.pop() {
            Some(entry) => self.entries.push(entry.on_silent(event, dest)),
            None => self.mark_orphan(event),
        }
        self
    }

    fn mark_orphan(&mut self, event: E::Kind) {
        if self.orphan.is_none() {
            self.orphan = Some(event);
        }
    }

    /// Validates the table and builds the definition.
    pub fn build(self) -> Result<MachineDefinition<S, E>, CoreError> {
        if let Some(event) = self.orphan {
            return Err(DefinitionError::TransitionWithoutState {
                event: label(&event),
            }
            .into());
        }

        MachineDefinition::new(self.events, self.entries)
    }
}

impl<S: Key, E: Event> Default for MachineBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}
