//! Machine definition types.
//!
//! A definition is the validated, immutable form of a transition table
//! grouped by source state, the same shape a table is written in:
//!
//! ```text
//! events: Stop, Play
//! Stopped:
//!     Play -> Playing   (action)
//!     Stop -> Stopped   (action)
//! Playing:
//!     Stop -> Stopped   (action)
//! ```
//!
//! The first listed state is the initial state. A pair `(state, event)` with
//! no row is allowed; what happens when such an event arrives is decided by
//! the instance's [`MissingTransition`](crate::MissingTransition) policy.

use crate::error::{ActionError, CoreError, DefinitionError};
use crate::instance::MachineInstance;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Bound shared by state and event kinds: cheap to clone, hashable, and
/// printable in errors and logs.
///
/// `Display` is the name a kind is reported under; `Debug` is used in logs.
pub trait Key: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {}

impl<T> Key for T where T: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {}

/// Renders a kind for errors.
pub(crate) fn label<T: fmt::Display>(value: &T) -> String {
    value.to_string()
}

/// An event fed to a machine.
///
/// The table is keyed by the event's kind; the event value itself (with
/// whatever payload it carries) is handed to the action.
pub trait Event: Send + Sync + 'static {
    type Kind: Key;

    fn kind(&self) -> Self::Kind;
}

/// An event kind paired with a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal<K, P = ()> {
    pub kind: K,
    pub payload: P,
}

impl<K, P> Signal<K, P> {
    pub fn with_payload(kind: K, payload: P) -> Self {
        Self { kind, payload }
    }
}

impl<K> Signal<K> {
    pub fn new(kind: K) -> Self {
        Self { kind, payload: () }
    }
}

impl<K: Key, P: Send + Sync + 'static> Event for Signal<K, P> {
    type Kind = K;

    fn kind(&self) -> K {
        self.kind.clone()
    }
}

/// Side effect run when a transition fires.
pub type Action<E> = Arc<dyn Fn(&E) -> Result<(), ActionError> + Send + Sync>;

/// One row of the transition table.
pub struct TransitionRow<S, E: Event> {
    pub source: S,
    pub event: E::Kind,
    pub dest: S,
    /// `None` fires the transition without a side effect.
    pub action: Option<Action<E>>,
}

impl<S: Key, E: Event> TransitionRow<S, E> {
    /// Runs the row's action, if any.
    pub fn run_action(&self, event: &E) -> Result<(), ActionError> {
        match &self.action {
            Some(action) => action(event),
            None => Ok(()),
        }
    }
}

impl<S: Clone, E: Event> Clone for TransitionRow<S, E> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            event: self.event.clone(),
            dest: self.dest.clone(),
            action: self.action.clone(),
        }
    }
}

impl<S: fmt::Debug, E: Event> fmt::Debug for TransitionRow<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionRow")
            .field("source", &self.source)
            .field("event", &self.event)
            .field("dest", &self.dest)
            .field("action", &self.action.is_some())
            .finish()
    }
}

/// Outgoing transitions of one source state, as written in a table.
pub struct StateEntry<S, E: Event> {
    pub state: S,
    pub transitions: Vec<(E::Kind, S, Option<Action<E>>)>,
}

impl<S, E: Event> StateEntry<S, E> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            transitions: Vec::new(),
        }
    }

    /// Adds a transition with an action.
    pub fn on<F>(mut self, event: E::Kind, dest: S, action: F) -> Self
    where
        F: Fn(&E) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.transitions.push((event, dest, Some(Arc::new(action))));
        self
    }

    /// Adds a transition with no action.
    pub fn on_silent(mut self, event: E::Kind, dest: S) -> Self {
        self.transitions.push((event, dest, None));
        self
    }
}

/// Validated and indexed machine definition.
pub struct MachineDefinition<S, E: Event> {
    /// All states, in declaration order.
    states: Vec<S>,

    /// All events, in declaration order.
    events: Vec<E::Kind>,

    /// Rows in table order.
    rows: Vec<TransitionRow<S, E>>,

    /// (source, event) -> index into `rows`.
    index: HashMap<(S, E::Kind), usize>,
}

impl<S: Key, E: Event> MachineDefinition<S, E> {
    /// Validates a grouped transition table and builds the definition.
    ///
    /// The initial state is the state of the first entry.
    pub fn new(
        events: Vec<E::Kind>,
        entries: Vec<StateEntry<S, E>>,
    ) -> Result<Self, CoreError> {
        if entries.is_empty() {
            return Err(DefinitionError::NoStates.into());
        }
        if events.is_empty() {
            return Err(DefinitionError::NoEvents.into());
        }

        let mut event_set = HashSet::with_capacity(events.len());
        for event in &events {
            if !event_set.insert(event.clone()) {
                return Err(DefinitionError::DuplicateEvent {
                    event: label(&event),
                }
                .into());
            }
        }

        let mut states = Vec::with_capacity(entries.len());
        let mut state_set = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !state_set.insert(entry.state.clone()) {
                return Err(DefinitionError::DuplicateState {
                    state: label(&entry.state),
                }
                .into());
            }
            states.push(entry.state.clone());
        }

        let mut rows = Vec::new();
        let mut index = HashMap::new();
        for entry in entries {
            for (event, dest, action) in entry.transitions {
                if !event_set.contains(&event) {
                    return Err(DefinitionError::UnknownEvent {
                        from: label(&entry.state),
                        event: label(&event),
                    }
                    .into());
                }

                if !state_set.contains(&dest) {
                    return Err(DefinitionError::UnknownState {
                        from: label(&entry.state),
                        event: label(&event),
                        state: label(&dest),
                    }
                    .into());
                }

                let key = (entry.state.clone(), event.clone());
                if index.contains_key(&key) {
                    return Err(DefinitionError::DuplicateTransition {
                        from: label(&entry.state),
                        event: label(&event),
                    }
                    .into());
                }

                index.insert(key, rows.len());
                rows.push(TransitionRow {
                    source: entry.state.clone(),
                    event,
                    dest,
                    action,
                });
            }
        }

        tracing::debug!(
            "built machine definition: {} states, {} events, {} transitions, initial {:?}",
            states.len(),
            events.len(),
            rows.len(),
            states[0]
        );

        Ok(Self {
            states,
            events,
            rows,
            index,
        })
    }

    /// Creates a started instance of this definition.
    pub fn initiate(self: &Arc<Self>) -> MachineInstance<S, E> {
        let mut instance = MachineInstance::new(Arc::clone(self));
        instance.initiate();
        instance
    }

    /// The state new instances start in.
    pub fn initial(&self) -> &S {
        // `new` rejects an empty state list.
        &self.states[0]
    }

    pub fn states(&self) -> &[S] {
        &self.states
    }

    pub fn events(&self) -> &[E::Kind] {
        &self.events
    }

    /// All rows in table order.
    pub fn rows(&self) -> &[TransitionRow<S, E>] {
        &self.rows
    }

    /// Looks up the row for the given state and event kind.
    pub fn get_transition(&self, state: &S, event: &E::Kind) -> Option<&TransitionRow<S, E>> {
        self.index
            .get(&(state.clone(), event.clone()))
            .map(|&i| &self.rows[i])
    }

    /// Returns true if the given state is declared by this machine.
    pub fn has_state(&self, state: &S) -> bool {
        self.states.contains(state)
    }

    /// Returns true if the given event kind is declared by this machine.
    pub fn has_event(&self, event: &E::Kind) -> bool {
        self.events.contains(event)
    }

    /// Returns the event kinds handled in the given state, in table order.
    pub fn events_from(&self, state: &S) -> Vec<&E::Kind> {
        self.rows
            .iter()
            .filter(|r| &r.source == state)
            .map(|r| &r.event)
            .collect()
    }

    /// A state with no outgoing rows.
    pub fn is_terminal(&self, state: &S) -> bool {
        !self.rows.iter().any(|r| &r.source == state)
    }
}

impl<S: fmt::Debug, E: Event> fmt::Debug for MachineDefinition<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineDefinition")
            .field("states", &self.states)
            .field("events", &self.events)
            .field("rows", &self.rows)
            .finish()
    }
}
