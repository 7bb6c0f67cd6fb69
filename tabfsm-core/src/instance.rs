//! Instance state management.

use crate::definition::{label, Event, Key, MachineDefinition};
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What `process_event` does when the table has no row for the current
/// state and event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingTransition {
    /// Drop the event; state and actions are untouched.
    #[default]
    Ignore,
    /// Report `CoreError::InvalidTransition`.
    Error,
}

impl std::str::FromStr for MissingTransition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "error" | "strict" => Ok(Self::Error),
            other => Err(format!(
                "unknown missing-transition policy '{}' (expected 'ignore' or 'error')",
                other
            )),
        }
    }
}

/// Result of processing an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult<S> {
    pub from: S,
    pub to: S,
    /// False when the event had no row and was ignored.
    pub applied: bool,
}

/// A running state machine bound to one definition.
///
/// The instance exclusively owns its current state; dispatch takes
/// `&mut self`. Wrap it in a [`SharedInstance`](crate::SharedInstance) to
/// drive it from several threads.
pub struct MachineInstance<S, E: Event> {
    definition: Arc<MachineDefinition<S, E>>,
    current: S,
    started: bool,
    policy: MissingTransition,
    fired: u64,
}

impl<S: Key, E: Event> MachineInstance<S, E> {
    /// Creates an instance that has not been started yet.
    pub fn new(definition: Arc<MachineDefinition<S, E>>) -> Self {
        let current = definition.initial().clone();
        Self {
            definition,
            current,
            started: false,
            policy: MissingTransition::default(),
            fired: 0,
        }
    }

    pub fn with_policy(mut self, policy: MissingTransition) -> Self {
        self.policy = policy;
        self
    }

    /// Enters the initial state. No action runs.
    ///
    /// Calling this on a started instance restarts it.
    pub fn initiate(&mut self) {
        if self.started {
            tracing::debug!("restarting machine from {:?}", self.current);
        }
        self.current = self.definition.initial().clone();
        self.started = true;
        self.fired = 0;
        tracing::trace!("machine initiated in {:?}", self.current);
    }

    /// Stops the instance. Events are rejected until `initiate` is called
    /// again.
    pub fn terminate(&mut self) {
        self.started = false;
    }

    /// Feeds one event through the transition table.
    ///
    /// The row's action runs before the state changes; if it fails the
    /// instance stays where it was.
    pub fn process_event(&mut self, event: &E) -> Result<ApplyResult<S>, CoreError> {
        if !self.started {
            return Err(CoreError::NotStarted);
        }

        let kind = event.kind();
        let Some(row) = self.definition.get_transition(&self.current, &kind) else {
            return match self.policy {
                MissingTransition::Ignore => {
                    tracing::debug!("ignoring {:?} in state {:?}", kind, self.current);
                    Ok(ApplyResult {
                        from: self.current.clone(),
                        to: self.current.clone(),
                        applied: false,
                    })
                }
                MissingTransition::Error => Err(CoreError::InvalidTransition {
                    state: label(&self.current),
                    event: label(&kind),
                }),
            };
        };

        if let Err(source) = row.run_action(event) {
            tracing::warn!(
                "action for {:?} -> {:?} on {:?} failed: {}",
                row.source,
                row.dest,
                kind,
                source
            );
            return Err(CoreError::Action {
                state: label(&self.current),
                event: label(&kind),
                source,
            });
        }

        let result = ApplyResult {
            from: self.current.clone(),
            to: row.dest.clone(),
            applied: true,
        };
        tracing::debug!("{:?} --{:?}--> {:?}", result.from, kind, result.to);

        self.current = row.dest.clone();
        self.fired += 1;

        Ok(result)
    }

    pub fn current_state(&self) -> &S {
        &self.current
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// True when the current state has no outgoing rows.
    pub fn is_terminal(&self) -> bool {
        self.definition.is_terminal(&self.current)
    }

    /// Number of transitions fired since the last `initiate`.
    pub fn transitions_fired(&self) -> u64 {
        self.fired
    }

    pub fn policy(&self) -> MissingTransition {
        self.policy
    }

    pub fn definition(&self) -> &Arc<MachineDefinition<S, E>> {
        &self.definition
    }
}

impl<S: fmt::Debug, E: Event> fmt::Debug for MachineInstance<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineInstance")
            .field("current", &self.current)
            .field("started", &self.started)
            .field("policy", &self.policy)
            .field("fired", &self.fired)
            .finish()
    }
}
