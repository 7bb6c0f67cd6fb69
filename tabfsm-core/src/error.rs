//! Core error types.

use thiserror::Error;

/// Errors from the state machine engine.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid machine definition: {0}")]
    InvalidDefinition(#[from] DefinitionError),

    #[error("machine not started: call initiate() before processing events")]
    NotStarted,

    #[error("invalid transition: cannot apply '{event}' in state '{state}'")]
    InvalidTransition { state: String, event: String },

    #[error("action failed for '{event}' in state '{state}': {source}")]
    Action {
        state: String,
        event: String,
        #[source]
        source: ActionError,
    },

    #[error("machine not found: {name}")]
    DefinitionNotFound { name: String },

    #[error("machine already registered: {name}")]
    DefinitionExists { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CoreError {
    /// Returns a stable error code for display and scripting.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::InvalidDefinition(_) => "INVALID_DEFINITION",
            CoreError::NotStarted => "NOT_STARTED",
            CoreError::InvalidTransition { .. } => "INVALID_TRANSITION",
            CoreError::Action { .. } => "ACTION_FAILED",
            CoreError::DefinitionNotFound { .. } => "MACHINE_NOT_FOUND",
            CoreError::DefinitionExists { .. } => "MACHINE_EXISTS",
            CoreError::Io(_) => "IO_ERROR",
            CoreError::Json(_) | CoreError::Yaml(_) => "BAD_TABLE",
        }
    }
}

/// Reasons a transition table is rejected at build time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("no states declared")]
    NoStates,

    #[error("no events declared")]
    NoEvents,

    #[error("state '{state}' is listed more than once")]
    DuplicateState { state: String },

    #[error("event '{event}' is listed more than once")]
    DuplicateEvent { event: String },

    #[error("transition from '{from}' on '{event}' targets unknown state '{state}'")]
    UnknownState {
        from: String,
        event: String,
        state: String,
    },

    #[error("transition from '{from}' uses undeclared event '{event}'")]
    UnknownEvent { from: String, event: String },

    #[error("duplicate transition from '{from}' on event '{event}'")]
    DuplicateTransition { from: String, event: String },

    #[error("transition on '{event}' declared before any state")]
    TransitionWithoutState { event: String },
}

/// Failure reported by a transition action.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ActionError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an underlying error, keeping it as the error source.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for ActionError {
    fn from(e: std::io::Error) -> Self {
        Self::with_source("I/O failure in action", e)
    }
}
