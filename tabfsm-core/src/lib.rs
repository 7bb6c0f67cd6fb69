//! # tabfsm-core
//!
//! Table-driven finite-state machine engine.
//!
//! This crate provides:
//! - Transition table validation and indexing
//! - Machine instances with event dispatch and per-transition actions
//! - Declarative tables loaded from JSON or YAML
//! - A named registry and a mutex-guarded shared instance
//! - The `fsm_table!` macro for declaring a machine in table notation

pub mod builder;
pub mod definition;
pub mod error;
pub mod instance;
mod macros;
pub mod registry;
pub mod shared;
pub mod table;

pub use builder::MachineBuilder;
pub use definition::{Action, Event, Key, MachineDefinition, Signal, StateEntry, TransitionRow};
pub use error::{ActionError, CoreError, DefinitionError};
pub use instance::{ApplyResult, MachineInstance, MissingTransition};
pub use registry::MachineRegistry;
pub use shared::SharedInstance;
pub use table::{RowSpec, StateSpec, TableMachine, TableSpec};
