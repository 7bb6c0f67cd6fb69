//! Declarative transition tables loaded from JSON or YAML.
//!
//! A table is grouped by source state; the first group is the initial
//! state:
//!
//! ```yaml
//! name: player
//! events: [Stop, Play]
//! states:
//!   - state: Stopped
//!     transitions:
//!       - { event: Play, to: Playing, message: "starting to play with event {event}" }
//!       - { event: Stop, to: Stopped, message: "stopping" }
//!   - state: Playing
//!     transitions:
//!       - { event: Stop, to: Stopped, message: "staying in Stopped" }
//! ```
//!
//! A row's `message` becomes its action: `{event}` is replaced with the
//! triggering event's name and the line is handed to an output sink.

use crate::definition::{MachineDefinition, Signal, StateEntry};
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Machine built from a table file: string states, string-tagged events.
pub type TableMachine = MachineDefinition<String, Signal<String>>;

/// One row inside a state group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSpec {
    /// Event that triggers this transition.
    pub event: String,

    /// Target state.
    pub to: String,

    /// Line emitted when the transition fires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outgoing rows of one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSpec {
    pub state: String,

    #[serde(default)]
    pub transitions: Vec<RowSpec>,
}

/// Raw table as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Optional machine name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// All events, in order.
    pub events: Vec<String>,

    /// State groups; the first is initial.
    pub states: Vec<StateSpec>,
}

impl TableSpec {
    pub fn from_json(json: &serde_json::Value) -> Result<Self, CoreError> {
        Ok(serde_json::from_value(json.clone())?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, CoreError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a table file. `.json` is parsed as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Name of the machine, falling back to `"machine"`.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("machine")
    }

    /// Validates the table and builds a definition whose row messages are
    /// passed to `emit`.
    pub fn compile<F>(&self, emit: F) -> Result<TableMachine, CoreError>
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let emit = Arc::new(emit);

        let entries: Vec<StateEntry<String, Signal<String>>> = self
            .states
            .iter()
            .map(|group| {
                group.transitions.iter().fold(
                    StateEntry::new(group.state.clone()),
                    |entry, row| match &row.message {
                        Some(template) => {
                            let template = template.clone();
                            let emit = Arc::clone(&emit);
                            entry.on(
                                row.event.clone(),
                                row.to.clone(),
                                move |event: &Signal<String>| {
                                    emit(&render(&template, event));
                                    Ok(())
                                },
                            )
                        }
                        None => entry.on_silent(row.event.clone(), row.to.clone()),
                    },
                )
            })
            .collect();

        let definition = MachineDefinition::new(self.events.clone(), entries)?;
        tracing::debug!("compiled table '{}'", self.display_name());
        Ok(definition)
    }

    /// Builds a definition that prints row messages to stdout.
    pub fn compile_to_stdout(&self) -> Result<TableMachine, CoreError> {
        self.compile(|line| println!("{}", line))
    }
}

fn render(template: &str, event: &Signal<String>) -> String {
    template.replace("{event}", &event.kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DefinitionError;
    use std::io::Write;
    use std::sync::Mutex;

    const PLAYER_YAML: &str = r#"
name: player
events: [Stop, Play]
states:
  - state: Stopped
    transitions:
      - { event: Play, to: Playing, message: "starting to play with event {event}" }
      - { event: Stop, to: Stopped, message: "stopping" }
  - state: Playing
    transitions:
      - { event: Stop, to: Stopped, message: "staying in Stopped" }
"#;

    fn capture() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Send + Sync + 'static) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        (lines, move |line: &str| {
            sink.lock().unwrap().push(line.to_string())
        })
    }

    #[test]
    fn test_parse_yaml_table() {
        let spec = TableSpec::from_yaml(PLAYER_YAML).unwrap();

        assert_eq!(spec.display_name(), "player");
        assert_eq!(spec.events, vec!["Stop", "Play"]);
        assert_eq!(spec.states.len(), 2);
        assert_eq!(spec.states[0].transitions[0].to, "Playing");
    }

    #[test]
    fn test_player_scenario_from_table() {
        let (lines, emit) = capture();
        let def = Arc::new(TableSpec::from_yaml(PLAYER_YAML).unwrap().compile(emit).unwrap());
        let mut instance = def.initiate();
        assert_eq!(instance.current_state(), "Stopped");

        for (event, expected) in [("Stop", "Stopped"), ("Play", "Playing"), ("Stop", "Stopped")] {
            instance.process_event(&Signal::new(event.to_string())).unwrap();
            assert_eq!(instance.current_state(), expected);
        }

        assert_eq!(
            *lines.lock().unwrap(),
            vec![
                "stopping",
                "starting to play with event Play",
                "staying in Stopped"
            ]
        );
    }

    #[test]
    fn test_rows_without_message_are_silent() {
        let json = serde_json::json!({
            "events": ["go"],
            "states": [
                {"state": "a", "transitions": [{"event": "go", "to": "b"}]},
                {"state": "b"}
            ]
        });
        let (lines, emit) = capture();
        let def = Arc::new(TableSpec::from_json(&json).unwrap().compile(emit).unwrap());

        let mut instance = def.initiate();
        instance.process_event(&Signal::new("go".to_string())).unwrap();
        assert_eq!(instance.current_state(), "b");
        assert!(lines.lock().unwrap().is_empty());
        assert!(def.is_terminal(&"b".to_string()));
    }

    #[test]
    fn test_invalid_table_rejected() {
        let json = serde_json::json!({
            "events": ["go"],
            "states": [
                {"state": "a", "transitions": [{"event": "go", "to": "nowhere"}]}
            ]
        });

        let result = TableSpec::from_json(&json).unwrap().compile(|_| {});
        match result {
            Err(CoreError::InvalidDefinition(DefinitionError::UnknownState { state, .. })) => {
                assert_eq!(state, "nowhere");
            }
            other => panic!("expected UnknownState, got {:?}", other),
        }
    }

    #[test]
    fn test_compile_to_stdout() {
        let def = Arc::new(TableSpec::from_yaml(PLAYER_YAML).unwrap().compile_to_stdout().unwrap());
        let mut instance = def.initiate();

        instance.process_event(&Signal::new("Play".to_string())).unwrap();
        assert_eq!(instance.current_state(), "Playing");
    }

    #[test]
    fn test_errors_name_kinds_verbatim() {
        let json = serde_json::json!({
            "events": ["go"],
            "states": [
                {"state": "say \"hi\"", "transitions": [{"event": "go", "to": "tab\there"}]}
            ]
        });

        let err = TableSpec::from_json(&json).unwrap().compile(|_| {}).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid machine definition: transition from 'say \"hi\"' on 'go' targets unknown state 'tab\there'"
        );
    }

    #[test]
    fn test_malformed_table() {
        let result = TableSpec::from_yaml("events: 12\n");
        assert!(matches!(result, Err(CoreError::Yaml(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();

        let yaml_path = dir.path().join("player.yaml");
        std::fs::File::create(&yaml_path)
            .unwrap()
            .write_all(PLAYER_YAML.as_bytes())
            .unwrap();
        let from_yaml = TableSpec::from_file(&yaml_path).unwrap();

        let json_path = dir.path().join("player.json");
        std::fs::write(&json_path, serde_json::to_string(&from_yaml).unwrap()).unwrap();
        let from_json = TableSpec::from_file(&json_path).unwrap();

        assert_eq!(from_yaml, from_json);

        let missing = TableSpec::from_file(dir.path().join("absent.yaml"));
        assert!(matches!(missing, Err(CoreError::Io(_))));
    }
}
