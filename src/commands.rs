//! Table file commands.

use colored::Colorize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tabfsm_core::{CoreError, MissingTransition, Signal, TableMachine, TableSpec};

/// One line of `run` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Text emitted by a row's action.
    Output(String),
    Fired {
        from: String,
        event: String,
        to: String,
    },
    Ignored {
        state: String,
        event: String,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Output(line) => write!(f, "{}", line),
            Step::Fired { from, event, to } => write!(f, "{} --{}--> {}", from, event, to),
            Step::Ignored { state, event } => write!(f, "{} ignores {}", state, event),
        }
    }
}

fn load(path: &Path) -> Result<(TableSpec, TableMachine), CoreError> {
    let spec = TableSpec::from_file(path)?;
    // Row output is discarded; `check` never dispatches.
    let definition = spec.compile(|_| {})?;
    Ok((spec, definition))
}

/// Validates a table file and describes it.
pub fn check(path: &Path) -> Result<String, CoreError> {
    let (spec, definition) = load(path)?;
    Ok(describe(&spec, &definition))
}

fn describe(spec: &TableSpec, definition: &TableMachine) -> String {
    let mut out = format!(
        "{} {}\n",
        "Valid".green(),
        spec.display_name().cyan().bold()
    );
    out.push_str(&format!("  initial:  {}\n", definition.initial().yellow()));
    out.push_str(&format!("  states:   {}\n", definition.states().join(", ")));
    out.push_str(&format!("  events:   {}\n", definition.events().join(", ")));

    let terminal: Vec<&str> = definition
        .states()
        .iter()
        .filter(|s| definition.is_terminal(s))
        .map(String::as_str)
        .collect();
    if !terminal.is_empty() {
        out.push_str(&format!("  terminal: {}\n", terminal.join(", ")));
    }

    out.push_str(&format!("  {} rows:\n", definition.rows().len()));
    for row in definition.rows() {
        let marker = if row.action.is_some() { "*" } else { " " };
        out.push_str(&format!(
            "   {} {} --{}--> {}\n",
            marker, row.source, row.event, row.dest
        ));
    }
    out
}

/// Feeds `events` through a fresh instance of the table, reporting each
/// step to `report`. Returns the final state.
pub fn drive<F>(
    spec: &TableSpec,
    events: &[String],
    policy: MissingTransition,
    report: F,
) -> Result<String, CoreError>
where
    F: Fn(Step) + Send + Sync + 'static,
{
    let report = Arc::new(report);
    let sink = Arc::clone(&report);
    let definition = Arc::new(spec.compile(move |line| sink(Step::Output(line.to_string())))?);

    let mut machine = definition.initiate().with_policy(policy);
    for event in events {
        let result = machine.process_event(&Signal::new(event.clone()))?;
        report(if result.applied {
            Step::Fired {
                from: result.from,
                event: event.clone(),
                to: result.to,
            }
        } else {
            Step::Ignored {
                state: result.from,
                event: event.clone(),
            }
        });
    }

    Ok(machine.current_state().clone())
}

/// Runs a table file against a list of events, printing as it goes.
pub fn run(path: &Path, events: &[String], policy: MissingTransition) -> Result<(), CoreError> {
    let spec = TableSpec::from_file(path)?;
    println!(
        "{} {}",
        "Running".green(),
        spec.display_name().cyan().bold()
    );

    let last = drive(&spec, events, policy, |step| match &step {
        Step::Output(_) => println!("{}", step),
        Step::Fired { .. } => println!("  {}", step.to_string().dimmed()),
        Step::Ignored { .. } => println!("  {}", step.to_string().yellow()),
    })?;

    println!("{} {}", "Final state:".bold(), last.yellow());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn events(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn record(
        spec: &TableSpec,
        names: &[&str],
        policy: MissingTransition,
    ) -> (Result<String, CoreError>, Vec<Step>) {
        let steps = Arc::new(Mutex::new(Vec::new()));
        let sink = steps.clone();
        let result = drive(spec, &events(names), policy, move |step| {
            sink.lock().unwrap().push(step)
        });
        let steps = steps.lock().unwrap().clone();
        (result, steps)
    }

    #[test]
    fn test_drive_player() {
        let spec = TableSpec::from_yaml(PLAYER_YAML).unwrap();
        let (result, steps) = record(&spec, &["Stop", "Play", "Stop"], MissingTransition::Ignore);

        assert_eq!(result.unwrap(), "Stopped");
        let outputs: Vec<String> = steps
            .iter()
            .filter(|s| matches!(s, Step::Output(_)))
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            outputs,
            vec![
                "stopping",
                "starting to play with event Play",
                "staying in Stopped"
            ]
        );
        assert_eq!(steps[3].to_string(), "Stopped --Play--> Playing");
    }

    #[test]
    fn test_drive_ignores_unknown_row() {
        let spec = TableSpec::from_yaml(PLAYER_YAML).unwrap();
        let (result, steps) = record(&spec, &["Play", "Play"], MissingTransition::Ignore);

        assert_eq!(result.unwrap(), "Playing");
        assert_eq!(
            steps.last(),
            Some(&Step::Ignored {
                state: "Playing".to_string(),
                event: "Play".to_string()
            })
        );
    }

    #[test]
    fn test_drive_strict() {
        let spec = TableSpec::from_yaml(PLAYER_YAML).unwrap();
        let (result, _) = record(&spec, &["Play", "Play"], MissingTransition::Error);

        match result {
            Err(e @ CoreError::InvalidTransition { .. }) => {
                assert_eq!(e.error_code(), "INVALID_TRANSITION")
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
    }

    #[test]
    fn test_check_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("player.yaml");
        std::fs::write(&path, PLAYER_YAML).unwrap();

        let report = check(&path).unwrap();
        assert!(report.contains("player"));
        assert!(report.contains("Playing"));
        assert!(report.contains("3 rows"));

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "events: [Go]\nstates:\n  - state: A\n    transitions:\n      - { event: Go, to: B }\n").unwrap();
        assert!(matches!(check(&bad), Err(CoreError::InvalidDefinition(_))));
    }
}
