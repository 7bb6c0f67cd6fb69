//! Built-in player machine.

use std::cell::RefCell;
use tabfsm_core::{fsm_table, ActionError, CoreError, MissingTransition};

thread_local! {
    // Lines land here instead of stdout while set.
    static CAPTURED: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

fn say(line: String) -> Result<(), ActionError> {
    CAPTURED.with(|captured| match captured.borrow_mut().as_mut() {
        Some(lines) => lines.push(line),
        None => println!("{}", line),
    });
    Ok(())
}

fsm_table! {
    pub mod player {
        events { Stop, Play }
        Stopped {
            Play => Playing: |evt| say(format!("starting to play with event {}", evt.name())),
            Stop => Stopped: |_| say("stopping".to_string()),
        }
        Playing {
            Stop => Stopped: |_| say("staying in Stopped".to_string()),
        }
    }
}

/// Events fed by `tabfsm demo`.
pub const SCRIPT: [player::Event; 3] = [
    player::Event::Stop,
    player::Event::Play,
    player::Event::Stop,
];

/// Runs the player through [`SCRIPT`] and returns where it ends up.
pub fn run(policy: MissingTransition) -> Result<player::State, CoreError> {
    let definition = std::sync::Arc::new(player::definition()?);
    let mut machine = definition.initiate().with_policy(policy);

    for event in SCRIPT {
        let step = machine.process_event(&event)?;
        tracing::debug!(
            "{} on {} -> {}",
            step.from.name(),
            event.name(),
            step.to.name()
        );
    }

    Ok(*machine.current_state())
}
