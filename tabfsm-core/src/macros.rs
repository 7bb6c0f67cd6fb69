//! Table notation for declaring a machine in one place.

/// Declares events, states and the transition table of a machine.
///
/// Generates a module containing `Event` and `State` enums and a
/// `definition()` function returning the validated
/// [`MachineDefinition`](crate::MachineDefinition). The first state block is
/// the initial state. A row written `Event => Dest` has no action; a row
/// written `Event => Dest: action` runs `action(&Event)`.
///
/// Actions are expanded inside the generated module, which glob-imports its
/// parent module.
///
/// ```
/// use tabfsm_core::fsm_table;
///
/// fsm_table! {
///     pub mod player {
///         events { Stop, Play }
///         Stopped {
///             Play => Playing: |evt| {
///                 println!("starting to play with event {}", evt.name());
///                 Ok(())
///             },
///             Stop => Stopped: |_| { println!("stopping"); Ok(()) },
///         }
///         Playing {
///             Stop => Stopped: |_| { println!("staying in Stopped"); Ok(()) },
///         }
///     }
/// }
///
/// let def = std::sync::Arc::new(player::definition().unwrap());
/// let mut machine = def.initiate();
/// machine.process_event(&player::Event::Play).unwrap();
/// assert_eq!(machine.current_state(), &player::State::Playing);
/// ```
#[macro_export]
macro_rules! fsm_table {
    (@row $builder:ident, $on:ident, $dest:ident, $action:expr) => {
        $builder.on(Event::$on, State::$dest, $action)
    };

    (@row $builder:ident, $on:ident, $dest:ident) => {
        $builder.on_silent(Event::$on, State::$dest)
    };

    (
        $(#[$meta:meta])*
        $vis:vis mod $machine:ident {
            events { $($event:ident),+ $(,)? }
            $(
                $state:ident {
                    $( $on:ident => $dest:ident $(: $action:expr)? ),* $(,)?
                }
            )+
        }
    ) => {
        $(#[$meta])*
        $vis mod $machine {
            #[allow(unused_imports)]
            use super::*;

            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum Event {
                $($event),+
            }

            #[allow(dead_code)]
            impl Event {
                pub const ALL: &'static [Event] = &[$(Event::$event),+];

                pub fn name(&self) -> &'static str {
                    match self {
                        $(Event::$event => stringify!($event)),+
                    }
                }
            }

            impl ::std::fmt::Display for Event {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    f.write_str(self.name())
                }
            }

            impl $crate::Event for Event {
                type Kind = Event;

                fn kind(&self) -> Event {
                    *self
                }
            }

            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum State {
                $($state),+
            }

            #[allow(dead_code)]
            impl State {
                pub const ALL: &'static [State] = &[$(State::$state),+];

                pub fn name(&self) -> &'static str {
                    match self {
                        $(State::$state => stringify!($state)),+
                    }
                }
            }

            impl ::std::fmt::Display for State {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    f.write_str(self.name())
                }
            }

            /// Validates the table and builds the machine definition.
            pub fn definition() -> ::std::result::Result<
                $crate::MachineDefinition<State, Event>,
                $crate::CoreError,
            > {
                let builder = $crate::MachineBuilder::<State, Event>::new()
                    .events([$(Event::$event),+]);
                $(
                    let builder = builder.state(State::$state);
                    $(
                        let builder = $crate::fsm_table!(@row builder, $on, $dest $(, $action)?);
                    )*
                )+
                builder.build()
            }
        }
    };
}
