//! Mutex-guarded instance handle.

use crate::definition::{Event, Key, MachineDefinition};
use crate::error::CoreError;
use crate::instance::{ApplyResult, MachineInstance};
use parking_lot::Mutex;
use std::sync::Arc;

/// Clonable handle that serialises access to one instance.
///
/// Each call holds the lock for the whole dispatch, action included, so no
/// caller can observe a half-applied transition.
pub struct SharedInstance<S, E: Event> {
    inner: Arc<Mutex<MachineInstance<S, E>>>,
}

impl<S: Key, E: Event> SharedInstance<S, E> {
    pub fn new(instance: MachineInstance<S, E>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(instance)),
        }
    }

    pub fn process_event(&self, event: &E) -> Result<ApplyResult<S>, CoreError> {
        self.inner.lock().process_event(event)
    }

    /// Snapshot of the current state.
    pub fn current_state(&self) -> S {
        self.inner.lock().current_state().clone()
    }

    pub fn initiate(&self) {
        self.inner.lock().initiate();
    }

    pub fn terminate(&self) {
        self.inner.lock().terminate();
    }

    pub fn transitions_fired(&self) -> u64 {
        self.inner.lock().transitions_fired()
    }

    pub fn definition(&self) -> Arc<MachineDefinition<S, E>> {
        Arc::clone(self.inner.lock().definition())
    }
}

impl<S, E: Event> Clone for SharedInstance<S, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Key, E: Event> From<MachineInstance<S, E>> for SharedInstance<S, E> {
    fn from(instance: MachineInstance<S, E>) -> Self {
        Self::new(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MachineBuilder;
    use crate::definition::Signal;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::thread;

    #[test]
    fn test_concurrent_dispatch_is_serialised() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();

        let def = MachineBuilder::<u8, Signal<&'static str>>::new()
            .events(["tick"])
            .state(0)
            .on("tick", 1, {
                let counter = counter.clone();
                move |_: &Signal<&'static str>| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .state(1)
            .on("tick", 0, move |_: &Signal<&'static str>| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
            .unwrap();

        let shared = SharedInstance::from(Arc::new(def).initiate());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..125 {
                        shared.process_event(&Signal::new("tick")).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // 1000 ticks, an even number of flips.
        assert_eq!(calls.load(Ordering::SeqCst), 1000);
        assert_eq!(shared.transitions_fired(), 1000);
        assert_eq!(shared.current_state(), 0);
    }

    #[test]
    fn test_shared_lifecycle() {
        let def = MachineBuilder::<u8, Signal<&'static str>>::new()
            .events(["tick"])
            .state(0)
            .on_silent("tick", 1)
            .state(1)
            .build()
            .unwrap();
        let shared = SharedInstance::new(MachineInstance::new(Arc::new(def)));

        assert!(matches!(
            shared.process_event(&Signal::new("tick")),
            Err(CoreError::NotStarted)
        ));

        shared.initiate();
        shared.process_event(&Signal::new("tick")).unwrap();
        assert_eq!(shared.current_state(), 1);
        assert!(shared.definition().is_terminal(&1));

        shared.terminate();
        assert!(matches!(
            shared.process_event(&Signal::new("tick")),
            Err(CoreError::NotStarted)
        ));
    }
}
