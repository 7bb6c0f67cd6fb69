//! Named machine definitions shared across a process.

use crate::definition::{Event, Key, MachineDefinition};
use crate::error::CoreError;
use crate::instance::MachineInstance;
use dashmap::DashMap;
use std::sync::Arc;

/// Definitions indexed by name.
///
/// A discarded definition can no longer be instantiated through the
/// registry. Instances created earlier hold their own `Arc` and keep running.
pub struct MachineRegistry<S, E: Event> {
    definitions: DashMap<String, Arc<MachineDefinition<S, E>>>,
}

impl<S: Key, E: Event> MachineRegistry<S, E> {
    pub fn new() -> Self {
        Self {
            definitions: DashMap::new(),
        }
    }

    /// Registers a definition under `name`.
    pub fn register(
        &self,
        name: &str,
        definition: MachineDefinition<S, E>,
    ) -> Result<Arc<MachineDefinition<S, E>>, CoreError> {
        use dashmap::mapref::entry::Entry;

        match self.definitions.entry(name.to_string()) {
            Entry::Occupied(_) => Err(CoreError::DefinitionExists {
                name: name.to_string(),
            }),
            Entry::Vacant(slot) => {
                let definition = Arc::new(definition);
                slot.insert(Arc::clone(&definition));
                tracing::info!(
                    "registered machine '{}' ({} states, {} transitions)",
                    name,
                    definition.states().len(),
                    definition.rows().len()
                );
                Ok(definition)
            }
        }
    }

    /// Gets a definition.
    pub fn get(&self, name: &str) -> Result<Arc<MachineDefinition<S, E>>, CoreError> {
        self.definitions
            .get(name)
            .map(|r| r.clone())
            .ok_or_else(|| CoreError::DefinitionNotFound {
                name: name.to_string(),
            })
    }

    /// Removes a definition. Returns it so callers can drain live instances.
    pub fn discard(&self, name: &str) -> Result<Arc<MachineDefinition<S, E>>, CoreError> {
        let (_, definition) =
            self.definitions
                .remove(name)
                .ok_or_else(|| CoreError::DefinitionNotFound {
                    name: name.to_string(),
                })?;
        tracing::info!("discarded machine '{}'", name);
        Ok(definition)
    }

    /// Creates a started instance of the named definition.
    pub fn initiate(&self, name: &str) -> Result<MachineInstance<S, E>, CoreError> {
        Ok(self.get(name)?.initiate())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.definitions.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl<S: Key, E: Event> Default for MachineRegistry<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MachineBuilder;
    use crate::definition::Signal;

    type Def = MachineDefinition<&'static str, Signal<&'static str>>;

    fn toggle() -> Def {
        MachineBuilder::new()
            .events(["flip"])
            .state("off")
            .on_silent("flip", "on")
            .state("on")
            .on_silent("flip", "off")
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_and_initiate() {
        let registry = MachineRegistry::new();
        registry.register("toggle", toggle()).unwrap();

        let mut instance = registry.initiate("toggle").unwrap();
        instance.process_event(&Signal::new("flip")).unwrap();
        assert_eq!(instance.current_state(), &"on");
        assert_eq!(registry.names(), vec!["toggle".to_string()]);
    }

    #[test]
    fn test_register_twice_rejected() {
        let registry = MachineRegistry::new();
        registry.register("toggle", toggle()).unwrap();

        let result = registry.register("toggle", toggle());
        assert!(matches!(result, Err(CoreError::DefinitionExists { .. })));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_discard_blocks_new_instances() {
        let registry = MachineRegistry::new();
        registry.register("toggle", toggle()).unwrap();
        let mut running = registry.initiate("toggle").unwrap();

        registry.discard("toggle").unwrap();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.initiate("toggle"),
            Err(CoreError::DefinitionNotFound { .. })
        ));
        assert!(matches!(
            registry.discard("toggle"),
            Err(CoreError::DefinitionNotFound { .. })
        ));

        // Existing instances are unaffected.
        running.process_event(&Signal::new("flip")).unwrap();
        assert_eq!(running.current_state(), &"on");
    }

    #[test]
    fn test_names_sorted() {
        let registry = MachineRegistry::new();
        registry.register("zeta", toggle()).unwrap();
        registry.register("alpha", toggle()).unwrap();

        assert_eq!(registry.names(), vec!["alpha", "zeta"]);
    }
}
