//! Components that contribute settings.
//!
//! A component publishes its own schema through `SettingsProvider` and
//! registers a constructor under a string key. Sections declared as an
//! include name that key; the registry resolves it without any reflection.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::settings::error::ComponentError;
use crate::settings::schema::Entry;

/// A component that publishes the settings it needs.
pub trait SettingsProvider: Send + Sync {
    /// Entries this component expects in the section that includes it.
    fn settings_schema(&self) -> Vec<Entry>;
}

/// Constructor registered for a component key.
pub type ComponentFactory = fn() -> Arc<dyn SettingsProvider>;

/// Map of component key to constructor, populated at startup.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    factories: BTreeMap<String, ComponentFactory>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `key`, replacing any previous registration.
    pub fn register(&mut self, key: impl Into<String>, factory: ComponentFactory) -> &mut Self {
        let key = key.into();
        if self.factories.insert(key.clone(), factory).is_some() {
            tracing::warn!(component = %key, "Component registered twice, replacing");
        }
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// Build the component registered under `key`.
    pub fn instantiate(&self, key: &str) -> Result<Arc<dyn SettingsProvider>, ComponentError> {
        self.factories
            .get(key)
            .map(|factory| factory())
            .ok_or_else(|| ComponentError::Unknown(key.to_string()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::schema::EntryType;

    struct Probe;

    impl SettingsProvider for Probe {
        fn settings_schema(&self) -> Vec<Entry> {
            vec![Entry::optional("ENABLED", EntryType::Boolean)]
        }
    }

    fn probe() -> Arc<dyn SettingsProvider> {
        Arc::new(Probe)
    }

    #[test]
    fn test_register_and_instantiate() {
        let mut components = ComponentRegistry::new();
        components.register("probe.Probe", probe);

        assert!(components.contains("probe.Probe"));
        let component = components.instantiate("probe.Probe").unwrap();
        assert_eq!(component.settings_schema().len(), 1);
    }

    #[test]
    fn test_unknown_component() {
        let components = ComponentRegistry::new();
        assert_eq!(
            components.instantiate("missing.Thing").err(),
            Some(ComponentError::Unknown("missing.Thing".into()))
        );
    }
}
