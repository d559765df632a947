//! Frozen settings handed to the rest of the process.

use std::path::{Path, PathBuf};

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::settings::schema::{Entry, Registry, Section};
use crate::settings::value::SettingValue;

/// Reconciled settings. Read-only; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Settings {
    registry: Registry,
    source: PathBuf,
}

impl Settings {
    pub(crate) fn new(registry: Registry, source: PathBuf) -> Self {
        Self { registry, source }
    }

    /// Live value of `section` `key`, if it has one.
    pub fn get(&self, section: &str, key: &str) -> Option<&SettingValue> {
        self.registry.entry(section, key).and_then(Entry::data)
    }

    pub fn entry(&self, section: &str, key: &str) -> Option<&Entry> {
        self.registry.entry(section, key)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.registry.section(name)
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.registry.sections()
    }

    /// File the settings were read from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Every value as a flat `SECTION_KEY` name, with spaces and dashes
    /// replaced by underscores. Entries without a value are skipped.
    pub fn flatten(&self) -> Vec<(String, &SettingValue)> {
        self.registry
            .sections()
            .flat_map(|section| {
                section.entries().filter_map(move |entry| {
                    entry.data().map(|value| {
                        let name = format!("{}_{}", section.name(), entry.name())
                            .replace([' ', '-'], "_");
                        (name, value)
                    })
                })
            })
            .collect()
    }
}

struct SectionValues<'a>(&'a Section);

impl Serialize for SectionValues<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in self.0.entries() {
            map.serialize_entry(entry.name(), &entry.data())?;
        }
        map.end()
    }
}

impl Serialize for Settings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for section in self.registry.sections() {
            map.serialize_entry(section.name(), &SectionValues(section))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::component::ComponentRegistry;
    use crate::settings::schema::{EntryType, SchemaDeclaration};
    use serde_json::json;

    fn settings() -> Settings {
        let declaration = SchemaDeclaration::new()
            .declare(
                "SHINOBI",
                vec![
                    Entry::required("port", EntryType::Integer).with_default(8080),
                    Entry::optional("group-key", EntryType::String),
                ],
            )
            .unwrap();
        let registry = Registry::resolve(&declaration, &ComponentRegistry::new()).unwrap();
        Settings::new(registry, PathBuf::from("config.ini"))
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let settings = settings();
        assert_eq!(settings.get("shinobi", "Port"), Some(&SettingValue::Int(8080)));
        assert_eq!(settings.get("SHINOBI", "GROUP-KEY"), None);
        assert!(settings.entry("SHINOBI", "GROUP-KEY").is_some());
    }

    #[test]
    fn test_flatten() {
        let settings = settings();
        let flat = settings.flatten();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].0, "SHINOBI_PORT");
    }

    #[test]
    fn test_serialize() {
        let value = serde_json::to_value(settings()).unwrap();
        assert_eq!(value, json!({"SHINOBI": {"GROUP-KEY": null, "PORT": 8080}}));
    }
}
