//! Settings schema definitions.
//!
//! A `SchemaDeclaration` names every section the application needs. Each
//! section is either declared entry by entry or delegated to a component
//! (an include), never both. `Registry::resolve` splices included
//! components in, so everything downstream sees flat sections only.

use std::collections::BTreeMap;
use std::fmt;

use crate::settings::component::ComponentRegistry;
use crate::settings::error::SchemaError;
use crate::settings::types::ComponentRef;
use crate::settings::value::SettingValue;

/// Name of the entry synthesized in every included section. Its value is
/// the component the section was included from.
pub const CLASS_ENTRY: &str = "CLASS";

/// Declared type of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    String,
    Integer,
    Boolean,
    Float,
    /// Comma separated values; integers stay integers.
    List,
    /// A JSON object.
    JsonObject,
    Url,
    Ip,
    LogLevel,
    /// JSON object of name to IP or URL.
    TrustList,
    /// Integer bounded to `RateLimit::MIN..=RateLimit::MAX`.
    RateLimit,
    /// Key of a registered component.
    Component,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryType::String => "string",
            EntryType::Integer => "integer",
            EntryType::Boolean => "boolean",
            EntryType::Float => "float",
            EntryType::List => "list",
            EntryType::JsonObject => "json object",
            EntryType::Url => "url",
            EntryType::Ip => "ip address",
            EntryType::LogLevel => "log level",
            EntryType::TrustList => "trust list",
            EntryType::RateLimit => "rate limit",
            EntryType::Component => "component",
        };
        f.write_str(name)
    }
}

/// One configurable value.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    name: String,
    ty: EntryType,
    default: Option<SettingValue>,
    required: bool,
    data: Option<SettingValue>,
}

impl Entry {
    fn new(name: &str, ty: EntryType, required: bool) -> Self {
        Self {
            name: name.trim().to_uppercase(),
            ty,
            default: None,
            required,
            data: None,
        }
    }

    /// A required entry. Without a default the operator is asked for it.
    pub fn required(name: &str, ty: EntryType) -> Self {
        Self::new(name, ty, true)
    }

    pub fn optional(name: &str, ty: EntryType) -> Self {
        Self::new(name, ty, false)
    }

    /// Set the default, which is also the live value until the file says
    /// otherwise.
    pub fn with_default(mut self, value: impl Into<SettingValue>) -> Self {
        let value = value.into();
        self.data = Some(value.clone());
        self.default = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> EntryType {
        self.ty
    }

    pub fn default(&self) -> Option<&SettingValue> {
        self.default.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The live value: the file value, else the default.
    pub fn data(&self) -> Option<&SettingValue> {
        self.data.as_ref()
    }

    /// True when only the file or the operator can supply a value.
    pub fn needs_input(&self) -> bool {
        self.required && self.default.is_none()
    }

    pub(crate) fn set_data(&mut self, value: SettingValue) {
        self.data = Some(value);
    }
}

/// Where a section's entries came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionOrigin {
    Declared,
    Included { component: String },
}

/// A named group of entries, matching one `[SECTION]` of the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    name: String,
    origin: SectionOrigin,
    entries: BTreeMap<String, Entry>,
}

impl Section {
    fn new(name: &str, origin: SectionOrigin) -> Self {
        Self {
            name: name.to_string(),
            origin,
            entries: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &SectionOrigin {
        &self.origin
    }

    /// Look up an entry; keys are case-insensitive.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(&key.trim().to_uppercase())
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.entries.get_mut(&key.trim().to_uppercase())
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, entry: Entry) -> Option<Entry> {
        self.entries.insert(entry.name.clone(), entry)
    }
}

/// How a section is declared.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionDecl {
    Entries(Vec<Entry>),
    /// Delegate the section to the component registered under this key.
    Include(String),
}

/// The application's settings, before includes are resolved.
#[derive(Debug, Clone, Default)]
pub struct SchemaDeclaration {
    sections: BTreeMap<String, SectionDecl>,
}

impl SchemaDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare entries for `section`. Declaring the same section twice
    /// extends it.
    pub fn declare(mut self, section: &str, entries: Vec<Entry>) -> Result<Self, SchemaError> {
        let name = section.trim().to_uppercase();
        match self
            .sections
            .entry(name.clone())
            .or_insert_with(|| SectionDecl::Entries(Vec::new()))
        {
            SectionDecl::Include(component) => {
                return Err(SchemaError::MixedSection {
                    section: name,
                    component: component.clone(),
                });
            }
            SectionDecl::Entries(existing) => {
                for entry in entries {
                    if existing.iter().any(|e| e.name == entry.name) {
                        return Err(SchemaError::DuplicateEntry {
                            section: name,
                            key: entry.name,
                        });
                    }
                    existing.push(entry);
                }
            }
        }
        Ok(self)
    }

    /// Delegate `section` to a component.
    pub fn include(mut self, section: &str, component: &str) -> Result<Self, SchemaError> {
        let name = section.trim().to_uppercase();
        match self.sections.get(&name) {
            None => {
                self.sections
                    .insert(name, SectionDecl::Include(component.to_string()));
            }
            Some(SectionDecl::Include(existing)) if existing == component => {}
            Some(_) => {
                return Err(SchemaError::MixedSection {
                    section: name,
                    component: component.to_string(),
                });
            }
        }
        Ok(self)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &SectionDecl)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// The resolved schema: every section flat, no includes left.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    sections: BTreeMap<String, Section>,
}

impl Registry {
    /// Resolve `declaration` against the registered components.
    ///
    /// An include that cannot be resolved is logged and leaves its
    /// section empty; the rest of the registry is still usable.
    pub fn resolve(
        declaration: &SchemaDeclaration,
        components: &ComponentRegistry,
    ) -> Result<Self, SchemaError> {
        let mut registry = Self::default();
        for (name, decl) in declaration.sections() {
            match decl {
                SectionDecl::Entries(entries) => {
                    let mut section = Section::new(name, SectionOrigin::Declared);
                    for entry in entries {
                        if section.insert(entry.clone()).is_some() {
                            return Err(SchemaError::DuplicateEntry {
                                section: name.to_string(),
                                key: entry.name.clone(),
                            });
                        }
                    }
                    registry.sections.insert(name.to_string(), section);
                }
                SectionDecl::Include(component) => {
                    registry.include(name, component, components)?;
                }
            }
        }

        tracing::debug!(sections = registry.sections.len(), "Settings schema resolved");
        Ok(registry)
    }

    /// Include `component`'s schema as `section`.
    ///
    /// Including the component a section already came from is a no-op.
    pub fn include(
        &mut self,
        section: &str,
        component: &str,
        components: &ComponentRegistry,
    ) -> Result<(), SchemaError> {
        let name = section.trim().to_uppercase();
        if let Some(existing) = self.sections.get(&name) {
            match existing.origin() {
                SectionOrigin::Included { component: current } if current == component => {
                    tracing::debug!(section = %name, component, "Section already included");
                    return Ok(());
                }
                SectionOrigin::Declared if existing.is_empty() => {}
                _ => {
                    return Err(SchemaError::MixedSection {
                        section: name,
                        component: component.to_string(),
                    });
                }
            }
        }

        let mut resolved = Section::new(
            &name,
            SectionOrigin::Included {
                component: component.to_string(),
            },
        );

        match ComponentRef::resolve(component, components) {
            Ok(reference) => {
                for entry in reference.component().settings_schema() {
                    if let Some(previous) = resolved.insert(entry) {
                        tracing::warn!(
                            section = %name,
                            key = %previous.name,
                            component,
                            "Component declares an entry twice, keeping the last"
                        );
                    }
                }
                let class = Entry::optional(CLASS_ENTRY, EntryType::Component)
                    .with_default(SettingValue::Component(reference));
                if resolved.insert(class).is_some() {
                    tracing::warn!(
                        section = %name,
                        component,
                        "Component declares {} itself, overriding",
                        CLASS_ENTRY
                    );
                }
                tracing::debug!(section = %name, component, entries = resolved.len(), "Included settings");
            }
            Err(e) => {
                tracing::error!(
                    section = %name,
                    component,
                    error = %e,
                    "Unable to include settings, section left empty"
                );
            }
        }

        self.sections.insert(name, resolved);
        Ok(())
    }

    /// Look up a section; names are case-insensitive.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(&name.trim().to_uppercase())
    }

    pub(crate) fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.get_mut(&name.trim().to_uppercase())
    }

    pub fn entry(&self, section: &str, key: &str) -> Option<&Entry> {
        self.section(section).and_then(|s| s.get(key))
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
