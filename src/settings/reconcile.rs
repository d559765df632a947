//! Reconciliation of the schema against the settings file.
//!
//! # Responsibilities
//! - Fill pass: ask the operator for required values the file lacks, then
//!   write the whole document back
//! - Populate pass: coerce every known file value into its entry
//! - Enforce that every required entry ends up with a value
//!
//! # Design Decisions
//! - Fail fast: a bad required value aborts startup, there is no partial
//!   configuration
//! - A bad optional value is fatal too unless `strict_optional` is off
//! - Unknown sections and keys are warnings, never errors

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::settings::coerce::Coercer;
use crate::settings::component::ComponentRegistry;
use crate::settings::error::SettingsError;
use crate::settings::ini::{self, IniDocument};
use crate::settings::prompt::Prompter;
use crate::settings::resolved::Settings;
use crate::settings::schema::{Registry, SchemaDeclaration};

/// Knobs for reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Treat an invalid value for an optional entry as fatal.
    pub strict_optional: bool,
    /// Write defaults of absent entries into the file during the fill pass.
    ///
    /// Later runs then find those defaults in the file; while this is set
    /// they are reported at debug level instead of as redundant.
    pub write_defaults: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            strict_optional: true,
            write_defaults: false,
        }
    }
}

/// Outcome of the fill pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Values supplied by the operator.
    pub prompted: usize,
    /// Defaults written because `write_defaults` was set.
    pub defaulted: usize,
}

/// Outcome of the populate pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateReport {
    /// Entries whose value now differs from the default.
    pub applied: usize,
    /// File values equal to the default.
    pub redundant: usize,
    /// Unknown sections and keys.
    pub unknown: usize,
    /// Invalid optional values ignored under `strict_optional = false`.
    pub skipped: usize,
}

/// Reads a settings file into memory.
///
/// A missing file is an empty document.
pub fn read_document(path: &Path) -> Result<IniDocument, SettingsError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "Settings file not found, starting empty");
            return Ok(IniDocument::new());
        }
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    IniDocument::parse(&text).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the whole document to `path`.
pub fn write_document(path: &Path, document: &IniDocument) -> Result<(), SettingsError> {
    fs::write(path, document.to_string()).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Runs the fill and populate passes for one settings file.
#[derive(Debug)]
pub struct Reconciler<'a> {
    path: PathBuf,
    coercer: Coercer<'a>,
    options: ReconcileOptions,
    document: IniDocument,
}

impl<'a> Reconciler<'a> {
    pub fn new(path: impl Into<PathBuf>, components: &'a ComponentRegistry) -> Self {
        Self {
            path: path.into(),
            coercer: Coercer::new(components),
            options: ReconcileOptions::default(),
            document: IniDocument::new(),
        }
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The in-memory document as of the last fill pass.
    pub fn document(&self) -> &IniDocument {
        &self.document
    }

    /// Fill pass: prompt for missing required values, persist the file and
    /// read it back, so this run sees exactly what the next one will.
    ///
    /// An answer that would not read back unchanged is rejected.
    pub fn fill(
        &mut self,
        registry: &Registry,
        prompter: &mut dyn Prompter,
    ) -> Result<FillReport, SettingsError> {
        self.document = read_document(&self.path)?;
        tracing::info!(path = %self.path.display(), "Checking settings file");

        let mut report = FillReport::default();
        for section in registry.sections() {
            for entry in section.entries() {
                if self.document.has_option(section.name(), entry.name()) {
                    continue;
                }

                if entry.needs_input() {
                    let answer = prompter
                        .ask(section.name(), entry.name(), entry.ty())
                        .map_err(|source| {
                            tracing::error!(
                                section = %section.name(),
                                key = %entry.name(),
                                error = %source,
                                "Error asking input in console; add it to the settings file and restart"
                            );
                            SettingsError::Prompt {
                                section: section.name().to_string(),
                                key: entry.name().to_string(),
                                source,
                            }
                        })?;
                    let answer = answer.trim();

                    match self.coercer.coerce(answer, entry.ty(), entry.name()) {
                        Ok(Some(_)) => {}
                        Ok(None) => {
                            return Err(SettingsError::RequiredMissing {
                                section: section.name().to_string(),
                                key: entry.name().to_string(),
                            });
                        }
                        Err(source) => {
                            tracing::error!(
                                section = %section.name(),
                                key = %entry.name(),
                                value = %answer,
                                target = %entry.ty(),
                                error = %source,
                                "Error verifying value or converting it to its type"
                            );
                            return Err(SettingsError::Coercion {
                                section: section.name().to_string(),
                                key: entry.name().to_string(),
                                value: answer.to_string(),
                                source,
                            });
                        }
                    }

                    if !ini::survives_write(answer) {
                        tracing::error!(
                            section = %section.name(),
                            key = %entry.name(),
                            value = %answer,
                            "Value cannot be stored as given; remove the inline comment marker"
                        );
                        return Err(SettingsError::Unpersistable {
                            section: section.name().to_string(),
                            key: entry.name().to_string(),
                            value: answer.to_string(),
                        });
                    }

                    self.document.set(section.name(), entry.name(), answer);
                    report.prompted += 1;
                } else if self.options.write_defaults {
                    if let Some(default) = entry.default() {
                        let text = default.to_string();
                        if !ini::survives_write(&text) {
                            tracing::warn!(
                                section = %section.name(),
                                key = %entry.name(),
                                "Default cannot be stored as text, not writing it"
                            );
                            continue;
                        }
                        tracing::info!(
                            section = %section.name(),
                            key = %entry.name(),
                            "Not found, writing default"
                        );
                        self.document.set(section.name(), entry.name(), &text);
                        report.defaulted += 1;
                    }
                }
            }
        }

        write_document(&self.path, &self.document)?;
        self.document = read_document(&self.path)?;
        tracing::info!(
            prompted = report.prompted,
            defaulted = report.defaulted,
            "Settings file check complete"
        );
        Ok(report)
    }

    /// Populate pass: assign file values to the registry's entries.
    pub fn populate(&self, registry: &mut Registry) -> Result<PopulateReport, SettingsError> {
        if registry.is_empty() {
            return Err(SettingsError::EmptyRegistry);
        }

        let mut report = PopulateReport::default();
        for file_section in self.document.sections() {
            let Some(section) = registry.section_mut(file_section.name()) else {
                tracing::warn!(
                    section = %file_section.name(),
                    "Unknown section in settings file, ignoring"
                );
                report.unknown += 1;
                continue;
            };
            let section_name = section.name().to_string();

            for (key, raw) in file_section.entries() {
                let Some(entry) = section.get_mut(key) else {
                    tracing::warn!(
                        section = %section_name,
                        key = %key,
                        "Unknown key in settings file, ignoring"
                    );
                    report.unknown += 1;
                    continue;
                };
                tracing::debug!(section = %section_name, key = %entry.name(), "Found in settings file");

                match self.coercer.coerce(raw, entry.ty(), entry.name()) {
                    Ok(Some(value)) => {
                        if entry.default() == Some(&value) {
                            if self.options.write_defaults {
                                tracing::debug!(
                                    section = %section_name,
                                    key = %entry.name(),
                                    "Value is the same as the default"
                                );
                            } else {
                                tracing::warn!(
                                    section = %section_name,
                                    key = %entry.name(),
                                    "Value is the same as the default and redundant, consider removing it"
                                );
                            }
                            report.redundant += 1;
                        } else {
                            if entry.default().is_some() {
                                tracing::debug!(
                                    section = %section_name,
                                    key = %entry.name(),
                                    value = %value,
                                    "Overriding default"
                                );
                            }
                            entry.set_data(value);
                            report.applied += 1;
                        }
                    }
                    Ok(None) => {
                        tracing::debug!(
                            section = %section_name,
                            key = %entry.name(),
                            "Empty value, keeping default"
                        );
                    }
                    Err(source) => {
                        if entry.is_required() || self.options.strict_optional {
                            tracing::error!(
                                section = %section_name,
                                key = %entry.name(),
                                value = %raw,
                                target = %entry.ty(),
                                error = %source,
                                "Error verifying value or converting it to its type"
                            );
                            return Err(SettingsError::Coercion {
                                section: section_name,
                                key: entry.name().to_string(),
                                value: raw.to_string(),
                                source,
                            });
                        }
                        tracing::warn!(
                            section = %section_name,
                            key = %entry.name(),
                            value = %raw,
                            error = %source,
                            "Invalid optional value, keeping default"
                        );
                        report.skipped += 1;
                    }
                }
            }
        }

        for section in registry.sections() {
            if let Some(entry) = section
                .entries()
                .find(|e| e.is_required() && e.data().is_none())
            {
                return Err(SettingsError::RequiredMissing {
                    section: section.name().to_string(),
                    key: entry.name().to_string(),
                });
            }
        }

        tracing::info!(
            applied = report.applied,
            redundant = report.redundant,
            unknown = report.unknown,
            skipped = report.skipped,
            "Settings loaded"
        );
        Ok(report)
    }

    /// Fill, persist and populate; consumes the registry into `Settings`.
    pub fn run(
        mut self,
        mut registry: Registry,
        prompter: &mut dyn Prompter,
    ) -> Result<Settings, SettingsError> {
        self.fill(&registry, prompter)?;
        self.populate(&mut registry)?;
        Ok(Settings::new(registry, self.path))
    }
}

/// Resolve `declaration`, reconcile it against the file at `path` and
/// return the frozen settings.
pub fn load_settings(
    path: impl Into<PathBuf>,
    declaration: &SchemaDeclaration,
    components: &ComponentRegistry,
    prompter: &mut dyn Prompter,
    options: ReconcileOptions,
) -> Result<Settings, SettingsError> {
    let registry = Registry::resolve(declaration, components)?;
    Reconciler::new(path, components)
        .with_options(options)
        .run(registry, prompter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::prompt::{NoPrompt, ScriptedPrompter};
    use crate::settings::schema::{Entry, EntryType};
    use crate::settings::types::LogLevel;
    use crate::settings::value::SettingValue;

    fn scratch() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        (dir, path)
    }

    fn registry(entries: Vec<Entry>) -> Registry {
        let declaration = SchemaDeclaration::new().declare("APP", entries).unwrap();
        Registry::resolve(&declaration, &ComponentRegistry::new()).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let doc = read_document(Path::new("/nonexistent/dir/settings.ini")).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_populate_without_fill_uses_defaults() {
        let components = ComponentRegistry::new();
        let mut registry = registry(vec![Entry::optional("name", EntryType::String).with_default("x")]);
        let (_dir, path) = scratch();
        let reconciler = Reconciler::new(path, &components);

        let report = reconciler.populate(&mut registry).unwrap();
        assert_eq!(report, PopulateReport::default());
        assert_eq!(
            registry.entry("app", "name").and_then(Entry::data),
            Some(&SettingValue::Str("x".into()))
        );
    }

    #[test]
    fn test_empty_registry_fails() {
        let components = ComponentRegistry::new();
        let (_dir, path) = scratch();
        let reconciler = Reconciler::new(path, &components);
        let mut registry = Registry::default();
        assert!(matches!(
            reconciler.populate(&mut registry),
            Err(SettingsError::EmptyRegistry)
        ));
    }

    #[test]
    fn test_write_defaults() {
        let (_dir, path) = scratch();
        let components = ComponentRegistry::new();
        let registry = registry(vec![
            Entry::optional("level", EntryType::LogLevel).with_default(LogLevel::Info),
            Entry::optional("chat", EntryType::List),
        ]);

        let mut reconciler = Reconciler::new(&path, &components).with_options(ReconcileOptions {
            write_defaults: true,
            ..ReconcileOptions::default()
        });
        let report = reconciler.fill(&registry, &mut NoPrompt).unwrap();
        assert_eq!(report.defaulted, 1);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "[APP]\nlevel = INFO\n\n");
    }

    #[test]
    fn test_written_defaults_are_counted_redundant() {
        let (_dir, path) = scratch();
        let components = ComponentRegistry::new();
        let options = ReconcileOptions {
            write_defaults: true,
            ..ReconcileOptions::default()
        };

        for _ in 0..2 {
            let mut registry = registry(vec![
                Entry::optional("level", EntryType::LogLevel).with_default(LogLevel::Info),
                Entry::optional("retries", EntryType::Integer).with_default(3),
            ]);
            let mut reconciler = Reconciler::new(&path, &components).with_options(options);
            reconciler.fill(&registry, &mut NoPrompt).unwrap();
            assert_eq!(reconciler.document(), &read_document(&path).unwrap());

            let report = reconciler.populate(&mut registry).unwrap();
            assert_eq!(report.redundant, 2);
            assert_eq!(report.applied, 0);
        }
    }

    #[test]
    fn test_empty_prompt_answer_fails() {
        let (_dir, path) = scratch();
        let components = ComponentRegistry::new();
        let registry = registry(vec![Entry::required("token", EntryType::String)]);

        let mut prompter = ScriptedPrompter::new([""]);
        let result = Reconciler::new(&path, &components).fill(&registry, &mut prompter);
        assert!(matches!(result, Err(SettingsError::RequiredMissing { .. })));
        assert!(!path.exists());
    }
}
