//! Shared helpers for settings integration tests.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use shinogramma::settings::{ComponentRegistry, Registry, SchemaDeclaration};

/// A scratch directory holding one settings file.
pub struct SettingsFile {
    // Keeps the directory alive for the test's duration.
    _dir: TempDir,
    pub path: PathBuf,
}

impl SettingsFile {
    /// A path with no file behind it yet.
    pub fn missing() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        Self { _dir: dir, path }
    }

    /// A settings file holding `contents`.
    pub fn with_contents(contents: &str) -> Self {
        let file = Self::missing();
        fs::write(&file.path, contents).unwrap();
        file
    }

    pub fn read(&self) -> String {
        fs::read_to_string(&self.path).unwrap()
    }

    #[allow(dead_code)]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// Resolve a declaration with no components registered.
#[allow(dead_code)]
pub fn resolve(declaration: SchemaDeclaration) -> Registry {
    Registry::resolve(&declaration, &ComponentRegistry::new()).unwrap()
}
