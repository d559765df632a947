//! Shinogramma settings loader library

pub mod app;
pub mod components;
pub mod observability;
pub mod settings;

pub use settings::{load_settings, ReconcileOptions, Settings, SettingsError};
