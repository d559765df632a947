//! Monitor browsing settings.

use std::sync::Arc;

use crate::settings::{Entry, EntryType, SettingsProvider};

pub const COMPONENT_KEY: &str = "monitor.Monitor";

/// One camera of the recorder, as browsed from a chat.
#[derive(Debug, Default)]
pub struct Monitor;

pub(crate) fn factory() -> Arc<dyn SettingsProvider> {
    Arc::new(Monitor)
}

impl SettingsProvider for Monitor {
    fn settings_schema(&self) -> Vec<Entry> {
        vec![
            // videos listed per page
            Entry::optional("PAGE_SIZE", EntryType::Integer).with_default(10),
            // seconds before a recorder request is abandoned
            Entry::optional("TIMEOUT", EntryType::Float).with_default(10.0),
            Entry::optional("SUBSTREAM", EntryType::Boolean).with_default(false),
        ]
    }
}
