//! Webhook notification server settings.

use std::sync::Arc;

use crate::settings::{Entry, EntryType, RateLimit, Settings, SettingsProvider, TrustList};

pub const COMPONENT_KEY: &str = "notify.WebhookServer";

/// Receives motion events from the recorder and forwards them to chats.
#[derive(Debug, Default)]
pub struct WebhookServer;

pub(crate) fn factory() -> Arc<dyn SettingsProvider> {
    Arc::new(WebhookServer)
}

impl SettingsProvider for WebhookServer {
    fn settings_schema(&self) -> Vec<Entry> {
        vec![
            Entry::optional("SERVER", EntryType::Boolean).with_default(false),
            Entry::optional("PORT", EntryType::Integer).with_default(5001),
            Entry::optional("TRUSTLIST", EntryType::TrustList),
            Entry::optional("RATELIMIT", EntryType::RateLimit)
                .with_default(RateLimit::MAXIMUM),
        ]
    }
}

/// Typed view of the `[WEBHOOK]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub port: u16,
    pub trustlist: TrustList,
    pub rate_limit: u8,
}

impl WebhookConfig {
    /// Read the section named `section`; `None` when it is absent or empty.
    pub fn from_settings(settings: &Settings, section: &str) -> Option<Self> {
        let enabled = settings.get(section, "SERVER")?.as_bool()?;
        let port = settings
            .get(section, "PORT")
            .and_then(|v| v.as_int())
            .and_then(|p| u16::try_from(p).ok())?;
        let trustlist = settings
            .get(section, "TRUSTLIST")
            .and_then(|v| v.as_trust_list())
            .cloned()
            .unwrap_or_default();
        let rate_limit = settings
            .get(section, "RATELIMIT")
            .and_then(|v| v.as_int())
            .map(|n| n as u8)
            .unwrap_or(RateLimit::MAX);

        Some(Self {
            enabled,
            port,
            trustlist,
            rate_limit,
        })
    }
}
