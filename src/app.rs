//! The bot's settings schema.
//!
//! `SHINOGRAMMA.LOGLEVEL` is applied only after settings load; to debug the
//! loading itself, start with `RUST_LOG=debug`.

use crate::components::{self, monitor, notify};
use crate::settings::{
    ComponentRegistry, Entry, EntryType, LogLevel, SchemaDeclaration, SchemaError, Settings,
};

/// Settings file used when none is given.
pub const CONFIG_FILE: &str = "config.ini";

/// Log file written next to the console output.
pub const LOG_FILE: &str = "shinogramma.log";

/// Section and key of the configured log level.
pub const LOG_LEVEL: (&str, &str) = ("SHINOGRAMMA", "LOGLEVEL");

/// Log level used until settings are loaded.
pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

/// Everything the bot needs to run.
pub fn schema() -> Result<SchemaDeclaration, SchemaError> {
    SchemaDeclaration::new()
        .declare(
            "TELEGRAM",
            vec![
                Entry::optional("CHAT_ID", EntryType::List),
                Entry::required("API_KEY", EntryType::String),
            ],
        )?
        .declare(
            "SHINOBI",
            vec![
                Entry::required("API_KEY", EntryType::String),
                Entry::required("GROUP_KEY", EntryType::String),
                Entry::required("BASE_URL", EntryType::Url),
                Entry::required("PORT", EntryType::Integer).with_default(8080),
            ],
        )?
        .declare(
            "SHINOGRAMMA",
            vec![
                Entry::optional("LOGLEVEL", EntryType::LogLevel).with_default(DEFAULT_LOG_LEVEL),
                Entry::optional("PERSISTENCE", EntryType::Boolean).with_default(false),
                Entry::optional("BANS", EntryType::JsonObject),
            ],
        )?
        .include("WEBHOOK", notify::COMPONENT_KEY)?
        .include("MONITOR", monitor::COMPONENT_KEY)
}

/// Component registry with every built-in component.
pub fn components() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    components::register_builtin(&mut registry);
    registry
}

/// Chat ids allowed to talk to the bot. Empty means anyone.
pub fn allowed_chats(settings: &Settings) -> Vec<i64> {
    settings
        .get("TELEGRAM", "CHAT_ID")
        .map(|v| v.list_ints())
        .unwrap_or_default()
}

/// The configured log level, or the default.
pub fn log_level(settings: &Settings) -> LogLevel {
    settings
        .get(LOG_LEVEL.0, LOG_LEVEL.1)
        .and_then(|v| v.as_log_level())
        .unwrap_or(DEFAULT_LOG_LEVEL)
}
