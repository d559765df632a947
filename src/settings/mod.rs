//! Settings management subsystem.
//!
//! # Data Flow
//! ```text
//! SchemaDeclaration (sections: entries or component includes)
//!     → schema.rs (resolve includes via ComponentRegistry)
//!     → Registry (flat sections, defaults as live values)
//!     → reconcile.rs fill pass (prompt for missing required values,
//!       write the INI file back)
//!     → reconcile.rs populate pass (coerce.rs turns each file value
//!       into its declared type)
//!     → Settings (frozen, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - The schema is the only source of truth for interpreting the file;
//!   values are stored as plain strings
//! - Any invalid or missing required value is fatal at startup
//! - Settings are immutable once loaded; there is no live reload

pub mod coerce;
pub mod component;
pub mod error;
pub mod ini;
pub mod prompt;
pub mod reconcile;
pub mod resolved;
pub mod schema;
pub mod types;
pub mod value;

pub use coerce::Coercer;
pub use component::{ComponentRegistry, SettingsProvider};
pub use error::{CoercionError, SchemaError, SettingsError};
pub use prompt::{ConsolePrompter, NoPrompt, Prompter, ScriptedPrompter};
pub use reconcile::{load_settings, ReconcileOptions, Reconciler};
pub use resolved::Settings;
pub use schema::{Entry, EntryType, Registry, SchemaDeclaration, CLASS_ENTRY};
pub use types::{ComponentRef, IpAddress, LogLevel, RateLimit, ResolvedUrl, TrustList};
pub use value::{ListItem, SettingValue};
