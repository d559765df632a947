//! Error types for the settings subsystem.
//!
//! Coercion failures never escape the coercion engine as panics; they are
//! returned as `CoercionError` and converted into a fatal `SettingsError`
//! only by the reconciliation passes.

use std::path::PathBuf;
use thiserror::Error;

use crate::settings::ini::IniError;
use crate::settings::schema::EntryType;

/// Errors raised while building the schema registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A section was both declared and included, or included from two
    /// different components.
    #[error("section {section} mixes declared entries with an include of {component}")]
    MixedSection { section: String, component: String },

    /// The same entry name was declared twice in one section.
    #[error("duplicate entry {key} in section {section}")]
    DuplicateEntry { section: String, key: String },
}

/// Errors raised when resolving a component key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComponentError {
    #[error("no component registered under {0:?}")]
    Unknown(String),

    #[error("component key must not be empty")]
    EmptyKey,
}

/// Errors raised when building a `ResolvedUrl`.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("{0:?} is an address literal, not a host name")]
    AddressLiteral(String),

    #[error("unable to parse {value:?}: {source}")]
    Parse {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{0:?} has no host")]
    MissingHost(String),

    #[error("unable to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} resolved to no address")]
    NoAddress(String),
}

/// A value could not be converted into its declared type.
#[derive(Debug, Error)]
pub enum CoercionError {
    #[error("{0:?} is not a boolean (expected true/false/1/0)")]
    Boolean(String),

    #[error("{value:?} is not an integer: {source}")]
    Integer {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("{value:?} is not a float: {source}")]
    Float {
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("{0:?} is not a finite number")]
    NonFinite(String),

    #[error("list {0:?} has no elements")]
    EmptyList(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error(transparent)]
    Url(#[from] UrlError),

    #[error("{value:?} is not an IP address: {source}")]
    Ip {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("invalid log level: {0}")]
    LogLevel(String),

    #[error("rate limit {value} outside {min}..={max}")]
    RateLimit { value: i64, min: u8, max: u8 },

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error("a {found} value cannot be used as {expected}")]
    Mismatch {
        expected: EntryType,
        found: &'static str,
    },
}

/// Fatal errors raised by the reconciliation passes.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unable to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: IniError,
    },

    #[error("unable to ask for {section} {key}: {source}")]
    Prompt {
        section: String,
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("type check failed in {section} {key} {value:?}: {source}")]
    Coercion {
        section: String,
        key: String,
        value: String,
        #[source]
        source: CoercionError,
    },

    #[error("{section} {key} {value:?} would not read back the same from the settings file")]
    Unpersistable {
        section: String,
        key: String,
        value: String,
    },

    #[error("no value given for required {section} {key}")]
    RequiredMissing { section: String, key: String },

    #[error("no settings sections are declared")]
    EmptyRegistry,

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
