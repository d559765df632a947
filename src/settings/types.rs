//! Domain value types.
//!
//! Each type wraps the raw string an operator typed and enforces its
//! invariant at construction time; a value that exists is a valid value.

use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, ToSocketAddrs};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::level_filters::LevelFilter;
use url::{Host, Url};

use crate::settings::component::{ComponentRegistry, SettingsProvider};
use crate::settings::error::{ComponentError, CoercionError, UrlError};

/// Name of a JSON value's kind, for diagnostics.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A syntactically valid IPv4 or IPv6 address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpAddress(IpAddr);

impl IpAddress {
    pub fn new(value: &str) -> Result<Self, CoercionError> {
        value
            .trim()
            .parse::<IpAddr>()
            .map(Self)
            .map_err(|source| CoercionError::Ip {
                value: value.to_string(),
                source,
            })
    }

    pub fn addr(&self) -> IpAddr {
        self.0
    }
}

impl From<IpAddr> for IpAddress {
    fn from(addr: IpAddr) -> Self {
        Self(addr)
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A URL or bare host name whose host resolved to an address when the
/// value was built.
///
/// Bare address literals (`192.168.1.5`) and all-digit strings are
/// rejected; those belong in an `Ip` entry. `http://192.168.1.5` is fine.
#[derive(Debug, Clone)]
pub struct ResolvedUrl {
    raw: String,
    host: String,
    ip: IpAddress,
    port: Option<u16>,
}

impl ResolvedUrl {
    /// Parse `raw` and resolve its host.
    pub fn new(raw: &str) -> Result<Self, UrlError> {
        let raw = raw.trim();
        if raw.parse::<IpAddr>().is_ok()
            || (!raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(UrlError::AddressLiteral(raw.to_string()));
        }

        let parsed = if raw.contains("://") {
            Url::parse(raw)
        } else {
            Url::parse(&format!("http://{}", raw))
        }
        .map_err(|source| UrlError::Parse {
            value: raw.to_string(),
            source,
        })?;

        let port = parsed.port();
        let (host, ip) = match parsed.host() {
            Some(Host::Ipv4(addr)) => (addr.to_string(), IpAddr::V4(addr)),
            Some(Host::Ipv6(addr)) => (addr.to_string(), IpAddr::V6(addr)),
            Some(Host::Domain(domain)) if !domain.is_empty() => {
                (domain.to_string(), resolve_host(domain, port)?)
            }
            _ => return Err(UrlError::MissingHost(raw.to_string())),
        };

        tracing::debug!(url = %raw, host = %host, ip = %ip, "Resolved URL");

        Ok(Self {
            raw: raw.to_string(),
            host,
            ip: IpAddress(ip),
            port,
        })
    }

    /// The URL exactly as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Address the host resolved to at construction.
    pub fn ip(&self) -> IpAddress {
        self.ip
    }

    /// Explicit port, if the URL carried one.
    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

/// Resolve a host name, preferring IPv4 answers.
fn resolve_host(host: &str, port: Option<u16>) -> Result<IpAddr, UrlError> {
    let addrs: Vec<IpAddr> = (host, port.unwrap_or(0))
        .to_socket_addrs()
        .map_err(|source| UrlError::Resolve {
            host: host.to_string(),
            source,
        })?
        .map(|addr| addr.ip())
        .collect();

    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| UrlError::NoAddress(host.to_string()))
}

impl PartialEq for ResolvedUrl {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl fmt::Display for ResolvedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Log levels accepted in settings files. `NOTSET` reads as `TRACE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// The tracing filter for this level. `CRITICAL` has no tracing
    /// counterpart and maps to `ERROR`.
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = CoercionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRACE" | "NOTSET" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" | "FATAL" => Ok(LogLevel::Critical),
            _ => Err(CoercionError::LogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry of a `TrustList`.
#[derive(Debug, Clone, PartialEq)]
pub enum Address {
    Ip(IpAddress),
    Url(ResolvedUrl),
}

impl Address {
    /// The resolved address, whichever form was configured.
    pub fn ip(&self) -> IpAddress {
        match self {
            Address::Ip(ip) => *ip,
            Address::Url(url) => url.ip(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Ip(ip) => write!(f, "{}", ip),
            Address::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Named trusted peers, configured as a flat JSON object:
/// `{"nvr": "192.168.1.5", "cloud": "https://example.com"}`.
///
/// Each value is tried as an IP address, then as a URL. Values that are
/// neither are dropped with a warning; the rest of the list survives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrustList {
    entries: BTreeMap<String, Address>,
}

impl TrustList {
    pub fn parse(text: &str) -> Result<Self, CoercionError> {
        let value: Value = serde_json::from_str(text)?;
        let object = match value {
            Value::Object(object) => object,
            other => return Err(CoercionError::NotAnObject(json_kind(&other))),
        };

        let mut entries = BTreeMap::new();
        for (name, value) in object {
            let Some(text) = value.as_str() else {
                tracing::warn!(
                    name = %name,
                    kind = json_kind(&value),
                    "Trust list value is not a string, dropping"
                );
                continue;
            };

            let address = match IpAddress::new(text) {
                Ok(ip) => Address::Ip(ip),
                Err(_) => match ResolvedUrl::new(text) {
                    Ok(url) => Address::Url(url),
                    Err(e) => {
                        tracing::warn!(
                            name = %name,
                            value = %text,
                            error = %e,
                            "Invalid address in trust list, dropping"
                        );
                        continue;
                    }
                },
            };
            entries.insert(name, address);
        }

        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&Address> {
        self.entries.get(name)
    }

    /// True when `ip` belongs to any trusted peer.
    pub fn contains_ip(&self, ip: IpAddr) -> bool {
        self.entries.values().any(|a| a.ip().addr() == ip)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Address)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for TrustList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let object: serde_json::Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.to_string())))
            .collect();
        write!(f, "{}", Value::Object(object))
    }
}

/// A per-window notification budget, bounded to `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RateLimit(u8);

impl RateLimit {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;
    /// The most permissive limit.
    pub const MAXIMUM: Self = Self(Self::MAX);

    pub fn new(value: i64) -> Result<Self, CoercionError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(CoercionError::RateLimit {
                value,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    pub fn parse(text: &str) -> Result<Self, CoercionError> {
        let text = text.trim();
        let value = text
            .parse::<i64>()
            .map_err(|source| CoercionError::Integer {
                value: text.to_string(),
                source,
            })?;
        Self::new(value)
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A component resolved by key through a `ComponentRegistry`.
#[derive(Clone)]
pub struct ComponentRef {
    key: String,
    component: Arc<dyn SettingsProvider>,
}

impl ComponentRef {
    pub fn resolve(key: &str, components: &ComponentRegistry) -> Result<Self, ComponentError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ComponentError::EmptyKey);
        }
        let component = components.instantiate(key)?;
        Ok(Self {
            key: key.to_string(),
            component,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn component(&self) -> &Arc<dyn SettingsProvider> {
        &self.component
    }
}

impl PartialEq for ComponentRef {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentRef").field(&self.key).finish()
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

macro_rules! serialize_as_display {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.collect_str(self)
                }
            }
        )*
    };
}

serialize_as_display!(IpAddress, ResolvedUrl, LogLevel, Address, ComponentRef);

impl Serialize for TrustList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter())
    }
}

impl Serialize for RateLimit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}
