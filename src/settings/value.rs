//! Typed setting values.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::settings::types::{ComponentRef, IpAddress, LogLevel, RateLimit, ResolvedUrl, TrustList};

/// One element of a list setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ListItem {
    Int(i64),
    Text(String),
}

impl fmt::Display for ListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListItem::Int(n) => write!(f, "{}", n),
            ListItem::Text(s) => f.write_str(s),
        }
    }
}

/// A live setting value, one variant per declared entry type.
///
/// `Display` yields the form persisted in the settings file; coercing that
/// text back through the same entry type yields an equal value.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Float(f64),
    List(Vec<ListItem>),
    Json(Map<String, Value>),
    Url(ResolvedUrl),
    Ip(IpAddress),
    LogLevel(LogLevel),
    TrustList(TrustList),
    RateLimit(RateLimit),
    Component(ComponentRef),
}

impl SettingValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(n) => Some(*n),
            SettingValue::RateLimit(r) => Some(r.get() as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            SettingValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ListItem]> {
        match self {
            SettingValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Map<String, Value>> {
        match self {
            SettingValue::Json(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_url(&self) -> Option<&ResolvedUrl> {
        match self {
            SettingValue::Url(url) => Some(url),
            _ => None,
        }
    }

    pub fn as_ip(&self) -> Option<IpAddress> {
        match self {
            SettingValue::Ip(ip) => Some(*ip),
            _ => None,
        }
    }

    pub fn as_log_level(&self) -> Option<LogLevel> {
        match self {
            SettingValue::LogLevel(level) => Some(*level),
            _ => None,
        }
    }

    pub fn as_trust_list(&self) -> Option<&TrustList> {
        match self {
            SettingValue::TrustList(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&ComponentRef> {
        match self {
            SettingValue::Component(component) => Some(component),
            _ => None,
        }
    }

    /// Integer elements of a list setting, e.g. chat ids.
    pub fn list_ints(&self) -> Vec<i64> {
        self.as_list()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match item {
                        ListItem::Int(n) => Some(*n),
                        ListItem::Text(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            SettingValue::Str(_) => "string",
            SettingValue::Int(_) => "integer",
            SettingValue::Bool(_) => "boolean",
            SettingValue::Float(_) => "float",
            SettingValue::List(_) => "list",
            SettingValue::Json(_) => "json",
            SettingValue::Url(_) => "url",
            SettingValue::Ip(_) => "ip",
            SettingValue::LogLevel(_) => "loglevel",
            SettingValue::TrustList(_) => "trustlist",
            SettingValue::RateLimit(_) => "ratelimit",
            SettingValue::Component(_) => "component",
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Str(s) => f.write_str(s),
            SettingValue::Int(n) => write!(f, "{}", n),
            SettingValue::Bool(b) => write!(f, "{}", b),
            SettingValue::Float(x) => write!(f, "{}", x),
            SettingValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            SettingValue::Json(map) => write!(f, "{}", Value::Object(map.clone())),
            SettingValue::Url(url) => write!(f, "{}", url),
            SettingValue::Ip(ip) => write!(f, "{}", ip),
            SettingValue::LogLevel(level) => write!(f, "{}", level),
            SettingValue::TrustList(list) => write!(f, "{}", list),
            SettingValue::RateLimit(limit) => write!(f, "{}", limit),
            SettingValue::Component(component) => write!(f, "{}", component),
        }
    }
}

impl Serialize for SettingValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SettingValue::Str(s) => serializer.serialize_str(s),
            SettingValue::Int(n) => serializer.serialize_i64(*n),
            SettingValue::Bool(b) => serializer.serialize_bool(*b),
            SettingValue::Float(x) => serializer.serialize_f64(*x),
            SettingValue::List(items) => items.serialize(serializer),
            SettingValue::Json(map) => map.serialize(serializer),
            SettingValue::Url(url) => url.serialize(serializer),
            SettingValue::Ip(ip) => ip.serialize(serializer),
            SettingValue::LogLevel(level) => level.serialize(serializer),
            SettingValue::TrustList(list) => list.serialize(serializer),
            SettingValue::RateLimit(limit) => limit.serialize(serializer),
            SettingValue::Component(component) => component.serialize(serializer),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::Str(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::Str(s)
    }
}

impl From<i64> for SettingValue {
    fn from(n: i64) -> Self {
        SettingValue::Int(n)
    }
}

impl From<i32> for SettingValue {
    fn from(n: i32) -> Self {
        SettingValue::Int(n as i64)
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        SettingValue::Bool(b)
    }
}

impl From<f64> for SettingValue {
    fn from(x: f64) -> Self {
        SettingValue::Float(x)
    }
}

impl From<LogLevel> for SettingValue {
    fn from(level: LogLevel) -> Self {
        SettingValue::LogLevel(level)
    }
}

impl From<RateLimit> for SettingValue {
    fn from(limit: RateLimit) -> Self {
        SettingValue::RateLimit(limit)
    }
}

/// Input to the coercion engine: text from a file or prompt, or a value
/// that already carries a type.
#[derive(Debug, Clone, Copy)]
pub enum RawValue<'a> {
    Text(&'a str),
    Bool(bool),
    Json(&'a Value),
}

impl<'a> From<&'a str> for RawValue<'a> {
    fn from(s: &'a str) -> Self {
        RawValue::Text(s)
    }
}

impl From<bool> for RawValue<'_> {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl<'a> From<&'a Value> for RawValue<'a> {
    fn from(v: &'a Value) -> Self {
        RawValue::Json(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_display() {
        let value = SettingValue::List(vec![
            ListItem::Int(111),
            ListItem::Int(-222),
            ListItem::Text("abc".into()),
        ]);
        assert_eq!(value.to_string(), "111,-222,abc");
        assert_eq!(value.list_ints(), vec![111, -222]);
    }

    #[test]
    fn test_typed_accessors() {
        assert_eq!(SettingValue::from(9000i64).as_int(), Some(9000));
        assert_eq!(SettingValue::from(9000).as_str(), None);
        assert_eq!(SettingValue::from(true).as_bool(), Some(true));
        assert_eq!(SettingValue::from("key").as_str(), Some("key"));
        assert_eq!(
            SettingValue::from(LogLevel::Debug).as_log_level(),
            Some(LogLevel::Debug)
        );
    }

    #[test]
    fn test_serialize() {
        let list = SettingValue::List(vec![ListItem::Int(1), ListItem::Text("x".into())]);
        assert_eq!(serde_json::to_value(&list).unwrap(), json!([1, "x"]));
        assert_eq!(
            serde_json::to_value(SettingValue::from(LogLevel::Info)).unwrap(),
            json!("INFO")
        );
    }
}
