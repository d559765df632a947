//! Type coercion engine.
//!
//! Converts raw text (or an already typed boolean/JSON value) into the
//! `SettingValue` an entry declares.
//!
//! # Design Decisions
//! - `Ok(None)` means "no value" (empty text for plain types), which leaves
//!   the entry at its default. `Err` is a failed coercion.
//! - Failures are traced here at debug level only; the caller decides
//!   whether one is fatal and logs it at the matching severity.

use serde_json::Value;

use crate::settings::component::ComponentRegistry;
use crate::settings::error::CoercionError;
use crate::settings::schema::EntryType;
use crate::settings::types::{json_kind, ComponentRef, IpAddress, LogLevel, RateLimit, ResolvedUrl, TrustList};
use crate::settings::value::{ListItem, RawValue, SettingValue};

/// Result of a coercion: a value, no value, or a failure.
pub type Coerced = Result<Option<SettingValue>, CoercionError>;

/// Coerces raw values; holds the component registry used to resolve
/// `Component` entries.
#[derive(Debug, Clone, Copy)]
pub struct Coercer<'a> {
    components: &'a ComponentRegistry,
}

impl<'a> Coercer<'a> {
    pub fn new(components: &'a ComponentRegistry) -> Self {
        Self { components }
    }

    /// Coerce `raw` into `ty`. `name` is only used for diagnostics.
    pub fn coerce<'r>(&self, raw: impl Into<RawValue<'r>>, ty: EntryType, name: &str) -> Coerced {
        let raw = raw.into();
        let result = self.convert(raw, ty);
        if let Err(e) = &result {
            tracing::debug!(
                name = %name,
                value = ?raw,
                target = %ty,
                error = %e,
                "Error verifying value or converting it to its type"
            );
        }
        result
    }

    fn convert(&self, raw: RawValue<'_>, ty: EntryType) -> Coerced {
        match (raw, ty) {
            (RawValue::Bool(b), EntryType::Boolean) => Ok(Some(SettingValue::Bool(b))),
            (RawValue::Bool(b), _) => self.convert_text(if b { "true" } else { "false" }, ty),
            (RawValue::Json(Value::Object(map)), EntryType::JsonObject) => {
                Ok(Some(SettingValue::Json(map.clone())))
            }
            (RawValue::Json(Value::String(s)), _) => self.convert_text(s, ty),
            (RawValue::Json(Value::Bool(b)), _) => self.convert(RawValue::Bool(*b), ty),
            (RawValue::Json(value @ Value::Number(_)), _) => {
                self.convert_text(&value.to_string(), ty)
            }
            (RawValue::Json(value), _) => Err(CoercionError::Mismatch {
                expected: ty,
                found: json_kind(value),
            }),
            (RawValue::Text(text), _) => self.convert_text(text, ty),
        }
    }

    fn convert_text(&self, text: &str, ty: EntryType) -> Coerced {
        let value = match ty {
            EntryType::Boolean => SettingValue::Bool(parse_bool(text)?),
            EntryType::List => SettingValue::List(parse_list(text)?),
            EntryType::JsonObject => match serde_json::from_str::<Value>(text)? {
                Value::Object(map) => SettingValue::Json(map),
                other => return Err(CoercionError::NotAnObject(json_kind(&other))),
            },
            EntryType::Url => SettingValue::Url(ResolvedUrl::new(text)?),
            EntryType::Ip => SettingValue::Ip(IpAddress::new(text)?),
            EntryType::LogLevel => SettingValue::LogLevel(text.parse::<LogLevel>()?),
            EntryType::TrustList => SettingValue::TrustList(TrustList::parse(text)?),
            EntryType::RateLimit => SettingValue::RateLimit(RateLimit::parse(text)?),
            EntryType::Component => {
                SettingValue::Component(ComponentRef::resolve(text, self.components)?)
            }
            EntryType::String | EntryType::Integer | EntryType::Float => {
                return parse_plain(text, ty);
            }
        };
        Ok(Some(value))
    }
}

fn parse_bool(text: &str) -> Result<bool, CoercionError> {
    match text.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(CoercionError::Boolean(text.to_string())),
    }
}

fn is_integer(segment: &str) -> bool {
    let digits = segment.strip_prefix('-').unwrap_or(segment);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Split on commas, drop empty segments, keep integers as integers.
fn parse_list(text: &str) -> Result<Vec<ListItem>, CoercionError> {
    let items: Vec<ListItem> = text
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.parse::<i64>() {
            Ok(n) if is_integer(segment) => ListItem::Int(n),
            _ => ListItem::Text(segment.to_string()),
        })
        .collect();

    if items.is_empty() {
        return Err(CoercionError::EmptyList(text.to_string()));
    }
    Ok(items)
}

/// Plain types: empty text is "no value", not a failure.
fn parse_plain(text: &str, ty: EntryType) -> Coerced {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = match ty {
        EntryType::Integer => {
            SettingValue::Int(trimmed.parse().map_err(|source| CoercionError::Integer {
                value: trimmed.to_string(),
                source,
            })?)
        }
        EntryType::Float => {
            let x: f64 = trimmed.parse().map_err(|source| CoercionError::Float {
                value: trimmed.to_string(),
                source,
            })?;
            if !x.is_finite() {
                return Err(CoercionError::NonFinite(trimmed.to_string()));
            }
            SettingValue::Float(x)
        }
        _ => SettingValue::Str(trimmed.to_string()),
    };
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coerce(text: &str, ty: EntryType) -> Coerced {
        let components = ComponentRegistry::new();
        Coercer::new(&components).coerce(text, ty, "TEST")
    }

    #[test]
    fn test_boolean() {
        for text in ["true", "TRUE", "1", " True "] {
            assert_eq!(coerce(text, EntryType::Boolean).unwrap(), Some(SettingValue::Bool(true)));
        }
        for text in ["false", "False", "0"] {
            assert_eq!(coerce(text, EntryType::Boolean).unwrap(), Some(SettingValue::Bool(false)));
        }
        assert!(matches!(coerce("maybe", EntryType::Boolean), Err(CoercionError::Boolean(_))));
        assert!(coerce("", EntryType::Boolean).is_err());
    }

    #[test]
    fn test_boolean_passthrough() {
        let components = ComponentRegistry::new();
        let coercer = Coercer::new(&components);
        assert_eq!(
            coercer.coerce(true, EntryType::Boolean, "B").unwrap(),
            Some(SettingValue::Bool(true))
        );
        assert_eq!(
            coercer.coerce(false, EntryType::String, "S").unwrap(),
            Some(SettingValue::Str("false".into()))
        );
    }

    #[test]
    fn test_list() {
        let value = coerce("111, 222, abc", EntryType::List).unwrap().unwrap();
        assert_eq!(
            value,
            SettingValue::List(vec![
                ListItem::Int(111),
                ListItem::Int(222),
                ListItem::Text("abc".into()),
            ])
        );

        let value = coerce("-1001,,7,", EntryType::List).unwrap().unwrap();
        assert_eq!(value.list_ints(), vec![-1001, 7]);

        // "-" alone and "+5" are not integers
        let value = coerce("-,+5", EntryType::List).unwrap().unwrap();
        assert_eq!(value.list_ints(), Vec::<i64>::new());

        assert!(matches!(coerce(" , ,", EntryType::List), Err(CoercionError::EmptyList(_))));
        assert!(coerce("", EntryType::List).is_err());
    }

    #[test]
    fn test_json_object() {
        let value = coerce(r#"{"123": "spam"}"#, EntryType::JsonObject).unwrap().unwrap();
        assert_eq!(value.as_json().unwrap()["123"], json!("spam"));

        assert!(matches!(coerce("{bad", EntryType::JsonObject), Err(CoercionError::Json(_))));
        assert!(matches!(
            coerce("[1, 2]", EntryType::JsonObject),
            Err(CoercionError::NotAnObject("array"))
        ));
    }

    #[test]
    fn test_json_passthrough() {
        let components = ComponentRegistry::new();
        let coercer = Coercer::new(&components);

        let object = json!({"a": 1});
        assert!(coercer.coerce(&object, EntryType::JsonObject, "J").unwrap().is_some());

        let number = json!(42);
        assert_eq!(
            coercer.coerce(&number, EntryType::Integer, "N").unwrap(),
            Some(SettingValue::Int(42))
        );

        let array = json!([1]);
        assert!(matches!(
            coercer.coerce(&array, EntryType::Integer, "A"),
            Err(CoercionError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_plain_types() {
        assert_eq!(coerce("9000", EntryType::Integer).unwrap(), Some(SettingValue::Int(9000)));
        assert_eq!(coerce("1.5", EntryType::Float).unwrap(), Some(SettingValue::Float(1.5)));
        assert_eq!(
            coerce("secret", EntryType::String).unwrap(),
            Some(SettingValue::Str("secret".into()))
        );
        assert!(matches!(coerce("90o0", EntryType::Integer), Err(CoercionError::Integer { .. })));
        assert!(matches!(coerce("fast", EntryType::Float), Err(CoercionError::Float { .. })));
    }

    #[test]
    fn test_float_must_be_finite() {
        for text in ["NaN", "nan", "inf", "-infinity", "1e400"] {
            assert!(
                matches!(coerce(text, EntryType::Float), Err(CoercionError::NonFinite(_))),
                "{} accepted",
                text
            );
        }
        assert_eq!(coerce("-0.5", EntryType::Float).unwrap(), Some(SettingValue::Float(-0.5)));
    }

    #[test]
    fn test_empty_plain_is_absent() {
        assert_eq!(coerce("", EntryType::String).unwrap(), None);
        assert_eq!(coerce("  ", EntryType::Integer).unwrap(), None);
        assert_eq!(coerce("", EntryType::Float).unwrap(), None);
    }

    #[test]
    fn test_domain_types() {
        assert!(coerce("http://localhost", EntryType::Url).unwrap().is_some());
        assert!(matches!(coerce("not a host", EntryType::Url), Err(CoercionError::Url(_))));
        assert!(coerce("10.0.0.1", EntryType::Ip).unwrap().is_some());
        assert!(coerce("10.0.0", EntryType::Ip).is_err());
        assert_eq!(
            coerce("debug", EntryType::LogLevel).unwrap(),
            Some(SettingValue::LogLevel(LogLevel::Debug))
        );
        assert!(coerce("loud", EntryType::LogLevel).is_err());
        assert!(coerce("3", EntryType::RateLimit).unwrap().is_some());
        assert!(coerce("9", EntryType::RateLimit).is_err());
        assert!(matches!(
            coerce("nowhere.Nothing", EntryType::Component),
            Err(CoercionError::Component(_))
        ));
    }
}
