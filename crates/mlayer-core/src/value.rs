#![forbid(unsafe_code)]

//! Dynamic option values carried by a layer configuration.
//!
//! Layer options arrive from callers as loosely typed values: a label can be a
//! string or `false`, a width can be a number or a CSS length, and unknown keys
//! must pass through untouched. [`ConfigValue`] keeps the exact value the caller
//! supplied so that `false`, `null` and `0` stay distinguishable from "absent".
//!
//! # Truthiness
//!
//! Several options are switched off by any "falsy" value. The rules are:
//!
//! | Value | Truthy |
//! |-------|--------|
//! | `Null` | no |
//! | `Bool(b)` | `b` |
//! | `Int(0)`, `Float(0.0)`, `Float(NaN)` | no |
//! | `Str("")` | no |
//! | everything else | yes |

use std::collections::BTreeMap;
use std::fmt;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ConfigValue {
    /// Explicit null.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Integer, typically milliseconds or pixels.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    Str(String),
    /// Ordered list of values.
    List(Vec<ConfigValue>),
    /// String-keyed mapping (style tables, data payloads).
    Map(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
    /// Whether this value counts as "on".
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0 && !f.is_nan(),
            Self::Str(s) => !s.is_empty(),
            Self::List(_) | Self::Map(_) => true,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, ConfigValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Numeric view: numbers as-is, strings only if they parse as a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) if f.is_finite() => Some(*f),
            Self::Str(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// Render the value as it would appear in a style declaration or label.
    ///
    /// Returns `None` for values with no scalar form (null, lists, maps).
    pub fn to_css(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(format_number(*f)),
            Self::Bool(b) => Some(b.to_string()),
            Self::Null | Self::List(_) | Self::Map(_) => None,
        }
    }

    /// Build a map value from key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<ConfigValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Format a number without a trailing `.0` for whole values.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Format a pixel length, e.g. `480px` or `12.5px`.
pub fn px(value: f64) -> String {
    format!("{}px", format_number(value))
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            other => match other.to_css() {
                Some(s) => f.write_str(&s),
                None => Ok(()),
            },
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for ConfigValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl<T: Into<ConfigValue>> From<Option<T>> for ConfigValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_table() {
        assert!(!ConfigValue::Null.is_truthy());
        assert!(!ConfigValue::Bool(false).is_truthy());
        assert!(ConfigValue::Bool(true).is_truthy());
        assert!(!ConfigValue::Int(0).is_truthy());
        assert!(ConfigValue::Int(-1).is_truthy());
        assert!(!ConfigValue::Float(f64::NAN).is_truthy());
        assert!(!ConfigValue::Str(String::new()).is_truthy());
        assert!(ConfigValue::Str("0".into()).is_truthy());
        assert!(ConfigValue::List(vec![]).is_truthy());
        assert!(ConfigValue::map(Vec::<(String, ConfigValue)>::new()).is_truthy());
    }

    #[test]
    fn numeric_strings_parse() {
        assert_eq!(ConfigValue::from("550").as_f64(), Some(550.0));
        assert_eq!(ConfigValue::from(" 12.5 ").as_f64(), Some(12.5));
        assert_eq!(ConfigValue::from("30%").as_f64(), None);
        assert_eq!(ConfigValue::Bool(true).as_f64(), None);
    }

    #[test]
    fn pixel_formatting_drops_whole_fraction() {
        assert_eq!(px(480.0), "480px");
        assert_eq!(px(12.5), "12.5px");
        assert_eq!(px(-20.0), "-20px");
    }

    #[test]
    fn option_conversion_maps_none_to_null() {
        let none: Option<&str> = None;
        assert_eq!(ConfigValue::from(none), ConfigValue::Null);
        assert_eq!(ConfigValue::from(Some("x")), ConfigValue::Str("x".into()));
    }

    #[test]
    fn display_renders_nested_values() {
        let value = ConfigValue::map([("a", ConfigValue::from(vec![1, 2])), ("b", ConfigValue::Null)]);
        assert_eq!(value.to_string(), "{a: [1, 2], b: null}");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_values_map_onto_variants() {
        let value: ConfigValue =
            serde_json::from_str(r#"{"w": 550, "r": 1.5, "t": "Hi", "on": false, "x": null}"#)
                .expect("valid json");
        let map = value.as_map().expect("object");
        assert_eq!(map["w"], ConfigValue::Int(550));
        assert_eq!(map["r"], ConfigValue::Float(1.5));
        assert_eq!(map["t"], ConfigValue::from("Hi"));
        assert_eq!(map["on"], ConfigValue::Bool(false));
        assert_eq!(map["x"], ConfigValue::Null);
    }
}
