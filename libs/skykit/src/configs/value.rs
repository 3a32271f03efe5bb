use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::configs::model::ModelReference;
use crate::di::Callable;
use crate::validators::Validator;

/// JSON object as used by dictionary-typed configs.
pub type Dict = Map<String, Value>;

/// A per-instance configuration value.
///
/// Values are owned: list and dictionary variants are always copies of whatever the
/// caller handed in, so two instances never share mutable state through a config.
#[derive(Clone, Default)]
pub enum ConfigValue {
    #[default]
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    StrList(Vec<String>),
    StrDict(BTreeMap<String, String>),
    Dict(Dict),
    DictList(Vec<Dict>),
    Datetime(DateTime<Utc>),
    Model(Arc<dyn ModelReference>),
    Callable(Callable),
    Validators(Vec<Arc<dyn Validator>>),
    Actions(Vec<Callable>),
}

impl ConfigValue {
    /// Language-agnostic description of the value's shape, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Str(_) => "string",
            ConfigValue::Int(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::Bool(_) => "boolean",
            ConfigValue::StrList(_) => "list of strings",
            ConfigValue::StrDict(_) => "dictionary of strings",
            ConfigValue::Dict(_) => "dictionary",
            ConfigValue::DictList(_) => "list of dictionaries",
            ConfigValue::Datetime(_) => "datetime",
            ConfigValue::Model(_) => "model class",
            ConfigValue::Callable(_) => "callable",
            ConfigValue::Validators(_) => "list of validators",
            ConfigValue::Actions(_) => "list of actions",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    /// Convert config-file data without coercion.
    ///
    /// Returns `None` for shapes no config type can hold (lists mixing strings and
    /// objects, lists of numbers). An empty JSON array becomes an empty string list.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(ConfigValue::Null),
            Value::Bool(b) => Some(ConfigValue::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(ConfigValue::Int(i)),
                None => n.as_f64().map(ConfigValue::Float),
            },
            Value::String(s) => Some(ConfigValue::Str(s)),
            Value::Object(map) => Some(ConfigValue::Dict(map)),
            Value::Array(items) => {
                if items.iter().all(Value::is_string) {
                    Some(ConfigValue::StrList(
                        items
                            .into_iter()
                            .filter_map(|v| match v {
                                Value::String(s) => Some(s),
                                _ => None,
                            })
                            .collect(),
                    ))
                } else if items.iter().all(Value::is_object) {
                    Some(ConfigValue::DictList(
                        items
                            .into_iter()
                            .filter_map(|v| match v {
                                Value::Object(m) => Some(m),
                                _ => None,
                            })
                            .collect(),
                    ))
                } else {
                    None
                }
            }
        }
    }

    /// JSON view of plain data values; `None` for models, callables and validators.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            ConfigValue::Null => Some(Value::Null),
            ConfigValue::Str(s) => Some(Value::String(s.clone())),
            ConfigValue::Int(i) => Some(Value::from(*i)),
            ConfigValue::Float(f) => Some(Value::from(*f)),
            ConfigValue::Bool(b) => Some(Value::Bool(*b)),
            ConfigValue::StrList(items) => Some(Value::from(items.clone())),
            ConfigValue::StrDict(map) => Some(Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            )),
            ConfigValue::Dict(map) => Some(Value::Object(map.clone())),
            ConfigValue::DictList(items) => Some(Value::Array(
                items.iter().cloned().map(Value::Object).collect(),
            )),
            ConfigValue::Datetime(dt) => Some(Value::String(dt.to_rfc3339())),
            ConfigValue::Model(_)
            | ConfigValue::Callable(_)
            | ConfigValue::Validators(_)
            | ConfigValue::Actions(_) => None,
        }
    }
}

impl fmt::Debug for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => f.write_str("Null"),
            ConfigValue::Str(s) => f.debug_tuple("Str").field(s).finish(),
            ConfigValue::Int(i) => f.debug_tuple("Int").field(i).finish(),
            ConfigValue::Float(x) => f.debug_tuple("Float").field(x).finish(),
            ConfigValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            ConfigValue::StrList(items) => f.debug_tuple("StrList").field(items).finish(),
            ConfigValue::StrDict(map) => f.debug_tuple("StrDict").field(map).finish(),
            ConfigValue::Dict(map) => f.debug_tuple("Dict").field(map).finish(),
            ConfigValue::DictList(items) => f.debug_tuple("DictList").field(items).finish(),
            ConfigValue::Datetime(dt) => f.debug_tuple("Datetime").field(dt).finish(),
            ConfigValue::Model(m) => f.debug_tuple("Model").field(&m.name()).finish(),
            ConfigValue::Callable(c) => f.debug_tuple("Callable").field(&c.name()).finish(),
            ConfigValue::Validators(v) => f
                .debug_tuple("Validators")
                .field(&v.iter().map(|v| v.name().to_string()).collect::<Vec<_>>())
                .finish(),
            ConfigValue::Actions(a) => f
                .debug_tuple("Actions")
                .field(&a.iter().map(Callable::name).collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// Data variants compare by value; models by name; callables and validators by identity.
impl PartialEq for ConfigValue {
    fn eq(&self, other: &Self) -> bool {
        use ConfigValue as V;
        match (self, other) {
            (V::Null, V::Null) => true,
            (V::Str(a), V::Str(b)) => a == b,
            (V::Int(a), V::Int(b)) => a == b,
            (V::Float(a), V::Float(b)) => a == b,
            (V::Bool(a), V::Bool(b)) => a == b,
            (V::StrList(a), V::StrList(b)) => a == b,
            (V::StrDict(a), V::StrDict(b)) => a == b,
            (V::Dict(a), V::Dict(b)) => a == b,
            (V::DictList(a), V::DictList(b)) => a == b,
            (V::Datetime(a), V::Datetime(b)) => a == b,
            (V::Model(a), V::Model(b)) => a.name() == b.name(),
            (V::Callable(a), V::Callable(b)) => a.same_as(b),
            (V::Validators(a), V::Validators(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Arc::ptr_eq(x, y))
            }
            (V::Actions(a), V::Actions(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            _ => false,
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Int(i64::from(value))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(value: Vec<String>) -> Self {
        ConfigValue::StrList(value)
    }
}

impl From<&[&str]> for ConfigValue {
    fn from(value: &[&str]) -> Self {
        ConfigValue::StrList(value.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ConfigValue {
    fn from(value: [&str; N]) -> Self {
        ConfigValue::StrList(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Borrowed lists are copied, never aliased.
impl From<&Vec<String>> for ConfigValue {
    fn from(value: &Vec<String>) -> Self {
        ConfigValue::StrList(value.clone())
    }
}

impl From<BTreeMap<String, String>> for ConfigValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        ConfigValue::StrDict(value)
    }
}

impl From<Dict> for ConfigValue {
    fn from(value: Dict) -> Self {
        ConfigValue::Dict(value)
    }
}

impl From<DateTime<Utc>> for ConfigValue {
    fn from(value: DateTime<Utc>) -> Self {
        ConfigValue::Datetime(value)
    }
}

impl From<Callable> for ConfigValue {
    fn from(value: Callable) -> Self {
        ConfigValue::Callable(value)
    }
}

impl From<Arc<dyn ModelReference>> for ConfigValue {
    fn from(value: Arc<dyn ModelReference>) -> Self {
        ConfigValue::Model(value)
    }
}

impl From<Arc<dyn Validator>> for ConfigValue {
    fn from(value: Arc<dyn Validator>) -> Self {
        ConfigValue::Validators(vec![value])
    }
}

impl From<Vec<Arc<dyn Validator>>> for ConfigValue {
    fn from(value: Vec<Arc<dyn Validator>>) -> Self {
        ConfigValue::Validators(value)
    }
}

impl<T: Into<ConfigValue>> From<Option<T>> for ConfigValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ConfigValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_numbers_keep_their_shape() {
        assert_eq!(ConfigValue::from_json(json!(1)), Some(ConfigValue::Int(1)));
        assert_eq!(ConfigValue::from_json(json!(1.5)), Some(ConfigValue::Float(1.5)));
        assert_eq!(ConfigValue::from_json(json!(true)), Some(ConfigValue::Bool(true)));
        assert_eq!(
            ConfigValue::from_json(json!("true")),
            Some(ConfigValue::Str("true".into()))
        );
    }

    #[test]
    fn json_arrays_map_to_typed_lists() {
        assert_eq!(
            ConfigValue::from_json(json!(["a", "b"])),
            Some(ConfigValue::from(["a", "b"]))
        );
        assert!(matches!(
            ConfigValue::from_json(json!([{"a": 1}])),
            Some(ConfigValue::DictList(items)) if items.len() == 1
        ));
        assert_eq!(ConfigValue::from_json(json!(["a", 1])), None);
        assert_eq!(
            ConfigValue::from_json(json!([])),
            Some(ConfigValue::StrList(vec![]))
        );
    }

    #[test]
    fn type_names_are_language_agnostic() {
        assert_eq!(ConfigValue::from(5).type_name(), "integer");
        assert_eq!(ConfigValue::from("x").type_name(), "string");
        assert_eq!(ConfigValue::from(["x"]).type_name(), "list of strings");
    }
}
