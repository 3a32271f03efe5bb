use regex::Regex;

use crate::configs::value::{ConfigValue, Dict};

/// Semantic type of a declared configuration.
#[derive(Debug, Clone)]
pub enum ConfigType {
    String { regex: Option<Regex> },
    Integer,
    Float,
    Boolean,
    StringList,
    StringDict,
    AnyDict,
    ListAnyDict,
    Select { allowed: Vec<String> },
    SelectList { allowed: Vec<String> },
    Url,
    Datetime,
    ModelClass,
    /// A column name; cross-checked against the model class named by `depends_on`.
    ModelColumn,
    ModelColumns,
    StringOrCallable,
    IntegerOrCallable,
    FloatOrCallable,
    DatetimeOrCallable,
    StringListOrCallable,
    AnyDictOrCallable,
    Callable,
    Validators,
    Actions,
}

/// Why a value was rejected; the store adds owner and attribute.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Mismatch {
    Type { found: String },
    Invalid(String),
}

impl ConfigType {
    pub fn describe(&self) -> &'static str {
        match self {
            ConfigType::String { .. } => "a string",
            ConfigType::Integer => "an integer",
            ConfigType::Float => "a float",
            ConfigType::Boolean => "a boolean",
            ConfigType::StringList => "a list of strings",
            ConfigType::StringDict => "a dictionary of strings",
            ConfigType::AnyDict => "a dictionary",
            ConfigType::ListAnyDict => "a list of dictionaries",
            ConfigType::Select { .. } => "a string",
            ConfigType::SelectList { .. } => "a list of strings",
            ConfigType::Url => "a URL",
            ConfigType::Datetime => "a datetime",
            ConfigType::ModelClass => "a model class",
            ConfigType::ModelColumn => "a column name",
            ConfigType::ModelColumns => "a list of column names",
            ConfigType::StringOrCallable => "a string or a callable",
            ConfigType::IntegerOrCallable => "an integer or a callable",
            ConfigType::FloatOrCallable => "a float or a callable",
            ConfigType::DatetimeOrCallable => "a datetime or a callable",
            ConfigType::StringListOrCallable => "a list of strings or a callable",
            ConfigType::AnyDictOrCallable => "a dictionary or a callable",
            ConfigType::Callable => "a callable",
            ConfigType::Validators => "a validator or a list of validators",
            ConfigType::Actions => "an action or a list of actions",
        }
    }

    /// The scalar half of a callable-or-scalar union.
    pub fn scalar_part(&self) -> Option<ConfigType> {
        match self {
            ConfigType::StringOrCallable => Some(ConfigType::String { regex: None }),
            ConfigType::IntegerOrCallable => Some(ConfigType::Integer),
            ConfigType::FloatOrCallable => Some(ConfigType::Float),
            ConfigType::DatetimeOrCallable => Some(ConfigType::Datetime),
            ConfigType::StringListOrCallable => Some(ConfigType::StringList),
            ConfigType::AnyDictOrCallable => Some(ConfigType::AnyDict),
            _ => None,
        }
    }

    /// Shape-check a non-null value, returning the normalized value to store.
    pub(crate) fn check(&self, value: ConfigValue) -> Result<ConfigValue, Mismatch> {
        use ConfigValue as V;

        // unions: the scalar shape wins, the callable shape is the fallback
        if let Some(scalar) = self.scalar_part() {
            return match scalar.check(value.clone()) {
                Ok(checked) => Ok(checked),
                Err(err) => match value {
                    V::Callable(c) => Ok(V::Callable(c)),
                    _ => Err(err),
                },
            };
        }

        match (self, value) {
            (ConfigType::String { regex }, V::Str(s)) => {
                if let Some(re) = regex {
                    // anchored at the start, unanchored at the end
                    if !re.find(&s).is_some_and(|m| m.start() == 0) {
                        return Err(Mismatch::Invalid(format!(
                            "attempt to set a value of '{s}' but this does not match the required regexp: '{}'",
                            re.as_str()
                        )));
                    }
                }
                Ok(V::Str(s))
            }
            (ConfigType::Integer, v @ V::Int(_)) => Ok(v),
            (ConfigType::Float, v @ V::Float(_)) => Ok(v),
            (ConfigType::Boolean, v @ V::Bool(_)) => Ok(v),
            (ConfigType::StringList, v @ V::StrList(_)) => Ok(v),
            (ConfigType::StringDict, v @ V::StrDict(_)) => Ok(v),
            (ConfigType::StringDict, V::Dict(map)) => {
                let mut out = std::collections::BTreeMap::new();
                for (key, item) in map {
                    match item {
                        serde_json::Value::String(s) => {
                            out.insert(key, s);
                        }
                        other => {
                            return Err(Mismatch::Type {
                                found: format!(
                                    "dictionary with a non-string value for key '{key}' ({})",
                                    json_type_name(&other)
                                ),
                            })
                        }
                    }
                }
                Ok(V::StrDict(out))
            }
            (ConfigType::AnyDict, v @ V::Dict(_)) => Ok(v),
            (ConfigType::AnyDict, V::StrDict(map)) => Ok(V::Dict(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect::<Dict>(),
            )),
            (ConfigType::ListAnyDict, v @ V::DictList(_)) => Ok(v),
            (ConfigType::ListAnyDict, V::StrList(items)) if items.is_empty() => {
                Ok(V::DictList(Vec::new()))
            }
            (ConfigType::Select { allowed }, V::Str(s)) => {
                if allowed.iter().any(|a| a == &s) {
                    Ok(V::Str(s))
                } else {
                    Err(Mismatch::Invalid(format!(
                        "attempt to set a value of '{s}' which is not in the list of allowed values. It must be one of '{}'",
                        allowed.join("', '")
                    )))
                }
            }
            (ConfigType::SelectList { allowed }, V::StrList(items)) => {
                for (index, item) in items.iter().enumerate() {
                    if !allowed.iter().any(|a| a == item) {
                        return Err(Mismatch::Invalid(format!(
                            "attempt to set a value of '{item}' for item #{}. This is not in the list of allowed values. It must be one of '{}'",
                            index + 1,
                            allowed.join("', '")
                        )));
                    }
                }
                Ok(V::StrList(items))
            }
            (ConfigType::Url, V::Str(s)) => match url::Url::parse(&s) {
                Ok(_) => Ok(V::Str(s)),
                Err(e) => Err(Mismatch::Invalid(format!(
                    "attempt to set a value of '{s}' which is not a valid URL: {e}"
                ))),
            },
            (ConfigType::Datetime, v @ V::Datetime(_)) => Ok(v),
            (ConfigType::ModelClass, v @ V::Model(_)) => Ok(v),
            (ConfigType::ModelColumn, v @ V::Str(_)) => Ok(v),
            (ConfigType::ModelColumns, v @ V::StrList(_)) => Ok(v),
            (ConfigType::Callable, v @ V::Callable(_)) => Ok(v),
            (ConfigType::Validators, v @ V::Validators(_)) => Ok(v),
            (ConfigType::Actions, V::Callable(c)) => Ok(V::Actions(vec![c])),
            (ConfigType::Actions, v @ V::Actions(_)) => Ok(v),
            (_, other) => Err(Mismatch::Type {
                found: other.type_name().to_string(),
            }),
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "dictionary",
    }
}
