//! Column validators: small configurable objects checking one column of a write.

use std::sync::LazyLock;

use serde_json::Value;

use crate::configs::{ConfigError, ConfigField, ConfigSchema, ConfigStore, Configurable, Dict};

pub trait Validator: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this validator makes the column mandatory.
    fn is_required(&self) -> bool {
        false
    }

    /// `existing` is the stored record on update and `None` on create.
    /// Returns the error message, or `None` when the input passes.
    fn check(&self, existing: Option<&Dict>, column: &str, input: &Dict) -> Option<String>;
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// The column must end up with a value.
///
/// On update a column absent from the input keeps the stored value, so it passes
/// when the stored value is present. An input value that is explicitly empty (or
/// whitespace only) never passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Required;

impl Validator for Required {
    fn name(&self) -> &str {
        "Required"
    }

    fn is_required(&self) -> bool {
        true
    }

    fn check(&self, existing: Option<&Dict>, column: &str, input: &Dict) -> Option<String> {
        let provided = input.get(column);
        let has_value = match provided {
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(other) => truthy(other),
            None => false,
        };
        if has_value {
            return None;
        }
        let stored = existing.and_then(|record| record.get(column)).is_some_and(truthy);
        if provided.is_none() && stored {
            return None;
        }
        Some(format!("'{column}' is required."))
    }
}

static MAXIMUM_LENGTH_SCHEMA: LazyLock<ConfigSchema> = LazyLock::new(|| {
    ConfigSchema::new("MaximumLength").field(ConfigField::integer("maximum_length").required())
});

static MINIMUM_LENGTH_SCHEMA: LazyLock<ConfigSchema> = LazyLock::new(|| {
    ConfigSchema::new("MinimumLength").field(ConfigField::integer("minimum_length").required())
});

/// Strings (in characters) and lists may not be longer than the limit.
/// Missing or empty input is left to [`Required`].
#[derive(Debug, Clone)]
pub struct MaximumLength {
    configs: ConfigStore,
    maximum_length: i64,
}

impl MaximumLength {
    pub fn new(maximum_length: i64) -> Result<Self, ConfigError> {
        let mut configs = ConfigStore::new(Self::schema());
        configs.assign("maximum_length", maximum_length)?;
        Self::from_store(configs)
    }

    /// Build from config-file keyword arguments.
    pub fn from_json(args: &Dict) -> Result<Self, ConfigError> {
        let mut configs = ConfigStore::new(Self::schema());
        configs.assign_json_map(args)?;
        Self::from_store(configs)
    }

    fn from_store(mut configs: ConfigStore) -> Result<Self, ConfigError> {
        configs.finalize()?;
        let maximum_length = configs.required_integer("maximum_length")?;
        Ok(Self {
            configs,
            maximum_length,
        })
    }

    pub fn maximum_length(&self) -> i64 {
        self.maximum_length
    }
}

impl Configurable for MaximumLength {
    fn schema() -> &'static ConfigSchema {
        &MAXIMUM_LENGTH_SCHEMA
    }

    fn configs(&self) -> &ConfigStore {
        &self.configs
    }

    fn configs_mut(&mut self) -> &mut ConfigStore {
        &mut self.configs
    }
}

impl Validator for MaximumLength {
    fn name(&self) -> &str {
        "MaximumLength"
    }

    fn check(&self, _existing: Option<&Dict>, column: &str, input: &Dict) -> Option<String> {
        let value = input.get(column).filter(|v| truthy(v))?;
        let len = length(value)?;
        if i64::try_from(len).unwrap_or(i64::MAX) <= self.maximum_length {
            return None;
        }
        Some(format!(
            "'{column}' must be at most {} characters long.",
            self.maximum_length
        ))
    }
}

#[derive(Debug, Clone)]
pub struct MinimumLength {
    configs: ConfigStore,
    minimum_length: i64,
}

impl MinimumLength {
    pub fn new(minimum_length: i64) -> Result<Self, ConfigError> {
        let mut configs = ConfigStore::new(Self::schema());
        configs.assign("minimum_length", minimum_length)?;
        Self::from_store(configs)
    }

    pub fn from_json(args: &Dict) -> Result<Self, ConfigError> {
        let mut configs = ConfigStore::new(Self::schema());
        configs.assign_json_map(args)?;
        Self::from_store(configs)
    }

    fn from_store(mut configs: ConfigStore) -> Result<Self, ConfigError> {
        configs.finalize()?;
        let minimum_length = configs.required_integer("minimum_length")?;
        Ok(Self {
            configs,
            minimum_length,
        })
    }

    pub fn minimum_length(&self) -> i64 {
        self.minimum_length
    }
}

impl Configurable for MinimumLength {
    fn schema() -> &'static ConfigSchema {
        &MINIMUM_LENGTH_SCHEMA
    }

    fn configs(&self) -> &ConfigStore {
        &self.configs
    }

    fn configs_mut(&mut self) -> &mut ConfigStore {
        &mut self.configs
    }
}

impl Validator for MinimumLength {
    fn name(&self) -> &str {
        "MinimumLength"
    }

    fn check(&self, _existing: Option<&Dict>, column: &str, input: &Dict) -> Option<String> {
        let value = input.get(column).filter(|v| truthy(v))?;
        let len = length(value)?;
        if i64::try_from(len).unwrap_or(i64::MAX) >= self.minimum_length {
            return None;
        }
        Some(format!(
            "'{column}' must be at least {} characters long.",
            self.minimum_length
        ))
    }
}
