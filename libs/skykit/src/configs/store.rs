use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::configs::error::ConfigError;
use crate::configs::field::ConfigField;
use crate::configs::model::ModelReference;
use crate::configs::schema::ConfigSchema;
use crate::configs::types::{ConfigType, Mismatch};
use crate::configs::value::{ConfigValue, Dict};
use crate::di::{Callable, Container, DiError};
use crate::validators::Validator;

static NULL: ConfigValue = ConfigValue::Null;

/// Per-instance configuration values, keyed by declared name.
///
/// Lifecycle: `assign*` while constructing, then [`finalize`](Self::finalize) exactly
/// like a constructor epilogue, then `read*`. Reads before finalize fail.
#[derive(Clone)]
pub struct ConfigStore {
    schema: &'static ConfigSchema,
    values: HashMap<&'static str, ConfigValue>,
    finalized: bool,
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("owner", &self.schema.owner())
            .field("values", &self.values)
            .field("finalized", &self.finalized)
            .finish()
    }
}

impl ConfigStore {
    pub fn new(schema: &'static ConfigSchema) -> Self {
        Self {
            schema,
            values: HashMap::new(),
            finalized: false,
        }
    }

    pub fn schema(&self) -> &'static ConfigSchema {
        self.schema
    }

    pub fn owner(&self) -> &'static str {
        self.schema.owner()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Whether a value was assigned (or defaulted) for `name`.
    pub fn is_set(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(|v| !v.is_null())
    }

    fn field(&self, name: &str) -> Result<&'static ConfigField, ConfigError> {
        let schema: &'static ConfigSchema = self.schema;
        schema.get(name).ok_or_else(|| ConfigError::UnknownConfig {
            owner: schema.owner(),
            attribute: name.to_string(),
        })
    }

    fn reject(&self, field: &ConfigField, mismatch: Mismatch) -> ConfigError {
        match mismatch {
            Mismatch::Type { found } => ConfigError::TypeMismatch {
                owner: self.owner(),
                attribute: field.name().to_string(),
                found,
                expected: field.config_type().describe(),
            },
            Mismatch::Invalid(message) => ConfigError::InvalidValue {
                owner: self.owner(),
                attribute: field.name().to_string(),
                message,
            },
        }
    }

    /// Type-check and store a value. A null value leaves the slot unset.
    pub fn assign(&mut self, name: &str, value: impl Into<ConfigValue>) -> Result<(), ConfigError> {
        let field = self.field(name)?;
        let value = value.into();
        if value.is_null() {
            return Ok(());
        }
        let checked = field
            .config_type()
            .check(value)
            .map_err(|m| self.reject(field, m))?;
        self.values.insert(field.name(), checked);
        Ok(())
    }

    /// Assign a value read from a config file.
    pub fn assign_json(&mut self, name: &str, value: Value) -> Result<(), ConfigError> {
        let field = self.field(name)?;
        match ConfigValue::from_json(value) {
            Some(converted) => self.assign(name, converted),
            None => Err(self.reject(
                field,
                Mismatch::Type {
                    found: "list of mixed values".to_string(),
                },
            )),
        }
    }

    /// Keyword-style population.
    pub fn assign_all<I, K, V>(&mut self, args: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ConfigValue>,
    {
        for (name, value) in args {
            self.assign(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Populate from a JSON object, e.g. a component section of the app config.
    pub fn assign_json_map(&mut self, args: &Map<String, Value>) -> Result<(), ConfigError> {
        for (name, value) in args {
            self.assign_json(name, value.clone())?;
        }
        Ok(())
    }

    /// Positional population, matched against declaration order.
    pub fn assign_positional<I>(&mut self, values: I) -> Result<(), ConfigError>
    where
        I: IntoIterator,
        I::Item: Into<ConfigValue>,
    {
        let values: Vec<ConfigValue> = values.into_iter().map(Into::into).collect();
        let declared = self.schema.fields().len();
        if values.len() > declared {
            return Err(ConfigError::TooManyArguments {
                owner: self.owner(),
                declared,
                given: values.len(),
            });
        }
        let schema: &'static ConfigSchema = self.schema;
        for (field, value) in schema.fields().iter().zip(values) {
            self.assign(field.name(), value)?;
        }
        Ok(())
    }

    /// Apply defaults, enforce required configs, then run cross-field and custom
    /// validation. Both passes cover every declared config: validation in the
    /// second pass may look at siblings' defaults.
    pub fn finalize(&mut self) -> Result<(), ConfigError> {
        let schema: &'static ConfigSchema = self.schema;

        for field in schema.fields() {
            let current = self.values.remove(field.name()).unwrap_or_default();
            let value = match (current, field.default_value()) {
                (ConfigValue::Null, Some(default)) => field
                    .config_type()
                    .check(default.clone())
                    .map_err(|m| self.reject(field, m))?,
                (current, _) => current,
            };
            if field.is_required() && value.is_null() {
                return Err(ConfigError::MissingRequired {
                    owner: schema.owner(),
                    attribute: field.name().to_string(),
                });
            }
            self.values.insert(field.name(), value);
        }

        for field in schema.fields() {
            self.check_depends_on(field)?;
            if let Some(check) = field.custom_check() {
                let value = match self.values.get(field.name()) {
                    Some(value) if !value.is_null() => value,
                    _ => continue,
                };
                check(self, value).map_err(|message| ConfigError::InvalidValue {
                    owner: schema.owner(),
                    attribute: field.name().to_string(),
                    message,
                })?;
            }
        }

        self.finalized = true;
        Ok(())
    }

    fn check_depends_on(&self, field: &ConfigField) -> Result<(), ConfigError> {
        let Some(sibling) = field.depends_on_name() else {
            return Ok(());
        };
        let bad_reference = || ConfigError::BadDependsOn {
            owner: self.owner(),
            attribute: field.name().to_string(),
            depends_on: sibling,
        };
        let sibling_field = self.schema.get(sibling).ok_or_else(bad_reference)?;
        if !matches!(sibling_field.config_type(), ConfigType::ModelClass) {
            return Err(bad_reference());
        }

        // no model yet: some owners supply it later and validate then
        let model = match self.values.get(sibling) {
            Some(ConfigValue::Model(model)) => model.clone(),
            _ => return Ok(()),
        };

        let candidates: Vec<&String> = match self.values.get(field.name()) {
            Some(ConfigValue::Str(column)) => vec![column],
            Some(ConfigValue::StrList(columns)) => columns.iter().collect(),
            _ => Vec::new(),
        };
        let columns = model.columns();
        for candidate in candidates {
            if candidate.is_empty() || columns.contains(candidate) {
                continue;
            }
            return Err(ConfigError::UnknownColumn {
                owner: self.owner(),
                attribute: field.name().to_string(),
                value: candidate.clone(),
                model: model.name().to_string(),
                expected: columns,
            });
        }
        Ok(())
    }

    /// The stored value. Unset optional configs read as [`ConfigValue::Null`].
    pub fn read(&self, name: &str) -> Result<&ConfigValue, ConfigError> {
        let field = self.field(name)?;
        if !self.finalized {
            return Err(ConfigError::NotFinalized {
                owner: self.owner(),
                attribute: field.name().to_string(),
            });
        }
        Ok(self.values.get(name).unwrap_or(&NULL))
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        expected: &'static str,
        pick: impl FnOnce(&'a ConfigValue) -> Option<T>,
    ) -> Result<Option<T>, ConfigError> {
        let value = self.read(name)?;
        if value.is_null() {
            return Ok(None);
        }
        pick(value).map(Some).ok_or_else(|| ConfigError::TypeMismatch {
            owner: self.owner(),
            attribute: name.to_string(),
            found: value.type_name().to_string(),
            expected,
        })
    }

    pub fn string(&self, name: &str) -> Result<Option<&str>, ConfigError> {
        self.typed(name, "a string", |v| match v {
            ConfigValue::Str(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn integer(&self, name: &str) -> Result<Option<i64>, ConfigError> {
        self.typed(name, "an integer", |v| match v {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        })
    }

    pub fn float(&self, name: &str) -> Result<Option<f64>, ConfigError> {
        self.typed(name, "a float", |v| match v {
            ConfigValue::Float(f) => Some(*f),
            _ => None,
        })
    }

    pub fn boolean(&self, name: &str) -> Result<Option<bool>, ConfigError> {
        self.typed(name, "a boolean", |v| match v {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        })
    }

    pub fn string_list(&self, name: &str) -> Result<Option<&[String]>, ConfigError> {
        self.typed(name, "a list of strings", |v| match v {
            ConfigValue::StrList(items) => Some(items.as_slice()),
            _ => None,
        })
    }

    pub fn dict(&self, name: &str) -> Result<Option<&Dict>, ConfigError> {
        self.typed(name, "a dictionary", |v| match v {
            ConfigValue::Dict(map) => Some(map),
            _ => None,
        })
    }

    pub fn datetime(&self, name: &str) -> Result<Option<DateTime<Utc>>, ConfigError> {
        self.typed(name, "a datetime", |v| match v {
            ConfigValue::Datetime(dt) => Some(*dt),
            _ => None,
        })
    }

    pub fn model(&self, name: &str) -> Result<Option<Arc<dyn ModelReference>>, ConfigError> {
        self.typed(name, "a model class", |v| match v {
            ConfigValue::Model(m) => Some(m.clone()),
            _ => None,
        })
    }

    pub fn validators(&self, name: &str) -> Result<&[Arc<dyn Validator>], ConfigError> {
        Ok(self
            .typed(name, "a list of validators", |v| match v {
                ConfigValue::Validators(list) => Some(list.as_slice()),
                _ => None,
            })?
            .unwrap_or(&[]))
    }

    pub fn actions(&self, name: &str) -> Result<&[Callable], ConfigError> {
        Ok(self
            .typed(name, "a list of actions", |v| match v {
                ConfigValue::Actions(list) => Some(list.as_slice()),
                _ => None,
            })?
            .unwrap_or(&[]))
    }

    pub fn required_string(&self, name: &str) -> Result<&str, ConfigError> {
        self.string(name)?.ok_or_else(|| self.missing(name))
    }

    pub fn required_integer(&self, name: &str) -> Result<i64, ConfigError> {
        self.integer(name)?.ok_or_else(|| self.missing(name))
    }

    fn missing(&self, name: &str) -> ConfigError {
        ConfigError::MissingRequired {
            owner: self.owner(),
            attribute: name.to_string(),
        }
    }

    /// In-place mutation for framework internals (e.g. appending a validator).
    /// The value may change, its type may not, and the new value must pass the
    /// same checks as an assignment. A rejected edit is rolled back.
    pub fn update<F>(&mut self, name: &str, f: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut ConfigValue),
    {
        let field = self.field(name)?;
        let slot = self.values.entry(field.name()).or_default();
        let before = slot.clone();
        f(slot);
        let candidate = std::mem::take(slot);
        if candidate.is_null() {
            return Ok(());
        }
        let checked = if !before.is_null()
            && std::mem::discriminant(&before) != std::mem::discriminant(&candidate)
        {
            Err(Mismatch::Type {
                found: candidate.type_name().to_string(),
            })
        } else {
            field.config_type().check(candidate)
        };
        match checked {
            Ok(value) => {
                self.values.insert(field.name(), value);
                Ok(())
            }
            Err(m) => {
                self.values.insert(field.name(), before);
                Err(self.reject(field, m))
            }
        }
    }

    /// Append a validator to a `Validators` config.
    pub fn push_validator(
        &mut self,
        name: &str,
        validator: Arc<dyn Validator>,
    ) -> Result<(), ConfigError> {
        self.update(name, |value| match value {
            ConfigValue::Validators(list) => list.push(validator),
            other => *other = ConfigValue::Validators(vec![validator]),
        })
    }

    /// Read a value, invoking it through the container when a callable was stored
    /// in a callable-or-scalar config. The produced value must match the scalar shape.
    pub fn resolve(&self, name: &str, container: &Container) -> Result<ConfigValue, DiError> {
        let field = self.field(name)?;
        match self.read(name)? {
            ConfigValue::Callable(callable) => {
                let produced = callable.call(container)?;
                match field.config_type().scalar_part() {
                    Some(scalar) => scalar
                        .check(produced)
                        .map_err(|m| DiError::from(self.reject(field, m))),
                    None => Ok(produced),
                }
            }
            other => Ok(other.clone()),
        }
    }

    /// JSON snapshot of the finalized plain-data values.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.schema
            .names()
            .filter_map(|name| {
                let value = self.values.get(name)?;
                value.to_json().map(|json| (name.to_string(), json))
            })
            .collect()
    }
}
