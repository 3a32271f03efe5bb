use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::configs::error::ConfigError;
use crate::configs::store::ConfigStore;
use crate::configs::types::ConfigType;
use crate::configs::value::ConfigValue;

/// Custom validation run during the second finalize pass.
pub type FieldCheck = Arc<dyn Fn(&ConfigStore, &ConfigValue) -> Result<(), String> + Send + Sync>;

/// One declared configuration slot of an owning type.
#[derive(Clone)]
pub struct ConfigField {
    name: &'static str,
    ty: ConfigType,
    required: bool,
    default: Option<ConfigValue>,
    depends_on: Option<&'static str>,
    check: Option<FieldCheck>,
}

impl fmt::Debug for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigField")
            .field("name", &self.name)
            .field("type", &self.ty.describe())
            .field("required", &self.required)
            .field("default", &self.default)
            .field("depends_on", &self.depends_on)
            .field("has_check", &self.check.is_some())
            .finish()
    }
}

impl ConfigField {
    pub fn new(name: &'static str, ty: ConfigType) -> Self {
        Self {
            name,
            ty,
            required: false,
            default: None,
            depends_on: None,
            check: None,
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, ConfigType::String { regex: None })
    }

    /// A string that must match `pattern` starting at its first character.
    pub fn string_matching(name: &'static str, pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            attribute: name,
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(name, ConfigType::String { regex: Some(regex) }))
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, ConfigType::Integer)
    }

    pub fn float(name: &'static str) -> Self {
        Self::new(name, ConfigType::Float)
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, ConfigType::Boolean)
    }

    pub fn string_list(name: &'static str) -> Self {
        Self::new(name, ConfigType::StringList)
    }

    pub fn select(name: &'static str, allowed: &[&str]) -> Self {
        Self::new(
            name,
            ConfigType::Select {
                allowed: allowed.iter().map(|s| s.to_string()).collect(),
            },
        )
    }

    pub fn select_list(name: &'static str, allowed: &[&str]) -> Self {
        Self::new(
            name,
            ConfigType::SelectList {
                allowed: allowed.iter().map(|s| s.to_string()).collect(),
            },
        )
    }

    pub fn model_class(name: &'static str) -> Self {
        Self::new(name, ConfigType::ModelClass)
    }

    /// A column of the model class held by the sibling config `model_config`.
    pub fn model_column(name: &'static str, model_config: &'static str) -> Self {
        Self::new(name, ConfigType::ModelColumn).depends_on(model_config)
    }

    pub fn model_columns(name: &'static str, model_config: &'static str) -> Self {
        Self::new(name, ConfigType::ModelColumns).depends_on(model_config)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, value: impl Into<ConfigValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn depends_on(mut self, sibling: &'static str) -> Self {
        self.depends_on = Some(sibling);
        self
    }

    pub fn check<F>(mut self, check: F) -> Self
    where
        F: Fn(&ConfigStore, &ConfigValue) -> Result<(), String> + Send + Sync + 'static,
    {
        self.check = Some(Arc::new(check));
        self
    }

    /// Restrict a dictionary config to keys a downstream function accepts.
    pub fn accepted_keys(self, keys: &'static [&'static str]) -> Self {
        self.check(move |_, value| {
            let present: Vec<String> = match value {
                ConfigValue::Dict(map) => map.keys().cloned().collect(),
                ConfigValue::StrDict(map) => map.keys().cloned().collect(),
                _ => return Ok(()),
            };
            let unknown: Vec<String> = present
                .into_iter()
                .filter(|k| !keys.contains(&k.as_str()))
                .collect();
            if unknown.is_empty() {
                Ok(())
            } else {
                Err(format!(
                    "unexpected keys '{}'. Accepted keys are: '{}'",
                    unknown.join("', '"),
                    keys.join("', '")
                ))
            }
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn config_type(&self) -> &ConfigType {
        &self.ty
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&ConfigValue> {
        self.default.as_ref()
    }

    pub fn depends_on_name(&self) -> Option<&'static str> {
        self.depends_on
    }

    pub(crate) fn custom_check(&self) -> Option<&FieldCheck> {
        self.check.as_ref()
    }
}
