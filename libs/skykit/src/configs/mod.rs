//! Declarative, typed configuration slots.
//!
//! A type declares its configs once in a [`ConfigSchema`] and keeps the per-instance
//! values in a [`ConfigStore`]. Instances are populated from constructor arguments and
//! then finalized; only finalized stores can be read.

mod error;
mod field;
mod model;
mod schema;
mod store;
mod types;
mod value;

pub use error::ConfigError;
pub use field::{ConfigField, FieldCheck};
pub use model::{ModelReference, ModelSchema};
pub use schema::ConfigSchema;
pub use store::ConfigStore;
pub use types::ConfigType;
pub use value::{ConfigValue, Dict};

/// Capability marker for types carrying declared configuration.
///
/// ```rust,ignore
/// static SCHEMA: LazyLock<ConfigSchema> = LazyLock::new(|| {
///     ConfigSchema::new("HasConfigs")
///         .field(ConfigField::string("name").required())
///         .field(ConfigField::integer("age").default(0))
/// });
/// ```
pub trait Configurable {
    fn schema() -> &'static ConfigSchema
    where
        Self: Sized;

    fn configs(&self) -> &ConfigStore;

    fn configs_mut(&mut self) -> &mut ConfigStore;

    /// Apply defaults, enforce required configs and run cross-field validation.
    fn finalize_and_validate_configuration(&mut self) -> Result<(), ConfigError> {
        self.configs_mut().finalize()
    }
}
