use thiserror::Error;

use crate::configs::ConfigError;

#[derive(Debug, Error)]
pub enum DiError {
    #[error("cannot resolve dependency '{dependency}' for constructing '{consumer}': there is no binding, provider or registered class with that name")]
    Unresolvable { dependency: String, consumer: String },

    #[error("circular dependency detected: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("there was an attempt to read '{property}' but the injectable property hasn't been properly initialized; this usually means the owning object was created outside of the container")]
    NotBuiltViaContainer { property: String },

    #[error("injectable property '{property}' outlived the container that built its owner")]
    ContainerDropped { property: String },

    #[error("dependency '{dependency}' was resolved but is not of the expected type '{expected}'")]
    TypeMismatch {
        dependency: String,
        expected: &'static str,
    },

    #[error("provider for '{name}' failed: {message}")]
    Provider { name: String, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DiError {
    pub fn provider(name: impl Into<String>, message: impl std::fmt::Display) -> Self {
        DiError::Provider {
            name: name.into(),
            message: message.to_string(),
        }
    }
}
