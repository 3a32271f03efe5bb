use thiserror::Error;

/// Structured errors for declaring, assigning and finalizing configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{owner}.{attribute}: attempt to set a value of type '{found}' to a parameter that requires {expected}")]
    TypeMismatch {
        owner: &'static str,
        attribute: String,
        found: String,
        expected: &'static str,
    },
    #[error("{owner}.{attribute}: {message}")]
    InvalidValue {
        owner: &'static str,
        attribute: String,
        message: String,
    },
    #[error("configuration '{attribute}' declares an invalid regexp '{pattern}': {reason}")]
    InvalidPattern {
        attribute: &'static str,
        pattern: String,
        reason: String,
    },
    #[error("Missing required configuration property '{attribute}' for class '{owner}'")]
    MissingRequired {
        owner: &'static str,
        attribute: String,
    },
    #[error("class '{owner}' has no configuration named '{attribute}'")]
    UnknownConfig {
        owner: &'static str,
        attribute: String,
    },
    #[error("attempt to read configuration '{owner}.{attribute}' before the configuration was finalized")]
    NotFinalized {
        owner: &'static str,
        attribute: String,
    },
    #[error("{owner}.{attribute}: depends on '{depends_on}' which is not a model class configuration of '{owner}'")]
    BadDependsOn {
        owner: &'static str,
        attribute: String,
        depends_on: &'static str,
    },
    #[error("{owner}.{attribute}: '{value}' is not a column in the model class '{model}'. Expected values are: '{}'", expected.join("', '"))]
    UnknownColumn {
        owner: &'static str,
        attribute: String,
        value: String,
        model: String,
        expected: Vec<String>,
    },
    #[error("class '{owner}' accepts {declared} positional configuration values but {given} were given")]
    TooManyArguments {
        owner: &'static str,
        declared: usize,
        given: usize,
    },
}
