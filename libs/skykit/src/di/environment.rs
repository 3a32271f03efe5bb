use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use thiserror::Error;

/// Prefix marking an environment value as a reference into the secret store.
pub const SECRET_PREFIX: &str = "secret://";

/// Backend for `secret://` references.
pub trait SecretStore: Send + Sync {
    fn get(&self, path: &str) -> Result<String, String>;
}

/// Shareable handle to a [`SecretStore`], as bound under the name `secrets`.
#[derive(Clone)]
pub struct Secrets(pub Arc<dyn SecretStore>);

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secrets(..)")
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnvironmentError {
    #[error("could not find environment config '{0}' in environment or .env file")]
    Missing(String),
    #[error("parse error in environment file '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("references to the secret engine were found in the environment ('{0}'), but a secret engine was not provided")]
    NoSecretStore(String),
    #[error("failed to fetch secret '{path}': {message}")]
    Secret { path: String, message: String },
}

/// Application settings from the process environment and an optional `.env` file.
///
/// Process variables win over the file. Values of the form `secret://path` are
/// fetched once from the secret store and remembered.
pub struct Environment {
    env_file: Option<PathBuf>,
    process: HashMap<String, String>,
    file_values: OnceLock<Result<HashMap<String, String>, EnvironmentError>>,
    secrets: Option<Secrets>,
    resolved: Mutex<HashMap<String, String>>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("env_file", &self.env_file)
            .field("process_vars", &self.process.len())
            .field("has_secrets", &self.secrets.is_some())
            .finish()
    }
}

impl Environment {
    pub fn new(
        env_file: Option<PathBuf>,
        process: HashMap<String, String>,
        secrets: Option<Secrets>,
    ) -> Self {
        Self {
            env_file,
            process,
            file_values: OnceLock::new(),
            secrets,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot of the current process environment.
    pub fn from_process(env_file: Option<PathBuf>, secrets: Option<Secrets>) -> Self {
        Self::new(env_file, std::env::vars().collect(), secrets)
    }

    pub fn env_file(&self) -> Option<&Path> {
        self.env_file.as_deref()
    }

    pub fn get(&self, name: &str) -> Result<String, EnvironmentError> {
        if let Some(value) = self.process.get(name) {
            return self.resolve_value(value);
        }
        let file = self.file_values.get_or_init(|| load_env_file(self.env_file.as_deref()));
        match file {
            Ok(values) => match values.get(name) {
                Some(value) => self.resolve_value(value),
                None => Err(EnvironmentError::Missing(name.to_string())),
            },
            Err(err) => Err(err.clone()),
        }
    }

    /// Like [`get`](Self::get), with a missing name reported as `None`.
    pub fn get_optional(&self, name: &str) -> Result<Option<String>, EnvironmentError> {
        match self.get(name) {
            Ok(value) => Ok(Some(value)),
            Err(EnvironmentError::Missing(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn resolve_value(&self, value: &str) -> Result<String, EnvironmentError> {
        let Some(path) = value.strip_prefix(SECRET_PREFIX) else {
            return Ok(value.to_string());
        };
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        if let Some(hit) = self.resolved.lock().get(&path) {
            return Ok(hit.clone());
        }
        let secrets = self
            .secrets
            .as_ref()
            .ok_or_else(|| EnvironmentError::NoSecretStore(value.to_string()))?;
        let secret = secrets.0.get(&path).map_err(|message| EnvironmentError::Secret {
            path: path.clone(),
            message,
        })?;
        self.resolved.lock().insert(path, secret.clone());
        Ok(secret)
    }
}

fn load_env_file(path: Option<&Path>) -> Result<HashMap<String, String>, EnvironmentError> {
    let Some(path) = path else {
        return Ok(HashMap::new());
    };
    let parse_error = |e: dotenvy::Error| EnvironmentError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => return Err(parse_error(e)),
    };
    let mut values = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(parse_error)?;
        values.insert(key, value);
    }
    Ok(values)
}
