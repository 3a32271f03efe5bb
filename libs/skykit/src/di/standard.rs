use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, Utc};
use uuid::Uuid;

use crate::di::container::Resolver;
use crate::di::dependency::{Dependency, Instance};
use crate::di::environment::{Environment, Secrets};
use crate::di::error::DiError;
use crate::di::provider::Provider;

const NAMES: &[&str] = &["utcnow", "now", "uuid", "environment", "input_output", "timezone"];

/// Built-in names every container can resolve unless the host supplies its own.
///
/// | name | type |
/// |---|---|
/// | `utcnow` | `chrono::DateTime<Utc>` |
/// | `now` | `chrono::DateTime<Local>` |
/// | `uuid` | [`UuidGenerator`] |
/// | `environment` | [`Environment`] (uses optional `secrets` and `env_file_path` bindings) |
/// | `timezone` | `chrono::Utc` |
/// | `input_output` | always fails: the host must bind it |
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDependencies;

/// Source of fresh identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl UuidGenerator {
    pub fn v4(&self) -> Uuid {
        Uuid::new_v4()
    }

    /// Time-ordered, for identifiers that end up in indexes.
    pub fn v7(&self) -> Uuid {
        Uuid::now_v7()
    }
}

impl Provider for StandardDependencies {
    fn label(&self) -> &str {
        "standard"
    }

    fn can_build(&self, name: &str) -> bool {
        NAMES.contains(&name)
    }

    fn build(&self, name: &str, resolver: &mut Resolver<'_>) -> Result<Instance, DiError> {
        match name {
            "utcnow" => Ok(Arc::new(Utc::now())),
            "now" => Ok(Arc::new(Local::now())),
            "uuid" => Ok(Arc::new(UuidGenerator)),
            "timezone" => Ok(Arc::new(Utc)),
            "environment" => {
                let secrets = resolver
                    .resolve(&Dependency::named("secrets").optional(), "environment")?
                    .and_then(|s| s.downcast::<Secrets>().ok())
                    .map(|s| (*s).clone());
                let env_file = resolver
                    .resolve(&Dependency::named("env_file_path").optional(), "environment")?
                    .and_then(|p| p.downcast::<String>().ok())
                    .map(|p| PathBuf::from(p.as_str()))
                    .or_else(|| std::env::current_dir().ok().map(|dir| dir.join(".env")));
                Ok(Arc::new(Environment::from_process(env_file, secrets)))
            }
            "input_output" => Err(DiError::provider(
                name,
                "an input/output handle was requested but none has been configured; the host must bind 'input_output'",
            )),
            other => Err(DiError::provider(other, "not a standard dependency")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::Container;

    #[test]
    fn standard_names_resolve() {
        let container = Container::builder().without_auto_providers().build();

        let generator = container.build_typed::<UuidGenerator>("uuid", true).unwrap();
        assert_ne!(generator.v4(), generator.v4());

        let first = container.build_typed::<chrono::DateTime<Utc>>("utcnow", true).unwrap();
        let second = container.build_typed::<chrono::DateTime<Utc>>("utcnow", true).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(container.build_typed::<Utc>("timezone", true).is_ok());
    }

    #[test]
    fn input_output_must_be_bound_by_the_host() {
        let container = Container::builder().without_auto_providers().build();
        let err = container.build_from_name("input_output", true).unwrap_err();
        assert!(err.to_string().contains("input_output"));

        container.bind("input_output", "stdio".to_string());
        let bound = container.build_typed::<String>("input_output", true).unwrap();
        assert_eq!(bound.as_str(), "stdio");
    }

    #[test]
    fn environment_uses_the_bound_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "SKYKIT_TEST_ONLY_IN_FILE=yes\n").unwrap();

        let container = Container::builder()
            .without_auto_providers()
            .bind("env_file_path", path.to_string_lossy().to_string())
            .build();
        let env = container.build_typed::<Environment>("environment", true).unwrap();
        assert_eq!(env.get("SKYKIT_TEST_ONLY_IN_FILE").unwrap(), "yes");
    }
}
