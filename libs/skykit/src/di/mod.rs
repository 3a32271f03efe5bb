//! Dependency injection: a container that resolves dependencies by type or by name,
//! builds object graphs from declared manifests and caches what it built for the
//! lifetime of one execution context.

mod callable;
mod container;
mod dependency;
mod environment;
mod error;
mod inject;
mod provider;
mod resolved;
mod standard;
mod validate;

pub use callable::Callable;
pub use container::{
    json_instance, Container, ContainerBuilder, Override, Resolver, TypeOverride, CONTAINER_NAME,
};
pub use dependency::{ClassEntry, Dependency, DependencyKind, Injectable, Instance};
pub use environment::{Environment, EnvironmentError, SecretStore, Secrets, SECRET_PREFIX};
pub use error::DiError;
pub use inject::{Inject, InjectableProperties};
pub use provider::{AutoProvider, Provider, Providers};
pub use resolved::Resolved;
pub use standard::{StandardDependencies, UuidGenerator};

/// `my_crate::models::User<T>` -> `User`.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
