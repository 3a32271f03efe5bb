//! # Skykit - Declarative Configuration and Dependency Injection
//!
//! The two building blocks every declarative class in an application sits on.
//!
//! ## Features
//!
//! - **Configs**: typed, named configuration slots declared once per type
//!   ([`ConfigSchema`]) and stored per instance ([`ConfigStore`]), populated from
//!   constructor arguments and frozen by an explicit finalize pass
//! - **Container**: resolves dependencies by type or by name, builds object graphs
//!   from declared manifests, caches built instances per container lifetime
//! - **Providers**: "can you build X" objects consulted before plain construction,
//!   including auto-imported providers collected via `inventory`
//! - **Injectable properties**: lazily resolved attributes bound to the container
//!   that built their owner
//!
//! ## Example
//!
//! ```rust,ignore
//! use skykit::{Container, Dependency, Injectable, Resolved, DiError};
//!
//! struct Clock;
//! impl Injectable for Clock {
//!     const NAME: &'static str = "clock";
//!     fn construct(_deps: &Resolved) -> Result<Self, DiError> {
//!         Ok(Clock)
//!     }
//! }
//!
//! struct Report {
//!     clock: std::sync::Arc<Clock>,
//!     title: String,
//! }
//! impl Injectable for Report {
//!     const NAME: &'static str = "report";
//!     fn dependencies() -> Vec<Dependency> {
//!         vec![Dependency::of::<Clock>("clock"), Dependency::named("title")]
//!     }
//!     fn construct(deps: &Resolved) -> Result<Self, DiError> {
//!         Ok(Report {
//!             clock: deps.get("clock")?,
//!             title: deps.value("title")?,
//!         })
//!     }
//! }
//!
//! let container = Container::builder().bind("title", "Daily".to_string()).build();
//! let report = container.build_class::<Report>(true)?;
//! ```

pub use anyhow::Result;

// Re-export inventory for auto-imported providers
pub use inventory;

pub mod configs;
pub mod di;
pub mod validators;

pub use configs::{
    ConfigError, ConfigField, ConfigSchema, ConfigStore, ConfigType, ConfigValue, Configurable,
    Dict, ModelReference, ModelSchema,
};
pub use di::{
    AutoProvider, Callable, ClassEntry, Container, ContainerBuilder, Dependency, DependencyKind,
    DiError, Environment, EnvironmentError, Inject, Injectable, InjectableProperties, Instance,
    Override, Provider, Providers, Resolved, Resolver, SecretStore, Secrets,
    StandardDependencies, TypeOverride, UuidGenerator,
};
pub use validators::{MaximumLength, MinimumLength, Required, Validator};
