use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::di::container::Resolver;
use crate::di::dependency::{Dependency, Instance};
use crate::di::error::DiError;
use crate::di::resolved::Resolved;

/// An object able to answer "can you build X" and, if so, build it.
///
/// Providers are consulted after overrides and bindings, before registered class
/// names. Among explicitly registered providers the most recent one wins.
pub trait Provider: Send + Sync {
    fn label(&self) -> &str {
        "provider"
    }

    fn can_build(&self, name: &str) -> bool;

    fn build(&self, name: &str, resolver: &mut Resolver<'_>) -> Result<Instance, DiError>;

    fn can_cache(&self, _name: &str) -> bool {
        true
    }
}

/// Provider registration collected at link time. Auto-imported providers rank
/// below every explicitly registered provider.
pub struct AutoProvider(pub fn() -> Arc<dyn Provider>);

inventory::collect!(AutoProvider);

type ProvideFn = Arc<dyn Fn(&Resolved) -> Result<Instance, DiError> + Send + Sync>;

#[derive(Clone)]
struct Entry {
    deps: Vec<Dependency>,
    provide: ProvideFn,
    cache: bool,
}

/// A table of named provide functions, each with its own dependency manifest.
///
/// ```rust,ignore
/// let doubled = Providers::new("math").provide("doubled", vec![Dependency::named("some_value")], |deps| {
///     Ok(deps.value::<i64>("some_value")? * 2)
/// });
/// ```
#[derive(Clone)]
pub struct Providers {
    label: String,
    entries: HashMap<String, Entry>,
}

impl fmt::Debug for Providers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("Providers")
            .field("label", &self.label)
            .field("provides", &names)
            .finish()
    }
}

impl Providers {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: HashMap::new(),
        }
    }

    pub fn provide<T, F>(self, name: impl Into<String>, deps: Vec<Dependency>, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Resolved) -> Result<T, DiError> + Send + Sync + 'static,
    {
        self.insert(name.into(), deps, f, true)
    }

    /// Like [`provide`](Self::provide) but the container never caches the result.
    pub fn provide_uncached<T, F>(self, name: impl Into<String>, deps: Vec<Dependency>, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Resolved) -> Result<T, DiError> + Send + Sync + 'static,
    {
        self.insert(name.into(), deps, f, false)
    }

    fn insert<T, F>(mut self, name: String, deps: Vec<Dependency>, f: F, cache: bool) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Resolved) -> Result<T, DiError> + Send + Sync + 'static,
    {
        let provide: ProvideFn = Arc::new(move |deps: &Resolved| -> Result<Instance, DiError> {
            Ok(Arc::new(f(deps)?))
        });
        self.entries.insert(
            name,
            Entry {
                deps,
                provide,
                cache,
            },
        );
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn shared(self) -> Arc<dyn Provider> {
        Arc::new(self)
    }
}

impl Provider for Providers {
    fn label(&self) -> &str {
        &self.label
    }

    fn can_build(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn build(&self, name: &str, resolver: &mut Resolver<'_>) -> Result<Instance, DiError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| DiError::provider(name, format!("'{}' cannot build it", self.label)))?;
        let consumer = format!("{}.provide_{name}", self.label);
        let resolved = resolver.resolve_all(&consumer, &entry.deps)?;
        (entry.provide)(&resolved)
    }

    fn can_cache(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(|e| e.cache)
    }
}
