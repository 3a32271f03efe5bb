use std::fmt;
use std::sync::Arc;

use crate::configs::ConfigValue;
use crate::di::container::Container;
use crate::di::dependency::Dependency;
use crate::di::error::DiError;
use crate::di::resolved::Resolved;

type CallableFn = Arc<dyn Fn(&Resolved) -> Result<ConfigValue, DiError> + Send + Sync>;

/// A function value stored in a config and invoked through the container.
#[derive(Clone)]
pub struct Callable {
    name: String,
    deps: Vec<Dependency>,
    f: CallableFn,
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("deps", &self.deps.iter().map(Dependency::name).collect::<Vec<_>>())
            .finish()
    }
}

impl Callable {
    pub fn new<F>(name: impl Into<String>, deps: Vec<Dependency>, f: F) -> Self
    where
        F: Fn(&Resolved) -> Result<ConfigValue, DiError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            deps,
            f: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.deps
    }

    /// Identity: clones of one callable are the same callable.
    pub fn same_as(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }

    pub fn call(&self, container: &Container) -> Result<ConfigValue, DiError> {
        container.call_function(&self.name, &self.deps, |deps| (self.f)(deps))?
    }
}
