use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock, Weak};

use crate::di::container::{Container, ContainerInner, Resolver};
use crate::di::dependency::{ClassEntry, Injectable};
use crate::di::error::DiError;

/// Implemented by types carrying [`Inject`] fields, directly or through nested members.
///
/// ```rust,ignore
/// impl InjectableProperties for Report {
///     fn inject_properties(&self, container: &Container) {
///         self.clock.attach(container);
///         self.formatter.inject_properties(container);
///     }
/// }
/// ```
pub trait InjectableProperties {
    fn inject_properties(&self, container: &Container);
}

#[derive(Clone, Debug)]
enum Target {
    ByClass(ClassEntry),
    ByName(String),
}

/// A lazily resolved attribute bound to the container that built its owner.
///
/// The container is held weakly: an owner that outlives its container gets
/// [`DiError::ContainerDropped`] instead of keeping the whole graph alive.
pub struct Inject<T> {
    target: Target,
    cache: bool,
    container: OnceLock<Weak<ContainerInner>>,
    value: OnceLock<Arc<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("target", &self.target)
            .field("cache", &self.cache)
            .field("attached", &self.container.get().is_some())
            .field("resolved", &self.value.get().is_some())
            .finish()
    }
}

impl<T: Injectable> Inject<T> {
    pub fn by_class() -> Self {
        Self::new(Target::ByClass(ClassEntry::of::<T>()))
    }
}

impl<T: Any + Send + Sync> Inject<T> {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self::new(Target::ByName(name.into()))
    }

    fn new(target: Target) -> Self {
        Self {
            target,
            cache: true,
            container: OnceLock::new(),
            value: OnceLock::new(),
            _marker: PhantomData,
        }
    }

    /// Resolve fresh on every read, bypassing both the property and the container cache.
    pub fn uncached(mut self) -> Self {
        self.cache = false;
        self
    }

    /// Associate with a container. The first association wins.
    pub fn attach(&self, container: &Container) {
        let _ = self.container.set(Arc::downgrade(&container.inner));
    }

    pub fn is_attached(&self) -> bool {
        self.container.get().is_some()
    }

    fn label(&self) -> String {
        match &self.target {
            Target::ByClass(entry) => entry.type_name().to_string(),
            Target::ByName(name) => name.clone(),
        }
    }

    pub fn get(&self) -> Result<Arc<T>, DiError> {
        if let Some(value) = self.value.get() {
            return Ok(value.clone());
        }

        let weak = self
            .container
            .get()
            .ok_or_else(|| DiError::NotBuiltViaContainer {
                property: format!("Inject<{}>", self.label()),
            })?;
        let inner = weak.upgrade().ok_or_else(|| DiError::ContainerDropped {
            property: self.label(),
        })?;
        let container = Container { inner };

        let value = match &self.target {
            Target::ByClass(entry) => {
                let instance = Resolver::new(&container).build_entry(entry, self.cache)?;
                instance
                    .downcast::<T>()
                    .map_err(|_| DiError::TypeMismatch {
                        dependency: self.label(),
                        expected: std::any::type_name::<T>(),
                    })?
            }
            Target::ByName(name) => container.build_typed::<T>(name, self.cache)?,
        };

        if self.cache {
            let _ = self.value.set(value.clone());
        }
        Ok(value)
    }
}
