use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::di::container::Container;
use crate::di::error::DiError;
use crate::di::resolved::Resolved;
use crate::di::short_type_name;

/// A type-erased value produced or held by the container.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// A type the container knows how to construct.
///
/// The manifest returned by [`dependencies`](Self::dependencies) replaces constructor
/// introspection: each entry is resolved before [`construct`](Self::construct) runs.
pub trait Injectable: Any + Send + Sync + Sized {
    /// Snake-case name used for by-name registration.
    const NAME: &'static str;

    fn dependencies() -> Vec<Dependency> {
        Vec::new()
    }

    fn construct(deps: &Resolved) -> Result<Self, DiError>;

    /// Runs after construction with the container that built the instance.
    fn inject_properties(&self, _container: &Container) {}
}

/// Erased registration of an [`Injectable`] type.
#[derive(Clone, Copy)]
pub struct ClassEntry {
    type_id: TypeId,
    type_name: &'static str,
    name: &'static str,
    dependencies: fn() -> Vec<Dependency>,
    factory: fn(&Resolved) -> Result<Instance, DiError>,
    properties: fn(&Instance, &Container),
}

fn construct_erased<T: Injectable>(deps: &Resolved) -> Result<Instance, DiError> {
    Ok(Arc::new(T::construct(deps)?))
}

fn properties_erased<T: Injectable>(instance: &Instance, container: &Container) {
    if let Some(value) = instance.downcast_ref::<T>() {
        value.inject_properties(container);
    }
}

fn construct_converted<R, T>(deps: &Resolved) -> Result<Instance, DiError>
where
    R: Injectable,
    T: From<R> + Any + Send + Sync,
{
    Ok(Arc::new(T::from(R::construct(deps)?)))
}

fn no_properties(_: &Instance, _: &Container) {}

impl ClassEntry {
    pub fn of<T: Injectable>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: short_type_name(std::any::type_name::<T>()),
            name: T::NAME,
            dependencies: T::dependencies,
            factory: construct_erased::<T>,
            properties: properties_erased::<T>,
        }
    }

    /// Builds `R` from its own manifest and hands out the `T` converted from it.
    /// Used to substitute a type with a differently-built stand-in.
    pub fn converted<R, T>() -> Self
    where
        R: Injectable,
        T: From<R> + Any + Send + Sync,
    {
        // cached and cycle-checked as the produced type
        Self {
            type_id: TypeId::of::<T>(),
            type_name: short_type_name(std::any::type_name::<R>()),
            name: R::NAME,
            dependencies: R::dependencies,
            factory: construct_converted::<R, T>,
            properties: no_properties,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn dependencies(&self) -> Vec<Dependency> {
        (self.dependencies)()
    }

    pub(crate) fn construct(&self, deps: &Resolved) -> Result<Instance, DiError> {
        (self.factory)(deps)
    }

    pub(crate) fn bind_properties(&self, instance: &Instance, container: &Container) {
        (self.properties)(instance, container)
    }
}

impl fmt::Debug for ClassEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassEntry")
            .field("type", &self.type_name)
            .field("name", &self.name)
            .finish()
    }
}

impl PartialEq for ClassEntry {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.name == other.name
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DependencyKind {
    ByName,
    ByType(ClassEntry),
}

/// One manifest entry: the slot name and how to resolve it.
#[derive(Clone, Debug, PartialEq)]
pub struct Dependency {
    name: String,
    kind: DependencyKind,
    required: bool,
}

impl Dependency {
    /// Resolved through bindings, providers and registered class names.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DependencyKind::ByName,
            required: true,
        }
    }

    /// Resolved by type; `name` is the slot the value is stored under.
    pub fn of<T: Injectable>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DependencyKind::ByType(ClassEntry::of::<T>()),
            required: true,
        }
    }

    /// A missing optional dependency resolves to nothing instead of failing.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &DependencyKind {
        &self.kind
    }

    pub fn class(&self) -> Option<&ClassEntry> {
        match &self.kind {
            DependencyKind::ByType(entry) => Some(entry),
            DependencyKind::ByName => None,
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}
