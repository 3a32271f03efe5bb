use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::di::dependency::{ClassEntry, Dependency, DependencyKind, Injectable, Instance};
use crate::di::error::DiError;
use crate::di::inject::InjectableProperties;
use crate::di::provider::{AutoProvider, Provider};
use crate::di::resolved::Resolved;
use crate::di::short_type_name;
use crate::di::standard::StandardDependencies;

/// Name under which the container resolves to itself.
pub const CONTAINER_NAME: &str = "container";

/// Redirects a request for a type or name.
#[derive(Clone)]
pub enum Override {
    /// Hand out this pre-built value; nothing is constructed.
    Instance(Instance),
    /// Construct this class instead.
    Class(ClassEntry),
}

impl fmt::Debug for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Override::Instance(_) => f.write_str("Override::Instance"),
            Override::Class(entry) => f.debug_tuple("Override::Class").field(entry).finish(),
        }
    }
}

impl Override {
    pub fn instance<T: Any + Send + Sync>(value: T) -> Self {
        Override::Instance(Arc::new(value))
    }

    pub fn shared<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Override::Instance(value)
    }

    pub fn class<R: Injectable>() -> Self {
        Override::Class(ClassEntry::of::<R>())
    }
}

/// Redirects requests for the type `T`.
///
/// Every constructor yields something usable as a `T`: the value itself, or a
/// class `R` with `T: From<R>`.
pub struct TypeOverride<T> {
    replacement: Override,
    _target: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for TypeOverride<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeOverride").field(&self.replacement).finish()
    }
}

impl<T: Any + Send + Sync> TypeOverride<T> {
    fn new(replacement: Override) -> Self {
        Self {
            replacement,
            _target: PhantomData,
        }
    }

    pub fn instance(value: T) -> Self {
        Self::new(Override::Instance(Arc::new(value)))
    }

    pub fn shared(value: Arc<T>) -> Self {
        Self::new(Override::Instance(value))
    }

    /// Build `R` instead, converting it into `T` unless it already is one.
    pub fn class<R>() -> Self
    where
        R: Injectable,
        T: From<R>,
    {
        let entry = if TypeId::of::<R>() == TypeId::of::<T>() {
            ClassEntry::of::<R>()
        } else {
            ClassEntry::converted::<R, T>()
        };
        Self::new(Override::Class(entry))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum CacheKey {
    Type(TypeId),
    Name(String),
}

pub(crate) struct ContainerInner {
    bindings: DashMap<String, Instance>,
    bound_classes: DashMap<String, ClassEntry>,
    classes: DashMap<&'static str, ClassEntry>,
    type_overrides: DashMap<TypeId, Override>,
    name_overrides: DashMap<String, Override>,
    cache: DashMap<CacheKey, Instance>,
    providers: RwLock<Vec<Arc<dyn Provider>>>,
    fallback: Vec<Arc<dyn Provider>>,
}

/// Resolves dependencies and builds object graphs for one execution context.
///
/// Cloning is cheap and every clone shares the same bindings and build cache.
/// Create one per request or CLI invocation and drop it (or call
/// [`clear_cache`](Self::clear_cache)) at the end of that context.
#[derive(Clone)]
pub struct Container {
    pub(crate) inner: Arc<ContainerInner>,
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.inner.bindings.len())
            .field("classes", &self.inner.classes.len())
            .field("providers", &self.inner.providers.read().len())
            .field("cached", &self.inner.cache.len())
            .finish()
    }
}

impl Default for Container {
    fn default() -> Self {
        ContainerBuilder::default().build()
    }
}

/// Seeds a [`Container`] with bindings, classes, overrides and providers.
pub struct ContainerBuilder {
    bindings: Vec<(String, Instance)>,
    bound_classes: Vec<(String, ClassEntry)>,
    classes: Vec<ClassEntry>,
    type_overrides: Vec<(TypeId, Override)>,
    name_overrides: Vec<(String, Override)>,
    providers: Vec<Arc<dyn Provider>>,
    auto_providers: bool,
    standard: bool,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
            bound_classes: Vec::new(),
            classes: Vec::new(),
            type_overrides: Vec::new(),
            name_overrides: Vec::new(),
            providers: Vec::new(),
            auto_providers: true,
            standard: true,
        }
    }
}

impl ContainerBuilder {
    pub fn bind<T: Any + Send + Sync>(self, name: impl Into<String>, value: T) -> Self {
        self.bind_instance(name, Arc::new(value))
    }

    pub fn bind_instance(mut self, name: impl Into<String>, value: Instance) -> Self {
        self.bindings.push((name.into(), value));
        self
    }

    /// Bind config-file data; see [`json_instance`] for the stored types.
    pub fn bind_json(self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.bind_instance(name, json_instance(value))
    }

    pub fn bind_class<T: Injectable>(mut self, name: impl Into<String>) -> Self {
        self.bound_classes.push((name.into(), ClassEntry::of::<T>()));
        self
    }

    pub fn class<T: Injectable>(mut self) -> Self {
        self.classes.push(ClassEntry::of::<T>());
        self
    }

    pub fn override_class<T: Injectable>(mut self, replacement: TypeOverride<T>) -> Self {
        self.type_overrides
            .push((TypeId::of::<T>(), replacement.replacement));
        self
    }

    pub fn override_name(mut self, name: impl Into<String>, replacement: Override) -> Self {
        self.name_overrides.push((name.into(), replacement));
        self
    }

    pub fn provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn shared_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Skip providers collected through [`AutoProvider`].
    pub fn without_auto_providers(mut self) -> Self {
        self.auto_providers = false;
        self
    }

    /// Skip the built-in `utcnow`/`uuid`/`environment`/... provider.
    pub fn without_standard(mut self) -> Self {
        self.standard = false;
        self
    }

    pub fn build(self) -> Container {
        let mut fallback: Vec<Arc<dyn Provider>> = Vec::new();
        if self.auto_providers {
            for auto in inventory::iter::<AutoProvider> {
                fallback.push((auto.0)());
            }
        }
        if self.standard {
            fallback.push(Arc::new(StandardDependencies));
        }

        let inner = ContainerInner {
            bindings: self.bindings.into_iter().collect(),
            bound_classes: self.bound_classes.into_iter().collect(),
            classes: self.classes.into_iter().map(|e| (e.name(), e)).collect(),
            type_overrides: self.type_overrides.into_iter().collect(),
            name_overrides: self.name_overrides.into_iter().collect(),
            cache: DashMap::new(),
            providers: RwLock::new(self.providers),
            fallback,
        };

        info!(
            bindings = inner.bindings.len(),
            classes = inner.classes.len(),
            providers = inner.providers.read().len(),
            fallback_providers = inner.fallback.len(),
            "container seeded"
        );

        Container {
            inner: Arc::new(inner),
        }
    }
}

/// Config-file data as container values: strings, integers, floats and booleans
/// become `String`, `i64`, `f64` and `bool`; anything else stays a `serde_json::Value`.
pub fn json_instance(value: serde_json::Value) -> Instance {
    use serde_json::Value;
    match value {
        Value::String(s) => Arc::new(s),
        Value::Bool(b) => Arc::new(b),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Arc::new(i),
            (None, Some(f)) => Arc::new(f),
            (None, None) => Arc::new(Value::Number(n)),
        },
        other => Arc::new(other),
    }
}

impl Container {
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    pub fn new() -> Self {
        Self::default()
    }

    /// Register an eagerly known value. Bound values are never subject to the build cache.
    pub fn bind<T: Any + Send + Sync>(&self, name: impl Into<String>, value: T) {
        self.bind_instance(name, Arc::new(value));
    }

    pub fn bind_instance(&self, name: impl Into<String>, value: Instance) {
        let name = name.into();
        self.inner.cache.remove(&CacheKey::Name(name.clone()));
        if self.inner.bindings.insert(name.clone(), value).is_some() {
            warn!(binding = %name, "replacing existing binding");
        }
    }

    pub fn bind_json(&self, name: impl Into<String>, value: serde_json::Value) {
        self.bind_instance(name, json_instance(value));
    }

    /// Resolve `name` by building `T` on demand.
    pub fn bind_class<T: Injectable>(&self, name: impl Into<String>) {
        let name = name.into();
        self.inner.cache.remove(&CacheKey::Name(name.clone()));
        self.inner.bound_classes.insert(name, ClassEntry::of::<T>());
    }

    /// Make `T` constructible by its [`Injectable::NAME`].
    pub fn register_class<T: Injectable>(&self) {
        let entry = ClassEntry::of::<T>();
        self.inner.classes.insert(entry.name(), entry);
    }

    /// Redirect every later request for `T`.
    pub fn register_override<T: Injectable>(&self, replacement: TypeOverride<T>) {
        let type_id = TypeId::of::<T>();
        self.inner.cache.remove(&CacheKey::Type(type_id));
        self.inner
            .type_overrides
            .insert(type_id, replacement.replacement);
    }

    /// Redirect every later by-name request for `name`; checked before bindings.
    pub fn override_name(&self, name: impl Into<String>, replacement: Override) {
        let name = name.into();
        self.inner.cache.remove(&CacheKey::Name(name.clone()));
        self.inner.name_overrides.insert(name, replacement);
    }

    /// The most recently registered provider wins.
    pub fn register_provider(&self, provider: impl Provider + 'static) {
        self.register_shared_provider(Arc::new(provider));
    }

    pub fn register_shared_provider(&self, provider: Arc<dyn Provider>) {
        debug!(provider = provider.label(), "registering provider");
        self.inner.providers.write().push(provider);
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.inner.bindings.contains_key(name)
    }

    pub fn build_class<T: Injectable>(&self, cache: bool) -> Result<Arc<T>, DiError> {
        let instance = Resolver::new(self).build_entry(&ClassEntry::of::<T>(), cache)?;
        downcast::<T>(instance, short_type_name(std::any::type_name::<T>()))
    }

    pub fn build_from_name(&self, name: &str, cache: bool) -> Result<Instance, DiError> {
        Resolver::new(self).build_from_name(name, cache)
    }

    pub fn build_typed<T: Any + Send + Sync>(&self, name: &str, cache: bool) -> Result<Arc<T>, DiError> {
        downcast::<T>(self.build_from_name(name, cache)?, name)
    }

    /// Resolve `deps` (with caching) and invoke `f` with them.
    pub fn call_function<R, F>(&self, consumer: &str, deps: &[Dependency], f: F) -> Result<R, DiError>
    where
        F: FnOnce(&Resolved) -> R,
    {
        let resolved = Resolver::new(self).resolve_all(consumer, deps)?;
        Ok(f(&resolved))
    }

    /// Like [`call_function`](Self::call_function), but `kwargs` supply dependencies
    /// directly; any name present there is not resolved through the container.
    pub fn call_function_with<R, F>(
        &self,
        consumer: &str,
        deps: &[Dependency],
        kwargs: HashMap<String, Instance>,
        f: F,
    ) -> Result<R, DiError>
    where
        F: FnOnce(&Resolved) -> R,
    {
        let mut resolver = Resolver::new(self);
        let mut values: HashMap<String, Option<Instance>> = HashMap::new();
        for dep in deps {
            let value = match kwargs.get(dep.name()) {
                Some(given) => Some(given.clone()),
                None => resolver.resolve(dep, consumer)?,
            };
            values.insert(dep.name().to_string(), value);
        }
        Ok(f(&Resolved::new(consumer, values)))
    }

    /// Attach this container to an object built outside of it.
    pub fn inject_properties(&self, target: &impl InjectableProperties) {
        target.inject_properties(self);
    }

    /// Discard everything built so far; bindings, overrides and providers stay.
    pub fn clear_cache(&self) {
        let dropped = self.inner.cache.len();
        self.inner.cache.clear();
        debug!(dropped, "build cache cleared");
    }

    pub(crate) fn classes(&self) -> Vec<ClassEntry> {
        let mut entries: Vec<ClassEntry> = self.inner.classes.iter().map(|e| *e.value()).collect();
        entries.extend(self.inner.bound_classes.iter().map(|e| *e.value()));
        entries.extend(self.inner.type_overrides.iter().filter_map(|e| match e.value() {
            Override::Class(entry) => Some(*entry),
            Override::Instance(_) => None,
        }));
        entries
    }

    /// Whether a by-name lookup could succeed without building anything.
    pub(crate) fn knows_name(&self, name: &str) -> bool {
        name == CONTAINER_NAME
            || self.inner.name_overrides.contains_key(name)
            || self.inner.bindings.contains_key(name)
            || self.inner.bound_classes.contains_key(name)
            || self.inner.classes.contains_key(name)
            || self.providers_in_order().iter().any(|p| p.can_build(name))
    }

    /// The class a by-name lookup would construct, if any.
    pub(crate) fn class_for_name(&self, name: &str) -> Option<ClassEntry> {
        if self.inner.bindings.contains_key(name) {
            return None;
        }
        if let Some(ov) = self.inner.name_overrides.get(name) {
            return match ov.value() {
                Override::Class(entry) => Some(*entry),
                Override::Instance(_) => None,
            };
        }
        if let Some(entry) = self.inner.bound_classes.get(name) {
            return Some(*entry.value());
        }
        if self.providers_in_order().iter().any(|p| p.can_build(name)) {
            return None;
        }
        self.inner.classes.get(name).map(|e| *e.value())
    }

    pub(crate) fn type_override(&self, type_id: TypeId) -> Option<Override> {
        self.inner.type_overrides.get(&type_id).map(|o| o.value().clone())
    }

    /// Explicit providers newest first, then auto-imported, then standard.
    fn providers_in_order(&self) -> Vec<Arc<dyn Provider>> {
        let explicit = self.inner.providers.read();
        explicit
            .iter()
            .rev()
            .cloned()
            .chain(self.inner.fallback.iter().cloned())
            .collect()
    }
}

fn downcast<T: Any + Send + Sync>(instance: Instance, dependency: &str) -> Result<Arc<T>, DiError> {
    instance.downcast::<T>().map_err(|_| DiError::TypeMismatch {
        dependency: dependency.to_string(),
        expected: std::any::type_name::<T>(),
    })
}

/// Per-call resolution state: the in-progress stack used for cycle detection.
///
/// Each top-level build gets its own resolver, so concurrent builds on clones of one
/// container never see each other's in-progress entries.
pub struct Resolver<'c> {
    container: &'c Container,
    building: Vec<(CacheKey, String)>,
}

impl<'c> Resolver<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        Self {
            container,
            building: Vec::new(),
        }
    }

    pub fn container(&self) -> &'c Container {
        self.container
    }

    fn enter(&mut self, key: CacheKey, label: &str) -> Result<(), DiError> {
        if let Some(start) = self.building.iter().position(|(k, _)| *k == key) {
            let mut path: Vec<String> = self.building[start..].iter().map(|(_, l)| l.clone()).collect();
            path.push(label.to_string());
            return Err(DiError::Cycle { path });
        }
        self.building.push((key, label.to_string()));
        Ok(())
    }

    fn leave(&mut self) {
        self.building.pop();
    }

    /// Build a class honoring type overrides.
    pub fn build_entry(&mut self, entry: &ClassEntry, cache: bool) -> Result<Instance, DiError> {
        match self.container.type_override(entry.type_id()) {
            Some(Override::Instance(instance)) => {
                debug!(class = entry.type_name(), "using override instance");
                Ok(instance)
            }
            Some(Override::Class(replacement)) => self.construct(&replacement, cache),
            None => self.construct(entry, cache),
        }
    }

    fn construct(&mut self, entry: &ClassEntry, cache: bool) -> Result<Instance, DiError> {
        let key = CacheKey::Type(entry.type_id());
        if cache {
            if let Some(hit) = self.container.inner.cache.get(&key) {
                debug!(class = entry.type_name(), "cache hit");
                return Ok(hit.value().clone());
            }
        }

        self.enter(key.clone(), entry.type_name())?;
        let built = self
            .resolve_all(entry.type_name(), &entry.dependencies())
            .and_then(|resolved| entry.construct(&resolved));
        self.leave();
        let instance = built?;

        entry.bind_properties(&instance, self.container);
        if cache {
            self.container.inner.cache.insert(key, instance.clone());
        }
        debug!(class = entry.type_name(), cache, "constructed");
        Ok(instance)
    }

    /// Resolve a manifest. Dependencies are always resolved with caching on.
    pub fn resolve_all(&mut self, consumer: &str, deps: &[Dependency]) -> Result<Resolved, DiError> {
        let mut values = HashMap::with_capacity(deps.len());
        for dep in deps {
            let value = self.resolve(dep, consumer)?;
            values.insert(dep.name().to_string(), value);
        }
        Ok(Resolved::new(consumer, values))
    }

    pub fn resolve(&mut self, dep: &Dependency, consumer: &str) -> Result<Option<Instance>, DiError> {
        let found = match dep.kind() {
            DependencyKind::ByType(entry) => Some(self.build_entry(entry, true)?),
            DependencyKind::ByName => self.lookup(dep.name(), true)?,
        };
        match found {
            Some(instance) => Ok(Some(instance)),
            None if !dep.is_required() => Ok(None),
            None => Err(DiError::Unresolvable {
                dependency: dep.name().to_string(),
                consumer: consumer.to_string(),
            }),
        }
    }

    pub fn build_from_name(&mut self, name: &str, cache: bool) -> Result<Instance, DiError> {
        self.lookup(name, cache)?.ok_or_else(|| DiError::Unresolvable {
            dependency: name.to_string(),
            consumer: "build_from_name".to_string(),
        })
    }

    /// By-name resolution; `Ok(None)` when nothing knows the name.
    fn lookup(&mut self, name: &str, cache: bool) -> Result<Option<Instance>, DiError> {
        let container = self.container;
        let inner = &container.inner;

        if name == CONTAINER_NAME {
            return Ok(Some(Arc::new(container.clone())));
        }

        if let Some(ov) = inner.name_overrides.get(name).map(|o| o.value().clone()) {
            return match ov {
                Override::Instance(instance) => Ok(Some(instance)),
                Override::Class(entry) => self.construct(&entry, cache).map(Some),
            };
        }

        if let Some(bound) = inner.bindings.get(name).map(|b| b.value().clone()) {
            return Ok(Some(bound));
        }

        if let Some(entry) = inner.bound_classes.get(name).map(|e| *e.value()) {
            return self.build_entry(&entry, cache).map(Some);
        }

        let key = CacheKey::Name(name.to_string());
        if cache {
            if let Some(hit) = inner.cache.get(&key) {
                debug!(name, "cache hit");
                return Ok(Some(hit.value().clone()));
            }
        }

        let providers = container.providers_in_order();
        if let Some(provider) = providers.iter().find(|p| p.can_build(name)) {
            self.enter(key.clone(), name)?;
            let built = provider.build(name, self);
            self.leave();
            let instance = built?;
            if cache && provider.can_cache(name) {
                inner.cache.insert(key, instance.clone());
            }
            debug!(name, provider = provider.label(), cache, "provided");
            return Ok(Some(instance));
        }

        if let Some(entry) = inner.classes.get(name).map(|e| *e.value()) {
            return self.build_entry(&entry, cache).map(Some);
        }

        Ok(None)
    }
}
