//! Injectable properties: lazy resolution through the owner's container.

use std::sync::Arc;

use skykit::{
    Container, DiError, Inject, Injectable, InjectableProperties, Resolved, TypeOverride,
    UuidGenerator,
};

#[derive(Debug)]
struct Clock {
    label: &'static str,
}

impl Injectable for Clock {
    const NAME: &'static str = "clock";

    fn construct(_deps: &Resolved) -> Result<Self, DiError> {
        Ok(Clock { label: "real" })
    }
}

/// Reusable part carrying its own injectable property.
struct Multiplier {
    factor: i64,
    some_number: Inject<i64>,
}

impl Multiplier {
    fn new(factor: i64) -> Self {
        Self {
            factor,
            some_number: Inject::by_name("some_number"),
        }
    }

    fn value(&self) -> Result<i64, DiError> {
        Ok(self.factor * *self.some_number.get()?)
    }
}

impl InjectableProperties for Multiplier {
    fn inject_properties(&self, container: &Container) {
        self.some_number.attach(container);
    }
}

struct Service {
    clock: Inject<Clock>,
    uuid: Inject<UuidGenerator>,
    multiplier: Multiplier,
}

impl Injectable for Service {
    const NAME: &'static str = "service";

    fn construct(_deps: &Resolved) -> Result<Self, DiError> {
        Ok(Service {
            clock: Inject::by_class(),
            uuid: Inject::by_name("uuid"),
            multiplier: Multiplier::new(5),
        })
    }

    fn inject_properties(&self, container: &Container) {
        InjectableProperties::inject_properties(self, container);
    }
}

impl InjectableProperties for Service {
    fn inject_properties(&self, container: &Container) {
        self.clock.attach(container);
        self.uuid.attach(container);
        self.multiplier.inject_properties(container);
    }
}

fn container() -> Container {
    Container::builder()
        .without_auto_providers()
        .bind("some_number", 10_i64)
        .build()
}

#[test]
fn properties_resolve_lazily_through_the_owner_container() {
    let c = container();
    let service = c.build_class::<Service>(true).unwrap();

    assert_eq!(service.clock.get().unwrap().label, "real");
    assert!(service.uuid.get().is_ok());
    assert_eq!(service.multiplier.value().unwrap(), 50);

    // cached properties share the container's instance
    let direct = c.build_class::<Clock>(true).unwrap();
    assert!(Arc::ptr_eq(&service.clock.get().unwrap(), &direct));
}

#[test]
fn reading_before_attachment_fails_descriptively() {
    let orphan = Multiplier::new(2);
    match orphan.value().unwrap_err() {
        DiError::NotBuiltViaContainer { property } => assert!(property.contains("some_number")),
        other => panic!("unexpected error: {other:?}"),
    }

    // attaching afterwards makes it usable
    let c = container();
    c.inject_properties(&orphan);
    assert_eq!(orphan.value().unwrap(), 20);
}

#[test]
fn properties_outliving_their_container_fail() {
    let orphan = Multiplier::new(2);
    {
        let c = container();
        c.inject_properties(&orphan);
    }
    assert!(matches!(
        orphan.value(),
        Err(DiError::ContainerDropped { .. })
    ));
}

#[test]
fn by_class_properties_follow_overrides() {
    let c = container();
    c.register_override::<Clock>(TypeOverride::instance(Clock { label: "fake" }));
    let service = c.build_class::<Service>(false).unwrap();
    assert_eq!(service.clock.get().unwrap().label, "fake");
}

#[test]
fn uncached_properties_build_fresh_each_read() {
    let c = container();
    let clock: Inject<Clock> = Inject::by_class().uncached();
    clock.attach(&c);
    let first = clock.get().unwrap();
    let second = clock.get().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}
