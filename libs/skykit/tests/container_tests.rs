//! Container resolution: caching, overrides, providers, cycles and failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use skykit::{
    AutoProvider, Container, Dependency, DiError, Injectable, Instance, Override, Provider,
    Providers, Resolved, Resolver, TypeOverride,
};

static CLOCK_BUILDS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug)]
struct Clock {
    serial: usize,
}

impl Injectable for Clock {
    const NAME: &'static str = "clock";

    fn construct(_deps: &Resolved) -> Result<Self, DiError> {
        Ok(Clock {
            serial: CLOCK_BUILDS.fetch_add(1, Ordering::SeqCst),
        })
    }
}

struct Report {
    clock: Arc<Clock>,
    title: String,
}

impl Injectable for Report {
    const NAME: &'static str = "report";

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::of::<Clock>("clock"), Dependency::named("title")]
    }

    fn construct(deps: &Resolved) -> Result<Self, DiError> {
        Ok(Report {
            clock: deps.get("clock")?,
            title: deps.value("title")?,
        })
    }
}

#[derive(Debug)]
struct NeedsX;

impl Injectable for NeedsX {
    const NAME: &'static str = "needs_x";

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::named("x")]
    }

    fn construct(_deps: &Resolved) -> Result<Self, DiError> {
        Ok(NeedsX)
    }
}

#[derive(Debug)]
struct A;
#[derive(Debug)]
struct B;

impl Injectable for A {
    const NAME: &'static str = "a";

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::of::<B>("b")]
    }

    fn construct(_deps: &Resolved) -> Result<Self, DiError> {
        Ok(A)
    }
}

impl Injectable for B {
    const NAME: &'static str = "b";

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::of::<A>("a")]
    }

    fn construct(_deps: &Resolved) -> Result<Self, DiError> {
        Ok(B)
    }
}

fn container() -> Container {
    Container::builder().without_auto_providers().build()
}

#[test]
fn cached_builds_return_the_same_instance() {
    let c = container();
    let first = c.build_class::<Clock>(true).unwrap();
    let second = c.build_class::<Clock>(true).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let fresh = c.build_class::<Clock>(false).unwrap();
    assert!(!Arc::ptr_eq(&first, &fresh));
    assert_ne!(first.serial, fresh.serial);
}

#[test]
fn dependencies_are_resolved_by_type_and_by_name() {
    let c = Container::builder()
        .without_auto_providers()
        .bind("title", "Daily".to_string())
        .build();

    let report = c.build_class::<Report>(false).unwrap();
    assert_eq!(report.title, "Daily");

    // by-type dependencies are always built with caching on
    let clock = c.build_class::<Clock>(true).unwrap();
    assert!(Arc::ptr_eq(&report.clock, &clock));
}

#[test]
fn clear_cache_forces_reconstruction() {
    let c = container();
    let first = c.build_class::<Clock>(true).unwrap();
    c.clear_cache();
    let second = c.build_class::<Clock>(true).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn unresolvable_names_mention_dependency_and_consumer() {
    let c = container();
    let err = c.build_class::<NeedsX>(true).unwrap_err();
    match &err {
        DiError::Unresolvable {
            dependency,
            consumer,
        } => {
            assert_eq!(dependency, "x");
            assert_eq!(consumer, "NeedsX");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("'x'"));
    assert!(message.contains("'NeedsX'"));
}

#[test]
fn cycles_are_reported_not_overflowed() {
    let c = container();
    match c.build_class::<A>(true).unwrap_err() {
        DiError::Cycle { path } => assert_eq!(path, vec!["A", "B", "A"]),
        other => panic!("unexpected error: {other:?}"),
    }
    // nothing was left half-built
    assert!(matches!(c.build_class::<B>(true), Err(DiError::Cycle { .. })));
}

#[test]
fn validate_finds_cycles_and_missing_names_statically() {
    let c = Container::builder().without_auto_providers().class::<A>().build();
    match c.validate().unwrap_err() {
        DiError::Cycle { path } => {
            assert!(path.contains(&"A".to_string()));
            assert!(path.contains(&"B".to_string()));
            assert_eq!(path.first(), path.last());
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let c = Container::builder().without_auto_providers().class::<NeedsX>().build();
    assert!(matches!(c.validate(), Err(DiError::Unresolvable { .. })));

    c.bind("x", 1_i64);
    c.validate().unwrap();
}

#[test]
fn instance_override_is_returned_directly() {
    let c = container();
    let prebuilt = Arc::new(Clock { serial: 999 });
    c.register_override::<Clock>(TypeOverride::shared(prebuilt.clone()));

    let built = c.build_class::<Clock>(true).unwrap();
    assert!(Arc::ptr_eq(&built, &prebuilt));
    let again = c.build_class::<Clock>(false).unwrap();
    assert!(Arc::ptr_eq(&again, &prebuilt));
}

struct FakeClock;

impl Injectable for FakeClock {
    const NAME: &'static str = "fake_clock";

    fn construct(_deps: &Resolved) -> Result<Self, DiError> {
        Ok(FakeClock)
    }
}

impl From<FakeClock> for Clock {
    fn from(_: FakeClock) -> Self {
        Clock { serial: 0 }
    }
}

#[test]
fn class_override_builds_the_replacement() {
    let c = Container::builder()
        .without_auto_providers()
        .override_class::<Clock>(TypeOverride::class::<FakeClock>())
        .build();
    assert_eq!(c.build_class::<Clock>(false).unwrap().serial, 0);

    // by-type dependencies follow the override too
    c.bind("title", "Daily".to_string());
    assert_eq!(c.build_class::<Report>(false).unwrap().clock.serial, 0);

    // names are untyped: any class may stand in
    c.override_name("clock", Override::class::<FakeClock>());
    let by_name = c.build_from_name("clock", false).unwrap();
    assert!(by_name.downcast::<FakeClock>().is_ok());
}

#[test]
fn bound_values_bypass_the_build_cache() {
    let c = container();
    c.bind("limit", 5_i64);
    assert_eq!(*c.build_typed::<i64>("limit", false).unwrap(), 5);
    c.bind("limit", 6_i64);
    assert_eq!(*c.build_typed::<i64>("limit", true).unwrap(), 6);
}

#[test]
fn provider_doubles_a_bound_value() {
    let doubled = Providers::new("math").provide(
        "doubled",
        vec![Dependency::named("some_value")],
        |deps| Ok(deps.value::<i64>("some_value")? * 2),
    );
    let c = Container::builder()
        .without_auto_providers()
        .bind("some_value", 5_i64)
        .provider(doubled)
        .build();

    assert_eq!(*c.build_typed::<i64>("doubled", true).unwrap(), 10);
}

#[test]
fn most_recent_provider_wins() {
    let c = container();
    c.register_provider(Providers::new("first").provide("greeting", vec![], |_| {
        Ok("hello".to_string())
    }));
    c.register_provider(Providers::new("second").provide("greeting", vec![], |_| {
        Ok("howdy".to_string())
    }));
    assert_eq!(
        c.build_typed::<String>("greeting", false).unwrap().as_str(),
        "howdy"
    );
}

#[test]
fn bindings_and_name_overrides_outrank_providers() {
    let c = Container::builder()
        .without_auto_providers()
        .provider(Providers::new("p").provide("mode", vec![], |_| Ok("provided".to_string())))
        .bind("mode", "bound".to_string())
        .build();
    assert_eq!(c.build_typed::<String>("mode", true).unwrap().as_str(), "bound");

    c.override_name("mode", Override::instance("overridden".to_string()));
    assert_eq!(
        c.build_typed::<String>("mode", true).unwrap().as_str(),
        "overridden"
    );
}

#[test]
fn uncached_provider_results_are_rebuilt() {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = counter.clone();
    let c = Container::builder()
        .without_auto_providers()
        .provider(Providers::new("p").provide_uncached("tick", vec![], move |_| {
            Ok(seen.fetch_add(1, Ordering::SeqCst))
        }))
        .build();

    let first = c.build_typed::<usize>("tick", true).unwrap();
    let second = c.build_typed::<usize>("tick", true).unwrap();
    assert_ne!(*first, *second);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn registered_class_names_are_a_fallback() {
    let c = container();
    assert!(c.build_from_name("clock", true).is_err());
    c.register_class::<Clock>();
    let by_name = c.build_from_name("clock", true).unwrap();
    assert!(by_name.downcast::<Clock>().is_ok());

    c.bind_class::<Clock>("ticker");
    let ticker = c.build_typed::<Clock>("ticker", true).unwrap();
    let typed = c.build_class::<Clock>(true).unwrap();
    assert!(Arc::ptr_eq(&ticker, &typed));
}

#[test]
fn call_function_resolves_arguments_and_honors_kwargs() {
    let c = Container::builder()
        .without_auto_providers()
        .bind("a", 2_i64)
        .bind("b", 3_i64)
        .build();
    let deps = vec![Dependency::named("a"), Dependency::named("b")];

    let sum = c
        .call_function("sum", &deps, |d| {
            Ok::<_, DiError>(d.value::<i64>("a")? + d.value::<i64>("b")?)
        })
        .unwrap()
        .unwrap();
    assert_eq!(sum, 5);

    let kwargs: HashMap<String, Instance> = HashMap::from([("b".to_string(), Arc::new(10_i64) as Instance)]);
    let sum = c
        .call_function_with("sum", &deps, kwargs, |d| {
            Ok::<_, DiError>(d.value::<i64>("a")? + d.value::<i64>("b")?)
        })
        .unwrap()
        .unwrap();
    assert_eq!(sum, 12);
}

#[test]
fn optional_dependencies_resolve_to_nothing() {
    let c = container();
    let deps = vec![Dependency::named("maybe").optional()];
    let present = c.call_function("f", &deps, |d| d.contains("maybe")).unwrap();
    assert!(!present);
}

#[test]
fn the_container_resolves_itself() {
    let c = container();
    let me = c.build_typed::<Container>("container", true).unwrap();
    me.bind("set_through_clone", true);
    assert!(c.is_bound("set_through_clone"));
}

// ---------- Auto-imported providers (module scope for `inventory`) ----------

struct Motd;

impl Provider for Motd {
    fn label(&self) -> &str {
        "motd"
    }

    fn can_build(&self, name: &str) -> bool {
        name == "motd"
    }

    fn build(&self, _name: &str, _resolver: &mut Resolver<'_>) -> Result<Instance, DiError> {
        Ok(Arc::new("auto".to_string()))
    }
}

fn motd() -> Arc<dyn Provider> {
    Arc::new(Motd)
}

skykit::inventory::submit! { AutoProvider(motd) }

#[test]
fn auto_providers_rank_below_explicit_ones() {
    let c = Container::new();
    assert_eq!(c.build_typed::<String>("motd", false).unwrap().as_str(), "auto");

    c.register_provider(Providers::new("explicit").provide("motd", vec![], |_| {
        Ok("explicit".to_string())
    }));
    assert_eq!(
        c.build_typed::<String>("motd", false).unwrap().as_str(),
        "explicit"
    );

    let without = Container::builder().without_auto_providers().build();
    assert!(without.build_from_name("motd", false).is_err());
}
