use scoped_di::{Activation, DiError, DiResult, Injectable, Resolver, ScopeBuilder, TypeKey};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait Notifier: Send + Sync {
    fn channel(&self) -> &'static str;
}

struct Email;
struct Sms;

impl Notifier for Email {
    fn channel(&self) -> &'static str {
        "email"
    }
}

impl Notifier for Sms {
    fn channel(&self) -> &'static str {
        "sms"
    }
}

#[test]
fn test_two_type_registrations_for_one_key_fail() {
    let mut builder = ScopeBuilder::new();
    builder
        .with_factory(|_| Ok(Email))
        .as_trait::<dyn Notifier>(|n| n as Arc<dyn Notifier>);
    builder
        .with_factory(|_| Ok(Sms))
        .as_trait::<dyn Notifier>(|n| n as Arc<dyn Notifier>);

    match builder.build() {
        Err(DiError::DuplicateMapping { key, existing, duplicate }) => {
            assert_eq!(key, TypeKey::of::<dyn Notifier>());
            assert_eq!(existing, TypeKey::of::<Email>());
            assert_eq!(duplicate, TypeKey::of::<Sms>());
        }
        other => panic!("expected duplicate mapping, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_duplicate_fails_even_when_singleton() {
    let mut builder = ScopeBuilder::new();
    builder.with_factory(|_| Ok(1u32)).as_self().as_singleton();
    builder.with_factory(|_| Ok(2u32)).as_self().as_singleton();

    assert!(matches!(builder.build(), Err(DiError::DuplicateMapping { .. })));
}

#[test]
fn test_instance_and_type_for_same_key_is_allowed() {
    let mut builder = ScopeBuilder::new();
    builder
        .with_instance(Email)
        .as_trait::<dyn Notifier>(|n| n as Arc<dyn Notifier>);
    builder
        .with_factory(|_| Ok(Sms))
        .as_trait::<dyn Notifier>(|n| n as Arc<dyn Notifier>);

    let sp = builder.build().unwrap();
    // The cached instance answers before the mapping is consulted
    assert_eq!(sp.get_required_trait::<dyn Notifier>().channel(), "email");
    assert_eq!(
        sp.create_trait::<dyn Notifier>(&[]).unwrap().channel(),
        "sms"
    );
}

#[test]
fn test_same_key_twice_on_one_registration_collapses() {
    let mut builder = ScopeBuilder::new();
    builder
        .with_factory(|_| Ok(Email))
        .as_self()
        .as_self()
        .as_trait::<dyn Notifier>(|n| n as Arc<dyn Notifier>)
        .as_trait::<dyn Notifier>(|n| n as Arc<dyn Notifier>);

    assert_eq!(builder.descriptors()[0].resolution_types.len(), 2);
    assert!(builder.build().is_ok());
}

#[test]
fn test_failing_singleton_aborts_build() {
    struct Broken;

    impl Injectable for Broken {
        fn construct(ctx: &mut Activation<'_>) -> DiResult<Self> {
            ctx.get::<String>()?;
            Ok(Broken)
        }
    }

    let mut builder = ScopeBuilder::new();
    builder.with_instance(1u8).as_self();
    builder.with_type::<Broken>().as_self().as_singleton();

    let err = builder.build().unwrap_err();
    assert!(matches!(err, DiError::Activation { .. }));
    assert!(matches!(err.root_cause(), DiError::NotFound(k) if *k == TypeKey::of::<String>()));
}

#[test]
fn test_singletons_materialize_in_declaration_order() {
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let mut builder = ScopeBuilder::new();
    let log = order.clone();
    builder
        .with_factory(move |_| {
            log.lock().push("first");
            Ok(1u8)
        })
        .as_self()
        .as_singleton();
    let log = order.clone();
    builder
        .with_factory(move |_| {
            log.lock().push("second");
            Ok(2u16)
        })
        .as_self()
        .as_singleton();
    let log = order.clone();
    builder
        .with_factory(move |_| {
            log.lock().push("third");
            Ok(3u32)
        })
        .as_self()
        .as_singleton();
    builder.build().unwrap();

    assert_eq!(*order.lock(), vec!["first", "second", "third"]);
}

#[test]
fn test_later_singleton_dependency_activated_on_demand() {
    struct Consumer {
        dep: Arc<Dependency>,
    }
    struct Dependency;

    impl Injectable for Consumer {
        fn construct(ctx: &mut Activation<'_>) -> DiResult<Self> {
            Ok(Consumer { dep: ctx.get::<Dependency>()? })
        }
    }

    let built = Arc::new(AtomicUsize::new(0));
    let built_clone = built.clone();

    let mut builder = ScopeBuilder::new();
    builder.with_type::<Consumer>().as_self().as_singleton();
    builder
        .with_factory(move |_| {
            built_clone.fetch_add(1, Ordering::SeqCst);
            Ok(Dependency)
        })
        .as_self()
        .as_singleton();

    let sp = builder.build().unwrap();

    // The consumer got a transient Dependency; the singleton was built afterwards
    assert_eq!(built.load(Ordering::SeqCst), 2);
    let consumer = sp.get_required::<Consumer>();
    assert!(!Arc::ptr_eq(&consumer.dep, &sp.get_required::<Dependency>()));
}

#[test]
fn test_earlier_singleton_dependency_is_shared() {
    struct Consumer {
        dep: Arc<Dependency>,
    }
    struct Dependency;

    impl Injectable for Consumer {
        fn construct(ctx: &mut Activation<'_>) -> DiResult<Self> {
            Ok(Consumer { dep: ctx.get::<Dependency>()? })
        }
    }

    let mut builder = ScopeBuilder::new();
    builder.with_factory(|_| Ok(Dependency)).as_self().as_singleton();
    builder.with_type::<Consumer>().as_self().as_singleton();

    let sp = builder.build().unwrap();
    let consumer = sp.get_required::<Consumer>();
    assert!(Arc::ptr_eq(&consumer.dep, &sp.get_required::<Dependency>()));
}
