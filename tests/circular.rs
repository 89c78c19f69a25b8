use scoped_di::{
    Activation, ActivationOptions, DiError, DiResult, Injectable, Resolver, ScopeBuilder, TypeKey,
};
use std::sync::Arc;

#[derive(Debug)]
struct A {
    _b: Arc<B>,
}
#[derive(Debug)]
struct B {
    _a: Arc<A>,
}

impl Injectable for A {
    fn construct(ctx: &mut Activation<'_>) -> DiResult<Self> {
        Ok(A { _b: ctx.get::<B>()? })
    }
}

impl Injectable for B {
    fn construct(ctx: &mut Activation<'_>) -> DiResult<Self> {
        Ok(B { _a: ctx.get::<A>()? })
    }
}

fn cycle_builder() -> ScopeBuilder {
    let mut builder = ScopeBuilder::new();
    builder.with_type::<A>().as_self();
    builder.with_type::<B>().as_self();
    builder
}

#[test]
fn test_two_node_cycle_reports_path() {
    let sp = cycle_builder().build().unwrap();

    let err = sp.get::<A>().unwrap_err();
    match err.root_cause() {
        DiError::Circular(path) => {
            assert_eq!(
                path,
                &vec![TypeKey::of::<A>(), TypeKey::of::<B>(), TypeKey::of::<A>()]
            );
        }
        other => panic!("expected circular error, got {:?}", other),
    }
}

#[test]
fn test_cycle_error_is_not_a_panic_and_scope_stays_usable() {
    let mut builder = cycle_builder();
    builder.with_instance(5u8).as_self();
    let sp = builder.build().unwrap();

    assert!(sp.get::<B>().is_err());
    assert!(sp.get::<A>().is_err());
    assert_eq!(*sp.get_required::<u8>(), 5);
}

#[test]
fn test_cycle_in_singleton_aborts_build() {
    let mut builder = ScopeBuilder::new();
    builder.with_type::<A>().as_self().as_singleton();
    builder.with_type::<B>().as_self();

    let err = builder.build().unwrap_err();
    assert!(matches!(err.root_cause(), DiError::Circular(_)));
}

#[test]
fn test_self_dependency() {
    #[derive(Debug)]
    struct Narcissus;

    impl Injectable for Narcissus {
        fn construct(ctx: &mut Activation<'_>) -> DiResult<Self> {
            ctx.get::<Narcissus>()?;
            Ok(Narcissus)
        }
    }

    let mut builder = ScopeBuilder::new();
    builder.with_type::<Narcissus>().as_self();
    let sp = builder.build().unwrap();

    match sp.get::<Narcissus>().unwrap_err().root_cause() {
        DiError::Circular(path) => assert_eq!(path.len(), 2),
        other => panic!("expected circular error, got {:?}", other),
    }
}

#[test]
fn test_depth_limit_without_cycle_detection() {
    let mut builder = cycle_builder();
    builder.with_options(ActivationOptions {
        max_depth: 16,
        detect_cycles: false,
    });
    let sp = builder.build().unwrap();

    let err = sp.get::<A>().unwrap_err();
    assert!(matches!(err.root_cause(), DiError::DepthExceeded(16)));
}

#[test]
fn test_deep_chain_within_limit() {
    #[derive(Debug)]
    struct Level<const N: usize>;

    macro_rules! level {
        ($n:literal => $dep:literal) => {
            impl Injectable for Level<$n> {
                fn construct(ctx: &mut Activation<'_>) -> DiResult<Self> {
                    ctx.get::<Level<$dep>>()?;
                    Ok(Level)
                }
            }
        };
    }

    impl Injectable for Level<0> {
        fn construct(_: &mut Activation<'_>) -> DiResult<Self> {
            Ok(Level)
        }
    }
    level!(1 => 0);
    level!(2 => 1);
    level!(3 => 2);

    let mut builder = ScopeBuilder::new();
    builder.with_type::<Level<0>>().as_self();
    builder.with_type::<Level<1>>().as_self();
    builder.with_type::<Level<2>>().as_self();
    builder.with_type::<Level<3>>().as_self();

    let sp = builder.build().unwrap();
    assert!(sp.get::<Level<3>>().is_ok());

    let mut builder = ScopeBuilder::new();
    builder.with_options(ActivationOptions {
        max_depth: 3,
        ..ActivationOptions::default()
    });
    builder.with_type::<Level<0>>().as_self();
    builder.with_type::<Level<1>>().as_self();
    builder.with_type::<Level<2>>().as_self();
    builder.with_type::<Level<3>>().as_self();

    let sp = builder.build().unwrap();
    assert!(matches!(
        sp.get::<Level<3>>().unwrap_err().root_cause(),
        DiError::DepthExceeded(3)
    ));
    assert!(sp.get::<Level<2>>().is_ok());
}
