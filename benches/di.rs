use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scoped_di::*;
use std::sync::Arc;

trait Port: Send + Sync {
    fn number(&self) -> u16;
}

struct HttpPort;

impl Port for HttpPort {
    fn number(&self) -> u16 {
        8080
    }
}

struct Handler {
    port: Arc<dyn Port>,
}

impl Injectable for Handler {
    fn construct(ctx: &mut Activation<'_>) -> DiResult<Self> {
        Ok(Handler {
            port: ctx.get_trait::<dyn Port>()?,
        })
    }
}

// ===== Micro Benchmarks =====

fn bench_singleton_hit(c: &mut Criterion) {
    let mut builder = ScopeBuilder::new();
    builder.with_instance(42u64).as_self();
    let sp = builder.build().unwrap();

    c.bench_function("singleton_hit_u64", |b| {
        b.iter(|| {
            let v = sp.get::<u64>().unwrap();
            black_box(v);
        })
    });
}

fn bench_trait_singleton_hit(c: &mut Criterion) {
    let mut builder = ScopeBuilder::new();
    builder
        .with_factory(|_| Ok(HttpPort))
        .as_trait::<dyn Port>(|p| p as Arc<dyn Port>)
        .as_singleton();
    let sp = builder.build().unwrap();

    c.bench_function("singleton_hit_trait", |b| {
        b.iter(|| {
            let v = sp.get_trait::<dyn Port>().unwrap();
            black_box(v.number());
        })
    });
}

fn bench_transient_with_dependency(c: &mut Criterion) {
    let mut builder = ScopeBuilder::new();
    builder
        .with_factory(|_| Ok(HttpPort))
        .as_trait::<dyn Port>(|p| p as Arc<dyn Port>)
        .as_singleton();
    builder.with_type::<Handler>().as_self();
    let sp = builder.build().unwrap();

    c.bench_function("transient_with_dependency", |b| {
        b.iter(|| {
            let v = sp.get::<Handler>().unwrap();
            black_box(v.port.number());
        })
    });
}

fn bench_open_generic(c: &mut Criterion) {
    struct Order;
    struct Repo {
        entity: TypeKey,
    }

    let mut builder = ScopeBuilder::new();
    builder
        .with_open_type(TypeKey::open("Repo", 1), |ctx| {
            Ok(arg(Repo {
                entity: ctx.type_args()[0].clone(),
            }))
        })
        .as_key(TypeKey::open("IRepo", 1));
    let sp = builder.build().unwrap();
    let request = TypeKey::closed("IRepo", [TypeKey::of::<Order>()]);

    c.bench_function("open_generic_resolve", |b| {
        b.iter(|| {
            let v = sp.get_keyed::<Repo>(&request).unwrap();
            black_box(&v.entity);
        })
    });
}

fn bench_parent_chain_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("parent_chain");

    for depth in [1usize, 4, 16] {
        let mut root = ScopeBuilder::new();
        root.with_instance(7u32).as_self();
        let mut current = root.build().unwrap();
        for _ in 0..depth {
            current = current.create_child_scope().build().unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(depth), &current, |b, sp| {
            b.iter(|| {
                let v = sp.get::<u32>().unwrap();
                black_box(v);
            })
        });
    }

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    c.bench_function("build_ten_singletons", |b| {
        b.iter(|| {
            let mut builder = ScopeBuilder::new();
            builder.with_instance(1u8).as_self();
            builder.with_instance(2u16).as_self();
            builder.with_instance(3u32).as_self();
            builder.with_instance(4u64).as_self();
            builder.with_instance(5i8).as_self();
            builder.with_instance(6i16).as_self();
            builder.with_instance(7i32).as_self();
            builder.with_instance(8i64).as_self();
            builder
                .with_factory(|_| Ok(HttpPort))
                .as_trait::<dyn Port>(|p| p as Arc<dyn Port>)
                .as_singleton();
            builder.with_type::<Handler>().as_self().as_singleton();
            black_box(builder.build().unwrap());
        })
    });
}

criterion_group!(
    benches,
    bench_singleton_hit,
    bench_trait_singleton_hit,
    bench_transient_with_dependency,
    bench_open_generic,
    bench_parent_chain_depth,
    bench_build
);
criterion_main!(benches);
