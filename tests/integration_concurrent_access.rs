/// Concurrent access integration tests
///
/// A built container is shared read-only across threads; these tests verify
/// that singletons stay unique and transients stay distinct under contention.

use scoped_di::{Activation, DiResult, Injectable, Resolver, ScopeBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

// ===== Test Services =====

static COUNTERS_BUILT: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug)]
struct CounterService {
    count: AtomicUsize,
}

impl CounterService {
    fn increment(&self) -> usize {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Injectable for CounterService {
    fn construct(_: &mut Activation<'_>) -> DiResult<Self> {
        COUNTERS_BUILT.fetch_add(1, Ordering::SeqCst);
        Ok(CounterService {
            count: AtomicUsize::new(0),
        })
    }
}

struct Worker {
    counter: Arc<CounterService>,
}

impl Injectable for Worker {
    fn construct(ctx: &mut Activation<'_>) -> DiResult<Self> {
        Ok(Worker {
            counter: ctx.get::<CounterService>()?,
        })
    }
}

// ===== Tests =====

#[test]
fn test_concurrent_singleton_access() {
    let mut builder = ScopeBuilder::new();
    builder.with_type::<CounterService>().as_self().as_singleton();
    builder.with_type::<Worker>().as_self();
    let sp = builder.build().unwrap();
    assert_eq!(COUNTERS_BUILT.load(Ordering::SeqCst), 1);

    let threads = 8;
    let per_thread = 100;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let sp = sp.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let mut workers = Vec::with_capacity(per_thread);
                for _ in 0..per_thread {
                    let worker = sp.get_required::<Worker>();
                    worker.counter.increment();
                    workers.push(worker);
                }
                workers
            })
        })
        .collect();

    let singleton = sp.get_required::<CounterService>();
    let mut all_workers = Vec::new();
    for handle in handles {
        all_workers.extend(handle.join().unwrap());
    }

    assert_eq!(COUNTERS_BUILT.load(Ordering::SeqCst), 1);
    assert_eq!(singleton.count.load(Ordering::SeqCst), threads * per_thread);
    assert!(all_workers.iter().all(|w| Arc::ptr_eq(&w.counter, &singleton)));

    for (i, a) in all_workers.iter().enumerate().take(16) {
        for b in all_workers.iter().skip(i + 1).take(16) {
            assert!(!Arc::ptr_eq(a, b));
        }
    }
}

#[test]
fn test_concurrent_child_scopes() {
    let mut root = ScopeBuilder::new();
    root.with_instance(String::from("shared")).as_self();
    let root = root.build().unwrap();

    let threads = 6;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let root = root.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let mut child = root.create_child_scope();
                child.with_instance(i).as_self();
                let child = child.build().unwrap();

                let shared = child.get_required::<String>();
                let own = child.get_required::<usize>();
                (shared, *own, i)
            })
        })
        .collect();

    let root_shared = root.get_required::<String>();
    for handle in handles {
        let (shared, own, i) = handle.join().unwrap();
        assert!(Arc::ptr_eq(&shared, &root_shared));
        assert_eq!(own, i);
    }
    assert!(root.try_get::<usize>().unwrap().is_none());
}
