/// Concurrent access integration tests
///
/// Many units of work run at once, each with its own scope, against one
/// shared root container.

use service_bridge::{DiResult, Dispose, Injectable, Lifetime, Resolver, ResolverContext, ServiceCollection};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};

const THREADS: usize = 8;
const REQUESTS_PER_THREAD: usize = 25;

struct Counters {
    built: AtomicUsize,
    disposed: AtomicUsize,
}

struct SharedCache;

struct Session {
    id: usize,
    counters: Arc<Counters>,
    cache: Arc<SharedCache>,
}

impl Injectable for Session {
    fn construct(r: &ResolverContext) -> DiResult<Self> {
        let counters = r.get::<Counters>()?;
        Ok(Session {
            id: counters.built.fetch_add(1, Ordering::SeqCst),
            counters,
            cache: r.get::<SharedCache>()?,
        })
    }

    fn disposable(this: Arc<Self>) -> Option<Arc<dyn Dispose>> {
        Some(this)
    }
}

impl Dispose for Session {
    fn dispose(&self) {
        self.counters.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

fn services(counters: &Arc<Counters>) -> ServiceCollection {
    let mut sc = ServiceCollection::new();
    sc.add_instance(counters.clone());
    sc.add_factory::<SharedCache, _>(Lifetime::Singleton, |_| Ok(Arc::new(SharedCache)));
    sc.add_scoped::<Session>();
    sc
}

#[test]
fn test_concurrent_scopes_are_isolated() {
    let counters = Arc::new(Counters {
        built: AtomicUsize::new(0),
        disposed: AtomicUsize::new(0),
    });
    let bridge = services(&counters).build().unwrap();
    let factory = bridge.scope_factory();
    let seen = Mutex::new(HashSet::new());
    let caches = Mutex::new(Vec::new());

    crossbeam_utils::thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|_| {
                for _ in 0..REQUESTS_PER_THREAD {
                    let scope = factory.create_scope().unwrap();
                    let first = scope.provider().get_required::<Session>().unwrap();
                    let second = scope.provider().get_required::<Session>().unwrap();
                    assert!(Arc::ptr_eq(&first, &second));

                    assert!(seen.lock().unwrap().insert(first.id));
                    caches.lock().unwrap().push(first.cache.clone());
                }
            });
        }
    })
    .unwrap();

    let total = THREADS * REQUESTS_PER_THREAD;
    assert_eq!(seen.lock().unwrap().len(), total);
    assert_eq!(counters.built.load(Ordering::SeqCst), total);
    assert_eq!(counters.disposed.load(Ordering::SeqCst), total);

    let caches = caches.into_inner().unwrap();
    assert!(caches.iter().all(|c| Arc::ptr_eq(c, &caches[0])));
}

#[test]
fn test_singleton_built_once_under_contention() {
    let built = Arc::new(AtomicUsize::new(0));
    let built_clone = built.clone();

    let mut sc = ServiceCollection::new();
    sc.add_factory::<String, _>(Lifetime::Singleton, move |_| {
        built_clone.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(5));
        Ok(Arc::new("expensive".to_string()))
    });
    let bridge = sc.build().unwrap();
    let barrier = Barrier::new(THREADS);

    let results: Vec<Arc<String>> = crossbeam_utils::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|_| {
                    barrier.wait();
                    let scope = bridge.scope_factory().create_scope().unwrap();
                    scope.provider().get_required::<String>().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
}
