use service_bridge::{
    ContainerOptions, DiResult, Dispose, Injectable, Lifetime, Resolver, ResolverContext, ServiceCollection,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

struct Tracked {
    name: &'static str,
    log: Log,
}

impl Dispose for Tracked {
    fn dispose(&self) {
        self.log.lock().unwrap().push(format!("dispose:{}", self.name));
    }
}

fn tracked_factory(sc: &mut ServiceCollection, lifetime: Lifetime, name: &'static str, log: &Log) {
    let log = log.clone();
    sc.add_factory::<Tracked, _>(lifetime, move |sp| {
        let tracked = Arc::new(Tracked { name, log: log.clone() });
        sp.register_disposer(tracked.clone())?;
        Ok(tracked)
    });
}

#[test]
fn test_scope_disposes_in_reverse_order() {
    let log: Log = Arc::default();
    struct First;
    struct Second;

    let mut sc = ServiceCollection::new();
    {
        let log = log.clone();
        sc.add_factory::<First, _>(Lifetime::Scoped, move |sp| {
            sp.register_disposer(Arc::new(Tracked { name: "first", log: log.clone() }))?;
            Ok(Arc::new(First))
        });
    }
    {
        let log = log.clone();
        sc.add_factory::<Second, _>(Lifetime::Scoped, move |sp| {
            sp.register_disposer(Arc::new(Tracked { name: "second", log: log.clone() }))?;
            Ok(Arc::new(Second))
        });
    }

    let bridge = sc.build().unwrap();
    let scope = bridge.scope_factory().create_scope().unwrap();
    scope.provider().get_required::<First>().unwrap();
    scope.provider().get_required::<Second>().unwrap();

    assert!(scope.dispose());
    assert_eq!(*log.lock().unwrap(), vec!["dispose:second", "dispose:first"]);
}

#[test]
fn test_double_dispose_is_noop() {
    let log: Log = Arc::default();
    let mut sc = ServiceCollection::new();
    tracked_factory(&mut sc, Lifetime::Scoped, "scoped", &log);

    let bridge = sc.build().unwrap();
    let scope = bridge.scope_factory().create_scope().unwrap();
    scope.provider().get_required::<Tracked>().unwrap();

    assert!(scope.dispose());
    assert!(!scope.dispose());
    drop(scope);
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[test]
fn test_scope_dispose_leaves_root_and_siblings_alone() {
    let log: Log = Arc::default();
    let mut sc = ServiceCollection::new();
    tracked_factory(&mut sc, Lifetime::Scoped, "scoped", &log);

    let bridge = sc.build().unwrap();
    let a = bridge.scope_factory().create_scope().unwrap();
    let b = bridge.scope_factory().create_scope().unwrap();
    a.provider().get_required::<Tracked>().unwrap();
    b.provider().get_required::<Tracked>().unwrap();

    a.dispose();
    assert_eq!(log.lock().unwrap().len(), 1);
    assert!(!b.is_disposed());
    assert!(b.provider().get_required::<Tracked>().is_ok());
    assert!(!bridge.root_provider().is_disposed());
}

#[test]
fn test_singletons_released_with_root() {
    let log: Log = Arc::default();
    let mut sc = ServiceCollection::new();
    tracked_factory(&mut sc, Lifetime::Singleton, "singleton", &log);

    let bridge = sc.build().unwrap();
    let scope = bridge.scope_factory().create_scope().unwrap();
    scope.provider().get_required::<Tracked>().unwrap();

    // A scope never owns a singleton.
    scope.dispose();
    assert!(log.lock().unwrap().is_empty());

    assert!(bridge.shutdown());
    assert_eq!(*log.lock().unwrap(), vec!["dispose:singleton"]);
    assert!(!bridge.shutdown());
}

#[test]
fn test_instances_are_never_disposed() {
    struct External {
        disposed: AtomicBool,
    }
    impl Dispose for External {
        fn dispose(&self) {
            self.disposed.store(true, Ordering::SeqCst);
        }
    }

    let external = Arc::new(External { disposed: AtomicBool::new(false) });
    let mut sc = ServiceCollection::new();
    sc.add_instance(external.clone());

    let bridge = sc.build().unwrap();
    let scope = bridge.scope_factory().create_scope().unwrap();
    let resolved = scope.provider().get_required::<External>().unwrap();
    assert!(Arc::ptr_eq(&resolved, &external));

    scope.dispose();
    bridge.shutdown();
    assert!(!external.disposed.load(Ordering::SeqCst));
}

struct Connection {
    closed: Arc<AtomicUsize>,
}

impl Dispose for Connection {
    fn dispose(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl Injectable for Connection {
    fn construct(r: &ResolverContext) -> DiResult<Self> {
        Ok(Connection {
            closed: r.get::<AtomicUsize>()?,
        })
    }

    fn disposable(this: Arc<Self>) -> Option<Arc<dyn Dispose>> {
        Some(this)
    }
}

#[test]
fn test_disposable_transients_tracked_by_scope() {
    let closed = Arc::new(AtomicUsize::new(0));
    let mut sc = ServiceCollection::new();
    sc.add_instance(closed.clone());
    sc.add_transient::<Connection>();

    let bridge = sc.build().unwrap();
    let scope = bridge.scope_factory().create_scope().unwrap();
    for _ in 0..3 {
        scope.provider().get_required::<Connection>().unwrap();
    }
    assert_eq!(closed.load(Ordering::SeqCst), 0);

    scope.dispose();
    assert_eq!(closed.load(Ordering::SeqCst), 3);
}

#[test]
fn test_transient_tracking_can_be_disabled() {
    let closed = Arc::new(AtomicUsize::new(0));
    let mut sc = ServiceCollection::new();
    sc.add_instance(closed.clone());
    sc.add_transient::<Connection>();

    let bridge = sc
        .build_with(ContainerOptions::default().with_disposable_transient_tracking(false))
        .unwrap();
    let scope = bridge.scope_factory().create_scope().unwrap();
    scope.provider().get_required::<Connection>().unwrap();

    scope.dispose();
    assert_eq!(closed.load(Ordering::SeqCst), 0);
}

#[test]
fn test_scoped_injectable_disposed_once() {
    let closed = Arc::new(AtomicUsize::new(0));
    let mut sc = ServiceCollection::new();
    sc.add_instance(closed.clone());
    sc.add_scoped::<Connection>();

    let bridge = sc.build().unwrap();
    let scope = bridge.scope_factory().create_scope().unwrap();
    let a = scope.provider().get_required::<Connection>().unwrap();
    let b = scope.provider().get_required::<Connection>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    drop(scope);
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}
