use service_bridge::{
    DiResult, Injectable, Lifetime, Resolver, ResolverContext, ScopeFactory, ScopedProvider, ServiceCollection,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait ServiceA: Send + Sync {
    fn id(&self) -> usize;
    fn partner(&self) -> &str;
}

trait ServiceB: Send + Sync {
    fn label(&self) -> &str;
}

static NEXT_A: AtomicUsize = AtomicUsize::new(0);

struct ImplA {
    id: usize,
    b: Arc<dyn ServiceB>,
}

impl ServiceA for ImplA {
    fn id(&self) -> usize {
        self.id
    }

    fn partner(&self) -> &str {
        self.b.label()
    }
}

impl Injectable for ImplA {
    fn construct(r: &ResolverContext) -> DiResult<Self> {
        Ok(ImplA {
            id: NEXT_A.fetch_add(1, Ordering::SeqCst),
            b: r.get::<dyn ServiceB>()?,
        })
    }
}

struct ExistingB;

impl ServiceB for ExistingB {
    fn label(&self) -> &str {
        "existing"
    }
}

#[test]
fn test_transient_type_and_singleton_instance() {
    let existing_b: Arc<dyn ServiceB> = Arc::new(ExistingB);

    let mut sc = ServiceCollection::new();
    sc.add_implementation_as::<dyn ServiceA, ImplA>(Lifetime::Transient, |a| a);
    sc.add_instance::<dyn ServiceB>(existing_b.clone());

    let bridge = sc.build().unwrap();
    let sp = bridge.root_provider();

    let a1 = sp.get_required::<dyn ServiceA>().unwrap();
    let a2 = sp.get_required::<dyn ServiceA>().unwrap();
    assert!(!Arc::ptr_eq(&a1, &a2));
    assert_ne!(a1.id(), a2.id());
    assert_eq!(a1.partner(), "existing");

    let b1 = sp.get_required::<dyn ServiceB>().unwrap();
    let b2 = sp.get_required::<dyn ServiceB>().unwrap();
    assert!(Arc::ptr_eq(&b1, &existing_b));
    assert!(Arc::ptr_eq(&b2, &existing_b));
    assert_eq!(b1.label(), "existing");
}

#[test]
fn test_unit_of_work_lifecycle() {
    struct RequestState {
        path: String,
    }

    struct Handler {
        state: Arc<RequestState>,
    }

    impl Injectable for Handler {
        fn construct(r: &ResolverContext) -> DiResult<Self> {
            Ok(Handler { state: r.get::<RequestState>()? })
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_factory::<RequestState, _>(Lifetime::Scoped, |_| {
        Ok(Arc::new(RequestState { path: "/users".to_string() }))
    });
    sc.add_transient::<Handler>();

    let bridge = sc.build().unwrap();

    // The framework resolves its infrastructure from the root provider.
    let factory = bridge.root_provider().get_required::<ScopeFactory>().unwrap();
    let scope = factory.create_scope().unwrap();

    let provider = scope.provider().get_required::<ScopedProvider>().unwrap();
    assert!(!provider.is_root());

    let h1 = provider.get_required::<Handler>().unwrap();
    let h2 = scope.provider().get_required::<Handler>().unwrap();
    assert!(!Arc::ptr_eq(&h1, &h2));
    assert!(Arc::ptr_eq(&h1.state, &h2.state));
    assert_eq!(h1.state.path, "/users");

    assert!(scope.dispose());
    assert!(provider.is_disposed());
}
