/// Warning output of the root scope fallback

use service_bridge::{DiResult, Injectable, ResolverContext, ServiceCollection};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

#[derive(Clone, Default)]
struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn count_warnings(f: impl FnOnce()) -> usize {
    let counter = WarnCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    tracing::subscriber::with_default(subscriber, f);
    counter.0.load(Ordering::SeqCst)
}

struct Session;

impl Injectable for Session {
    fn construct(_: &ResolverContext) -> DiResult<Self> {
        Ok(Session)
    }
}

#[test]
fn test_bridge_startup_is_quiet() {
    let warnings = count_warnings(|| {
        let bridge = ServiceCollection::new().build().unwrap();
        bridge.scope_factory().create_scope().unwrap().dispose();
        bridge.shutdown();
    });
    assert_eq!(warnings, 0);
}

#[test]
fn test_user_scoped_service_at_root_warns_once() {
    let warnings = count_warnings(|| {
        let mut sc = ServiceCollection::new();
        sc.add_scoped::<Session>();
        let bridge = sc.build().unwrap();
        let sp = bridge.root_provider();
        sp.get_required::<Session>().unwrap();
        sp.get_required::<Session>().unwrap();
        bridge.shutdown();
    });
    assert_eq!(warnings, 1);
}
