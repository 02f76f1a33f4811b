//! Internal disposal bag for managing cleanup hooks.

use std::sync::Arc;

use crate::traits::Dispose;

/// Disposables owned by one scope, released in LIFO order.
#[derive(Default)]
pub(crate) struct DisposeBag {
    items: Vec<Arc<dyn Dispose>>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, item: Arc<dyn Dispose>) {
        self.items.push(item);
    }

    /// Takes every pending disposable, most recent first.
    ///
    /// Callers run the returned items after releasing the bag's lock so that
    /// a disposer touching the container cannot deadlock.
    pub(crate) fn drain_reverse(&mut self) -> Vec<Arc<dyn Dispose>> {
        let mut items = std::mem::take(&mut self.items);
        items.reverse();
        items
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
