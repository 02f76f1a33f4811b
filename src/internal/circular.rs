//! Circular dependency and depth detection.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};

// Per-thread stack of services currently under construction.
thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

/// Pops the service pushed by [`enter`] when construction ends, on every path.
pub(crate) struct StackGuard {
    name: &'static str,
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(popped, Some(self.name));
        });
    }
}

/// Marks `name` as under construction on this thread.
pub(crate) fn enter(name: &'static str, max_depth: usize) -> DiResult<StackGuard> {
    RESOLUTION_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();

        if stack.iter().any(|&n| n == name) {
            let mut path = stack.clone();
            path.push(name);
            return Err(DiError::Circular(path));
        }
        if stack.len() >= max_depth {
            return Err(DiError::DepthExceeded(stack.len()));
        }

        stack.push(name);
        Ok(StackGuard { name })
    })
}

/// Services under construction on this thread, outermost first.
pub(crate) fn current_path() -> Vec<&'static str> {
    RESOLUTION_STACK.with(|stack| stack.borrow().clone())
}

/// Runs a constructor with circular dependency detection.
pub(crate) fn with_circular_check<T, F>(name: &'static str, max_depth: usize, f: F) -> DiResult<T>
where
    F: FnOnce() -> DiResult<T>,
{
    let _guard = enter(name, max_depth)?;
    f()
}
