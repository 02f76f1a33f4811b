//! Cross-thread coordination of singleton construction.
//!
//! A singleton is built by exactly one thread. Other threads asking for it
//! wait until the build ends, unless waiting would close a cycle through
//! builds already in flight on other threads, in which case they fail with
//! [`DiError::Circular`] instead of blocking forever.

use std::collections::HashMap;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};

use super::circular;
use crate::error::{DiError, DiResult};

#[derive(Default)]
struct State {
    /// Entry id -> thread building it, plus the service name for reports.
    building: HashMap<u64, (ThreadId, &'static str)>,
    /// Thread -> entry id it is blocked on.
    waiting: HashMap<ThreadId, u64>,
}

impl State {
    /// Names along the wait chain starting at `id`, if it leads back to `me`.
    fn cycle_through(&self, id: u64, me: ThreadId) -> Option<Vec<&'static str>> {
        let mut chain = Vec::new();
        let mut next = id;
        // Every hop visits a distinct blocked thread, so this terminates.
        for _ in 0..=self.waiting.len() {
            let (owner, _) = *self.building.get(&next)?;
            next = *self.waiting.get(&owner)?;
            let (holder, name) = *self.building.get(&next)?;
            chain.push(name);
            if holder == me {
                return Some(chain);
            }
        }
        None
    }
}

#[derive(Default)]
pub(crate) struct BuildTable {
    state: Mutex<State>,
    finished: Condvar,
}

/// Held by the thread building an entry; releases the claim on drop.
pub(crate) struct BuildClaim<'a> {
    table: &'a BuildTable,
    id: u64,
}

impl Drop for BuildClaim<'_> {
    fn drop(&mut self) {
        self.table.state.lock().building.remove(&self.id);
        self.table.finished.notify_all();
    }
}

impl BuildTable {
    /// Claims the build of entry `id`.
    ///
    /// Returns `None` once `is_ready` reports that another thread finished
    /// the build. `is_ready` is checked under the table lock.
    pub(crate) fn claim(
        &self,
        id: u64,
        name: &'static str,
        is_ready: impl Fn() -> bool,
    ) -> DiResult<Option<BuildClaim<'_>>> {
        let me = thread::current().id();
        let mut state = self.state.lock();
        loop {
            if is_ready() {
                return Ok(None);
            }
            let owner = match state.building.get(&id) {
                None => {
                    state.building.insert(id, (me, name));
                    return Ok(Some(BuildClaim { table: self, id }));
                }
                Some((owner, _)) => *owner,
            };
            if owner == me {
                // Re-entry on this thread is reported by the resolution stack
                // before getting here; treat a stray one the same way.
                return Err(DiError::Circular(circular::current_path()));
            }
            if let Some(chain) = state.cycle_through(id, me) {
                let mut path = circular::current_path();
                path.extend(chain);
                return Err(DiError::Circular(path));
            }

            state.waiting.insert(me, id);
            self.finished.wait(&mut state);
            state.waiting.remove(&me);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn first_claim_wins_and_release_frees_the_entry() {
        let table = BuildTable::default();
        let claim = table.claim(1, "A", || false).unwrap();
        assert!(claim.is_some());
        drop(claim);
        assert!(table.claim(1, "A", || false).unwrap().is_some());
    }

    #[test]
    fn ready_entries_are_not_claimed() {
        let table = BuildTable::default();
        assert!(table.claim(1, "A", || true).unwrap().is_none());
    }

    #[test]
    fn waiter_sees_finished_build() {
        let table = BuildTable::default();
        let ready = AtomicBool::new(false);

        crossbeam_utils::thread::scope(|s| {
            let claim = table.claim(7, "A", || false).unwrap();
            let waiter = s.spawn(|_| table.claim(7, "A", || ready.load(Ordering::SeqCst)).map(|c| c.is_none()));
            ready.store(true, Ordering::SeqCst);
            drop(claim);
            assert!(waiter.join().unwrap().unwrap());
        })
        .unwrap();
    }
}
