//! Re-entrance trap for recursive inference.

use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashSet;

/// Outcome of [`CycleGuard::guard`].
#[derive(Debug, PartialEq, Eq)]
pub enum Guarded<R> {
    /// The action ran without looping back to the key.
    Completed(R),
    /// The action ran, but something inside it asked for the key again and
    /// was given a stand-in answer. The caller reports the cycle.
    Cyclic(R),
    /// The key was already being computed further up the stack.
    Reentered,
}

/// Visited set of entities whose inference is in progress.
///
/// The outermost computation of an entity goes through [`guard`](Self::guard);
/// queries that need the entity's result call [`intercept`](Self::intercept)
/// first and substitute a stand-in when it reports a cycle. No borrow is held
/// while the guarded action runs, so actions may nest freely.
#[derive(Debug)]
pub struct CycleGuard<K> {
    active: RefCell<Vec<K>>,
    trapped: RefCell<FxHashSet<K>>,
}

impl<K> Default for CycleGuard<K> {
    fn default() -> Self {
        CycleGuard {
            active: RefCell::new(Vec::new()),
            trapped: RefCell::new(FxHashSet::default()),
        }
    }
}

impl<K: Copy + Eq + Hash + Debug> CycleGuard<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guard<R>(&self, key: K, action: impl FnOnce() -> R) -> Guarded<R> {
        if self.intercept(key) {
            return Guarded::Reentered;
        }
        self.active.borrow_mut().push(key);
        let result = action();
        self.active.borrow_mut().retain(|k| *k != key);
        if self.trapped.borrow_mut().remove(&key) {
            Guarded::Cyclic(result)
        } else {
            Guarded::Completed(result)
        }
    }

    /// Returns `true`, and marks the running computation as cyclic, when
    /// `key` is already being computed.
    pub fn intercept(&self, key: K) -> bool {
        if !self.is_active(key) {
            return false;
        }
        tracing::warn!(?key, "cyclic inference trapped");
        self.trapped.borrow_mut().insert(key);
        true
    }

    pub fn is_active(&self, key: K) -> bool {
        self.active.borrow().contains(&key)
    }
}
