//! A concurrent, per-key, compute-once memoization map.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;

/// Maps keys to lazily computed, write-once values.
///
/// For a given key the init closure runs at most once for the lifetime of the
/// map, no matter how many callers race on it: concurrent callers for the
/// same key block until the single in-flight computation finishes and then
/// all observe the identical result. Failures are ordinary values here, so a
/// memoized error is replayed the same way a memoized success is.
///
/// The outer lock is held only to fetch or insert the per-key cell, never
/// while computing, so computations for distinct keys run in parallel.
///
/// There is no eviction; entries live as long as the map.
pub(crate) struct OnceMap<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K: Eq + Hash, V: Clone> OnceMap<K, V> {
    pub fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the memoized value for `key`, computing it with `init` if this
    /// is the first request for the key.
    pub fn get_or_init(&self, key: K, init: impl FnOnce() -> V) -> V {
        let cell = {
            let mut cells = self.cells.lock().expect("once map mutex poisoned");
            Arc::clone(cells.entry(key).or_default())
        };
        cell.get_or_init(init).clone()
    }
}
