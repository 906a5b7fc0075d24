//! Pattern validation cache.
//!
//! Validation results are memoized per original input string. The store is
//! behind [`PatternCache`] so the validator does not care whether it is
//! bounded.

use std::collections::{BTreeMap, HashMap};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::compiler::CompileOptions;

/// Default capacity of the bounded cache.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Cache key: the pattern as the caller passed it, before preprocessing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternKey {
    pub pattern: String,
    pub options: CompileOptions,
}

impl PatternKey {
    pub fn new(pattern: impl Into<String>, options: CompileOptions) -> Self {
        Self {
            pattern: pattern.into(),
            options,
        }
    }
}

/// A thread-safe store of pass/fail results.
pub trait PatternCache: Send + Sync {
    fn get(&self, key: &PatternKey) -> Option<bool>;

    /// Record a result. A key that is already present keeps its value.
    fn insert(&self, key: PatternKey, valid: bool);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);

    /// Maximum number of entries, `None` when unbounded.
    fn capacity(&self) -> Option<usize> {
        None
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of stored results.
    pub entries: usize,
    /// Maximum number of entries, `None` when unbounded.
    pub capacity: Option<usize>,
}

/// Cache without eviction.
#[derive(Debug, Default)]
pub struct UnboundedCache {
    entries: DashMap<PatternKey, bool>,
}

impl UnboundedCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PatternCache for UnboundedCache {
    fn get(&self, key: &PatternKey) -> Option<bool> {
        self.entries.get(key).map(|entry| *entry)
    }

    fn insert(&self, key: PatternKey, valid: bool) {
        self.entries.entry(key).or_insert(valid);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&self) {
        self.entries.clear();
    }
}

struct LruState {
    /// Value and last-use tick per key.
    entries: HashMap<PatternKey, (bool, u64)>,
    /// Keys ordered by last use.
    order: BTreeMap<u64, PatternKey>,
    tick: u64,
}

impl LruState {
    fn touch(&mut self, key: &PatternKey) -> Option<bool> {
        self.tick += 1;
        let tick = self.tick;
        let (valid, last) = self.entries.get_mut(key)?;
        self.order.remove(&*last);
        *last = tick;
        self.order.insert(tick, key.clone());
        Some(*valid)
    }
}

/// Least-recently-used cache with a fixed capacity.
pub struct LruCache {
    capacity: usize,
    state: Mutex<LruState>,
}

impl LruCache {
    /// Create a cache holding at most `capacity` entries (minimum one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(LruState {
                entries: HashMap::new(),
                order: BTreeMap::new(),
                tick: 0,
            }),
        }
    }
}

impl Default for LruCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PatternCache for LruCache {
    fn get(&self, key: &PatternKey) -> Option<bool> {
        self.state.lock().touch(key)
    }

    fn insert(&self, key: PatternKey, valid: bool) {
        let mut state = self.state.lock();
        if state.touch(&key).is_some() {
            return;
        }

        if state.entries.len() >= self.capacity {
            if let Some((_, oldest)) = state.order.pop_first() {
                state.entries.remove(&oldest);
            }
        }

        state.tick += 1;
        let tick = state.tick;
        state.order.insert(tick, key.clone());
        state.entries.insert(key, (valid, tick));
    }

    fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.order.clear();
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.capacity)
    }
}
