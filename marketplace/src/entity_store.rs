//! Keyed collection for one entity kind.

use std::collections::BTreeMap;

/// Primary-key map for one kind of entity
///
/// Iteration is in ascending key order, so listings are stable between
/// calls with no intervening writes. There is no secondary indexing: any
/// filtered listing is a full scan.
#[derive(Debug, Clone)]
pub struct EntityStore<K: Ord, V> {
    entries: BTreeMap<K, V>,
}

impl<K: Ord, V> Default for EntityStore<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord, V> EntityStore<K, V> {
    /// Creates an empty store
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Inserts or replaces an entity, returning the previous value
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    /// Reads an entity
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Mutable access to an entity
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Whether an entity exists
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes an entity, returning it
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    /// All entities in key order
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    /// Number of entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Clamp a `(start, limit)` window over a sequence of `len` items
///
/// `end = min(start + limit, len)`; a start at or past the end yields an
/// empty range rather than an error.
#[must_use]
pub fn page_bounds(start: usize, limit: usize, len: usize) -> std::ops::Range<usize> {
    if start >= len {
        return len..len;
    }
    start..start.saturating_add(limit).min(len)
}
