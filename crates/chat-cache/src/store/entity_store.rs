//! Concurrent keyed store for one entity class
//!
//! Values are stored behind `Arc` and never mutated in place: an update swaps the `Arc`,
//! so readers holding an older value keep a consistent snapshot.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Concurrent map of fully constructed entities
pub struct EntityStore<K, V> {
    entries: DashMap<K, Arc<V>>,
}

impl<K, V> EntityStore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Get an entity by key
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key).map(|r| Arc::clone(r.value()))
    }

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace an entity, returning the previous value
    pub fn put(&self, key: K, value: V) -> Option<Arc<V>> {
        self.entries.insert(key, Arc::new(value))
    }

    /// Insert an already shared entity, returning the previous value
    pub fn put_arc(&self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        self.entries.insert(key, value)
    }

    /// Remove an entity, returning it if it was present
    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    /// Get the entity for `key`, constructing it with `build` when absent
    ///
    /// The shard holding `key` stays write-locked while `build` runs, so concurrent misses
    /// on the same key construct the entity once and every caller gets the same `Arc`.
    /// `build` must not access this store.
    pub fn compute_if_absent(&self, key: K, build: impl FnOnce() -> V) -> Arc<V> {
        if let Some(existing) = self.get(&key) {
            return existing;
        }

        Arc::clone(self.entries.entry(key).or_insert_with(|| Arc::new(build())).value())
    }

    /// Fallible [`compute_if_absent`](Self::compute_if_absent); nothing is cached on error
    pub fn try_compute_if_absent<E>(
        &self,
        key: K,
        build: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(existing) = self.get(&key) {
            return Ok(existing);
        }

        match self.entries.entry(key) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let value = Arc::new(build()?);
                entry.insert(Arc::clone(&value));
                Ok(value)
            }
        }
    }

    /// Replace an existing entity with `update(old)`
    ///
    /// Returns `(old, new)`. The old value is captured under the same lock that
    /// installs the new one, so no concurrent writer can slip in between.
    pub fn replace_with(
        &self,
        key: &K,
        update: impl FnOnce(&V) -> V,
    ) -> Option<(Arc<V>, Arc<V>)> {
        let mut slot = self.entries.get_mut(key)?;
        let old = Arc::clone(slot.value());
        let new = Arc::new(update(&old));
        *slot.value_mut() = Arc::clone(&new);
        Some((old, new))
    }

    /// Remove every entity matching `pred`, returning the removed values
    pub fn remove_where(&self, mut pred: impl FnMut(&K, &V) -> bool) -> Vec<Arc<V>> {
        let mut removed = Vec::new();
        self.entries.retain(|k, v| {
            if pred(k, v) {
                removed.push(Arc::clone(v));
                false
            } else {
                true
            }
        });
        removed
    }

    /// Keep only entities matching `pred`
    pub fn retain(&self, mut pred: impl FnMut(&K, &V) -> bool) {
        self.entries.retain(|k, v| pred(k, v));
    }

    /// Snapshot of all entities matching `pred`
    pub fn filter(&self, mut pred: impl FnMut(&V) -> bool) -> Vec<Arc<V>> {
        self.entries
            .iter()
            .filter(|r| pred(r.value()))
            .map(|r| Arc::clone(r.value()))
            .collect()
    }

    /// Snapshot of all entities
    pub fn values(&self) -> Vec<Arc<V>> {
        self.entries.iter().map(|r| Arc::clone(r.value())).collect()
    }

    pub fn keys(&self) -> Vec<K> {
        self.entries.iter().map(|r| r.key().clone()).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<K, V> Default for EntityStore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for EntityStore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("len", &self.entries.len())
            .finish()
    }
}
