//! Render cache that honours invalidation signals.

use crate::view::invalidation::{InvalidationBus, ViewScope};
use std::collections::BTreeMap;

/// Per-key cache of rendered values for one [`ViewScope`].
///
/// An entry is served only while the bus generation for the scope is the one
/// it was built at; otherwise the loader runs again.
pub struct ViewCache<K: Ord, V> {
    bus: InvalidationBus,
    scope: ViewScope,
    entries: BTreeMap<K, (u64, V)>,
}

impl<K: Ord, V: Clone> ViewCache<K, V> {
    pub fn new(bus: InvalidationBus, scope: ViewScope) -> Self {
        Self {
            bus,
            scope,
            entries: BTreeMap::new(),
        }
    }

    /// Returns the cached value for `key`, reloading it when stale.
    ///
    /// Every reload first drops all entries built before the current
    /// generation, so the cache only holds keys rendered since the last
    /// invalidation. A failed load is not cached.
    pub fn get_or_load<E>(&mut self, key: K, load: impl FnOnce() -> Result<V, E>) -> Result<V, E> {
        let generation = self.bus.generation(self.scope);
        if let Some((built_at, value)) = self.entries.get(&key) {
            if *built_at == generation {
                return Ok(value.clone());
            }
        }

        self.entries.retain(|_, (built_at, _)| *built_at == generation);
        let value = load()?;
        self.entries.insert(key, (generation, value.clone()));
        Ok(value)
    }

    /// Whether `key` would be served without reloading.
    pub fn is_fresh(&self, key: &K) -> bool {
        let generation = self.bus.generation(self.scope);
        self.entries
            .get(key)
            .is_some_and(|(built_at, _)| *built_at == generation)
    }
}
