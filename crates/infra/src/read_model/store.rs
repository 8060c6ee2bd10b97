use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

/// Key/value store abstraction for read models.
///
/// `list` returns values in first-insertion order. Replacing a value keeps its
/// position.
pub trait ReadStore<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;

    /// Insert `value`, or replace the existing one when `replace(existing, &value)`
    /// holds. The check and the write are atomic. Returns whether the store changed.
    fn upsert_if(&self, key: K, value: V, replace: fn(&V, &V) -> bool) -> bool;

    fn list(&self) -> Vec<V>;

    fn upsert(&self, key: K, value: V) {
        self.upsert_if(key, value, |_, _| true);
    }
}

impl<K, V, S> ReadStore<K, V> for Arc<S>
where
    S: ReadStore<K, V> + ?Sized,
{
    fn get(&self, key: &K) -> Option<V> {
        (**self).get(key)
    }

    fn upsert_if(&self, key: K, value: V, replace: fn(&V, &V) -> bool) -> bool {
        (**self).upsert_if(key, value, replace)
    }

    fn list(&self) -> Vec<V> {
        (**self).list()
    }
}

#[derive(Debug)]
struct Entries<K, V> {
    index: HashMap<K, usize>,
    values: Vec<V>,
}

/// In-memory read store.
///
/// Values are replaced whole under the write lock, so readers always see a
/// complete value. A poisoned lock is recovered since no write leaves an
/// entry half-updated.
#[derive(Debug)]
pub struct InMemoryReadStore<K, V> {
    inner: RwLock<Entries<K, V>>,
}

impl<K, V> InMemoryReadStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Entries {
                index: HashMap::new(),
                values: Vec::new(),
            }),
        }
    }
}

impl<K, V> Default for InMemoryReadStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ReadStore<K, V> for InMemoryReadStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Option<V> {
        let entries = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        entries.index.get(key).map(|&i| entries.values[i].clone())
    }

    fn upsert_if(&self, key: K, value: V, replace: fn(&V, &V) -> bool) -> bool {
        let mut entries = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match entries.index.get(&key).copied() {
            Some(i) => {
                if replace(&entries.values[i], &value) {
                    entries.values[i] = value;
                    true
                } else {
                    false
                }
            }
            None => {
                let i = entries.values.len();
                entries.values.push(value);
                entries.index.insert(key, i);
                true
            }
        }
    }

    fn list(&self) -> Vec<V> {
        let entries = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        entries.values.clone()
    }
}
