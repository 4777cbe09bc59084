//! Cached function wrapper for expensive function evaluations

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// A wrapper that caches function evaluations
///
/// Every distinct key reaches the wrapped function at most once, so
/// `num_evals` is the number of distinct oracle calls.
#[derive(Debug)]
pub struct CachedFunction<K, V, F>
where
    K: Clone + Eq + Hash,
    V: Clone,
    F: Fn(&K) -> V,
{
    func: F,
    cache: HashMap<K, V>,
    num_evals: usize,
}

impl<K, V, F> CachedFunction<K, V, F>
where
    K: Clone + Eq + Hash,
    V: Clone,
    F: Fn(&K) -> V,
{
    /// Create a new cached function wrapper
    pub fn new(func: F) -> Self {
        Self {
            func,
            cache: HashMap::new(),
            num_evals: 0,
        }
    }

    /// Evaluate many keys, sending only the distinct uncached ones to
    /// `batch` (or to the single-key function when `batch` is None)
    ///
    /// Values come back in key order. A batch function that returns fewer
    /// values than requested leaves the missing keys out of the result.
    pub fn eval_many<B>(&mut self, keys: &[K], batch: Option<&B>) -> Vec<V>
    where
        B: Fn(&[K]) -> Vec<V>,
    {
        let missing = self.uncached(keys);
        let n_missing = missing.len();
        if n_missing > 0 {
            let values: Vec<V> = match batch {
                Some(batch_fn) => batch_fn(&missing),
                None => missing.iter().map(|k| (self.func)(k)).collect(),
            };
            let returned = values.len().min(n_missing);
            self.num_evals += returned;
            for (key, value) in missing.into_iter().zip(values) {
                self.cache.insert(key, value);
            }
        }

        keys.iter()
            .filter_map(|k| self.cache.get(k).cloned())
            .collect()
    }

    /// Distinct keys of `keys` not yet in the cache, in first-seen order
    fn uncached(&self, keys: &[K]) -> Vec<K> {
        let mut seen = HashSet::new();
        keys.iter()
            .filter(|k| !self.cache.contains_key(*k) && seen.insert(*k))
            .cloned()
            .collect()
    }

    /// Number of distinct keys of `keys` not yet in the cache
    pub fn count_uncached(&self, keys: &[K]) -> usize {
        let mut seen = HashSet::new();
        keys.iter()
            .filter(|k| !self.cache.contains_key(*k) && seen.insert(*k))
            .count()
    }

    /// Get the number of actual function evaluations
    pub fn num_evals(&self) -> usize {
        self.num_evals
    }
}
