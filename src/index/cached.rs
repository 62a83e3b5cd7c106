//! Read-through cache over a sorted file index.
//!
//! Values are cached lazily on `get` and eagerly on `put`. The cache is
//! unbounded and only stays consistent while every write goes through the
//! wrapper.

use super::{FixedWidth, KeyValueStore, SortedFileIndex};
use crate::error::Result;
use std::collections::HashMap;
use std::hash::Hash;
use std::path::Path;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of lookups
    pub lookups: u64,
    /// Lookups answered from memory
    pub hits: u64,
    /// Lookups that went to the file
    pub misses: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }

    /// Reset all statistics to zero
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A [`SortedFileIndex`] with an in-memory map in front of it.
///
/// Found values are cached; misses are not, so a lookup for an absent key
/// always probes the file.
#[derive(Debug)]
pub struct CachingIndex<K, V> {
    inner: SortedFileIndex<K, V>,
    cache: HashMap<K, V>,
    stats: CacheStats,
}

impl<K, V> CachingIndex<K, V>
where
    K: FixedWidth + Ord + Hash + Clone,
    V: FixedWidth + Clone,
{
    /// Wrap an open index.
    pub fn new(inner: SortedFileIndex<K, V>) -> Self {
        Self { inner, cache: HashMap::new(), stats: CacheStats::default() }
    }

    /// Open or create an index file with caching.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        SortedFileIndex::open(path).map(Self::new)
    }

    /// Look up the value stored for `key`.
    pub fn get(&mut self, key: &K) -> Result<Option<V>> {
        self.stats.lookups += 1;
        if let Some(value) = self.cache.get(key) {
            self.stats.hits += 1;
            return Ok(Some(value.clone()));
        }

        self.stats.misses += 1;
        let found = self.inner.get(key)?;
        if let Some(value) = &found {
            self.cache.insert(key.clone(), value.clone());
        }
        Ok(found)
    }

    /// Store `value` under `key` in the file and the cache.
    pub fn put(&mut self, key: K, value: V) -> Result<Option<V>> {
        let previous = self.inner.put(key.clone(), value.clone())?;
        self.cache.insert(key, value);
        Ok(previous)
    }

    /// Number of cached values.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drop every cached value and reset the statistics.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.stats.reset();
    }

    /// The wrapped index.
    ///
    /// Writes must not go through this reference or the cache goes stale.
    pub fn inner(&mut self) -> &mut SortedFileIndex<K, V> {
        &mut self.inner
    }

    /// Unwrap into the file index, discarding the cache.
    pub fn into_inner(self) -> SortedFileIndex<K, V> {
        self.inner
    }
}

impl<K, V> KeyValueStore<K, V> for CachingIndex<K, V>
where
    K: FixedWidth + Ord + Hash + Clone,
    V: FixedWidth + Clone,
{
    fn get(&mut self, key: &K) -> Result<Option<V>> {
        CachingIndex::get(self, key)
    }

    fn put(&mut self, key: K, value: V) -> Result<Option<V>> {
        CachingIndex::put(self, key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_get_populates_cache() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut index = SortedFileIndex::<i64, i64>::open(temp_file.path()).unwrap();
        index.put(1, 10).unwrap();

        let mut cached = CachingIndex::new(index);
        assert_eq!(cached.cached_len(), 0);
        assert_eq!(cached.get(&1).unwrap(), Some(10));
        assert_eq!(cached.get(&1).unwrap(), Some(10));

        let stats = cached.stats();
        assert_eq!(stats.lookups, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_misses_are_not_cached() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut cached = CachingIndex::<i32, i32>::open(temp_file.path()).unwrap();
        assert_eq!(cached.get(&5).unwrap(), None);
        assert_eq!(cached.get(&5).unwrap(), None);
        assert_eq!(cached.cached_len(), 0);
        assert_eq!(cached.stats().misses, 2);
    }

    #[test]
    fn test_put_updates_file_and_cache() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut cached = CachingIndex::<i32, i32>::open(temp_file.path()).unwrap();

        assert_eq!(cached.put(3, 30).unwrap(), None);
        assert_eq!(cached.put(3, 31).unwrap(), Some(30));
        assert_eq!(cached.get(&3).unwrap(), Some(31));
        assert_eq!(cached.stats().hits, 1);

        let mut inner = cached.into_inner();
        assert_eq!(inner.get(&3).unwrap(), Some(31));
    }

    #[test]
    fn test_clear_cache() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut cached = CachingIndex::<i32, i32>::open(temp_file.path()).unwrap();
        cached.put(1, 1).unwrap();
        cached.get(&1).unwrap();

        cached.clear_cache();
        assert_eq!(cached.cached_len(), 0);
        assert_eq!(cached.stats(), CacheStats::default());
        assert_eq!(cached.get(&1).unwrap(), Some(1));
        assert_eq!(cached.stats().misses, 1);
    }
}
