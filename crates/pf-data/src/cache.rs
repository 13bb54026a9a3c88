use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use pf_types::{Dataset, PfResult, RawDataLoader, RetrievalOperation, RetrievalParameters};

pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Cache key for raw datasets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    operation: RetrievalOperation,
    parameters: RetrievalParameters,
}

/// Cached dataset with access metadata
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Dataset,
    last_accessed: u64,
    access_count: u64,
}

impl CacheEntry {
    fn new(data: Dataset, tick: u64) -> Self {
        Self {
            data,
            last_accessed: tick,
            access_count: 0,
        }
    }

    fn access(&mut self, tick: u64) {
        self.last_accessed = tick;
        self.access_count += 1;
    }
}

/// LRU cache in front of any [`RawDataLoader`].
///
/// Identical `(operation, parameters)` requests are served from memory.
/// When the cache is full the least recently used entry is evicted.
pub struct CachedLoader {
    inner: Arc<dyn RawDataLoader>,
    cache: DashMap<CacheKey, RwLock<CacheEntry>>,
    capacity: usize,
    clock: AtomicU64,
    stats: RwLock<CacheStats>,
}

impl CachedLoader {
    pub fn new(inner: Arc<dyn RawDataLoader>) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(inner: Arc<dyn RawDataLoader>, capacity: usize) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
            capacity: capacity.max(1),
            clock: AtomicU64::new(0),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn lookup(&self, key: &CacheKey) -> Option<Dataset> {
        let entry_lock = self.cache.get(key)?;
        let mut entry = entry_lock.write();
        entry.access(self.tick());
        Some(entry.data.clone())
    }

    fn store(&self, key: CacheKey, data: Dataset) {
        if !self.cache.contains_key(&key) && self.cache.len() >= self.capacity {
            self.evict_lru();
        }
        self.cache
            .insert(key, RwLock::new(CacheEntry::new(data, self.tick())));

        let mut stats = self.stats.write();
        stats.stores += 1;
    }

    /// Evict the least recently used entry
    fn evict_lru(&self) {
        let oldest = self
            .cache
            .iter()
            .min_by_key(|entry| entry.value().read().last_accessed)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            if self.cache.remove(&key).is_some() {
                tracing::debug!(operation = %key.operation, "Evicted cached dataset");
                let mut stats = self.stats.write();
                stats.evictions += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&self) {
        self.cache.clear();

        // Reset stats
        {
            let mut stats = self.stats.write();
            *stats = CacheStats::default();
        }
    }

    pub fn get_stats(&self) -> CacheStats {
        self.stats.read().clone()
    }
}

impl RawDataLoader for CachedLoader {
    fn fetch(
        &self,
        operation: RetrievalOperation,
        parameters: &RetrievalParameters,
    ) -> PfResult<Dataset> {
        let key = CacheKey {
            operation,
            parameters: parameters.clone(),
        };

        if let Some(data) = self.lookup(&key) {
            self.stats.write().hits += 1;
            return Ok(data);
        }

        // Cache miss
        self.stats.write().misses += 1;
        let data = self.inner.fetch(operation, parameters)?;
        self.store(key, data.clone());
        Ok(data)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Counts fetches and returns a one-column dataset tagged by sample size.
    #[derive(Default)]
    struct CountingLoader {
        calls: AtomicUsize,
    }

    impl RawDataLoader for CountingLoader {
        fn fetch(
            &self,
            _operation: RetrievalOperation,
            parameters: &RetrievalParameters,
        ) -> PfResult<Dataset> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let tag = parameters.random_sample_n_states.unwrap_or(0) as f64;
            Dataset::new(vec![2000], vec!["x".into()], vec![vec![tag]])
        }
    }

    fn params(n: usize) -> RetrievalParameters {
        RetrievalParameters::with_random_sample(n)
    }

    #[test]
    fn repeated_requests_hit_the_cache() {
        let inner = Arc::new(CountingLoader::default());
        let cache = CachedLoader::new(inner.clone());

        let a = cache.fetch(RetrievalOperation::FullDatabase, &params(1)).unwrap();
        let b = cache.fetch(RetrievalOperation::FullDatabase, &params(1)).unwrap();
        assert_eq!(a, b);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        // Same parameters, different operation.
        cache
            .fetch(RetrievalOperation::AveragedAcrossStates, &params(1))
            .unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);

        let stats = cache.get_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert!((stats.hit_rate() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let inner = Arc::new(CountingLoader::default());
        let cache = CachedLoader::with_capacity(inner.clone(), 2);

        cache.fetch(RetrievalOperation::FullDatabase, &params(1)).unwrap();
        cache.fetch(RetrievalOperation::FullDatabase, &params(2)).unwrap();
        // Touch 1 so that 2 becomes the oldest.
        cache.fetch(RetrievalOperation::FullDatabase, &params(1)).unwrap();
        cache.fetch(RetrievalOperation::FullDatabase, &params(3)).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_stats().evictions, 1);

        cache.fetch(RetrievalOperation::FullDatabase, &params(1)).unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
        cache.fetch(RetrievalOperation::FullDatabase, &params(2)).unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn errors_are_not_cached() {
        struct Failing;
        impl RawDataLoader for Failing {
            fn fetch(
                &self,
                _operation: RetrievalOperation,
                _parameters: &RetrievalParameters,
            ) -> PfResult<Dataset> {
                Err(pf_types::DataError::SourceNotFound("db".into()).into())
            }
        }

        let cache = CachedLoader::new(Arc::new(Failing));
        assert!(cache.fetch(RetrievalOperation::FullDatabase, &params(1)).is_err());
        assert!(cache.is_empty());

        cache.clear();
        assert_eq!(cache.get_stats(), CacheStats::default());
    }
}
