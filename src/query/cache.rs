use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::debug;

/// One component of a structured cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySegment {
    /// Query family, e.g. `recommendations`
    Namespace(String),

    /// Committed search text
    Search(String),

    /// Selected tags, normalized order
    Tags(Vec<String>),

    /// Active or archived partition
    ArchiveView(bool),
}

/// Ordered tuple of segments. Prefix matching is segment-wise, never textual.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<KeySegment>);

impl CacheKey {
    /// Key consisting of a namespace alone
    pub fn namespace(name: impl Into<String>) -> Self {
        Self(vec![KeySegment::Namespace(name.into())])
    }

    /// Append a segment
    #[must_use]
    pub fn with(mut self, segment: KeySegment) -> Self {
        self.0.push(segment);
        self
    }

    /// Segments in order
    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    /// Whether `prefix` matches this key's leading segments
    pub fn starts_with(&self, prefix: &CacheKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

/// LRU-bounded cache keyed by [`CacheKey`], with exact and prefix invalidation
pub struct QueryCache<V> {
    entries: LruCache<CacheKey, V>,
}

impl<V> QueryCache<V> {
    /// Create a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Look up and mark as recently used
    pub fn get(&mut self, key: &CacheKey) -> Option<&V> {
        self.entries.get(key)
    }

    /// Mutable lookup, marks as recently used
    pub fn get_mut(&mut self, key: &CacheKey) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Look up without touching recency
    pub fn peek(&self, key: &CacheKey) -> Option<&V> {
        self.entries.peek(key)
    }

    /// Whether `key` is present
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    /// Insert or replace, evicting the least recently used entry when full
    pub fn insert(&mut self, key: CacheKey, value: V) {
        if let Some((evicted, _)) = self.entries.push(key.clone(), value) {
            if evicted != key {
                debug!("Evicted cache entry {:?}", evicted.segments());
            }
        }
    }

    /// Remove exactly `key`. Returns whether an entry was removed.
    pub fn invalidate_exact(&mut self, key: &CacheKey) -> bool {
        self.entries.pop(key).is_some()
    }

    /// Remove every entry whose key starts with `prefix`. Returns the count.
    pub fn invalidate_prefix(&mut self, prefix: &CacheKey) -> usize {
        let doomed: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            self.entries.pop(key);
        }
        doomed.len()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(ns: &str, search: &str, archived: bool) -> CacheKey {
        CacheKey::namespace(ns)
            .with(KeySegment::Search(search.to_string()))
            .with(KeySegment::ArchiveView(archived))
    }

    #[test]
    fn test_exact_invalidation_only_touches_one_key() {
        let mut cache = QueryCache::new(8);
        cache.insert(key("recommendations", "a", false), 1);
        cache.insert(key("recommendations", "a", true), 2);

        assert!(cache.invalidate_exact(&key("recommendations", "a", false)));
        assert!(!cache.invalidate_exact(&key("recommendations", "a", false)));
        assert_eq!(cache.peek(&key("recommendations", "a", true)), Some(&2));
    }

    #[test]
    fn test_prefix_invalidation_is_segment_wise() {
        let mut cache = QueryCache::new(8);
        cache.insert(key("recommendations", "a", false), 1);
        cache.insert(key("recommendations", "b", true), 2);
        cache.insert(key("recommendations-v2", "a", false), 3);
        cache.insert(key("profile", "a", false), 4);

        let removed = cache.invalidate_prefix(&CacheKey::namespace("recommendations"));
        assert_eq!(removed, 2);
        assert_eq!(cache.len(), 2);
        // a textual prefix match would have removed this one too
        assert!(cache.contains(&key("recommendations-v2", "a", false)));
        assert!(cache.contains(&key("profile", "a", false)));
    }

    #[test]
    fn test_longer_prefix_narrows_invalidation() {
        let mut cache = QueryCache::new(8);
        cache.insert(key("recommendations", "a", false), 1);
        cache.insert(key("recommendations", "a", true), 2);
        cache.insert(key("recommendations", "b", false), 3);

        let prefix = CacheKey::namespace("recommendations").with(KeySegment::Search("a".into()));
        assert_eq!(cache.invalidate_prefix(&prefix), 2);
        assert!(cache.contains(&key("recommendations", "b", false)));
    }

    #[test]
    fn test_capacity_evicts_least_recent() {
        let mut cache = QueryCache::new(2);
        cache.insert(key("n", "a", false), 1);
        cache.insert(key("n", "b", false), 2);
        let _ = cache.get(&key("n", "a", false));
        cache.insert(key("n", "c", false), 3);

        assert!(cache.contains(&key("n", "a", false)));
        assert!(!cache.contains(&key("n", "b", false)));
        assert!(cache.contains(&key("n", "c", false)));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut cache = QueryCache::new(0);
        cache.insert(key("n", "a", false), 1);
        assert_eq!(cache.len(), 1);
    }
}
