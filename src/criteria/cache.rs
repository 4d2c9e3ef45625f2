//! Filter parsing cache, keyed by filter text

use crate::compiler::{self, Record, TypeDescriptor};
use crate::criteria::ast::Criteria;
use crate::criteria::parser;
use crate::error::Result;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};

/// Number of filters kept before the cache starts over
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Parsed filters keyed by their text
///
/// Filter text comes from users, so the map is bounded: inserting a new
/// filter into a full cache clears it first.
pub struct FilterCache {
    entries: RwLock<AHashMap<String, Criteria>>,
    capacity: AtomicUsize,
}

impl FilterCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(AHashMap::with_capacity(capacity.min(256))),
            capacity: AtomicUsize::new(capacity.max(1)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Relaxed)
    }

    /// Change the bound; a cache above the new bound is cleared
    pub fn set_capacity(&self, capacity: usize) {
        let capacity = capacity.max(1);
        self.capacity.store(capacity, Ordering::Relaxed);
        let mut entries = self.entries.write();
        if entries.len() > capacity {
            entries.clear();
        }
    }

    /// Get or parse a filter text; empty input is not cached and yields `None`
    pub fn get_or_parse(&self, text: &str) -> Result<Option<Criteria>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        // Fast path: check read lock first
        {
            let entries = self.entries.read();
            if let Some(criteria) = entries.get(text) {
                trace!(text, "filter cache hit");
                return Ok(Some(criteria.clone()));
            }
        }

        trace!(text, "filter cache miss");
        let criteria = parser::parse(text)?;

        if let Some(criteria) = &criteria {
            let mut entries = self.entries.write();
            if entries.len() >= self.capacity() && !entries.contains_key(text) {
                debug!(size = entries.len(), "filter cache full, clearing");
                entries.clear();
            }
            entries.insert(text.to_string(), criteria.clone());
        }

        Ok(criteria)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for FilterCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

/// Global filter cache with fast hashing (ahash)
static FILTER_CACHE: Lazy<FilterCache> = Lazy::new(FilterCache::default);

/// Get or parse a filter text, using cache for repeated filters
///
/// Empty input is not cached and yields `None`.
#[inline]
pub fn get_or_parse(text: &str) -> Result<Option<Criteria>> {
    FILTER_CACHE.get_or_parse(text)
}

/// Bound the global cache to `capacity` filters
pub fn set_cache_capacity(capacity: usize) {
    FILTER_CACHE.set_capacity(capacity);
}

/// Check a filter text against a record, using the cached criteria
///
/// An empty filter matches every record.
pub fn check_filter(text: &str, descriptor: &TypeDescriptor, record: &dyn Record) -> Result<bool> {
    match get_or_parse(text)? {
        None => Ok(true),
        Some(criteria) => compiler::compile(&criteria, descriptor)?.evaluate(record),
    }
}

/// Clear the filter cache
pub fn clear_cache() {
    FILTER_CACHE.clear();
}

/// Number of cached filters
pub fn cache_size() -> usize {
    FILTER_CACHE.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{FieldValue, MemberKind};

    struct Person {
        age: i64,
    }

    impl Record for Person {
        fn member(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "Age" => Some(FieldValue::Int(self.age)),
                _ => None,
            }
        }
    }

    fn person_type() -> TypeDescriptor {
        TypeDescriptor::new("Person").with_member("Age", MemberKind::Integer)
    }

    #[test]
    fn test_cache_hit() {
        let cache = FilterCache::default();
        let text = "[Age > 5]";
        let first = cache.get_or_parse(text).unwrap();
        let second = cache.get_or_parse(text).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
        assert_eq!(get_or_parse(text).unwrap(), first);
    }

    #[test]
    fn test_cache_stays_within_capacity() {
        let cache = FilterCache::with_capacity(8);
        for age in 0..100 {
            let text = format!("[Age > {}]", age);
            assert!(cache.get_or_parse(&text).unwrap().is_some());
            assert!(cache.len() <= 8, "cache grew to {}", cache.len());
        }
        assert!(!cache.is_empty());

        // A hit on a full cache keeps the entries
        let size = cache.len();
        let last = cache.get_or_parse("[Age > 99]").unwrap();
        assert_eq!(cache.len(), size);
        assert_eq!(last, cache.get_or_parse("[Age > 99]").unwrap());
    }

    #[test]
    fn test_lowering_capacity_clears() {
        let cache = FilterCache::with_capacity(16);
        for age in 0..10 {
            cache.get_or_parse(&format!("[Age < {}]", age)).unwrap();
        }
        assert_eq!(cache.len(), 10);

        cache.set_capacity(4);
        assert_eq!(cache.capacity(), 4);
        assert!(cache.is_empty());

        cache.set_capacity(0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_check_filter() {
        let descriptor = person_type();
        let person = Person { age: 10 };

        assert!(check_filter("[Age > 5]", &descriptor, &person).unwrap());
        assert!(!check_filter("[Age > 50]", &descriptor, &person).unwrap());
    }

    #[test]
    fn test_empty_filter_matches() {
        let descriptor = person_type();
        let person = Person { age: 1 };
        assert!(check_filter("", &descriptor, &person).unwrap());
        assert_eq!(get_or_parse("  ").unwrap(), None);
    }

    #[test]
    fn test_parse_errors_are_not_cached() {
        let cache = FilterCache::default();
        assert!(cache.get_or_parse("[Age >]").is_err());
        assert!(cache.get_or_parse("[Age >]").is_err());
        assert!(cache.is_empty());
    }
}
