//! cache
//!
//! Read cache for membership lookups.
//!
//! # Design
//!
//! Membership checks read through a [`MembershipCache`]: a hit answers
//! without touching the store, a miss is filled from the store. Anything
//! that changes membership must invalidate the affected entries after the
//! store mutation commits and before membership is read again.
//!
//! Entries are keyed `"<uid>:<group>"`. Raw keys such as
//! `group:<name>:members` can be dropped with [`MembershipCache::del`].
//!
//! The cache is best-effort: a poisoned lock behaves like an empty cache.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::core::types::{GroupName, Uid};

/// Default number of cached entries.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Cache of per-user membership answers.
pub trait MembershipCache: Send + Sync {
    /// Cached membership of `uid` in `group`, if known.
    fn get(&self, uid: Uid, group: &GroupName) -> Option<bool>;

    /// Remember a membership answer.
    fn put(&self, uid: Uid, group: &GroupName, is_member: bool);

    /// Forget every answer about `uid` in `groups`.
    fn clear(&self, uid: Uid, groups: &[GroupName]);

    /// Forget raw keys.
    fn del(&self, keys: &[String]);
}

/// Cache key for a membership answer.
pub fn membership_key(uid: Uid, group: &GroupName) -> String {
    format!("{}:{}", uid, group)
}

/// Process-local LRU [`MembershipCache`].
pub struct LocalCache {
    entries: Mutex<LruCache<String, bool>>,
}

impl LocalCache {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove_keys(&self, keys: impl IntoIterator<Item = String>) {
        if let Ok(mut entries) = self.entries.lock() {
            for key in keys {
                entries.pop(&key);
            }
        }
    }
}

impl Default for LocalCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MembershipCache for LocalCache {
    fn get(&self, uid: Uid, group: &GroupName) -> Option<bool> {
        self.entries
            .lock()
            .ok()?
            .get(&membership_key(uid, group))
            .copied()
    }

    fn put(&self, uid: Uid, group: &GroupName, is_member: bool) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(membership_key(uid, group), is_member);
        }
    }

    fn clear(&self, uid: Uid, groups: &[GroupName]) {
        self.remove_keys(groups.iter().map(|g| membership_key(uid, g)));
    }

    fn del(&self, keys: &[String]) {
        self.remove_keys(keys.iter().cloned());
    }
}

/// [`LocalCache`] that also records every invalidated key, for tests.
#[derive(Clone)]
pub struct RecordingCache {
    cache: Arc<LocalCache>,
    invalidated: Arc<Mutex<Vec<String>>>,
}

impl RecordingCache {
    /// Create a recorder over a cache of `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Arc::new(LocalCache::new(capacity)),
            invalidated: Arc::default(),
        }
    }

    /// Every key invalidated so far, in order.
    pub fn invalidated(&self) -> Vec<String> {
        self.invalidated
            .lock()
            .map(|i| i.clone())
            .unwrap_or_default()
    }

    fn record(&self, keys: impl IntoIterator<Item = String>) {
        if let Ok(mut log) = self.invalidated.lock() {
            log.extend(keys);
        }
    }
}

impl MembershipCache for RecordingCache {
    fn get(&self, uid: Uid, group: &GroupName) -> Option<bool> {
        self.cache.get(uid, group)
    }

    fn put(&self, uid: Uid, group: &GroupName, is_member: bool) {
        self.cache.put(uid, group, is_member);
    }

    fn clear(&self, uid: Uid, groups: &[GroupName]) {
        self.cache.clear(uid, groups);
        self.record(groups.iter().map(|g| membership_key(uid, g)));
    }

    fn del(&self, keys: &[String]) {
        self.cache.del(keys);
        self.record(keys.iter().cloned());
    }
}
