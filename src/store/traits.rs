//! store::traits
//!
//! Storage primitive trait definition.
//!
//! # Design
//!
//! `KvStore` is the narrow contract the membership workflow needs from the
//! underlying key/value + set engine. It is async because real engines sit
//! behind the network. Keys are plain strings; the groups and users adapters
//! own the key layout.
//!
//! Multi-key operations (e.g. [`KvStore::sorted_set_remove`]) are applied key
//! by key. There is no atomicity across keys.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from storage operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backing engine could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A key holds a value of a different shape than the operation expects.
    #[error("wrong type for key '{key}': expected {expected}")]
    WrongType {
        /// The offending key
        key: String,
        /// The expected shape (e.g. "sorted set")
        expected: &'static str,
    },

    /// A stored value could not be interpreted.
    #[error("corrupt value at '{key}': {message}")]
    Corrupt {
        /// The offending key (and field, if any)
        key: String,
        /// What was wrong with it
        message: String,
    },

    /// Reading or writing a persisted snapshot failed.
    #[error("snapshot i/o error: {0}")]
    Io(String),
}

/// Storage primitives with Redis-like semantics.
///
/// Implementations must be `Send + Sync` so one store can back every
/// collaborator of the lifecycle manager.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Upsert one value into a sorted set, replacing its score.
    async fn sorted_set_add(&self, key: &str, score: i64, value: &str) -> Result<(), StoreError>;

    /// Upsert many `(score, value)` pairs into one sorted set.
    async fn sorted_set_add_bulk(
        &self,
        key: &str,
        entries: &[(i64, String)],
    ) -> Result<(), StoreError>;

    /// Remove `value` from every sorted set in `keys`. Missing keys are ignored.
    async fn sorted_set_remove(&self, keys: &[String], value: &str) -> Result<(), StoreError>;

    /// Read an inclusive index range, ascending by score then value.
    ///
    /// Negative indices count from the end (`-1` is the last element).
    async fn sorted_set_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError>;

    /// Score of `value` in a sorted set, if present.
    async fn sorted_set_score(&self, key: &str, value: &str) -> Result<Option<i64>, StoreError>;

    /// Membership of `value` in each sorted set, parallel to `keys`.
    async fn is_member_of_sorted_sets(
        &self,
        keys: &[String],
        value: &str,
    ) -> Result<Vec<bool>, StoreError>;

    /// Add a value to a set.
    async fn set_add(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `value` from every set in `keys`. Missing keys are ignored.
    async fn set_remove(&self, keys: &[String], value: &str) -> Result<(), StoreError>;

    /// Cardinality of a set (0 if missing).
    async fn set_count(&self, key: &str) -> Result<usize, StoreError>;

    /// Whether `value` is in a set.
    async fn is_set_member(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Read `fields` of each object, parallel to `keys`.
    ///
    /// Absent objects yield `None`; absent fields are omitted from the map.
    async fn get_objects_fields(
        &self,
        keys: &[String],
        fields: &[&str],
    ) -> Result<Vec<Option<HashMap<String, String>>>, StoreError>;

    /// Read a single object field.
    async fn get_object_field(&self, key: &str, field: &str)
        -> Result<Option<String>, StoreError>;

    /// Create or merge an object.
    async fn set_object(&self, key: &str, fields: &[(&str, String)]) -> Result<(), StoreError>;

    /// Set a single object field, creating the object if needed.
    async fn set_object_field(&self, key: &str, field: &str, value: &str)
        -> Result<(), StoreError>;

    /// Delete a single object field. Deleting a missing field is not an error.
    async fn delete_object_field(&self, key: &str, field: &str) -> Result<(), StoreError>;

    /// Unconditionally decrement a numeric field on each object.
    ///
    /// A missing field counts as 0. Returns the new values, parallel to `keys`.
    async fn decr_object_field(&self, keys: &[String], field: &str)
        -> Result<Vec<i64>, StoreError>;

    /// Delete keys of any type. Missing keys are ignored.
    async fn delete_all(&self, keys: &[String]) -> Result<(), StoreError>;

    /// Whether a key exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;
}
