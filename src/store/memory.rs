//! store::memory
//!
//! In-process storage engine.
//!
//! # Design
//!
//! `MemoryStore` keeps a [`Keyspace`] behind `Arc<Mutex<...>>`, so clones are
//! cheap handles onto the same data. It backs the CLI (loaded from and saved
//! to a [`SnapshotFile`](super::SnapshotFile)) and every test.
//!
//! Like the other test doubles in this crate it records the operations it
//! receives and can be configured to fail a specific operation.
//!
//! # Example
//!
//! ```
//! use memberflow::store::{KvStore, MemoryStore};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! store.sorted_set_add("group:vip:members", 100, "1").await.unwrap();
//! store.sorted_set_add("group:vip:members", 200, "2").await.unwrap();
//!
//! let members = store.sorted_set_range("group:vip:members", 0, -1).await.unwrap();
//! assert_eq!(members, vec!["1".to_string(), "2".to_string()]);
//! # });
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::traits::{KvStore, StoreError};

/// A stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Value {
    /// value -> score
    SortedSet(BTreeMap<String, i64>),
    Set(BTreeSet<String>),
    /// field -> value
    Object(BTreeMap<String, String>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::SortedSet(_) => "sorted set",
            Value::Set(_) => "set",
            Value::Object(_) => "object",
        }
    }
}

/// The full contents of a store, as persisted in snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyspace {
    #[serde(default)]
    pub keys: BTreeMap<String, Value>,
}

/// Which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    SortedSetAdd(StoreError),
    SortedSetRemove(StoreError),
    SortedSetRange(StoreError),
    IsMemberOfSortedSets(StoreError),
    SetRemove(StoreError),
    SetCount(StoreError),
    GetObjectsFields(StoreError),
    SetObjectField(StoreError),
    DeleteObjectField(StoreError),
    DecrObjectField(StoreError),
    DeleteAll(StoreError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    SortedSetAdd { key: String, values: Vec<String> },
    SortedSetRemove { keys: Vec<String>, value: String },
    SortedSetRange { key: String },
    SortedSetScore { key: String },
    IsMemberOfSortedSets { keys: Vec<String> },
    SetAdd { key: String },
    SetRemove { keys: Vec<String>, value: String },
    SetCount { key: String },
    IsSetMember { key: String },
    GetObjectsFields { keys: Vec<String> },
    GetObjectField { key: String, field: String },
    SetObject { key: String },
    SetObjectField { key: String, field: String },
    DeleteObjectField { key: String, field: String },
    DecrObjectField { keys: Vec<String>, field: String },
    DeleteAll { keys: Vec<String> },
    Exists { key: String },
}

impl StoreOp {
    /// Whether the operation changes stored data.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            StoreOp::SortedSetAdd { .. }
                | StoreOp::SortedSetRemove { .. }
                | StoreOp::SetAdd { .. }
                | StoreOp::SetRemove { .. }
                | StoreOp::SetObject { .. }
                | StoreOp::SetObjectField { .. }
                | StoreOp::DeleteObjectField { .. }
                | StoreOp::DecrObjectField { .. }
                | StoreOp::DeleteAll { .. }
        )
    }
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    keyspace: Keyspace,
    fail_on: Option<FailOn>,
    operations: Vec<StoreOp>,
}

/// In-memory [`KvStore`].
///
/// Every call is appended to an operation log that only
/// [`MemoryStore::clear_operations`] shrinks, so a store is meant to live for
/// one CLI invocation or one test, not for a long-running process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding an existing keyspace.
    pub fn from_keyspace(keyspace: Keyspace) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryStoreInner {
                keyspace,
                ..Default::default()
            })),
        }
    }

    /// Copy out the current keyspace.
    pub fn snapshot(&self) -> Result<Keyspace, StoreError> {
        Ok(self.state()?.keyspace.clone())
    }

    /// Configure the store to fail a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_on = None;
        }
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<StoreOp> {
        self.inner
            .lock()
            .map(|inner| inner.operations.clone())
            .unwrap_or_default()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.operations.clear();
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryStoreInner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    /// Record `op`, then fail if configured to.
    fn begin(&self, op: StoreOp) -> Result<MutexGuard<'_, MemoryStoreInner>, StoreError> {
        let mut inner = self.state()?;
        let failure = match (&inner.fail_on, &op) {
            (Some(FailOn::SortedSetAdd(e)), StoreOp::SortedSetAdd { .. })
            | (Some(FailOn::SortedSetRemove(e)), StoreOp::SortedSetRemove { .. })
            | (Some(FailOn::SortedSetRange(e)), StoreOp::SortedSetRange { .. })
            | (Some(FailOn::IsMemberOfSortedSets(e)), StoreOp::IsMemberOfSortedSets { .. })
            | (Some(FailOn::SetRemove(e)), StoreOp::SetRemove { .. })
            | (Some(FailOn::SetCount(e)), StoreOp::SetCount { .. })
            | (Some(FailOn::GetObjectsFields(e)), StoreOp::GetObjectsFields { .. })
            | (Some(FailOn::SetObjectField(e)), StoreOp::SetObjectField { .. })
            | (Some(FailOn::DeleteObjectField(e)), StoreOp::DeleteObjectField { .. })
            | (Some(FailOn::DecrObjectField(e)), StoreOp::DecrObjectField { .. })
            | (Some(FailOn::DeleteAll(e)), StoreOp::DeleteAll { .. }) => Some(e.clone()),
            _ => None,
        };
        inner.operations.push(op);
        match failure {
            Some(e) => Err(e),
            None => Ok(inner),
        }
    }
}

impl Keyspace {
    fn sorted_set(&self, key: &str) -> Result<Option<&BTreeMap<String, i64>>, StoreError> {
        match self.keys.get(key) {
            None => Ok(None),
            Some(Value::SortedSet(z)) => Ok(Some(z)),
            Some(_) => Err(wrong_type(key, "sorted set")),
        }
    }

    fn sorted_set_mut(&mut self, key: &str) -> Result<&mut BTreeMap<String, i64>, StoreError> {
        match self
            .keys
            .entry(key.to_string())
            .or_insert_with(|| Value::SortedSet(BTreeMap::new()))
        {
            Value::SortedSet(z) => Ok(z),
            _ => Err(wrong_type(key, "sorted set")),
        }
    }

    fn set(&self, key: &str) -> Result<Option<&BTreeSet<String>>, StoreError> {
        match self.keys.get(key) {
            None => Ok(None),
            Some(Value::Set(s)) => Ok(Some(s)),
            Some(_) => Err(wrong_type(key, "set")),
        }
    }

    fn object(&self, key: &str) -> Result<Option<&BTreeMap<String, String>>, StoreError> {
        match self.keys.get(key) {
            None => Ok(None),
            Some(Value::Object(o)) => Ok(Some(o)),
            Some(_) => Err(wrong_type(key, "object")),
        }
    }

    fn object_mut(&mut self, key: &str) -> Result<&mut BTreeMap<String, String>, StoreError> {
        match self
            .keys
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(BTreeMap::new()))
        {
            Value::Object(o) => Ok(o),
            _ => Err(wrong_type(key, "object")),
        }
    }

    /// Drop a collection once its last element is gone, as Redis does.
    fn prune(&mut self, key: &str) {
        let empty = match self.keys.get(key) {
            Some(Value::SortedSet(z)) => z.is_empty(),
            Some(Value::Set(s)) => s.is_empty(),
            Some(Value::Object(o)) => o.is_empty(),
            None => false,
        };
        if empty {
            self.keys.remove(key);
        }
    }
}

fn wrong_type(key: &str, expected: &'static str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
    }
}

/// Resolve a Redis-style inclusive range against a length.
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn sorted_set_add(&self, key: &str, score: i64, value: &str) -> Result<(), StoreError> {
        let mut inner = self.begin(StoreOp::SortedSetAdd {
            key: key.to_string(),
            values: vec![value.to_string()],
        })?;
        inner
            .keyspace
            .sorted_set_mut(key)?
            .insert(value.to_string(), score);
        Ok(())
    }

    async fn sorted_set_add_bulk(
        &self,
        key: &str,
        entries: &[(i64, String)],
    ) -> Result<(), StoreError> {
        let mut inner = self.begin(StoreOp::SortedSetAdd {
            key: key.to_string(),
            values: entries.iter().map(|(_, v)| v.clone()).collect(),
        })?;
        if entries.is_empty() {
            return Ok(());
        }
        let zset = inner.keyspace.sorted_set_mut(key)?;
        for (score, value) in entries {
            zset.insert(value.clone(), *score);
        }
        Ok(())
    }

    async fn sorted_set_remove(&self, keys: &[String], value: &str) -> Result<(), StoreError> {
        let mut inner = self.begin(StoreOp::SortedSetRemove {
            keys: keys.to_vec(),
            value: value.to_string(),
        })?;
        for key in keys {
            if inner.keyspace.sorted_set(key)?.is_none() {
                continue;
            }
            inner.keyspace.sorted_set_mut(key)?.remove(value);
            inner.keyspace.prune(key);
        }
        Ok(())
    }

    async fn sorted_set_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError> {
        let inner = self.begin(StoreOp::SortedSetRange {
            key: key.to_string(),
        })?;
        let Some(zset) = inner.keyspace.sorted_set(key)? else {
            return Ok(Vec::new());
        };

        let mut entries: Vec<(&i64, &String)> = zset.iter().map(|(v, s)| (s, v)).collect();
        entries.sort();

        Ok(match resolve_range(entries.len(), start, stop) {
            Some((from, to)) => entries[from..=to]
                .iter()
                .map(|(_, v)| (*v).clone())
                .collect(),
            None => Vec::new(),
        })
    }

    async fn sorted_set_score(&self, key: &str, value: &str) -> Result<Option<i64>, StoreError> {
        let inner = self.begin(StoreOp::SortedSetScore {
            key: key.to_string(),
        })?;
        Ok(inner
            .keyspace
            .sorted_set(key)?
            .and_then(|z| z.get(value).copied()))
    }

    async fn is_member_of_sorted_sets(
        &self,
        keys: &[String],
        value: &str,
    ) -> Result<Vec<bool>, StoreError> {
        let inner = self.begin(StoreOp::IsMemberOfSortedSets {
            keys: keys.to_vec(),
        })?;
        keys.iter()
            .map(|key| {
                Ok(inner
                    .keyspace
                    .sorted_set(key)?
                    .is_some_and(|z| z.contains_key(value)))
            })
            .collect()
    }

    async fn set_add(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.begin(StoreOp::SetAdd {
            key: key.to_string(),
        })?;
        match inner
            .keyspace
            .keys
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(BTreeSet::new()))
        {
            Value::Set(s) => {
                s.insert(value.to_string());
                Ok(())
            }
            _ => Err(wrong_type(key, "set")),
        }
    }

    async fn set_remove(&self, keys: &[String], value: &str) -> Result<(), StoreError> {
        let mut inner = self.begin(StoreOp::SetRemove {
            keys: keys.to_vec(),
            value: value.to_string(),
        })?;
        for key in keys {
            match inner.keyspace.keys.get_mut(key) {
                None => continue,
                Some(Value::Set(s)) => {
                    s.remove(value);
                }
                Some(_) => return Err(wrong_type(key, "set")),
            }
            inner.keyspace.prune(key);
        }
        Ok(())
    }

    async fn set_count(&self, key: &str) -> Result<usize, StoreError> {
        let inner = self.begin(StoreOp::SetCount {
            key: key.to_string(),
        })?;
        Ok(inner.keyspace.set(key)?.map_or(0, |s| s.len()))
    }

    async fn is_set_member(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let inner = self.begin(StoreOp::IsSetMember {
            key: key.to_string(),
        })?;
        Ok(inner.keyspace.set(key)?.is_some_and(|s| s.contains(value)))
    }

    async fn get_objects_fields(
        &self,
        keys: &[String],
        fields: &[&str],
    ) -> Result<Vec<Option<HashMap<String, String>>>, StoreError> {
        let inner = self.begin(StoreOp::GetObjectsFields {
            keys: keys.to_vec(),
        })?;
        keys.iter()
            .map(|key| {
                Ok(inner.keyspace.object(key)?.map(|object| {
                    fields
                        .iter()
                        .filter_map(|f| object.get(*f).map(|v| (f.to_string(), v.clone())))
                        .collect()
                }))
            })
            .collect()
    }

    async fn get_object_field(
        &self,
        key: &str,
        field: &str,
    ) -> Result<Option<String>, StoreError> {
        let inner = self.begin(StoreOp::GetObjectField {
            key: key.to_string(),
            field: field.to_string(),
        })?;
        Ok(inner
            .keyspace
            .object(key)?
            .and_then(|o| o.get(field).cloned()))
    }

    async fn set_object(&self, key: &str, fields: &[(&str, String)]) -> Result<(), StoreError> {
        let mut inner = self.begin(StoreOp::SetObject {
            key: key.to_string(),
        })?;
        let object = inner.keyspace.object_mut(key)?;
        for (field, value) in fields {
            object.insert(field.to_string(), value.clone());
        }
        Ok(())
    }

    async fn set_object_field(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.begin(StoreOp::SetObjectField {
            key: key.to_string(),
            field: field.to_string(),
        })?;
        inner
            .keyspace
            .object_mut(key)?
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_object_field(&self, key: &str, field: &str) -> Result<(), StoreError> {
        let mut inner = self.begin(StoreOp::DeleteObjectField {
            key: key.to_string(),
            field: field.to_string(),
        })?;
        if inner.keyspace.object(key)?.is_some() {
            inner.keyspace.object_mut(key)?.remove(field);
            inner.keyspace.prune(key);
        }
        Ok(())
    }

    async fn decr_object_field(
        &self,
        keys: &[String],
        field: &str,
    ) -> Result<Vec<i64>, StoreError> {
        let mut inner = self.begin(StoreOp::DecrObjectField {
            keys: keys.to_vec(),
            field: field.to_string(),
        })?;
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            let object = inner.keyspace.object_mut(key)?;
            let current = match object.get(field) {
                Some(raw) => raw.parse::<i64>().map_err(|_| StoreError::Corrupt {
                    key: format!("{}.{}", key, field),
                    message: format!("'{}' is not an integer", raw),
                })?,
                None => 0,
            };
            let next = current - 1;
            object.insert(field.to_string(), next.to_string());
            values.push(next);
        }
        Ok(values)
    }

    async fn delete_all(&self, keys: &[String]) -> Result<(), StoreError> {
        let mut inner = self.begin(StoreOp::DeleteAll {
            keys: keys.to_vec(),
        })?;
        for key in keys {
            inner.keyspace.keys.remove(key);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let inner = self.begin(StoreOp::Exists {
            key: key.to_string(),
        })?;
        Ok(inner.keyspace.keys.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn sorted_set_range_orders_by_score_then_value() {
        let store = MemoryStore::new();
        store.sorted_set_add("z", 3, "c").await.unwrap();
        store.sorted_set_add("z", 1, "b").await.unwrap();
        store.sorted_set_add("z", 1, "a").await.unwrap();

        let all = store.sorted_set_range("z", 0, -1).await.unwrap();
        assert_eq!(all, keys(&["a", "b", "c"]));

        let tail = store.sorted_set_range("z", -2, -1).await.unwrap();
        assert_eq!(tail, keys(&["b", "c"]));

        let first = store.sorted_set_range("z", 0, 0).await.unwrap();
        assert_eq!(first, keys(&["a"]));

        assert!(store.sorted_set_range("z", 5, 10).await.unwrap().is_empty());
        assert!(store.sorted_set_range("missing", 0, -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sorted_set_add_replaces_score() {
        let store = MemoryStore::new();
        store.sorted_set_add("z", 5, "g").await.unwrap();
        store
            .sorted_set_add_bulk("z", &[(4, "g".to_string())])
            .await
            .unwrap();
        assert_eq!(store.sorted_set_score("z", "g").await.unwrap(), Some(4));
    }

    #[tokio::test]
    async fn removing_last_member_drops_the_key() {
        let store = MemoryStore::new();
        store.sorted_set_add("z", 1, "1").await.unwrap();
        store.set_add("s", "1").await.unwrap();

        store.sorted_set_remove(&keys(&["z", "nope"]), "1").await.unwrap();
        store.set_remove(&keys(&["s", "nope"]), "1").await.unwrap();

        assert!(!store.exists("z").await.unwrap());
        assert!(!store.exists("s").await.unwrap());
    }

    #[tokio::test]
    async fn membership_checks_are_parallel_to_keys() {
        let store = MemoryStore::new();
        store.sorted_set_add("a", 1, "7").await.unwrap();
        store.sorted_set_add("b", 1, "8").await.unwrap();

        let result = store
            .is_member_of_sorted_sets(&keys(&["a", "b", "c"]), "7")
            .await
            .unwrap();
        assert_eq!(result, vec![true, false, false]);
    }

    #[tokio::test]
    async fn decrement_is_unconditional() {
        let store = MemoryStore::new();
        store
            .set_object("group:a", &[("memberCount", "2".to_string())])
            .await
            .unwrap();

        let values = store
            .decr_object_field(&keys(&["group:a", "group:new"]), "memberCount")
            .await
            .unwrap();
        assert_eq!(values, vec![1, -1]);
    }

    #[tokio::test]
    async fn decrement_rejects_non_numeric_field() {
        let store = MemoryStore::new();
        store
            .set_object_field("group:a", "memberCount", "lots")
            .await
            .unwrap();

        let result = store
            .decr_object_field(&keys(&["group:a"]), "memberCount")
            .await;
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn objects_fields_marks_missing_objects() {
        let store = MemoryStore::new();
        store
            .set_object("group:a", &[("name", "a".into()), ("hidden", "0".into())])
            .await
            .unwrap();

        let rows = store
            .get_objects_fields(&keys(&["group:a", "group:b"]), &["name", "memberCount"])
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.get("name").map(String::as_str), Some("a"));
        assert!(!first.contains_key("memberCount"));
        assert!(rows[1].is_none());
    }

    #[tokio::test]
    async fn wrong_type_is_reported() {
        let store = MemoryStore::new();
        store.set_add("k", "v").await.unwrap();

        let result = store.sorted_set_add("k", 1, "v").await;
        assert!(matches!(result, Err(StoreError::WrongType { .. })));
    }

    #[tokio::test]
    async fn fail_on_injects_error_and_records() {
        let store = MemoryStore::new()
            .fail_on(FailOn::SetRemove(StoreError::Unavailable("down".into())));

        let result = store.set_remove(&keys(&["s"]), "1").await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.operations().len(), 1);

        store.clear_fail_on();
        store.set_remove(&keys(&["s"]), "1").await.unwrap();
    }

    #[tokio::test]
    async fn snapshot_round_trips_through_json() {
        let store = MemoryStore::new();
        store.sorted_set_add("z", 1, "a").await.unwrap();
        store.set_add("s", "b").await.unwrap();
        store.set_object_field("o", "f", "v").await.unwrap();

        let keyspace = store.snapshot().unwrap();
        let json = serde_json::to_string(&keyspace).unwrap();
        let restored = MemoryStore::from_keyspace(serde_json::from_str(&json).unwrap());
        assert_eq!(restored.snapshot().unwrap(), keyspace);
    }

    #[test]
    fn range_resolution() {
        assert_eq!(resolve_range(3, 0, -1), Some((0, 2)));
        assert_eq!(resolve_range(3, -10, 1), Some((0, 1)));
        assert_eq!(resolve_range(3, 2, 100), Some((2, 2)));
        assert_eq!(resolve_range(3, 2, 1), None);
        assert_eq!(resolve_range(0, 0, -1), None);
    }
}
