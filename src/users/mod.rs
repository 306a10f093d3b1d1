//! users
//!
//! Per-user display titles.
//!
//! A title is an ordered list of group names the user chose to display. It
//! lives in the `groupTitle` field of the user's object record, encoded as a
//! JSON array. Older records may hold a bare group name instead; those read
//! back as a one-entry list.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use memberflow::core::types::{GroupName, Uid};
//! use memberflow::store::{KvStore, MemoryStore};
//! use memberflow::users::{KvUserTitles, UserTitleStore};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! store.set_object_field("user:1", "username", "alice").await.unwrap();
//!
//! let titles = KvUserTitles::new(Arc::new(store));
//! let title = vec![GroupName::new("vip").unwrap()];
//! titles.set_title(Uid::new(1), &title).await.unwrap();
//! assert_eq!(titles.get_title(Uid::new(1)).await.unwrap(), Some(title));
//! # });
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::types::{GroupName, Uid};
use crate::store::{KvStore, StoreError};

const FIELD_GROUP_TITLE: &str = "groupTitle";

/// Storage of user titles.
#[async_trait]
pub trait UserTitleStore: Send + Sync {
    /// Load a user's title.
    ///
    /// Returns `Ok(None)` if the user record does not exist and an empty list
    /// if the user has no title.
    async fn get_title(&self, uid: Uid) -> Result<Option<Vec<GroupName>>, StoreError>;

    /// Replace a user's title.
    async fn set_title(&self, uid: Uid, title: &[GroupName]) -> Result<(), StoreError>;

    /// Remove the title field entirely.
    async fn delete_title(&self, uid: Uid) -> Result<(), StoreError>;
}

/// [`UserTitleStore`] over a [`KvStore`].
#[derive(Clone)]
pub struct KvUserTitles {
    store: Arc<dyn KvStore>,
}

impl KvUserTitles {
    /// Wrap a store.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }
}

/// Decode a stored `groupTitle` value.
pub fn parse_title(key: &str, raw: &str) -> Result<Vec<GroupName>, StoreError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if !raw.starts_with('[') {
        return Ok(vec![GroupName::from_stored(raw)]);
    }
    serde_json::from_str::<Vec<String>>(raw)
        .map(|names| names.into_iter().map(GroupName::from_stored).collect())
        .map_err(|e| StoreError::Corrupt {
            key: format!("{}.{}", key, FIELD_GROUP_TITLE),
            message: e.to_string(),
        })
}

#[async_trait]
impl UserTitleStore for KvUserTitles {
    async fn get_title(&self, uid: Uid) -> Result<Option<Vec<GroupName>>, StoreError> {
        let key = uid.user_key();
        if !self.store.exists(&key).await? {
            return Ok(None);
        }
        match self.store.get_object_field(&key, FIELD_GROUP_TITLE).await? {
            Some(raw) => parse_title(&key, &raw).map(Some),
            None => Ok(Some(Vec::new())),
        }
    }

    async fn set_title(&self, uid: Uid, title: &[GroupName]) -> Result<(), StoreError> {
        let key = uid.user_key();
        let encoded = serde_json::to_string(title).map_err(|e| StoreError::Corrupt {
            key: format!("{}.{}", key, FIELD_GROUP_TITLE),
            message: e.to_string(),
        })?;
        self.store
            .set_object_field(&key, FIELD_GROUP_TITLE, &encoded)
            .await
    }

    async fn delete_title(&self, uid: Uid) -> Result<(), StoreError> {
        self.store
            .delete_object_field(&uid.user_key(), FIELD_GROUP_TITLE)
            .await
    }
}
