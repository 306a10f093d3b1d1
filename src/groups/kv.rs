//! groups::kv
//!
//! Group collaborators implemented on top of a [`KvStore`].
//!
//! # Key layout
//!
//! | Key | Shape | Contents |
//! |-----|-------|----------|
//! | `group:<name>` | object | `name`, `hidden`, `memberCount`, `createtime`, ... |
//! | `group:<name>:members` | sorted set | uid, scored by join time |
//! | `group:<name>:owners` | set | uid |
//! | `group:<name>:pending` | set | uid with an open join request |
//! | `group:<name>:invited` | set | uid with an open invitation |
//! | `groups:createtime` | sorted set | every group name, by creation time |
//! | `groups:visible:createtime` | sorted set | visible group names, by creation time |
//! | `groups:visible:memberCount` | sorted set | visible group names, by member count |
//! | `groups:visible:name` | sorted set | `<lowercase>:<name>`, score 0 |

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::traits::{GroupCatalog, JoinRequests, MembershipStore};
use crate::core::types::{GroupLookup, GroupName, GroupRecord, Uid};
use crate::store::{KvStore, StoreError};

pub const GROUPS_BY_CREATETIME: &str = "groups:createtime";
pub const VISIBLE_BY_CREATETIME: &str = "groups:visible:createtime";
pub const VISIBLE_BY_MEMBER_COUNT: &str = "groups:visible:memberCount";
pub const VISIBLE_BY_NAME: &str = "groups:visible:name";

const FIELD_NAME: &str = "name";
const FIELD_HIDDEN: &str = "hidden";
const FIELD_MEMBER_COUNT: &str = "memberCount";

/// Groups adapter over any [`KvStore`].
///
/// Implements [`MembershipStore`], [`GroupCatalog`] and [`JoinRequests`].
#[derive(Clone)]
pub struct KvGroups {
    store: Arc<dyn KvStore>,
}

impl KvGroups {
    /// Wrap a store.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    fn keys(groups: &[GroupName], key: fn(&GroupName) -> String) -> Vec<String> {
        groups.iter().map(key).collect()
    }
}

/// Parse a catalog row into a record.
fn parse_record(
    requested: &GroupName,
    row: HashMap<String, String>,
) -> Result<GroupRecord, StoreError> {
    let name = row
        .get(FIELD_NAME)
        .map(|n| GroupName::from_stored(n.clone()))
        .unwrap_or_else(|| requested.clone());

    let hidden = matches!(
        row.get(FIELD_HIDDEN).map(String::as_str),
        Some("1") | Some("true")
    );

    let member_count = match row.get(FIELD_MEMBER_COUNT) {
        Some(raw) => raw.parse::<i64>().map_err(|_| StoreError::Corrupt {
            key: format!("{}.{}", requested.object_key(), FIELD_MEMBER_COUNT),
            message: format!("'{}' is not an integer", raw),
        })?,
        None => 0,
    };

    Ok(GroupRecord {
        name,
        hidden,
        member_count,
    })
}

#[async_trait]
impl MembershipStore for KvGroups {
    async fn is_member_of_groups(
        &self,
        uid: Uid,
        groups: &[GroupName],
    ) -> Result<Vec<bool>, StoreError> {
        if groups.is_empty() {
            return Ok(Vec::new());
        }
        self.store
            .is_member_of_sorted_sets(&Self::keys(groups, GroupName::members_key), &uid.as_member())
            .await
    }

    async fn remove_members(&self, groups: &[GroupName], uid: Uid) -> Result<(), StoreError> {
        self.store
            .sorted_set_remove(&Self::keys(groups, GroupName::members_key), &uid.as_member())
            .await
    }

    async fn remove_owners(&self, groups: &[GroupName], uid: Uid) -> Result<(), StoreError> {
        self.store
            .set_remove(&Self::keys(groups, GroupName::owners_key), &uid.as_member())
            .await
    }

    async fn decrement_member_counts(&self, groups: &[GroupName]) -> Result<(), StoreError> {
        self.store
            .decr_object_field(&Self::keys(groups, GroupName::object_key), FIELD_MEMBER_COUNT)
            .await
            .map(|_| ())
    }

    async fn owner_count(&self, group: &GroupName) -> Result<usize, StoreError> {
        self.store.set_count(&group.owners_key()).await
    }

    async fn upsert_visible_member_counts(
        &self,
        groups: &[GroupRecord],
    ) -> Result<(), StoreError> {
        let entries: Vec<(i64, String)> = groups
            .iter()
            .map(|g| (g.member_count, g.name.as_str().to_string()))
            .collect();
        self.store
            .sorted_set_add_bulk(VISIBLE_BY_MEMBER_COUNT, &entries)
            .await
    }

    async fn all_group_names(&self) -> Result<Vec<GroupName>, StoreError> {
        Ok(self
            .store
            .sorted_set_range(GROUPS_BY_CREATETIME, 0, -1)
            .await?
            .into_iter()
            .map(GroupName::from_stored)
            .collect())
    }
}

#[async_trait]
impl GroupCatalog for KvGroups {
    async fn get_groups(&self, groups: &[GroupName]) -> Result<Vec<GroupLookup>, StoreError> {
        let rows = self
            .store
            .get_objects_fields(
                &Self::keys(groups, GroupName::object_key),
                &[FIELD_NAME, FIELD_HIDDEN, FIELD_MEMBER_COUNT],
            )
            .await?;

        groups
            .iter()
            .zip(rows)
            .map(|(requested, row)| row.map(|r| parse_record(requested, r)).transpose())
            .collect()
    }

    async fn destroy(&self, groups: &[GroupName]) -> Result<(), StoreError> {
        if groups.is_empty() {
            return Ok(());
        }

        let mut keys = Vec::with_capacity(groups.len() * 5);
        for group in groups {
            keys.push(group.object_key());
            keys.push(group.members_key());
            keys.push(group.owners_key());
            keys.push(group.pending_key());
            keys.push(group.invited_key());
        }
        self.store.delete_all(&keys).await?;

        let indexes = [
            GROUPS_BY_CREATETIME.to_string(),
            VISIBLE_BY_CREATETIME.to_string(),
            VISIBLE_BY_MEMBER_COUNT.to_string(),
        ];
        for group in groups {
            self.store.sorted_set_remove(&indexes, group.as_str()).await?;
            self.store
                .sorted_set_remove(
                    &[VISIBLE_BY_NAME.to_string()],
                    &format!("{}:{}", group.as_str().to_lowercase(), group.as_str()),
                )
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl JoinRequests for KvGroups {
    async fn reject_membership(&self, groups: &[GroupName], uid: Uid) -> Result<(), StoreError> {
        if groups.is_empty() {
            return Ok(());
        }
        let mut keys = Self::keys(groups, GroupName::pending_key);
        keys.extend(Self::keys(groups, GroupName::invited_key));
        self.store.set_remove(&keys, &uid.as_member()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn name(s: &str) -> GroupName {
        GroupName::new(s).unwrap()
    }

    async fn seed(store: &MemoryStore, group: &str, hidden: bool, members: &[u64]) {
        let g = name(group);
        store
            .set_object(
                &g.object_key(),
                &[
                    ("name", group.to_string()),
                    ("hidden", if hidden { "1" } else { "0" }.to_string()),
                    ("memberCount", members.len().to_string()),
                ],
            )
            .await
            .unwrap();
        store.sorted_set_add(GROUPS_BY_CREATETIME, 1, group).await.unwrap();
        for m in members {
            store
                .sorted_set_add(&g.members_key(), 1, &m.to_string())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn get_groups_marks_missing_as_none() {
        let store = MemoryStore::new();
        seed(&store, "vip", true, &[1, 2]).await;
        let groups = KvGroups::new(Arc::new(store));

        let found = groups.get_groups(&[name("vip"), name("gone")]).await.unwrap();
        assert_eq!(
            found[0],
            Some(GroupRecord {
                name: name("vip"),
                hidden: true,
                member_count: 2,
            })
        );
        assert_eq!(found[1], None);
    }

    #[tokio::test]
    async fn get_groups_rejects_corrupt_count() {
        let store = MemoryStore::new();
        store
            .set_object_field("group:odd", "memberCount", "many")
            .await
            .unwrap();
        let groups = KvGroups::new(Arc::new(store));

        let result = groups.get_groups(&[name("odd")]).await;
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn destroy_removes_group_keys_and_index_entries() {
        let store = MemoryStore::new();
        seed(&store, "cid:1:privileges:read", false, &[]).await;
        store
            .sorted_set_add(VISIBLE_BY_MEMBER_COUNT, 0, "cid:1:privileges:read")
            .await
            .unwrap();
        let groups = KvGroups::new(Arc::new(store.clone()));

        let g = name("cid:1:privileges:read");
        groups.destroy(std::slice::from_ref(&g)).await.unwrap();

        assert!(!store.exists(&g.object_key()).await.unwrap());
        assert_eq!(
            store
                .sorted_set_score(VISIBLE_BY_MEMBER_COUNT, g.as_str())
                .await
                .unwrap(),
            None
        );
        assert!(groups.all_group_names().await.unwrap().is_empty());

        // Idempotent
        groups.destroy(std::slice::from_ref(&g)).await.unwrap();
    }

    #[tokio::test]
    async fn reject_membership_clears_pending_and_invited() {
        let store = MemoryStore::new();
        store.set_add("group:vip:pending", "4").await.unwrap();
        store.set_add("group:vip:invited", "4").await.unwrap();
        store.set_add("group:vip:invited", "5").await.unwrap();
        let groups = KvGroups::new(Arc::new(store.clone()));

        groups
            .reject_membership(&[name("vip")], Uid::new(4))
            .await
            .unwrap();

        assert!(!store.is_set_member("group:vip:pending", "4").await.unwrap());
        assert!(!store.is_set_member("group:vip:invited", "4").await.unwrap());
        assert!(store.is_set_member("group:vip:invited", "5").await.unwrap());
    }

    #[tokio::test]
    async fn all_group_names_in_creation_order() {
        let store = MemoryStore::new();
        store.sorted_set_add(GROUPS_BY_CREATETIME, 30, "c").await.unwrap();
        store.sorted_set_add(GROUPS_BY_CREATETIME, 10, "a").await.unwrap();
        store.sorted_set_add(GROUPS_BY_CREATETIME, 20, "b").await.unwrap();
        let groups = KvGroups::new(Arc::new(store));

        let names = groups.all_group_names().await.unwrap();
        assert_eq!(names, vec![name("a"), name("b"), name("c")]);
    }
}
