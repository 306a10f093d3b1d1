//! lifecycle::manager
//!
//! The membership departure workflow.
//!
//! # Leave sequence
//!
//! 1. Drop empty input
//! 2. Batched membership check against the store; keep only groups the
//!    user is in
//! 3. Remove from members, remove from owners, decrement counts (joined)
//! 4. Invalidate cached membership
//! 5. Re-read group metadata; groups that vanished are skipped
//! 6. Partition into empty privilege groups and visible groups
//! 7. Destroy empty privilege groups
//! 8. Refresh the visible-groups-by-member-count index
//! 9. Steps 7 and 8 run concurrently; both are awaited
//! 10. Scrub the left groups from the user's title
//! 11. Fire `action:group.leave`, ignoring listener failures
//!
//! # Invariants
//!
//! - Step 2 never trusts the cache; another manager may have changed
//!   membership since an answer was cached
//! - Step 4 runs after step 3 commits and before step 5 reads
//! - Counters are decremented unconditionally, never read-modify-written
//! - A repeated `leave` is a no-op, so callers may retry blindly
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use memberflow::core::types::{GroupName, Uid};
//! use memberflow::lifecycle::{LifecycleDeps, MembershipLifecycleManager};
//! use memberflow::store::{KvStore, MemoryStore};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! store.set_object("group:vip", &[("name", "vip".into()), ("hidden", "0".into()), ("memberCount", "1".into())]).await.unwrap();
//! store.sorted_set_add("group:vip:members", 1, "7").await.unwrap();
//!
//! let manager = MembershipLifecycleManager::new(LifecycleDeps::from_store(Arc::new(store.clone())));
//! let outcome = manager.leave(&[GroupName::new("vip").unwrap()], Uid::new(7)).await.unwrap();
//!
//! assert_eq!(outcome.left.len(), 1);
//! assert_eq!(store.sorted_set_score("groups:visible:memberCount", "vip").await.unwrap(), Some(0));
//! # });
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use super::errors::LifecycleError;
use crate::cache::{LocalCache, MembershipCache};
use crate::core::naming::is_privilege_group;
use crate::core::types::{GroupName, GroupRecord, Uid};
use crate::groups::{GroupCatalog, JoinRequests, KvGroups, MembershipStore};
use crate::hooks::{HookBus, HookEvent, LoggingHookBus};
use crate::store::KvStore;
use crate::users::{KvUserTitles, UserTitleStore};

/// Collaborators of the lifecycle manager.
#[derive(Clone)]
pub struct LifecycleDeps {
    pub memberships: Arc<dyn MembershipStore>,
    pub catalog: Arc<dyn GroupCatalog>,
    pub join_requests: Arc<dyn JoinRequests>,
    pub cache: Arc<dyn MembershipCache>,
    pub titles: Arc<dyn UserTitleStore>,
    pub hooks: Arc<dyn HookBus>,
}

impl LifecycleDeps {
    /// Wire every collaborator onto one store, with a default-sized local
    /// cache and a logging hook bus.
    pub fn from_store(store: Arc<dyn KvStore>) -> Self {
        Self::from_store_with(store, Arc::new(LocalCache::default()), Arc::new(LoggingHookBus))
    }

    /// Wire every collaborator onto one store with the given cache and hooks.
    pub fn from_store_with(
        store: Arc<dyn KvStore>,
        cache: Arc<dyn MembershipCache>,
        hooks: Arc<dyn HookBus>,
    ) -> Self {
        let groups = Arc::new(KvGroups::new(store.clone()));
        Self {
            memberships: groups.clone(),
            catalog: groups.clone(),
            join_requests: groups,
            cache,
            titles: Arc::new(KvUserTitles::new(store)),
            hooks,
        }
    }
}

/// What a leave changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// Groups the user was removed from, in input order.
    pub left: Vec<GroupName>,
    /// Privilege groups destroyed because they became empty.
    pub destroyed: Vec<GroupName>,
    /// Visible groups whose index entry was refreshed.
    pub reindexed: Vec<GroupName>,
}

impl LeaveOutcome {
    /// Whether the call changed nothing.
    pub fn is_noop(&self) -> bool {
        self.left.is_empty()
    }
}

/// Orchestrates `leave`, `kick` and `leave_all_groups`.
pub struct MembershipLifecycleManager {
    pub(super) deps: LifecycleDeps,
}

impl MembershipLifecycleManager {
    /// Create a manager over explicit collaborators.
    pub fn new(deps: LifecycleDeps) -> Self {
        Self { deps }
    }

    /// Membership of `uid` in each group, parallel to `groups`.
    ///
    /// Cached answers are used as-is; the rest are fetched in one batch and
    /// cached. `leave` bypasses this and asks the store.
    pub async fn is_member_of_groups(
        &self,
        uid: Uid,
        groups: &[GroupName],
    ) -> Result<Vec<bool>, LifecycleError> {
        let mut answers: Vec<Option<bool>> =
            groups.iter().map(|g| self.deps.cache.get(uid, g)).collect();

        let misses: Vec<GroupName> = groups
            .iter()
            .zip(&answers)
            .filter(|(_, cached)| cached.is_none())
            .map(|(g, _)| g.clone())
            .collect();

        if !misses.is_empty() {
            let fresh = self.deps.memberships.is_member_of_groups(uid, &misses).await?;
            let mut fresh = misses.iter().zip(fresh);
            for answer in answers.iter_mut().filter(|a| a.is_none()) {
                if let Some((group, is_member)) = fresh.next() {
                    self.deps.cache.put(uid, group, is_member);
                    *answer = Some(is_member);
                }
            }
        }

        Ok(answers.into_iter().map(|a| a.unwrap_or(false)).collect())
    }

    /// Remove `uid` from every named group it belongs to.
    ///
    /// Groups the user is not in are ignored, and so is a repeated name.
    /// Empty input succeeds without touching anything.
    #[tracing::instrument(level = "debug", skip_all, fields(uid = %uid, requested = group_names.len()))]
    pub async fn leave(
        &self,
        group_names: &[GroupName],
        uid: Uid,
    ) -> Result<LeaveOutcome, LifecycleError> {
        if group_names.is_empty() {
            return Ok(LeaveOutcome::default());
        }

        let is_member = self
            .deps
            .memberships
            .is_member_of_groups(uid, group_names)
            .await?;
        let mut seen = HashSet::new();
        let to_leave: Vec<GroupName> = group_names
            .iter()
            .zip(is_member)
            .filter(|(name, member)| *member && seen.insert(name.as_str()))
            .map(|(name, _)| name.clone())
            .collect();
        if to_leave.is_empty() {
            debug!("not a member of any requested group");
            return Ok(LeaveOutcome::default());
        }

        let memberships = &self.deps.memberships;
        tokio::try_join!(
            memberships.remove_members(&to_leave, uid),
            memberships.remove_owners(&to_leave, uid),
            memberships.decrement_member_counts(&to_leave),
        )?;
        debug!(groups = to_leave.len(), "membership removed");

        self.deps.cache.clear(uid, &to_leave);
        let member_keys: Vec<String> = to_leave.iter().map(GroupName::members_key).collect();
        self.deps.cache.del(&member_keys);

        let refreshed: Vec<GroupRecord> = self
            .deps
            .catalog
            .get_groups(&to_leave)
            .await?
            .into_iter()
            .flatten()
            .collect();
        if refreshed.is_empty() {
            debug!("groups vanished before metadata refresh");
            return Ok(LeaveOutcome {
                left: to_leave,
                ..Default::default()
            });
        }

        let empty_privilege: Vec<GroupName> = refreshed
            .iter()
            .filter(|g| g.member_count == 0 && is_privilege_group(g.name.as_str()))
            .map(|g| g.name.clone())
            .collect();
        let visible: Vec<GroupRecord> = refreshed.into_iter().filter(|g| !g.hidden).collect();

        // Reindex is polled before destroy; a destroyed group must not be
        // written back into the visible index.
        let reindex = async {
            if visible.is_empty() {
                return Ok(());
            }
            memberships.upsert_visible_member_counts(&visible).await
        };
        let destroy = async {
            if empty_privilege.is_empty() {
                return Ok(());
            }
            self.deps.catalog.destroy(&empty_privilege).await
        };
        let (reindexed, destroyed) = tokio::join!(reindex, destroy);
        reindexed?;
        destroyed?;
        debug!(
            destroyed = empty_privilege.len(),
            reindexed = visible.len(),
            "derived state refreshed"
        );

        self.clear_group_title_if_set(&to_leave, uid).await?;

        self.fire(HookEvent::GroupLeave {
            group_names: to_leave.clone(),
            uid,
        })
        .await;

        Ok(LeaveOutcome {
            left: to_leave,
            destroyed: empty_privilege,
            reindexed: visible.into_iter().map(|g| g.name).collect(),
        })
    }

    /// Leave a single group.
    pub async fn leave_one(
        &self,
        group_name: &GroupName,
        uid: Uid,
    ) -> Result<LeaveOutcome, LifecycleError> {
        self.leave(std::slice::from_ref(group_name), uid).await
    }

    /// Remove `uid` from a group on someone else's behalf.
    ///
    /// When `is_owner` is set the group must keep at least one other owner,
    /// otherwise [`LifecycleError::OwnershipViolation`] is returned and
    /// nothing changes. The owner count is read before the removal, so two
    /// concurrent kicks of the last two owners can both pass.
    #[tracing::instrument(level = "debug", skip_all, fields(uid = %uid, group = %group_name))]
    pub async fn kick(
        &self,
        uid: Uid,
        group_name: &GroupName,
        is_owner: bool,
    ) -> Result<LeaveOutcome, LifecycleError> {
        if is_owner {
            let owners = self.deps.memberships.owner_count(group_name).await?;
            if owners <= 1 {
                return Err(LifecycleError::OwnershipViolation {
                    group: group_name.clone(),
                });
            }
        }
        self.leave_one(group_name, uid).await
    }

    /// Remove `uid` from every group and cancel its pending requests.
    ///
    /// Used when an account is deleted or deactivated.
    #[tracing::instrument(level = "debug", skip_all, fields(uid = %uid))]
    pub async fn leave_all_groups(&self, uid: Uid) -> Result<LeaveOutcome, LifecycleError> {
        let groups = self.deps.memberships.all_group_names().await?;
        let (outcome, ()) = tokio::try_join!(
            self.leave(&groups, uid),
            self.reject_membership(&groups, uid)
        )?;
        Ok(outcome)
    }

    /// Cancel pending join requests and invitations of `uid`.
    pub async fn reject_membership(
        &self,
        group_names: &[GroupName],
        uid: Uid,
    ) -> Result<(), LifecycleError> {
        if group_names.is_empty() {
            return Ok(());
        }
        self.deps
            .join_requests
            .reject_membership(group_names, uid)
            .await?;
        self.fire(HookEvent::GroupRejectMembership {
            group_names: group_names.to_vec(),
            uid,
        })
        .await;
        Ok(())
    }

    async fn fire(&self, event: HookEvent) {
        let name = event.name();
        if let Err(e) = self.deps.hooks.fire(event).await {
            warn!(hook = name, error = %e, "hook failed; ignoring");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RecordingCache;
    use crate::core::types::GroupLookup;
    use crate::hooks::{HookError, RecordingHookBus};
    use crate::store::{FailOn, MemoryStore, StoreError, StoreOp};
    use async_trait::async_trait;

    fn name(s: &str) -> GroupName {
        GroupName::new(s).unwrap()
    }

    async fn seed_group(store: &MemoryStore, group: &str, hidden: bool, members: &[u64]) {
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
        for m in members {
            store
                .sorted_set_add(&g.members_key(), 1, &m.to_string())
                .await
                .unwrap();
        }
    }

    fn manager_with(store: &MemoryStore, hooks: RecordingHookBus) -> MembershipLifecycleManager {
        MembershipLifecycleManager::new(LifecycleDeps::from_store_with(
            Arc::new(store.clone()),
            Arc::new(LocalCache::new(64)),
            Arc::new(hooks),
        ))
    }

    #[tokio::test]
    async fn empty_input_touches_nothing() {
        let store = MemoryStore::new();
        let hooks = RecordingHookBus::new();
        let manager = manager_with(&store, hooks.clone());

        let outcome = manager.leave(&[], Uid::new(1)).await.unwrap();

        assert!(outcome.is_noop());
        assert!(store.operations().is_empty());
        assert!(hooks.events().is_empty());
    }

    #[tokio::test]
    async fn cache_is_invalidated_before_metadata_is_read() {
        let store = MemoryStore::new();
        seed_group(&store, "a", false, &[1, 2]).await;
        let cache = RecordingCache::new(64);
        let manager = MembershipLifecycleManager::new(LifecycleDeps::from_store_with(
            Arc::new(store.clone()),
            Arc::new(cache.clone()),
            Arc::new(RecordingHookBus::new()),
        ));

        // Prime the cache
        assert_eq!(
            manager.is_member_of_groups(Uid::new(1), &[name("a")]).await.unwrap(),
            vec![true]
        );

        manager.leave(&[name("a")], Uid::new(1)).await.unwrap();

        assert_eq!(
            cache.invalidated(),
            vec!["1:a".to_string(), "group:a:members".to_string()]
        );
        assert_eq!(
            manager.is_member_of_groups(Uid::new(1), &[name("a")]).await.unwrap(),
            vec![false]
        );

        // Mutations happen before the catalog read
        let ops = store.operations();
        let read_at = ops
            .iter()
            .position(|op| matches!(op, StoreOp::GetObjectsFields { .. }))
            .unwrap();
        let last_decr = ops
            .iter()
            .rposition(|op| matches!(op, StoreOp::DecrObjectField { .. }))
            .unwrap();
        assert!(last_decr < read_at);
    }

    #[tokio::test]
    async fn leave_ignores_membership_cached_before_another_manager_left() {
        let store = MemoryStore::new();
        seed_group(&store, "g", false, &[1, 2, 3]).await;
        let a = manager_with(&store, RecordingHookBus::new());
        let b = manager_with(&store, RecordingHookBus::new());

        assert_eq!(
            a.is_member_of_groups(Uid::new(1), &[name("g")]).await.unwrap(),
            vec![true]
        );
        b.leave(&[name("g")], Uid::new(1)).await.unwrap();

        let outcome = a.leave(&[name("g")], Uid::new(1)).await.unwrap();

        assert!(outcome.is_noop());
        assert_eq!(
            store.get_object_field("group:g", "memberCount").await.unwrap(),
            Some("2".to_string())
        );
    }

    #[tokio::test]
    async fn leave_ignores_cached_non_membership() {
        let store = MemoryStore::new();
        seed_group(&store, "g", false, &[2]).await;
        let manager = manager_with(&store, RecordingHookBus::new());

        assert_eq!(
            manager.is_member_of_groups(Uid::new(1), &[name("g")]).await.unwrap(),
            vec![false]
        );
        store.sorted_set_add("group:g:members", 5, "1").await.unwrap();
        store
            .set_object_field("group:g", "memberCount", "2")
            .await
            .unwrap();

        let outcome = manager.leave(&[name("g")], Uid::new(1)).await.unwrap();

        assert_eq!(outcome.left, vec![name("g")]);
        assert!(store
            .sorted_set_score("group:g:members", "1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_names_decrement_once() {
        let store = MemoryStore::new();
        seed_group(&store, "a", true, &[1, 2]).await;
        let manager = manager_with(&store, RecordingHookBus::new());

        let outcome = manager
            .leave(&[name("a"), name("a")], Uid::new(1))
            .await
            .unwrap();

        assert_eq!(outcome.left, vec![name("a")]);
        assert_eq!(
            store.get_object_field("group:a", "memberCount").await.unwrap(),
            Some("1".to_string())
        );
    }

    #[tokio::test]
    async fn hook_failure_does_not_fail_leave() {
        let store = MemoryStore::new();
        seed_group(&store, "a", false, &[1]).await;
        let hooks = RecordingHookBus::failing(HookError::ListenerFailed {
            event: "action:group.leave",
            message: "plugin crashed".into(),
        });
        let manager = manager_with(&store, hooks.clone());

        let outcome = manager.leave(&[name("a")], Uid::new(1)).await.unwrap();

        assert_eq!(outcome.left, vec![name("a")]);
        assert_eq!(
            hooks.events(),
            vec![HookEvent::GroupLeave {
                group_names: vec![name("a")],
                uid: Uid::new(1),
            }]
        );
    }

    #[tokio::test]
    async fn store_failure_propagates_without_hook() {
        let store = MemoryStore::new();
        seed_group(&store, "a", false, &[1]).await;
        let store = store.fail_on(FailOn::DecrObjectField(StoreError::Unavailable(
            "down".into(),
        )));
        let hooks = RecordingHookBus::new();
        let manager = manager_with(&store, hooks.clone());

        let result = manager.leave(&[name("a")], Uid::new(1)).await;

        assert!(matches!(
            result,
            Err(LifecycleError::Store(StoreError::Unavailable(_)))
        ));
        assert!(hooks.events().is_empty());
    }

    /// Catalog that reports every group as already deleted.
    struct VanishedCatalog;

    #[async_trait]
    impl GroupCatalog for VanishedCatalog {
        async fn get_groups(&self, groups: &[GroupName]) -> Result<Vec<GroupLookup>, StoreError> {
            Ok(vec![None; groups.len()])
        }

        async fn destroy(&self, _groups: &[GroupName]) -> Result<(), StoreError> {
            panic!("nothing to destroy");
        }
    }

    #[tokio::test]
    async fn vanished_groups_end_the_leave_quietly() {
        let store = MemoryStore::new();
        seed_group(&store, "a", false, &[1]).await;
        let hooks = RecordingHookBus::new();
        let mut deps = LifecycleDeps::from_store_with(
            Arc::new(store.clone()),
            Arc::new(LocalCache::new(8)),
            Arc::new(hooks.clone()),
        );
        deps.catalog = Arc::new(VanishedCatalog);
        let manager = MembershipLifecycleManager::new(deps);

        let outcome = manager.leave(&[name("a")], Uid::new(1)).await.unwrap();

        assert_eq!(outcome.left, vec![name("a")]);
        assert!(outcome.destroyed.is_empty());
        assert!(outcome.reindexed.is_empty());
        assert!(hooks.events().is_empty());
    }

    #[tokio::test]
    async fn visible_privilege_group_is_destroyed_and_not_reindexed() {
        let store = MemoryStore::new();
        let group = "cid:2:privileges:topics:create";
        seed_group(&store, group, false, &[1]).await;
        store
            .sorted_set_add("groups:visible:memberCount", 1, group)
            .await
            .unwrap();
        let manager = manager_with(&store, RecordingHookBus::new());

        let outcome = manager.leave(&[name(group)], Uid::new(1)).await.unwrap();

        assert_eq!(outcome.destroyed, vec![name(group)]);
        assert!(!store.exists(&name(group).object_key()).await.unwrap());
        assert_eq!(
            store
                .sorted_set_score("groups:visible:memberCount", group)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn reject_membership_fires_its_own_hook() {
        let store = MemoryStore::new();
        store.set_add("group:a:pending", "3").await.unwrap();
        let hooks = RecordingHookBus::new();
        let manager = manager_with(&store, hooks.clone());

        manager
            .reject_membership(&[name("a")], Uid::new(3))
            .await
            .unwrap();

        assert!(!store.is_set_member("group:a:pending", "3").await.unwrap());
        assert_eq!(hooks.events()[0].name(), "action:group.rejectMembership");
    }
}
