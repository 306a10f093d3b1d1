//! groups::traits
//!
//! Collaborator traits the lifecycle manager depends on.
//!
//! # Design
//!
//! Each trait is a narrow, async view of the group subsystem. They are
//! separate so tests can swap one collaborator (say, a catalog that loses a
//! group mid-flight) while keeping the real implementation of the others.
//!
//! All methods return [`StoreError`] unchanged from the storage layer; none
//! of them retry.

use async_trait::async_trait;

use crate::core::types::{GroupLookup, GroupName, GroupRecord, Uid};
use crate::store::StoreError;

/// Membership sets, owner sets, counters and the visible-groups index.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Membership of `uid` in each group, parallel to `groups`.
    async fn is_member_of_groups(
        &self,
        uid: Uid,
        groups: &[GroupName],
    ) -> Result<Vec<bool>, StoreError>;

    /// Remove `uid` from the member set of every group.
    async fn remove_members(&self, groups: &[GroupName], uid: Uid) -> Result<(), StoreError>;

    /// Remove `uid` from the owner set of every group.
    async fn remove_owners(&self, groups: &[GroupName], uid: Uid) -> Result<(), StoreError>;

    /// Decrement `memberCount` of every group by one, unconditionally.
    async fn decrement_member_counts(&self, groups: &[GroupName]) -> Result<(), StoreError>;

    /// Number of owners of a group.
    async fn owner_count(&self, group: &GroupName) -> Result<usize, StoreError>;

    /// Upsert `(memberCount, name)` of each group into the visible-groups index.
    async fn upsert_visible_member_counts(&self, groups: &[GroupRecord])
        -> Result<(), StoreError>;

    /// Every group ever created, oldest first.
    async fn all_group_names(&self) -> Result<Vec<GroupName>, StoreError>;
}

/// Group metadata lookup and permanent deletion.
#[async_trait]
pub trait GroupCatalog: Send + Sync {
    /// Fetch name, hidden flag and member count, parallel to `groups`.
    ///
    /// Groups that no longer exist yield `None`.
    async fn get_groups(&self, groups: &[GroupName]) -> Result<Vec<GroupLookup>, StoreError>;

    /// Permanently delete groups and every per-group key.
    ///
    /// Destroying a group that is already gone is not an error.
    async fn destroy(&self, groups: &[GroupName]) -> Result<(), StoreError>;
}

/// Pending join requests and invitations.
#[async_trait]
pub trait JoinRequests: Send + Sync {
    /// Cancel any pending request or invitation of `uid` for each group.
    async fn reject_membership(&self, groups: &[GroupName], uid: Uid) -> Result<(), StoreError>;
}
