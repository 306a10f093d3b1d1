//! groups
//!
//! The group subsystem as seen by the leave workflow.
//!
//! # Modules
//!
//! - `traits`: [`MembershipStore`], [`GroupCatalog`], [`JoinRequests`]
//! - [`kv`]: [`KvGroups`], one adapter implementing all three on a [`KvStore`](crate::store::KvStore)
//!
//! Group creation and joining live elsewhere; only the reads and removals a
//! departure needs are modelled here.

pub mod kv;
mod traits;

pub use kv::KvGroups;
pub use traits::{GroupCatalog, JoinRequests, MembershipStore};
