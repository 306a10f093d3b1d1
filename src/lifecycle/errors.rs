//! lifecycle::errors
//!
//! Error type for membership lifecycle operations.
//!
//! # Taxonomy
//!
//! - No-op conditions (empty input, not a member, group vanished) are not
//!   errors at all; the operation simply succeeds.
//! - [`LifecycleError::OwnershipViolation`] is raised by `kick` before any
//!   mutation and carries a localizable code for the user.
//! - Collaborator failures pass through unchanged. Nothing is retried or
//!   rolled back; `leave` is safe to call again.
//! - Hook failures never reach this type.
//!
//! # Example
//!
//! ```
//! use memberflow::core::types::GroupName;
//! use memberflow::lifecycle::LifecycleError;
//!
//! let err = LifecycleError::OwnershipViolation {
//!     group: GroupName::new("vip").unwrap(),
//! };
//! assert_eq!(err.code(), Some("[[error:group-needs-owner]]"));
//! assert!(err.to_string().contains("vip"));
//! ```

use thiserror::Error;

use crate::core::types::GroupName;
use crate::store::StoreError;

/// Localized error key for removing a group's last owner.
pub const GROUP_NEEDS_OWNER: &str = "[[error:group-needs-owner]]";

/// Errors from lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Removing this owner would leave a populated group without owners.
    #[error("group '{group}' needs at least one owner")]
    OwnershipViolation {
        /// The group that would have lost its last owner
        group: GroupName,
    },

    /// A storage collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LifecycleError {
    /// The user-facing localization key, for errors meant for the user.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            LifecycleError::OwnershipViolation { .. } => Some(GROUP_NEEDS_OWNER),
            LifecycleError::Store(_) => None,
        }
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Store failures are retryable because `leave` re-checks membership.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LifecycleError::Store(_))
    }
}
