//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Uid`] - User identifier
//! - [`GroupName`] - Group name (the unique group key)
//! - [`GroupRecord`] - Group metadata as read from the catalog
//! - [`GroupLookup`] - Catalog lookup result that may miss
//!
//! # Validation
//!
//! Names typed in by a person go through [`GroupName::new`], which rejects
//! values that can never name a group. Names read back from storage use
//! [`GroupName::from_stored`] and are taken as-is.
//!
//! # Examples
//!
//! ```
//! use memberflow::core::types::{GroupName, Uid};
//!
//! let name = GroupName::new("team-a").unwrap();
//! assert_eq!(name.as_str(), "team-a");
//! assert_eq!(name.members_key(), "group:team-a:members");
//!
//! assert!(GroupName::new("").is_err());
//! assert!(GroupName::new("   ").is_err());
//!
//! let uid: Uid = "42".parse().unwrap();
//! assert_eq!(uid.user_key(), "user:42");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid group name: {0}")]
    InvalidGroupName(String),

    #[error("invalid user id: {0}")]
    InvalidUid(String),
}

/// A user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(u64);

impl Uid {
    /// Wrap a raw numeric id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Key of the user's object record.
    pub fn user_key(self) -> String {
        format!("user:{}", self.0)
    }

    /// The id as stored inside membership sets.
    pub fn as_member(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Uid {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Uid)
            .map_err(|_| TypeError::InvalidUid(format!("'{}' is not a numeric user id", s)))
    }
}

impl From<u64> for Uid {
    fn from(id: u64) -> Self {
        Uid(id)
    }
}

/// A group name.
///
/// Group names are the unique key of a group and are embedded verbatim in
/// storage keys (`group:<name>`, `group:<name>:members`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupName(String);

impl GroupName {
    /// Create a validated group name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidGroupName` if the name is empty, blank, or
    /// contains control characters.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TypeError::InvalidGroupName(
                "group name cannot be empty".into(),
            ));
        }
        if name.chars().any(|c| c.is_control()) {
            return Err(TypeError::InvalidGroupName(
                "group name cannot contain control characters".into(),
            ));
        }
        Ok(Self(name))
    }

    /// Wrap a name read back from storage without validation.
    pub fn from_stored(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of the group's object record.
    pub fn object_key(&self) -> String {
        format!("group:{}", self.0)
    }

    /// Key of the member sorted set (score = join time).
    pub fn members_key(&self) -> String {
        format!("group:{}:members", self.0)
    }

    /// Key of the owner set.
    pub fn owners_key(&self) -> String {
        format!("group:{}:owners", self.0)
    }

    /// Key of the pending join request set.
    pub fn pending_key(&self) -> String {
        format!("group:{}:pending", self.0)
    }

    /// Key of the outstanding invitation set.
    pub fn invited_key(&self) -> String {
        format!("group:{}:invited", self.0)
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for GroupName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for GroupName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for GroupName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl FromStr for GroupName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroupName::new(s)
    }
}

/// Group metadata as seen by the leave workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub name: GroupName,
    pub hidden: bool,
    /// May transiently disagree with the member set while a leave is in flight.
    pub member_count: i64,
}

/// A catalog lookup; `None` means the group no longer exists.
pub type GroupLookup = Option<GroupRecord>;
