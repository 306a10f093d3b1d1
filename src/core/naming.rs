//! core::naming
//!
//! Group naming conventions.
//!
//! # Features
//!
//! - Recognize privilege groups from their reserved name shape
//! - Name the built-in registered-users pseudo-group
//!
//! Privilege groups are named `cid:<category>:privileges:<privilege>` where
//! `<category>` is a (possibly negative) integer or `admin`, and
//! `<privilege>` is one or more of `[A-Za-z0-9_:-]`.

/// The pseudo-group every registered account belongs to.
pub const REGISTERED_USERS: &str = "registered-users";

const PRIVILEGE_PREFIX: &str = "cid:";
const PRIVILEGE_INFIX: &str = ":privileges:";

/// Check whether a group name follows the privilege-group convention.
///
/// # Example
///
/// ```
/// use memberflow::core::naming::is_privilege_group;
///
/// assert!(is_privilege_group("cid:1:privileges:groups:find"));
/// assert!(is_privilege_group("cid:admin:privileges:admin:users"));
/// assert!(is_privilege_group("cid:-1:privileges:chat"));
/// assert!(!is_privilege_group("administrators"));
/// assert!(!is_privilege_group("cid:x:privileges:read"));
/// ```
pub fn is_privilege_group(name: &str) -> bool {
    let Some(rest) = name.strip_prefix(PRIVILEGE_PREFIX) else {
        return false;
    };
    let Some(idx) = rest.find(PRIVILEGE_INFIX) else {
        return false;
    };
    let (category, privilege) = (&rest[..idx], &rest[idx + PRIVILEGE_INFIX.len()..]);

    valid_category(category) && valid_privilege(privilege)
}

fn valid_category(category: &str) -> bool {
    if category == "admin" {
        return true;
    }
    let digits = category.strip_prefix('-').unwrap_or(category);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn valid_privilege(privilege: &str) -> bool {
    !privilege.is_empty()
        && privilege
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':'))
}

/// Whether a group may appear in a user's display title.
///
/// Titles never reference the registered-users pseudo-group or privilege
/// groups.
pub fn is_titleable(name: &str) -> bool {
    name != REGISTERED_USERS && !is_privilege_group(name)
}
