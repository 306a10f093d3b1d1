//! lifecycle::title
//!
//! Scrubbing departed groups from a user's display title.

use crate::core::naming::is_titleable;
use crate::core::types::{GroupName, Uid};

use super::errors::LifecycleError;
use super::manager::MembershipLifecycleManager;

/// Remove every entry of `left` from `title`, preserving order.
///
/// Returns `None` when nothing was removed.
pub fn scrub_title(title: &[GroupName], left: &[GroupName]) -> Option<Vec<GroupName>> {
    let kept: Vec<GroupName> = title
        .iter()
        .filter(|entry| !left.contains(*entry))
        .cloned()
        .collect();
    (kept.len() != title.len()).then_some(kept)
}

impl MembershipLifecycleManager {
    /// Drop `group_names` from the title of `uid`.
    ///
    /// The registered-users group and privilege groups can never appear in
    /// a title and are ignored. A missing user is not an error. An emptied
    /// title is deleted rather than stored as `[]`.
    pub async fn clear_group_title_if_set(
        &self,
        group_names: &[GroupName],
        uid: Uid,
    ) -> Result<(), LifecycleError> {
        let candidates: Vec<GroupName> = group_names
            .iter()
            .filter(|g| is_titleable(g.as_str()))
            .cloned()
            .collect();
        if candidates.is_empty() {
            return Ok(());
        }

        let Some(title) = self.deps.titles.get_title(uid).await? else {
            return Ok(());
        };
        let Some(kept) = scrub_title(&title, &candidates) else {
            return Ok(());
        };

        if kept.is_empty() {
            self.deps.titles.delete_title(uid).await?;
        } else {
            self.deps.titles.set_title(uid, &kept).await?;
        }
        tracing::debug!(uid = %uid, remaining = kept.len(), "title scrubbed");
        Ok(())
    }
}
