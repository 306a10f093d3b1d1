//! show command - Print a user's memberships and title

use std::sync::Arc;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};

use super::state::Session;
use crate::cli::Context;
use crate::core::types::{GroupName, Uid};
use crate::groups::{KvGroups, MembershipStore};
use crate::store::{KvStore, MemoryStore};
use crate::ui::output;
use crate::users::{KvUserTitles, UserTitleStore};

/// One group the user belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub group: GroupName,
    pub owner: bool,
    /// Join time, if the member score is a millisecond timestamp
    pub joined: Option<DateTime<Utc>>,
}

/// Everything `show` reports about a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub memberships: Vec<Membership>,
    pub pending: Vec<GroupName>,
    pub invited: Vec<GroupName>,
    /// `None` if the user record does not exist
    pub title: Option<Vec<GroupName>>,
}

/// Print what `uid` belongs to.
pub fn show(ctx: &Context, uid: Uid) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(show_async(ctx, uid))
}

async fn show_async(ctx: &Context, uid: Uid) -> Result<()> {
    let session = Session::open(ctx)?;
    let profile = collect(session.store(), uid)
        .await
        .with_context(|| format!("Failed to read memberships of user {}", uid))?;
    output::print(render(uid, &profile), ctx.verbosity);
    Ok(())
}

/// Gather the profile of `uid` from `store`.
pub async fn collect(store: &MemoryStore, uid: Uid) -> Result<Profile> {
    let groups = KvGroups::new(Arc::new(store.clone()));
    let member = uid.as_member();
    let mut profile = Profile::default();

    for group in groups.all_group_names().await? {
        if let Some(score) = store.sorted_set_score(&group.members_key(), &member).await? {
            profile.memberships.push(Membership {
                owner: store.is_set_member(&group.owners_key(), &member).await?,
                joined: DateTime::<Utc>::from_timestamp_millis(score).filter(|t| t.timestamp() > 0),
                group: group.clone(),
            });
        }
        if store.is_set_member(&group.pending_key(), &member).await? {
            profile.pending.push(group.clone());
        }
        if store.is_set_member(&group.invited_key(), &member).await? {
            profile.invited.push(group);
        }
    }

    let titles = KvUserTitles::new(Arc::new(store.clone()));
    profile.title = titles.get_title(uid).await?;
    Ok(profile)
}

/// Render a profile for display.
pub fn render(uid: Uid, profile: &Profile) -> String {
    let mut lines = vec![format!("User {}", uid)];

    if profile.memberships.is_empty() {
        lines.push("Groups: (none)".to_string());
    } else {
        lines.push("Groups:".to_string());
        for m in &profile.memberships {
            let mut notes = Vec::new();
            if m.owner {
                notes.push("owner".to_string());
            }
            if let Some(joined) = m.joined {
                notes.push(format!("joined {}", joined.format("%Y-%m-%d %H:%M UTC")));
            }
            if notes.is_empty() {
                lines.push(format!("  - {}", m.group));
            } else {
                lines.push(format!("  - {} ({})", m.group, notes.join(", ")));
            }
        }
    }

    lines.push(format!("Pending: {}", output::format_groups(&profile.pending)));
    lines.push(format!("Invited: {}", output::format_groups(&profile.invited)));
    lines.push(match &profile.title {
        Some(title) => format!("Title: {}", output::format_groups(title)),
        None => "Title: (no user record)".to_string(),
    });
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> GroupName {
        GroupName::from_stored(s)
    }

    #[tokio::test]
    async fn collects_memberships_requests_and_title() {
        let store = MemoryStore::new();
        store.sorted_set_add("groups:createtime", 1, "a").await.unwrap();
        store.sorted_set_add("groups:createtime", 2, "b").await.unwrap();
        store
            .sorted_set_add("group:a:members", 1_700_000_000_000, "5")
            .await
            .unwrap();
        store.set_add("group:a:owners", "5").await.unwrap();
        store.set_add("group:b:pending", "5").await.unwrap();
        store
            .set_object(
                "user:5",
                &[("username", "eve".into()), ("groupTitle", r#"["a"]"#.into())],
            )
            .await
            .unwrap();

        let profile = collect(&store, Uid::new(5)).await.unwrap();

        assert_eq!(profile.memberships.len(), 1);
        assert!(profile.memberships[0].owner);
        assert!(profile.memberships[0].joined.is_some());
        assert_eq!(profile.pending, vec![name("b")]);
        assert!(profile.invited.is_empty());
        assert_eq!(profile.title, Some(vec![name("a")]));
    }

    #[test]
    fn renders_join_time_in_utc() {
        let profile = Profile {
            memberships: vec![Membership {
                group: name("a"),
                owner: true,
                joined: DateTime::<Utc>::from_timestamp_millis(86_400_000),
            }],
            title: Some(vec![]),
            ..Default::default()
        };

        let text = render(Uid::new(1), &profile);

        assert!(text.contains("  - a (owner, joined 1970-01-02 00:00 UTC)"));
        assert!(text.contains("Pending: (none)"));
        assert!(text.contains("Title: (none)"));
    }

    #[test]
    fn renders_missing_user() {
        let text = render(Uid::new(9), &Profile::default());
        assert!(text.contains("Groups: (none)"));
        assert!(text.contains("Title: (no user record)"));
    }
}
