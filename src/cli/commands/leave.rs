//! leave command - Remove a user from groups

use anyhow::{Context as _, Result};

use super::state::Session;
use crate::cli::Context;
use crate::core::types::{GroupName, Uid};
use crate::ui::output;

/// Remove `uid` from `groups`.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn leave(ctx: &Context, uid: Uid, groups: &[GroupName]) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(leave_async(ctx, uid, groups))
}

async fn leave_async(ctx: &Context, uid: Uid, groups: &[GroupName]) -> Result<()> {
    let session = Session::open(ctx)?;
    let outcome = session
        .manager()
        .leave(groups, uid)
        .await
        .with_context(|| format!("Failed to remove user {} from groups", uid))?;
    session.commit()?;

    output::success(output::format_outcome(&outcome), ctx.verbosity);
    Ok(())
}
