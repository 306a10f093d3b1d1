//! kick command - Remove a user from a group on someone else's behalf

use anyhow::{anyhow, Result};
use tracing::debug;

use super::state::Session;
use crate::cli::Context;
use crate::core::types::{GroupName, Uid};
use crate::ui::output;

/// Kick `uid` out of `group`.
///
/// With `is_owner`, refuses to remove the group's last owner and leaves the
/// state file untouched.
pub fn kick(ctx: &Context, uid: Uid, group: &GroupName, is_owner: bool) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(kick_async(ctx, uid, group, is_owner))
}

async fn kick_async(ctx: &Context, uid: Uid, group: &GroupName, is_owner: bool) -> Result<()> {
    let session = Session::open(ctx)?;
    let outcome = session
        .manager()
        .kick(uid, group, is_owner)
        .await
        .map_err(|e| match e.code() {
            Some(code) => {
                debug!(error = %e, "kick refused");
                anyhow!(code)
            }
            None => anyhow::Error::new(e)
                .context(format!("Failed to kick user {} from '{}'", uid, group)),
        })?;
    session.commit()?;

    output::success(output::format_outcome(&outcome), ctx.verbosity);
    Ok(())
}
