//! leave-all command - Remove a user from every group

use anyhow::{Context as _, Result};

use super::state::Session;
use crate::cli::Context;
use crate::core::types::Uid;
use crate::ui::output;

/// Remove `uid` from every group and cancel its pending requests.
pub fn leave_all(ctx: &Context, uid: Uid) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(leave_all_async(ctx, uid))
}

async fn leave_all_async(ctx: &Context, uid: Uid) -> Result<()> {
    let session = Session::open(ctx)?;
    let outcome = session
        .manager()
        .leave_all_groups(uid)
        .await
        .with_context(|| format!("Failed to remove user {} from all groups", uid))?;
    session.commit()?;

    output::success(output::format_outcome(&outcome), ctx.verbosity);
    Ok(())
}
