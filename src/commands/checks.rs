use crate::lobby::state;
use crate::{Context, Error};

/// Allows the command only inside a lobby. Failing raises a user error, so the
/// invoker is told why instead of the command silently not running.
pub async fn in_lobby(ctx: Context<'_>) -> Result<bool, Error> {
    state::require_lobby(ctx.data().gateway.as_ref(), ctx.channel_id()).await?;
    Ok(true)
}
