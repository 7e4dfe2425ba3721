use tracing::info;

use super::checks;
use crate::error::LobbyError;
use crate::lobby::gateway::ChannelEdit;
use crate::lobby::state;
use crate::{Context, Error};

/// Highest user limit a voice channel accepts. `0` means no limit.
pub const MAX_USER_LIMIT: u32 = 99;

pub fn clamp_limit(requested: u32) -> u32 {
    requested.min(MAX_USER_LIMIT)
}

async fn limit_impl(ctx: Context<'_>, limit: u32) -> Result<(), Error> {
    let gateway = ctx.data().gateway.as_ref();
    let lobby = state::require_lobby(gateway, ctx.channel_id()).await?;
    let voice = lobby
        .voice
        .as_ref()
        .ok_or_else(|| LobbyError::user("This lobby has no voice channel."))?;

    let applied = clamp_limit(limit);
    info!("setting user limit of {} to {applied}", lobby.group.name);
    gateway
        .edit_channel(voice.id, ChannelEdit::user_limit(applied))
        .await?;

    if applied == 0 {
        ctx.say("The lobby's user limit has been removed.").await?;
    } else {
        ctx.say(format!("The lobby's user limit is now {applied}."))
            .await?;
    }
    Ok(())
}

/// Change the lobby's user limit, use 0 to remove it
#[poise::command(prefix_command, slash_command, guild_only, check = "checks::in_lobby")]
pub async fn limit(
    ctx: Context<'_>,
    #[description = "User limit (0-99)"] limit: u32,
) -> Result<(), Error> {
    limit_impl(ctx, limit).await
}
