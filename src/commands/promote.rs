use poise::serenity_prelude as serenity;

use super::{checks, member_info};
use crate::error::LobbyError;
use crate::lobby::{access, state};
use crate::{Context, Error};

async fn promote_impl(ctx: Context<'_>, target: serenity::Member) -> Result<(), Error> {
    let gateway = ctx.data().gateway.as_ref();
    let lobby = state::require_lobby(gateway, ctx.channel_id()).await?;
    let voice = lobby
        .voice
        .as_ref()
        .ok_or_else(|| LobbyError::user("This lobby has no voice channel."))?;

    let member = member_info(&target);
    if gateway.voice_channel_of(member.id).await? != Some(voice.id) {
        return Err(LobbyError::user(format!(
            "{} must be in the lobby's voice chat to be promoted.",
            member.display_name
        )));
    }

    access::promote(gateway, &member, lobby.group.id).await?;
    ctx.say(format!("{} is now a lobby moderator.", member.display_name))
        .await?;
    Ok(())
}

/// Give a lobby member moderation rights in the lobby
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    check = "checks::in_lobby",
    required_permissions = "MANAGE_CHANNELS"
)]
pub async fn promote(
    ctx: Context<'_>,
    #[description = "Member to promote"] member: serenity::Member,
) -> Result<(), Error> {
    promote_impl(ctx, member).await
}
