use poise::serenity_prelude as serenity;
use tracing::info;

use super::{checks, member_info};
use crate::error::LobbyError;
use crate::lobby::state;
use crate::lobby::vote::{self, VoteOutcome};
use crate::{Context, Error};

async fn votekick_impl(
    ctx: Context<'_>,
    target: serenity::Member,
    reason: String,
) -> Result<(), Error> {
    let data = ctx.data();
    let gateway = data.gateway.as_ref();
    let lobby = state::require_lobby(gateway, ctx.channel_id()).await?;
    let voice = lobby
        .voice
        .as_ref()
        .ok_or_else(|| LobbyError::user("This lobby has no voice channel."))?;

    let session = vote::open_session(
        gateway,
        voice.id,
        ctx.author().id,
        member_info(&target),
        reason,
        lobby.group.name.clone(),
    )
    .await?;

    ctx.defer().await?;

    info!(
        "{} started a votekick against {} in {}",
        session.initiator.display_name, session.target.display_name, session.lobby_name
    );
    let result = vote::run_votekick(
        gateway,
        &data.audit,
        &session,
        ctx.channel_id(),
        vote::VOTE_TIMEOUT,
    )
    .await?;

    let verdict = match result.outcome {
        VoteOutcome::Kicked => "has been kicked from the lobby",
        VoteOutcome::NotKicked => "was **not** kicked",
    };
    ctx.say(format!(
        "Vote finished: {} {verdict} ({}/{} votes).",
        session.target.display_name,
        result.tally.affirm.len(),
        session.quorum
    ))
    .await?;
    Ok(())
}

/// Start a vote to kick a member from the lobby
#[poise::command(prefix_command, slash_command, guild_only, check = "checks::in_lobby")]
pub async fn votekick(
    ctx: Context<'_>,
    #[description = "Member to kick"] member: serenity::Member,
    #[description = "Why they should be kicked"]
    #[rest]
    reason: String,
) -> Result<(), Error> {
    votekick_impl(ctx, member, reason).await
}
