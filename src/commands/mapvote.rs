use poise::CreateReply;

use super::checks;
use crate::lobby::maps;
use crate::utils::embed;
use crate::{Context, Error};

async fn mapvote_impl(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;

    let results =
        maps::run_mapvote(ctx.data().gateway.as_ref(), ctx.channel_id(), maps::MAPVOTE_DURATION)
            .await?;

    ctx.send(CreateReply::default().embed(embed::mapvote_results(&results)))
        .await?;
    Ok(())
}

/// Vote on which map to play next
#[poise::command(prefix_command, slash_command, guild_only, check = "checks::in_lobby")]
pub async fn mapvote(ctx: Context<'_>) -> Result<(), Error> {
    mapvote_impl(ctx).await
}
