use poise::CreateReply;

use crate::utils::embed;
use crate::{Context, Error};

async fn help_impl(ctx: Context<'_>) -> Result<(), Error> {
    ctx.send(CreateReply::default().embed(embed::lobby_help(ctx.prefix())))
        .await?;
    Ok(())
}

/// Lobby command help
#[poise::command(prefix_command, slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    help_impl(ctx).await
}
