use poise::serenity_prelude as serenity;
use poise::CreateReply;
use tracing::info;

use super::checks;
use crate::error::LobbyError;
use crate::lobby::maps::{self, GameMap};
use crate::{Context, Error};

async fn send_map(ctx: Context<'_>, map: &GameMap) -> Result<(), Error> {
    let path = map.image_path(&ctx.data().config.assets_dir);
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(LobbyError::Admin(format!(
            "map image {} is missing",
            path.display()
        )));
    }

    let attachment = serenity::CreateAttachment::path(&path).await?;
    ctx.send(CreateReply::default().attachment(attachment))
        .await?;
    info!("uploaded map {} for {}", map.file, ctx.author().name);
    Ok(())
}

async fn map_impl(ctx: Context<'_>, name: Option<String>) -> Result<(), Error> {
    if let Some(map) = name.as_deref().and_then(maps::find_map) {
        return send_map(ctx, map).await;
    }

    // Unknown or missing names fall back to the picker.
    let picked = maps::pick_map(
        ctx.data().gateway.as_ref(),
        ctx.channel_id(),
        maps::MAP_PICK_TIMEOUT,
    )
    .await?;
    match picked {
        Some(map) => send_map(ctx, map).await,
        None => {
            ctx.say("No map was picked.").await?;
            Ok(())
        }
    }
}

/// Show a map
#[poise::command(prefix_command, slash_command, guild_only, check = "checks::in_lobby")]
pub async fn map(
    ctx: Context<'_>,
    #[description = "Map name"] name: Option<String>,
) -> Result<(), Error> {
    map_impl(ctx, name).await
}
