use tracing::info;

use super::checks;
use crate::error::LobbyError;
use crate::lobby::gateway::ChannelEdit;
use crate::lobby::state;
use crate::{Context, Error};

/// Group name for a renamed lobby. Keeps the suffix that marks it as a lobby.
pub fn lobby_title(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| format!("{name} Lobby"))
}

async fn rename_impl(ctx: Context<'_>, name: Option<String>) -> Result<(), Error> {
    let title = name.as_deref().and_then(lobby_title).ok_or_else(|| {
        LobbyError::user(format!(
            "This command requires a name. Ex: `{}rename New lobby name`",
            ctx.prefix()
        ))
    })?;

    let gateway = ctx.data().gateway.as_ref();
    let lobby = state::require_lobby(gateway, ctx.channel_id()).await?;

    info!("renaming {} to {title}", lobby.group.name);
    gateway
        .edit_channel(lobby.group.id, ChannelEdit::name(title.as_str()))
        .await?;
    ctx.say(format!("Lobby renamed to **{title}**.")).await?;
    Ok(())
}

/// Rename the lobby (twice every 10 minutes)
#[poise::command(prefix_command, slash_command, guild_only, check = "checks::in_lobby")]
pub async fn rename(
    ctx: Context<'_>,
    #[description = "New lobby name"]
    #[rest]
    name: Option<String>,
) -> Result<(), Error> {
    rename_impl(ctx, name).await
}
