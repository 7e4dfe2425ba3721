use tracing::info;

use super::checks;
use crate::error::LobbyError;
use crate::lobby::gateway::ChannelEdit;
use crate::{Context, Error};

/// Topic prefix marking a stored game code.
pub const CODE_PREFIX: &str = "Game code: ";

pub fn code_topic(code: &str) -> String {
    format!("{CODE_PREFIX}{code}")
}

/// The game code stored in a channel topic. Topics without the prefix, such as
/// the initial help text, hold no code.
pub fn parse_code(topic: Option<&str>) -> Option<&str> {
    topic?
        .strip_prefix(CODE_PREFIX)
        .map(str::trim)
        .filter(|code| !code.is_empty())
}

async fn code_impl(ctx: Context<'_>, code: Option<String>) -> Result<(), Error> {
    let gateway = ctx.data().gateway.as_ref();
    let channel = gateway
        .channel(ctx.channel_id())
        .await?
        .ok_or_else(|| LobbyError::vanished(format!("channel {}", ctx.channel_id())))?;

    let new_code = code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let Some(new_code) = new_code else {
        match parse_code(channel.topic.as_deref()) {
            Some(current) => {
                ctx.say(format!("{} The game code is `{current}`", ctx.author()))
                    .await?;
            }
            None => {
                ctx.say(format!(
                    "A game code hasn't been set yet! Use `{}code` to set one.",
                    ctx.prefix()
                ))
                .await?;
            }
        }
        return Ok(());
    };

    info!("updating code for {} to {new_code}", channel.name);
    gateway
        .edit_channel(channel.id, ChannelEdit::topic(code_topic(new_code)))
        .await?;
    ctx.say(format!("<#{}> The game code is `{new_code}`", channel.id))
        .await?;
    Ok(())
}

/// Show or set the lobby's game code
#[poise::command(prefix_command, slash_command, guild_only, check = "checks::in_lobby")]
pub async fn code(
    ctx: Context<'_>,
    #[description = "New game code"] code: Option<String>,
) -> Result<(), Error> {
    code_impl(ctx, code).await
}

/// Show or set the lobby's game code (alias of code)
#[poise::command(prefix_command, slash_command, guild_only, check = "checks::in_lobby")]
pub async fn c(
    ctx: Context<'_>,
    #[description = "New game code"] code: Option<String>,
) -> Result<(), Error> {
    code_impl(ctx, code).await
}
