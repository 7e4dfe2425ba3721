//! Building a new lobby from the seed channel.

use serenity::model::channel::{PermissionOverwrite, PermissionOverwriteType};
use serenity::model::id::{ChannelId, RoleId};
use serenity::model::permissions::Permissions;
use tracing::{error, info, warn};

use super::gateway::{ChannelInfo, ChannelKind, Gateway, MemberInfo, NewChannel};
use super::{TEXT_CHANNEL_NAME, VOICE_CHANNEL_NAME};
use crate::utils::embed;
use crate::Error;

/// What got built. Steps after the group are independent, so any of them may
/// be missing.
#[derive(Clone, Debug)]
pub struct ProvisionReport {
    pub group: ChannelInfo,
    pub voice: Option<ChannelId>,
    pub text: Option<ChannelId>,
    pub moved: bool,
}

impl ProvisionReport {
    pub fn is_complete(&self) -> bool {
        self.voice.is_some() && self.text.is_some() && self.moved
    }
}

pub fn lobby_name(display_name: &str) -> String {
    format!("{display_name}'s Lobby")
}

pub fn text_channel_topic(prefix: &str) -> String {
    format!("Use {prefix}code to set a game code.")
}

/// Overwrites for a new lobby text channel: hidden from `@everyone`, visible
/// to the bot's role, plus any allow-overwrites carried over from the group
/// the lobby was cloned from.
pub fn text_channel_overwrites(
    default_role: RoleId,
    bot_role: RoleId,
    source_group: &[PermissionOverwrite],
) -> Vec<PermissionOverwrite> {
    let mut overwrites = vec![
        PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
            kind: PermissionOverwriteType::Role(default_role),
        },
        PermissionOverwrite {
            allow: Permissions::VIEW_CHANNEL,
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Role(bot_role),
        },
    ];

    let reserved = [
        PermissionOverwriteType::Role(default_role),
        PermissionOverwriteType::Role(bot_role),
    ];
    overwrites.extend(
        source_group
            .iter()
            .filter(|o| !o.allow.is_empty() && !reserved.contains(&o.kind))
            .cloned(),
    );
    overwrites
}

async fn create_group(
    gateway: &dyn Gateway,
    seed: &ChannelInfo,
    name: &str,
) -> Result<(ChannelInfo, Vec<PermissionOverwrite>), Error> {
    let template = match seed.parent_id {
        Some(parent) => gateway.channel(parent).await?,
        None => None,
    };

    let mut group = NewChannel::new(name, ChannelKind::Category);
    let source_overwrites = match template {
        Some(template) => {
            info!("cloning channel group {} as {name}", template.name);
            group = group.overwrites(template.overwrites.clone());
            template.overwrites
        }
        None => {
            info!("creating lobby channel group {name}");
            Vec::new()
        }
    };

    let group = gateway.create_channel(group).await?;
    Ok((group, source_overwrites))
}

async fn create_voice_channel(
    gateway: &dyn Gateway,
    seed: &ChannelInfo,
    group: ChannelId,
) -> Result<ChannelInfo, Error> {
    info!("creating lobby voice channel with {:?}", seed.voice);
    let channel = NewChannel::new(VOICE_CHANNEL_NAME, ChannelKind::Voice)
        .parent(group)
        .position(0)
        .voice(seed.voice.clone())
        .overwrites(seed.overwrites.clone());
    gateway.create_channel(channel).await
}

async fn create_text_channel(
    gateway: &dyn Gateway,
    group: ChannelId,
    source_overwrites: &[PermissionOverwrite],
    prefix: &str,
) -> Result<ChannelInfo, Error> {
    let bot_role = gateway.bot_top_role().await?;
    let overwrites = text_channel_overwrites(gateway.default_role(), bot_role, source_overwrites);

    info!("creating lobby text channel in {group}");
    let channel = NewChannel::new(TEXT_CHANNEL_NAME, ChannelKind::Text)
        .parent(group)
        .topic(text_channel_topic(prefix))
        .overwrites(overwrites);
    let channel = gateway.create_channel(channel).await?;

    if let Err(e) = gateway
        .send_embed(channel.id, embed::lobby_welcome(prefix))
        .await
    {
        warn!("failed to send lobby welcome message: {e}");
    }

    Ok(channel)
}

/// Creates a lobby for `founder` modelled on `seed` and moves them into it.
///
/// Only a failure to create the group itself is returned; every later step is
/// attempted regardless and its failure logged.
pub async fn create_lobby(
    gateway: &dyn Gateway,
    seed: &ChannelInfo,
    founder: &MemberInfo,
    prefix: &str,
) -> Result<ProvisionReport, Error> {
    let name = lobby_name(&founder.display_name);
    info!("creating new lobby ({name}) in guild {}", gateway.guild_id());

    let (group, source_overwrites) = create_group(gateway, seed, &name).await?;

    let voice = match create_voice_channel(gateway, seed, group.id).await {
        Ok(channel) => Some(channel.id),
        Err(e) => {
            error!("failed to create lobby voice channel: {e}");
            None
        }
    };

    let text = match create_text_channel(gateway, group.id, &source_overwrites, prefix).await {
        Ok(channel) => Some(channel.id),
        Err(e) => {
            error!("failed to create lobby text channel: {e}");
            None
        }
    };

    // The move re-enters the voice router as a join of this lobby.
    let moved = match voice {
        Some(voice) => match gateway.move_member(founder.id, voice).await {
            Ok(()) => true,
            Err(e) => {
                error!("failed to move {} into lobby: {e}", founder.display_name);
                false
            }
        },
        None => {
            warn!("no voice channel to move {} into", founder.display_name);
            false
        }
    };

    Ok(ProvisionReport {
        group,
        voice,
        text,
        moved,
    })
}
