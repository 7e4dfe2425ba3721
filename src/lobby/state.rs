//! Read-only classification of live channel state.

use serenity::model::id::ChannelId;

use super::gateway::{ChannelInfo, ChannelKind, Gateway};
use super::TEXT_CHANNEL_NAME;
use crate::error::LobbyError;
use crate::Error;

pub const LOBBY_SUFFIX: &str = "lobby";

/// A channel group is a lobby when its name ends with "lobby", ignoring case.
pub fn is_lobby(group_name: &str) -> bool {
    group_name.to_lowercase().ends_with(LOBBY_SUFFIX)
}

pub fn is_lobby_group(channel: &ChannelInfo) -> bool {
    channel.kind == ChannelKind::Category && is_lobby(&channel.name)
}

/// Snapshot of one lobby's channels.
#[derive(Clone, Debug)]
pub struct LobbyView {
    pub group: ChannelInfo,
    pub voice: Option<ChannelInfo>,
    pub texts: Vec<ChannelInfo>,
    pub others: Vec<ChannelInfo>,
}

impl LobbyView {
    /// The designated lobby text channel, where notices are posted.
    pub fn text_chat(&self) -> Option<&ChannelInfo> {
        self.texts.iter().find(|c| c.name == TEXT_CHANNEL_NAME)
    }

    pub fn all_channels(&self) -> impl Iterator<Item = &ChannelInfo> {
        self.voice.iter().chain(self.texts.iter()).chain(self.others.iter())
    }
}

pub fn split_lobby(group: ChannelInfo, channels: Vec<ChannelInfo>) -> LobbyView {
    let mut voice = None;
    let mut texts = Vec::new();
    let mut others = Vec::new();
    for channel in channels {
        match channel.kind {
            ChannelKind::Voice if voice.is_none() => voice = Some(channel),
            ChannelKind::Text => texts.push(channel),
            _ => others.push(channel),
        }
    }
    LobbyView {
        group,
        voice,
        texts,
        others,
    }
}

/// The lobby group containing `channel`, if that channel sits in a lobby.
pub async fn lobby_of_channel(
    gateway: &dyn Gateway,
    channel: ChannelId,
) -> Result<Option<ChannelInfo>, Error> {
    let Some(channel) = gateway.channel(channel).await? else {
        return Ok(None);
    };
    let Some(parent_id) = channel.parent_id else {
        return Ok(None);
    };
    Ok(gateway
        .channel(parent_id)
        .await?
        .filter(is_lobby_group))
}

/// Re-reads a lobby's channels. `None` if the group is gone or is no longer a lobby.
pub async fn load_lobby(gateway: &dyn Gateway, group: ChannelId) -> Result<Option<LobbyView>, Error> {
    let Some(group) = gateway.channel(group).await?.filter(is_lobby_group) else {
        return Ok(None);
    };
    let channels = gateway.channels_in(group.id).await?;
    Ok(Some(split_lobby(group, channels)))
}

/// Command guard: resolves the lobby the command was sent from, or fails with
/// a user error.
pub async fn require_lobby(gateway: &dyn Gateway, channel: ChannelId) -> Result<LobbyView, Error> {
    let not_lobby = || LobbyError::user("That command can only be used in a lobby.");
    let group = lobby_of_channel(gateway, channel).await?.ok_or_else(not_lobby)?;
    load_lobby(gateway, group.id).await?.ok_or_else(not_lobby)
}
