//! The platform seam.
//!
//! Everything the lobby core reads or mutates on Discord goes through
//! [`Gateway`]. Values returned here are snapshots taken at call time; callers
//! re-read instead of holding them across operations.

use std::time::Duration;

use async_trait::async_trait;
use serenity::builder::CreateEmbed;
use serenity::model::channel::{PermissionOverwrite, PermissionOverwriteType, VideoQualityMode};
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};

use crate::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    Category,
    Voice,
    Text,
    Other,
}

/// Voice settings copied from the seed channel onto a new lobby.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoiceSettings {
    pub bitrate: Option<u32>,
    pub user_limit: Option<u32>,
    pub video_quality_mode: Option<VideoQualityMode>,
    pub nsfw: bool,
    pub rate_limit_per_user: Option<u16>,
    pub rtc_region: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<ChannelId>,
    pub position: u16,
    pub topic: Option<String>,
    pub voice: VoiceSettings,
    pub overwrites: Vec<PermissionOverwrite>,
}

impl ChannelInfo {
    pub fn member_overwrite(&self, user: UserId) -> Option<&PermissionOverwrite> {
        self.overwrites
            .iter()
            .find(|o| o.kind == PermissionOverwriteType::Member(user))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberInfo {
    pub id: UserId,
    pub display_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReactionEvent {
    pub message_id: MessageId,
    pub user_id: UserId,
    pub emoji: String,
}

/// Arguments for creating any channel, including a category.
#[derive(Clone, Debug)]
pub struct NewChannel {
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<ChannelId>,
    pub position: Option<u16>,
    pub topic: Option<String>,
    pub voice: Option<VoiceSettings>,
    pub overwrites: Vec<PermissionOverwrite>,
}

impl NewChannel {
    pub fn new(name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent_id: None,
            position: None,
            topic: None,
            voice: None,
            overwrites: Vec::new(),
        }
    }

    pub fn parent(mut self, parent_id: ChannelId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn position(mut self, position: u16) -> Self {
        self.position = Some(position);
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn voice(mut self, voice: VoiceSettings) -> Self {
        self.voice = Some(voice);
        self
    }

    pub fn overwrites(mut self, overwrites: Vec<PermissionOverwrite>) -> Self {
        self.overwrites = overwrites;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelEdit {
    pub name: Option<String>,
    pub topic: Option<String>,
    pub user_limit: Option<u32>,
}

impl ChannelEdit {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            ..Default::default()
        }
    }

    pub fn user_limit(limit: u32) -> Self {
        Self {
            user_limit: Some(limit),
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait Gateway: Send + Sync {
    fn guild_id(&self) -> GuildId;

    fn bot_user_id(&self) -> UserId;

    /// The guild's `@everyone` role.
    fn default_role(&self) -> RoleId {
        RoleId::new(self.guild_id().get())
    }

    async fn channel(&self, id: ChannelId) -> Result<Option<ChannelInfo>, Error>;

    /// Channels whose parent is `group`, ordered by position.
    async fn channels_in(&self, group: ChannelId) -> Result<Vec<ChannelInfo>, Error>;

    async fn find_channel(&self, name: &str, kind: ChannelKind)
        -> Result<Option<ChannelInfo>, Error>;

    /// Members currently connected to a voice channel.
    async fn voice_members(&self, channel: ChannelId) -> Result<Vec<MemberInfo>, Error>;

    /// The voice channel a member is connected to, if any.
    async fn voice_channel_of(&self, user: UserId) -> Result<Option<ChannelId>, Error>;

    /// The bot's highest role in the guild.
    async fn bot_top_role(&self) -> Result<RoleId, Error>;

    async fn create_channel(&self, channel: NewChannel) -> Result<ChannelInfo, Error>;

    async fn edit_channel(&self, id: ChannelId, edit: ChannelEdit) -> Result<(), Error>;

    async fn delete_channel(&self, id: ChannelId) -> Result<(), Error>;

    async fn set_overwrite(
        &self,
        channel: ChannelId,
        overwrite: PermissionOverwrite,
    ) -> Result<(), Error>;

    async fn clear_overwrite(
        &self,
        channel: ChannelId,
        target: PermissionOverwriteType,
    ) -> Result<(), Error>;

    async fn move_member(&self, user: UserId, channel: ChannelId) -> Result<(), Error>;

    async fn disconnect_member(&self, user: UserId) -> Result<(), Error>;

    async fn send_text(&self, channel: ChannelId, content: &str) -> Result<MessageId, Error>;

    async fn send_embed(&self, channel: ChannelId, embed: CreateEmbed)
        -> Result<MessageId, Error>;

    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), Error>;

    /// Users currently reacting to `message` with `emoji`, read live.
    async fn reaction_users(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<Vec<UserId>, Error>;

    /// Waits up to `timeout` for the next reaction added to `message`.
    /// `None` means the timeout elapsed.
    async fn next_reaction(
        &self,
        message: MessageId,
        timeout: Duration,
    ) -> Result<Option<ReactionEvent>, Error>;
}
