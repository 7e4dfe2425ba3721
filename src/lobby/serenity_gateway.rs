use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serenity::builder::{CreateChannel, CreateEmbed, CreateMessage, EditChannel};
use serenity::client::Context;
use serenity::collector::ReactionCollector;
use serenity::model::channel::{
    ChannelType, GuildChannel, PermissionOverwrite, PermissionOverwriteType, Reaction,
    ReactionType,
};
use serenity::model::guild::Role;
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};

use super::gateway::{
    ChannelEdit, ChannelInfo, ChannelKind, Gateway, MemberInfo, NewChannel, ReactionEvent,
    VoiceSettings,
};
use crate::error::LobbyError;
use crate::Error;

/// [`Gateway`] over a live serenity client, bound to one guild.
///
/// Reads prefer the gateway-fed cache and fall back to HTTP when the guild is
/// not cached. Voice presence is only known through the cache.
pub struct SerenityGateway {
    ctx: Context,
    guild_id: GuildId,
}

impl SerenityGateway {
    pub fn new(ctx: Context, guild_id: GuildId) -> Self {
        Self { ctx, guild_id }
    }

    async fn guild_channels(&self) -> Result<Vec<ChannelInfo>, Error> {
        let cached: Option<Vec<ChannelInfo>> = self
            .ctx
            .cache
            .guild(self.guild_id)
            .map(|guild| guild.channels.values().map(channel_info).collect());

        match cached {
            Some(channels) => Ok(channels),
            None => {
                let channels = self.guild_id.channels(&self.ctx).await?;
                Ok(channels.values().map(channel_info).collect())
            }
        }
    }

    fn not_cached(&self) -> LobbyError {
        LobbyError::vanished(format!("cached guild {}", self.guild_id))
    }
}

fn channel_kind(kind: ChannelType) -> ChannelKind {
    match kind {
        ChannelType::Category => ChannelKind::Category,
        ChannelType::Voice | ChannelType::Stage => ChannelKind::Voice,
        ChannelType::Text | ChannelType::News => ChannelKind::Text,
        _ => ChannelKind::Other,
    }
}

fn channel_type(kind: ChannelKind) -> ChannelType {
    match kind {
        ChannelKind::Category => ChannelType::Category,
        ChannelKind::Voice => ChannelType::Voice,
        ChannelKind::Text | ChannelKind::Other => ChannelType::Text,
    }
}

fn channel_info(channel: &GuildChannel) -> ChannelInfo {
    ChannelInfo {
        id: channel.id,
        name: channel.name.clone(),
        kind: channel_kind(channel.kind),
        parent_id: channel.parent_id,
        position: channel.position,
        topic: channel.topic.clone(),
        voice: VoiceSettings {
            bitrate: channel.bitrate,
            user_limit: channel.user_limit,
            video_quality_mode: channel.video_quality_mode,
            nsfw: channel.nsfw,
            rate_limit_per_user: channel.rate_limit_per_user,
            rtc_region: channel.rtc_region.clone(),
        },
        overwrites: channel.permission_overwrites.clone(),
    }
}

fn highest_role(roles: &HashMap<RoleId, Role>, member_roles: &[RoleId]) -> Option<RoleId> {
    member_roles
        .iter()
        .filter_map(|id| roles.get(id))
        .max_by_key(|role| role.position)
        .map(|role| role.id)
}

fn emoji_name(emoji: &ReactionType) -> String {
    match emoji {
        ReactionType::Unicode(s) => s.clone(),
        ReactionType::Custom { name, .. } => name.clone().unwrap_or_default(),
        other => other.to_string(),
    }
}

fn reaction_event(reaction: &Reaction) -> Option<ReactionEvent> {
    Some(ReactionEvent {
        message_id: reaction.message_id,
        user_id: reaction.user_id?,
        emoji: emoji_name(&reaction.emoji),
    })
}

fn apply_voice_settings(mut builder: CreateChannel<'_>, voice: VoiceSettings) -> CreateChannel<'_> {
    if let Some(bitrate) = voice.bitrate {
        builder = builder.bitrate(bitrate);
    }
    if let Some(limit) = voice.user_limit {
        builder = builder.user_limit(limit);
    }
    if let Some(mode) = voice.video_quality_mode {
        builder = builder.video_quality_mode(mode);
    }
    if let Some(slowmode) = voice.rate_limit_per_user {
        builder = builder.rate_limit_per_user(slowmode);
    }
    if let Some(region) = voice.rtc_region {
        builder = builder.rtc_region(region);
    }
    builder.nsfw(voice.nsfw)
}

#[async_trait]
impl Gateway for SerenityGateway {
    fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    fn bot_user_id(&self) -> UserId {
        self.ctx.cache.current_user().id
    }

    async fn channel(&self, id: ChannelId) -> Result<Option<ChannelInfo>, Error> {
        Ok(self
            .guild_channels()
            .await?
            .into_iter()
            .find(|c| c.id == id))
    }

    async fn channels_in(&self, group: ChannelId) -> Result<Vec<ChannelInfo>, Error> {
        let mut channels: Vec<ChannelInfo> = self
            .guild_channels()
            .await?
            .into_iter()
            .filter(|c| c.parent_id == Some(group))
            .collect();
        channels.sort_by_key(|c| (c.position, c.id));
        Ok(channels)
    }

    async fn find_channel(
        &self,
        name: &str,
        kind: ChannelKind,
    ) -> Result<Option<ChannelInfo>, Error> {
        Ok(self
            .guild_channels()
            .await?
            .into_iter()
            .find(|c| c.kind == kind && c.name == name))
    }

    async fn voice_members(&self, channel: ChannelId) -> Result<Vec<MemberInfo>, Error> {
        let guild = self
            .ctx
            .cache
            .guild(self.guild_id)
            .ok_or_else(|| self.not_cached())?;

        Ok(guild
            .voice_states
            .values()
            .filter(|vs| vs.channel_id == Some(channel))
            .map(|vs| {
                let display_name = guild
                    .members
                    .get(&vs.user_id)
                    .or(vs.member.as_ref())
                    .map(|m| m.display_name().to_string())
                    .unwrap_or_else(|| vs.user_id.to_string());
                MemberInfo {
                    id: vs.user_id,
                    display_name,
                }
            })
            .collect())
    }

    async fn voice_channel_of(&self, user: UserId) -> Result<Option<ChannelId>, Error> {
        let guild = self
            .ctx
            .cache
            .guild(self.guild_id)
            .ok_or_else(|| self.not_cached())?;
        Ok(guild.voice_states.get(&user).and_then(|vs| vs.channel_id))
    }

    async fn bot_top_role(&self) -> Result<RoleId, Error> {
        let bot = self.bot_user_id();
        let cached = self.ctx.cache.guild(self.guild_id).and_then(|guild| {
            let member = guild.members.get(&bot)?;
            highest_role(&guild.roles, &member.roles)
        });
        if let Some(role) = cached {
            return Ok(role);
        }

        let member = self.guild_id.member(&self.ctx, bot).await?;
        let roles = self.guild_id.roles(&self.ctx).await?;
        Ok(highest_role(&roles, &member.roles).unwrap_or_else(|| self.default_role()))
    }

    async fn create_channel(&self, channel: NewChannel) -> Result<ChannelInfo, Error> {
        let mut builder = CreateChannel::new(channel.name)
            .kind(channel_type(channel.kind))
            .permissions(channel.overwrites);
        if let Some(parent) = channel.parent_id {
            builder = builder.category(parent);
        }
        if let Some(position) = channel.position {
            builder = builder.position(position);
        }
        if let Some(topic) = channel.topic {
            builder = builder.topic(topic);
        }
        if let Some(voice) = channel.voice {
            builder = apply_voice_settings(builder, voice);
        }

        let created = self.guild_id.create_channel(&self.ctx, builder).await?;
        Ok(channel_info(&created))
    }

    async fn edit_channel(&self, id: ChannelId, edit: ChannelEdit) -> Result<(), Error> {
        let mut builder = EditChannel::new();
        if let Some(name) = edit.name {
            builder = builder.name(name);
        }
        if let Some(topic) = edit.topic {
            builder = builder.topic(topic);
        }
        if let Some(limit) = edit.user_limit {
            builder = builder.user_limit(limit);
        }
        id.edit(&self.ctx, builder).await?;
        Ok(())
    }

    async fn delete_channel(&self, id: ChannelId) -> Result<(), Error> {
        id.delete(&self.ctx).await?;
        Ok(())
    }

    async fn set_overwrite(
        &self,
        channel: ChannelId,
        overwrite: PermissionOverwrite,
    ) -> Result<(), Error> {
        channel.create_permission(&self.ctx, overwrite).await?;
        Ok(())
    }

    async fn clear_overwrite(
        &self,
        channel: ChannelId,
        target: PermissionOverwriteType,
    ) -> Result<(), Error> {
        channel.delete_permission(&self.ctx, target).await?;
        Ok(())
    }

    async fn move_member(&self, user: UserId, channel: ChannelId) -> Result<(), Error> {
        self.guild_id.move_member(&self.ctx, user, channel).await?;
        Ok(())
    }

    async fn disconnect_member(&self, user: UserId) -> Result<(), Error> {
        self.guild_id.disconnect_member(&self.ctx, user).await?;
        Ok(())
    }

    async fn send_text(&self, channel: ChannelId, content: &str) -> Result<MessageId, Error> {
        Ok(channel.say(&self.ctx, content).await?.id)
    }

    async fn send_embed(
        &self,
        channel: ChannelId,
        embed: CreateEmbed,
    ) -> Result<MessageId, Error> {
        let message = channel
            .send_message(&self.ctx, CreateMessage::new().embed(embed))
            .await?;
        Ok(message.id)
    }

    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), Error> {
        channel
            .create_reaction(&self.ctx, message, ReactionType::Unicode(emoji.to_string()))
            .await?;
        Ok(())
    }

    async fn reaction_users(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<Vec<UserId>, Error> {
        let users = channel
            .reaction_users(
                &self.ctx,
                message,
                ReactionType::Unicode(emoji.to_string()),
                Some(100),
                None::<UserId>,
            )
            .await?;
        Ok(users.into_iter().map(|u| u.id).collect())
    }

    async fn next_reaction(
        &self,
        message: MessageId,
        timeout: Duration,
    ) -> Result<Option<ReactionEvent>, Error> {
        // Reactions without a user cannot be voted with; keep waiting past them.
        let reaction = ReactionCollector::new(&self.ctx)
            .message_id(message)
            .timeout(timeout)
            .filter(|r| r.user_id.is_some())
            .next()
            .await;

        Ok(reaction.as_ref().and_then(reaction_event))
    }
}
