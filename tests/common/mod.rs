#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use lobby_bot::config::Config;
use lobby_bot::error::LobbyError;
use lobby_bot::lobby::gateway::{
    ChannelEdit, ChannelInfo, ChannelKind, Gateway, MemberInfo, NewChannel, ReactionEvent,
    VoiceSettings,
};
use lobby_bot::{Data, Error};
use serenity::builder::CreateEmbed;
use serenity::model::channel::{PermissionOverwrite, PermissionOverwriteType};
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
use serenity::model::permissions::Permissions;

pub const GUILD: GuildId = GuildId::new(1);
pub const BOT: UserId = UserId::new(999);
pub const BOT_ROLE: RoleId = RoleId::new(900);
pub const REGULARS_ROLE: RoleId = RoleId::new(500);

#[derive(Clone, Debug)]
pub struct SentMessage {
    pub id: MessageId,
    pub channel: ChannelId,
    pub content: Option<String>,
    pub embed: Option<serde_json::Value>,
}

impl SentMessage {
    pub fn embed_title(&self) -> Option<&str> {
        self.embed.as_ref()?.get("title")?.as_str()
    }

    pub fn embed_description(&self) -> Option<&str> {
        self.embed.as_ref()?.get("description")?.as_str()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Failure {
    Vanished,
    Error,
}

#[derive(Default)]
struct FakeState {
    next_id: u64,
    channels: BTreeMap<ChannelId, ChannelInfo>,
    voice: HashMap<UserId, ChannelId>,
    names: HashMap<UserId, String>,
    messages: Vec<SentMessage>,
    reactions: HashMap<(MessageId, String), Vec<UserId>>,
    scripted: VecDeque<ReactionEvent>,
    failures: HashMap<(String, Option<String>), Failure>,
    calls: Vec<String>,
}

impl FakeState {
    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check(&mut self, op: &str, target: &str) -> Result<(), Error> {
        self.calls.push(format!("{op} {target}"));
        let failure = self
            .failures
            .get(&(op.to_string(), Some(target.to_string())))
            .or_else(|| self.failures.get(&(op.to_string(), None)));
        match failure {
            Some(Failure::Vanished) => Err(LobbyError::vanished(format!("{op} {target}"))),
            Some(Failure::Error) => Err(LobbyError::Admin(format!("injected failure: {op} {target}"))),
            None => Ok(()),
        }
    }

    fn existing(&mut self, id: ChannelId) -> Result<&mut ChannelInfo, Error> {
        self.channels
            .get_mut(&id)
            .ok_or_else(|| LobbyError::vanished(format!("channel {id}")))
    }
}

/// In-memory guild implementing [`Gateway`]. Every call yields once so that
/// concurrently routed events interleave the way they do against Discord.
pub struct FakeGateway {
    state: Mutex<FakeState>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_id: 1000,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn add_channel(
        &self,
        name: &str,
        kind: ChannelKind,
        parent: Option<ChannelId>,
    ) -> ChannelId {
        let mut state = self.state();
        let id = ChannelId::new(state.id());
        state.channels.insert(
            id,
            ChannelInfo {
                id,
                name: name.to_string(),
                kind,
                parent_id: parent,
                position: 0,
                topic: None,
                voice: VoiceSettings::default(),
                overwrites: Vec::new(),
            },
        );
        id
    }

    pub fn update_channel(&self, id: ChannelId, f: impl FnOnce(&mut ChannelInfo)) {
        let mut state = self.state();
        f(state.channels.get_mut(&id).expect("channel exists"));
    }

    pub fn remove_channel(&self, id: ChannelId) {
        self.state().channels.remove(&id);
    }

    pub fn channel_info(&self, id: ChannelId) -> Option<ChannelInfo> {
        self.state().channels.get(&id).cloned()
    }

    pub fn find(&self, name: &str) -> Option<ChannelInfo> {
        self.state()
            .channels
            .values()
            .find(|c| c.name == name)
            .cloned()
    }

    pub fn children(&self, group: ChannelId) -> Vec<ChannelInfo> {
        self.state()
            .channels
            .values()
            .filter(|c| c.parent_id == Some(group))
            .cloned()
            .collect()
    }

    pub fn channel_count(&self) -> usize {
        self.state().channels.len()
    }

    pub fn member(&self, id: u64, name: &str) -> MemberInfo {
        let user = UserId::new(id);
        self.state().names.insert(user, name.to_string());
        MemberInfo {
            id: user,
            display_name: name.to_string(),
        }
    }

    pub fn connect(&self, member: &MemberInfo, channel: ChannelId) {
        self.state().voice.insert(member.id, channel);
    }

    pub fn disconnect(&self, member: &MemberInfo) {
        self.state().voice.remove(&member.id);
    }

    pub fn location(&self, member: &MemberInfo) -> Option<ChannelId> {
        self.state().voice.get(&member.id).copied()
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.state().messages.clone()
    }

    pub fn messages_in(&self, channel: ChannelId) -> Vec<SentMessage> {
        self.state()
            .messages
            .iter()
            .filter(|m| m.channel == channel)
            .cloned()
            .collect()
    }

    pub fn texts_in(&self, channel: ChannelId) -> Vec<String> {
        self.messages_in(channel)
            .into_iter()
            .filter_map(|m| m.content)
            .collect()
    }

    /// Adds a reaction to the live message state without emitting an event.
    pub fn react(&self, message: MessageId, emoji: &str, user: UserId) {
        self.state()
            .reactions
            .entry((message, emoji.to_string()))
            .or_default()
            .push(user);
    }

    /// Queues a reaction that `next_reaction` delivers and applies, in order.
    pub fn script_reaction(&self, emoji: &str, user: UserId) {
        self.state().scripted.push_back(ReactionEvent {
            message_id: MessageId::new(1),
            user_id: user,
            emoji: emoji.to_string(),
        });
    }

    pub fn fail(&self, op: &str, target: Option<&str>, failure: Failure) {
        self.state()
            .failures
            .insert((op.to_string(), target.map(str::to_string)), failure);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, call: &str) -> usize {
        self.state().calls.iter().filter(|c| *c == call).count()
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    fn guild_id(&self) -> GuildId {
        GUILD
    }

    fn bot_user_id(&self) -> UserId {
        BOT
    }

    async fn channel(&self, id: ChannelId) -> Result<Option<ChannelInfo>, Error> {
        tokio::task::yield_now().await;
        Ok(self.state().channels.get(&id).cloned())
    }

    async fn channels_in(&self, group: ChannelId) -> Result<Vec<ChannelInfo>, Error> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.check("channels_in", &group.to_string())?;
        let mut channels: Vec<ChannelInfo> = state
            .channels
            .values()
            .filter(|c| c.parent_id == Some(group))
            .cloned()
            .collect();
        channels.sort_by_key(|c| (c.position, c.id));
        Ok(channels)
    }

    async fn find_channel(
        &self,
        name: &str,
        kind: ChannelKind,
    ) -> Result<Option<ChannelInfo>, Error> {
        tokio::task::yield_now().await;
        Ok(self
            .state()
            .channels
            .values()
            .find(|c| c.kind == kind && c.name == name)
            .cloned())
    }

    async fn voice_members(&self, channel: ChannelId) -> Result<Vec<MemberInfo>, Error> {
        tokio::task::yield_now().await;
        let state = self.state();
        let mut members: Vec<MemberInfo> = state
            .voice
            .iter()
            .filter(|(_, c)| **c == channel)
            .map(|(user, _)| MemberInfo {
                id: *user,
                display_name: state
                    .names
                    .get(user)
                    .cloned()
                    .unwrap_or_else(|| user.to_string()),
            })
            .collect();
        members.sort_by_key(|m| m.id);
        Ok(members)
    }

    async fn voice_channel_of(&self, user: UserId) -> Result<Option<ChannelId>, Error> {
        tokio::task::yield_now().await;
        Ok(self.state().voice.get(&user).copied())
    }

    async fn bot_top_role(&self) -> Result<RoleId, Error> {
        tokio::task::yield_now().await;
        self.state().check("bot_top_role", "")?;
        Ok(BOT_ROLE)
    }

    async fn create_channel(&self, channel: NewChannel) -> Result<ChannelInfo, Error> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.check("create_channel", &channel.name)?;
        if let Some(parent) = channel.parent_id {
            state.existing(parent)?;
        }

        let id = ChannelId::new(state.id());
        let siblings = state
            .channels
            .values()
            .filter(|c| c.parent_id == channel.parent_id)
            .count();
        let info = ChannelInfo {
            id,
            name: channel.name,
            kind: channel.kind,
            parent_id: channel.parent_id,
            position: channel.position.unwrap_or(siblings as u16),
            topic: channel.topic,
            voice: channel.voice.unwrap_or_default(),
            overwrites: channel.overwrites,
        };
        state.channels.insert(id, info.clone());
        Ok(info)
    }

    async fn edit_channel(&self, id: ChannelId, edit: ChannelEdit) -> Result<(), Error> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.check("edit_channel", &id.to_string())?;
        let channel = state.existing(id)?;
        if let Some(name) = edit.name {
            channel.name = name;
        }
        if let Some(topic) = edit.topic {
            channel.topic = Some(topic);
        }
        if let Some(limit) = edit.user_limit {
            channel.voice.user_limit = Some(limit);
        }
        Ok(())
    }

    async fn delete_channel(&self, id: ChannelId) -> Result<(), Error> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.check("delete_channel", &id.to_string())?;
        state
            .channels
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| LobbyError::vanished(format!("channel {id}")))
    }

    async fn set_overwrite(
        &self,
        channel: ChannelId,
        overwrite: PermissionOverwrite,
    ) -> Result<(), Error> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.check("set_overwrite", &channel.to_string())?;
        let channel = state.existing(channel)?;
        channel.overwrites.retain(|o| o.kind != overwrite.kind);
        channel.overwrites.push(overwrite);
        Ok(())
    }

    async fn clear_overwrite(
        &self,
        channel: ChannelId,
        target: PermissionOverwriteType,
    ) -> Result<(), Error> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.check("clear_overwrite", &channel.to_string())?;
        state
            .existing(channel)?
            .overwrites
            .retain(|o| o.kind != target);
        Ok(())
    }

    async fn move_member(&self, user: UserId, channel: ChannelId) -> Result<(), Error> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.check("move_member", &user.to_string())?;
        state.existing(channel)?;
        state.voice.insert(user, channel);
        Ok(())
    }

    async fn disconnect_member(&self, user: UserId) -> Result<(), Error> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.check("disconnect_member", &user.to_string())?;
        state.voice.remove(&user);
        Ok(())
    }

    async fn send_text(&self, channel: ChannelId, content: &str) -> Result<MessageId, Error> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.check("send_text", &channel.to_string())?;
        state.existing(channel)?;
        let id = MessageId::new(state.id());
        state.messages.push(SentMessage {
            id,
            channel,
            content: Some(content.to_string()),
            embed: None,
        });
        Ok(id)
    }

    async fn send_embed(
        &self,
        channel: ChannelId,
        embed: CreateEmbed,
    ) -> Result<MessageId, Error> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.check("send_embed", &channel.to_string())?;
        state.existing(channel)?;
        let id = MessageId::new(state.id());
        state.messages.push(SentMessage {
            id,
            channel,
            content: None,
            embed: Some(serde_json::to_value(&embed).expect("embed serializes")),
        });
        Ok(id)
    }

    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), Error> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.check("add_reaction", &channel.to_string())?;
        state
            .reactions
            .entry((message, emoji.to_string()))
            .or_default()
            .push(BOT);
        Ok(())
    }

    async fn reaction_users(
        &self,
        _channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<Vec<UserId>, Error> {
        tokio::task::yield_now().await;
        let state = self.state();
        let mut users = state
            .reactions
            .get(&(message, emoji.to_string()))
            .cloned()
            .unwrap_or_default();
        let mut seen = HashSet::new();
        users.retain(|u| seen.insert(*u));
        Ok(users)
    }

    async fn next_reaction(
        &self,
        message: MessageId,
        timeout: Duration,
    ) -> Result<Option<ReactionEvent>, Error> {
        let next = self.state().scripted.pop_front();
        let Some(mut event) = next else {
            tokio::time::sleep(timeout).await;
            return Ok(None);
        };

        event.message_id = message;
        self.react(message, &event.emoji, event.user_id);
        tokio::task::yield_now().await;
        Ok(Some(event))
    }
}

/// A guild with a "Lobbies" category holding the seed channel, plus the bot
/// log channel.
pub struct Guild {
    pub gateway: Arc<FakeGateway>,
    pub data: Data,
    pub lobbies: ChannelId,
    pub seed: ChannelId,
    pub bot_logs: ChannelId,
}

impl Guild {
    pub fn new() -> Self {
        let gateway = Arc::new(FakeGateway::new());

        let lobbies = gateway.add_channel("Lobbies", ChannelKind::Category, None);
        gateway.update_channel(lobbies, |c| {
            c.overwrites = vec![PermissionOverwrite {
                allow: Permissions::VIEW_CHANNEL,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Role(REGULARS_ROLE),
            }];
        });

        let seed = gateway.add_channel("Create New Lobby", ChannelKind::Voice, Some(lobbies));
        gateway.update_channel(seed, |c| {
            c.voice = VoiceSettings {
                bitrate: Some(64_000),
                user_limit: Some(10),
                rtc_region: Some("us-east".to_string()),
                ..Default::default()
            };
        });

        let bot_logs = gateway.add_channel("bot-logs", ChannelKind::Text, None);

        let data = Data::new(Config::with_token("test-token"), gateway.clone());
        Self {
            gateway,
            data,
            lobbies,
            seed,
            bot_logs,
        }
    }

    /// Builds a lobby directly: a group, its voice channel and text-chat.
    pub fn lobby(&self, name: &str) -> (ChannelId, ChannelId, ChannelId) {
        let group = self
            .gateway
            .add_channel(name, ChannelKind::Category, None);
        let voice = self
            .gateway
            .add_channel("voice chat", ChannelKind::Voice, Some(group));
        let text = self
            .gateway
            .add_channel("text-chat", ChannelKind::Text, Some(group));
        self.gateway.update_channel(text, |c| c.position = 1);
        (group, voice, text)
    }
}
