use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId, UserId};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error, info, warn};

use crate::error::LobbyError;
use crate::lobby::gateway::{ChannelInfo, ChannelKind, Gateway, MemberInfo};
use crate::lobby::teardown::TeardownOutcome;
use crate::lobby::{access, provision, state, teardown};
use crate::{Data, Error};

/// One FIFO lock per member so their presence updates run in arrival order.
pub type PresenceQueue = Arc<Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>>;

pub fn new_presence_queue() -> PresenceQueue {
    Arc::new(Mutex::new(HashMap::new()))
}

/// A member's voice channel on one side of a transition, and the lobby group
/// that channel belongs to, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Presence {
    pub channel: ChannelId,
    pub lobby: Option<ChannelId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Join {
    Seed,
    Lobby { group: ChannelId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Leave {
    pub group: ChannelId,
    pub channel: ChannelId,
}

/// The independent branches a single transition triggers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    pub join: Option<Join>,
    pub leave: Option<Leave>,
}

/// Classifies a `(before, after)` voice transition.
pub fn plan(before: Option<Presence>, after: Option<Presence>, seed: Option<ChannelId>) -> Plan {
    if before.map(|p| p.channel) == after.map(|p| p.channel) {
        return Plan::default();
    }

    let join = after.and_then(|after| {
        if Some(after.channel) == seed {
            Some(Join::Seed)
        } else {
            after.lobby.map(|group| Join::Lobby { group })
        }
    });

    let leave = before.and_then(|before| {
        before.lobby.map(|group| Leave {
            group,
            channel: before.channel,
        })
    });

    Plan { join, leave }
}

async fn presence(gateway: &dyn Gateway, channel: Option<ChannelId>) -> Option<Presence> {
    let channel = channel?;
    let lobby = match state::lobby_of_channel(gateway, channel).await {
        Ok(group) => group.map(|g| g.id),
        Err(e) => {
            warn!("failed to classify channel {channel}: {e}");
            None
        }
    };
    Some(Presence { channel, lobby })
}

async fn member_turn(queue: &PresenceQueue, user: UserId) -> OwnedMutexGuard<()> {
    let lock = {
        let mut locks = queue.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(user).or_default())
    };
    lock.lock_owned().await
}

fn release_idle(queue: &PresenceQueue) {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .retain(|_, lock| Arc::strong_count(lock) > 1);
}

async fn handle_join(
    data: &Data,
    member: &MemberInfo,
    join: Join,
    seed: Option<&ChannelInfo>,
) -> Result<(), Error> {
    let gateway = data.gateway.as_ref();
    match join {
        Join::Seed => {
            info!("{} is creating a new lobby", member.display_name);
            let seed = seed.ok_or_else(|| LobbyError::vanished("seed channel"))?;
            let report =
                provision::create_lobby(gateway, seed, member, &data.config.prefix).await?;
            if !report.is_complete() {
                warn!("lobby {} was only partially created: {report:?}", report.group.name);
            }
        }
        Join::Lobby { group } => {
            info!("{} joined existing lobby {group}", member.display_name);
            access::grant_access(gateway, member, group).await?;
        }
    }
    Ok(())
}

async fn handle_leave(data: &Data, member: &MemberInfo, leave: Leave) {
    let gateway = data.gateway.as_ref();
    info!("{} left lobby {}", member.display_name, leave.group);

    match access::revoke_access(gateway, member, leave.group).await {
        Ok(0) => {}
        Ok(failed) => warn!("{failed} channel(s) kept overwrites for {}", member.display_name),
        Err(e) if e.is_vanished() => debug!("lobby gone before revoking access: {e}"),
        Err(e) => error!("failed to clear lobby overwrites for {}: {e}", member.display_name),
    }

    let remaining = match gateway.voice_members(leave.channel).await {
        Ok(members) => members.len(),
        Err(e) => {
            error!("failed to read members of {}: {e}", leave.channel);
            return;
        }
    };
    if remaining > 0 {
        return;
    }

    match teardown::delete_lobby(gateway, &data.teardowns, leave.group).await {
        Ok(TeardownOutcome::Deleted { channels }) => {
            info!("deleted lobby {} and {channels} channel(s)", leave.group)
        }
        Ok(outcome) => debug!("lobby {} teardown skipped: {outcome:?}", leave.group),
        Err(e) => {
            error!("{e}");
            data.audit
                .log(&format!("Failed to delete empty lobby <#{}>: {e}", leave.group))
                .await;
        }
    }
}

/// Handles one member's voice transition from `before` to `after`.
///
/// The join and leave branches are separate fault domains: each logs its own
/// failure and neither prevents the other from running.
pub async fn route(
    data: &Data,
    member: &MemberInfo,
    before: Option<ChannelId>,
    after: Option<ChannelId>,
) -> Plan {
    if before == after {
        return Plan::default();
    }

    let turn = member_turn(&data.presence_queue, member.id).await;
    let gateway = data.gateway.as_ref();

    let seed = match gateway
        .find_channel(&data.config.seed_channel_name, ChannelKind::Voice)
        .await
    {
        Ok(seed) => seed,
        Err(e) => {
            warn!("failed to look up seed channel: {e}");
            None
        }
    };

    let plan = plan(
        presence(gateway, before).await,
        presence(gateway, after).await,
        seed.as_ref().map(|c| c.id),
    );
    debug!("voice transition for {}: {before:?} -> {after:?}: {plan:?}", member.display_name);

    if let Some(join) = plan.join {
        if let Err(e) = handle_join(data, member, join, seed.as_ref()).await {
            error!("failed to handle {join:?} for {}: {e}", member.display_name);
        }
    }

    if let Some(leave) = plan.leave {
        handle_leave(data, member, leave).await;
    }

    drop(turn);
    release_idle(&data.presence_queue);
    plan
}

/// A voice move made inside the managed guild.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub member: MemberInfo,
    pub before: Option<ChannelId>,
    pub after: Option<ChannelId>,
}

/// Reads a voice-state update, dropping updates from other guilds and ones
/// that leave the member in the same channel.
pub fn transition(
    guild: GuildId,
    old: Option<&serenity::VoiceState>,
    new: &serenity::VoiceState,
) -> Option<Transition> {
    if new.guild_id != Some(guild) {
        return None;
    }

    let before = old.and_then(|vs| vs.channel_id);
    let after = new.channel_id;
    if before == after {
        return None;
    }

    let member = MemberInfo {
        id: new.user_id,
        display_name: new
            .member
            .as_ref()
            .map(|m| m.display_name().to_string())
            .unwrap_or_else(|| new.user_id.to_string()),
    };
    Some(Transition {
        member,
        before,
        after,
    })
}

pub async fn handle(
    _ctx: &serenity::Context,
    old: &Option<serenity::VoiceState>,
    new: &serenity::VoiceState,
    data: &Data,
) -> Result<(), Error> {
    if let Some(t) = transition(data.gateway.guild_id(), old.as_ref(), new) {
        route(data, &t.member, t.before, t.after).await;
    }
    Ok(())
}
