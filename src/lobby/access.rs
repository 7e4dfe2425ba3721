//! Per-member visibility of a lobby's private text channel.

use serenity::model::channel::{PermissionOverwrite, PermissionOverwriteType};
use serenity::model::id::ChannelId;
use serenity::model::permissions::Permissions;
use tracing::{error, info, warn};

use super::gateway::{Gateway, MemberInfo};
use super::state::{self, LobbyView};
use crate::error::LobbyError;
use crate::Error;

/// Permissions a member gets on the lobby text channels while connected.
pub const MEMBER_TEXT_ALLOW: Permissions = Permissions::VIEW_CHANNEL;

/// Extra permissions a promoted member gets on the lobby voice channel.
pub const MODERATOR_VOICE_ALLOW: Permissions = Permissions::MOVE_MEMBERS
    .union(Permissions::MUTE_MEMBERS)
    .union(Permissions::DEAFEN_MEMBERS);

/// Permissions a promoted member gets on the lobby text channels.
pub const MODERATOR_TEXT_ALLOW: Permissions = MEMBER_TEXT_ALLOW.union(Permissions::MANAGE_MESSAGES);

fn member_overwrite(member: &MemberInfo, allow: Permissions) -> PermissionOverwrite {
    PermissionOverwrite {
        allow,
        deny: Permissions::empty(),
        kind: PermissionOverwriteType::Member(member.id),
    }
}

pub fn member_read_overwrite(member: &MemberInfo) -> PermissionOverwrite {
    member_overwrite(member, MEMBER_TEXT_ALLOW)
}

async fn load(gateway: &dyn Gateway, group: ChannelId) -> Result<LobbyView, Error> {
    state::load_lobby(gateway, group)
        .await?
        .ok_or_else(|| LobbyError::vanished(format!("lobby {group}")))
}

async fn post_notice(gateway: &dyn Gateway, lobby: &LobbyView, notice: &str) {
    let Some(text_chat) = lobby.text_chat() else {
        warn!("lobby {} has no text chat for notice: {notice}", lobby.group.id);
        return;
    };
    if let Err(e) = gateway.send_text(text_chat.id, notice).await {
        warn!("failed to post notice in {}: {e}", text_chat.id);
    }
}

/// Lets `member` read every text channel in the lobby and announces them.
/// Granting twice leaves the same overwrite in place.
pub async fn grant_access(
    gateway: &dyn Gateway,
    member: &MemberInfo,
    group: ChannelId,
) -> Result<(), Error> {
    let lobby = load(gateway, group).await?;

    for channel in &lobby.texts {
        info!("granting {} read access to {}", member.display_name, channel.id);
        gateway
            .set_overwrite(channel.id, member_read_overwrite(member))
            .await?;
    }

    post_notice(
        gateway,
        &lobby,
        &format!("{} joined the lobby.", member.display_name),
    )
    .await;
    Ok(())
}

/// Removes every member-specific overwrite `member` holds in the lobby.
///
/// Each channel is cleared independently; a failure on one is logged and the
/// rest are still attempted. Returns the number of channels that failed.
pub async fn revoke_access(
    gateway: &dyn Gateway,
    member: &MemberInfo,
    group: ChannelId,
) -> Result<usize, Error> {
    let lobby = load(gateway, group).await?;
    let mut failures = 0;

    for channel in lobby.all_channels() {
        let target = PermissionOverwriteType::Member(member.id);
        match gateway.clear_overwrite(channel.id, target).await {
            Ok(()) => info!("cleared {} overwrites on {}", member.display_name, channel.id),
            Err(e) if e.is_vanished() => {
                warn!("channel {} vanished while clearing overwrites: {e}", channel.id)
            }
            Err(e) => {
                failures += 1;
                error!(
                    "failed to clear {} overwrites on {}: {e}",
                    member.display_name, channel.id
                );
            }
        }
    }

    post_notice(
        gateway,
        &lobby,
        &format!("{} left the lobby.", member.display_name),
    )
    .await;
    Ok(failures)
}

/// Gives `member` moderation rights inside the lobby until they leave it.
pub async fn promote(
    gateway: &dyn Gateway,
    member: &MemberInfo,
    group: ChannelId,
) -> Result<(), Error> {
    let lobby = load(gateway, group).await?;
    let voice = lobby
        .voice
        .as_ref()
        .ok_or_else(|| LobbyError::vanished(format!("voice channel of lobby {group}")))?;

    info!("promoting {} in {}", member.display_name, lobby.group.name);
    gateway
        .set_overwrite(voice.id, member_overwrite(member, MODERATOR_VOICE_ALLOW))
        .await?;
    for channel in &lobby.texts {
        gateway
            .set_overwrite(channel.id, member_overwrite(member, MODERATOR_TEXT_ALLOW))
            .await?;
    }

    post_notice(
        gateway,
        &lobby,
        &format!("{} has been promoted to lobby moderator.", member.display_name),
    )
    .await;
    Ok(())
}
