//! Timed vote-kick scoped to a lobby's voice members.
//!
//! A [`VoteSession`] is a plain value built when the command runs. Tallies are
//! never accumulated: every check re-reads the message's live reactions and
//! passes them through [`VoteSession::tally`].

use std::collections::HashSet;
use std::time::Duration;

use serenity::model::channel::{PermissionOverwrite, PermissionOverwriteType};
use serenity::model::id::{ChannelId, MessageId, UserId};
use serenity::model::permissions::Permissions;
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::audit::AuditLog;
use super::gateway::{Gateway, MemberInfo, ReactionEvent};
use crate::error::LobbyError;
use crate::utils::embed;
use crate::Error;

pub const AFFIRM_EMOJI: &str = "✅";
pub const DENY_EMOJI: &str = "❌";

pub const VOTE_TIMEOUT: Duration = Duration::from_secs(120);

/// Wait between disconnecting the target and denying reconnects.
pub const KICK_PROPAGATION_DELAY: Duration = Duration::from_secs(1);

/// Majority of `eligible`, rounded up.
pub fn quorum(eligible: usize) -> usize {
    eligible.div_ceil(2)
}

#[derive(Clone, Debug)]
pub struct VoteSession {
    pub initiator: MemberInfo,
    pub target: MemberInfo,
    pub reason: String,
    pub lobby_name: String,
    pub voice_channel: ChannelId,
    pub eligible: Vec<MemberInfo>,
    pub quorum: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub affirm: Vec<MemberInfo>,
    pub deny: Vec<MemberInfo>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    Kicked,
    NotKicked,
}

#[derive(Clone, Debug)]
pub struct VoteResult {
    pub outcome: VoteOutcome,
    pub tally: Tally,
}

/// The posted vote message.
#[derive(Clone, Copy, Debug)]
pub struct Ballot {
    pub channel: ChannelId,
    pub message: MessageId,
}

impl VoteSession {
    pub fn new(
        initiator: MemberInfo,
        target: MemberInfo,
        reason: impl Into<String>,
        lobby_name: impl Into<String>,
        voice_channel: ChannelId,
        eligible: Vec<MemberInfo>,
    ) -> Self {
        let quorum = quorum(eligible.len());
        Self {
            initiator,
            target,
            reason: reason.into(),
            lobby_name: lobby_name.into(),
            voice_channel,
            eligible,
            quorum,
        }
    }

    pub fn is_eligible(&self, user: UserId) -> bool {
        self.eligible.iter().any(|m| m.id == user)
    }

    /// Whether a reaction should cause a recount: an affirm vote from an
    /// eligible voter other than the one who started the vote.
    pub fn triggers_recount(&self, reaction: &ReactionEvent) -> bool {
        reaction.emoji == AFFIRM_EMOJI
            && reaction.user_id != self.initiator.id
            && self.is_eligible(reaction.user_id)
    }

    fn voters(&self, reactors: &[UserId]) -> Vec<MemberInfo> {
        let reactors: HashSet<UserId> = reactors.iter().copied().collect();
        self.eligible
            .iter()
            .filter(|m| reactors.contains(&m.id))
            .cloned()
            .collect()
    }

    /// Counts live reactions, keeping only eligible voters, each once.
    pub fn tally(&self, affirm: &[UserId], deny: &[UserId]) -> Tally {
        Tally {
            affirm: self.voters(affirm),
            deny: self.voters(deny),
        }
    }

    pub fn reaches_quorum(&self, tally: &Tally) -> bool {
        tally.affirm.len() >= self.quorum
    }
}

/// Starts a session for a vote in `voice_channel`. The initiator and the
/// target must both be connected to it; its current members are the voters.
pub async fn open_session(
    gateway: &dyn Gateway,
    voice_channel: ChannelId,
    initiator: UserId,
    target: MemberInfo,
    reason: impl Into<String>,
    lobby_name: impl Into<String>,
) -> Result<VoteSession, Error> {
    let eligible = gateway.voice_members(voice_channel).await?;

    let Some(initiator) = eligible.iter().find(|m| m.id == initiator).cloned() else {
        return Err(LobbyError::user(
            "You must be in the lobby's voice chat to start a vote.",
        ));
    };
    if !eligible.iter().any(|m| m.id == target.id) {
        return Err(LobbyError::user(format!(
            "{} must be in the lobby's voice chat to be voted out.",
            target.display_name
        )));
    }

    Ok(VoteSession::new(
        initiator,
        target,
        reason,
        lobby_name,
        voice_channel,
        eligible,
    ))
}

pub async fn recount(
    gateway: &dyn Gateway,
    session: &VoteSession,
    ballot: Ballot,
) -> Result<Tally, Error> {
    let affirm = gateway
        .reaction_users(ballot.channel, ballot.message, AFFIRM_EMOJI)
        .await?;
    let deny = gateway
        .reaction_users(ballot.channel, ballot.message, DENY_EMOJI)
        .await?;
    Ok(session.tally(&affirm, &deny))
}

/// Waits for the vote to pass or for `timeout` to elapse.
pub async fn await_outcome(
    gateway: &dyn Gateway,
    session: &VoteSession,
    ballot: Ballot,
    timeout: Duration,
) -> Result<VoteOutcome, Error> {
    let deadline = Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(VoteOutcome::NotKicked);
        }

        let Some(reaction) = gateway.next_reaction(ballot.message, remaining).await? else {
            return Ok(VoteOutcome::NotKicked);
        };
        if !session.triggers_recount(&reaction) {
            continue;
        }

        match recount(gateway, session, ballot).await {
            Ok(tally) if session.reaches_quorum(&tally) => return Ok(VoteOutcome::Kicked),
            Ok(tally) => info!(
                "votekick for {}: {}/{} votes",
                session.target.display_name,
                tally.affirm.len(),
                session.quorum
            ),
            Err(e) => warn!("failed to recount votekick reactions: {e}"),
        }
    }
}

/// Disconnects the target if they are still in the lobby's voice channel,
/// then denies them reconnecting to it.
///
/// The rejoin block is written even when the disconnect fails. Only the
/// overwrite's own failure is returned.
pub async fn apply_kick(gateway: &dyn Gateway, session: &VoteSession) -> Result<(), Error> {
    let target = &session.target;
    match gateway.voice_channel_of(target.id).await {
        Ok(Some(channel)) if channel == session.voice_channel => {
            if let Err(e) = gateway.disconnect_member(target.id).await {
                warn!("failed to disconnect {}: {e}", target.display_name);
            }
        }
        Ok(_) => info!(
            "{} already left {}, blocking rejoin only",
            target.display_name, session.lobby_name
        ),
        Err(e) => warn!("failed to locate {} before kicking: {e}", target.display_name),
    }

    tokio::time::sleep(KICK_PROPAGATION_DELAY).await;

    let deny_connect = PermissionOverwrite {
        allow: Permissions::empty(),
        deny: Permissions::CONNECT,
        kind: PermissionOverwriteType::Member(target.id),
    };
    gateway.set_overwrite(session.voice_channel, deny_connect).await
}

/// Runs a vote-kick from announcement to the audit-log result.
pub async fn run_votekick(
    gateway: &dyn Gateway,
    audit: &AuditLog,
    session: &VoteSession,
    text_channel: ChannelId,
    timeout: Duration,
) -> Result<VoteResult, Error> {
    let message = gateway
        .send_embed(text_channel, embed::votekick_started(session))
        .await?;
    let ballot = Ballot {
        channel: text_channel,
        message,
    };

    audit
        .log(&format!(
            "{} has initiated a vote to kick {} from {}. Reason: {}. Votes required: {}.",
            session.initiator.display_name,
            session.target.display_name,
            session.lobby_name,
            session.reason,
            session.quorum
        ))
        .await;

    for emoji in [AFFIRM_EMOJI, DENY_EMOJI] {
        gateway.add_reaction(text_channel, message, emoji).await?;
    }

    let outcome = await_outcome(gateway, session, ballot, timeout).await?;

    if outcome == VoteOutcome::Kicked {
        info!("kicking {} from {}", session.target.display_name, session.lobby_name);
        // The lobby may have been torn down if the target was the last member.
        if let Err(e) = apply_kick(gateway, session).await {
            if e.is_vanished() {
                warn!("lobby vanished while kicking {}: {e}", session.target.display_name);
            } else {
                error!("failed to kick {}: {e}", session.target.display_name);
            }
        }
    }

    let tally = match recount(gateway, session, ballot).await {
        Ok(tally) => tally,
        Err(e) => {
            warn!("failed to read final votekick reactions: {e}");
            Tally::default()
        }
    };

    audit
        .log_embed(embed::votekick_results(session, outcome, &tally))
        .await;

    Ok(VoteResult { outcome, tally })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: u64) -> MemberInfo {
        MemberInfo {
            id: UserId::new(id),
            display_name: format!("member{id}"),
        }
    }

    fn session(eligible: u64) -> VoteSession {
        VoteSession::new(
            member(1),
            member(2),
            "griefing",
            "Sam's Lobby",
            ChannelId::new(10),
            (1..=eligible).map(member).collect(),
        )
    }

    #[test]
    fn test_quorum_rounds_up() {
        let expected = [(1, 1), (2, 1), (3, 2), (4, 2), (5, 3)];
        for (count, required) in expected {
            assert_eq!(quorum(count), required, "quorum({count})");
        }
    }

    #[test]
    fn test_session_computes_quorum() {
        assert_eq!(session(5).quorum, 3);
        assert_eq!(session(4).quorum, 2);
    }

    #[test]
    fn test_tally_filters_ineligible_and_duplicates() {
        let s = session(3);
        let tally = s.tally(
            &[UserId::new(2), UserId::new(3), UserId::new(3), UserId::new(99)],
            &[UserId::new(1), UserId::new(42)],
        );
        assert_eq!(tally.affirm, vec![member(2), member(3)]);
        assert_eq!(tally.deny, vec![member(1)]);
        assert!(s.reaches_quorum(&tally));
    }

    #[test]
    fn test_recount_trigger_ignores_initiator_and_outsiders() {
        let s = session(3);
        let reaction = |user: u64, emoji: &str| ReactionEvent {
            message_id: MessageId::new(1),
            user_id: UserId::new(user),
            emoji: emoji.to_string(),
        };
        assert!(s.triggers_recount(&reaction(2, AFFIRM_EMOJI)));
        assert!(!s.triggers_recount(&reaction(1, AFFIRM_EMOJI)));
        assert!(!s.triggers_recount(&reaction(99, AFFIRM_EMOJI)));
        assert!(!s.triggers_recount(&reaction(3, DENY_EMOJI)));
    }
}
