use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use serenity::model::id::ChannelId;
use tracing::{info, warn};

use super::gateway::Gateway;
use crate::error::LobbyError;
use crate::Error;

/// Groups with a teardown currently in progress.
pub type TeardownRegistry = Arc<Mutex<HashSet<ChannelId>>>;

pub fn new_registry() -> TeardownRegistry {
    Arc::new(Mutex::new(HashSet::new()))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeardownOutcome {
    Deleted { channels: usize },
    AlreadyRunning,
    AlreadyGone,
}

struct InFlight<'a> {
    registry: &'a TeardownRegistry,
    group: ChannelId,
}

impl<'a> InFlight<'a> {
    fn claim(registry: &'a TeardownRegistry, group: ChannelId) -> Option<Self> {
        let mut groups = registry.lock().unwrap_or_else(PoisonError::into_inner);
        groups.insert(group).then_some(Self { registry, group })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.group);
    }
}

fn teardown_error(group: ChannelId, source: LobbyError) -> LobbyError {
    LobbyError::Teardown {
        group,
        source: Box::new(source),
    }
}

/// Deletes every channel in `group`, then the group itself.
///
/// Objects that are already gone are skipped. Any other failure aborts the
/// teardown and is returned as [`LobbyError::Teardown`].
pub async fn delete_lobby(
    gateway: &dyn Gateway,
    registry: &TeardownRegistry,
    group: ChannelId,
) -> Result<TeardownOutcome, Error> {
    let Some(_in_flight) = InFlight::claim(registry, group) else {
        info!("teardown of {group} already in progress");
        return Ok(TeardownOutcome::AlreadyRunning);
    };

    let Some(category) = gateway.channel(group).await? else {
        info!("lobby {group} already deleted");
        return Ok(TeardownOutcome::AlreadyGone);
    };

    info!("deleting empty lobby {} ({group})", category.name);
    let channels = gateway
        .channels_in(group)
        .await
        .map_err(|e| teardown_error(group, e))?;

    let mut deleted = 0;
    for channel in &channels {
        info!("deleting {:?} channel {} ({})", channel.kind, channel.name, channel.id);
        match gateway.delete_channel(channel.id).await {
            Ok(()) => deleted += 1,
            Err(e) if e.is_vanished() => warn!("channel {} was already deleted", channel.id),
            Err(e) => return Err(teardown_error(group, e)),
        }
    }

    match gateway.delete_channel(group).await {
        Ok(()) => {}
        Err(e) if e.is_vanished() => warn!("lobby group {group} was already deleted"),
        Err(e) => return Err(teardown_error(group, e)),
    }

    Ok(TeardownOutcome::Deleted { channels: deleted })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_claim_is_exclusive() {
        let registry = new_registry();
        let group = ChannelId::new(7);

        let first = InFlight::claim(&registry, group);
        assert!(first.is_some());
        assert!(InFlight::claim(&registry, group).is_none());
        assert!(InFlight::claim(&registry, ChannelId::new(8)).is_some());

        drop(first);
        assert!(InFlight::claim(&registry, group).is_some());
    }
}
