//! Map images and the timed map poll.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serenity::model::id::ChannelId;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::gateway::Gateway;
use crate::utils::embed;
use crate::Error;

pub const MAPVOTE_DURATION: Duration = Duration::from_secs(60);
pub const MAP_PICK_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameMap {
    pub name: &'static str,
    pub emoji: &'static str,
    pub file: &'static str,
}

impl GameMap {
    pub fn title(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Image location under the configured assets directory.
    pub fn image_path(&self, assets_dir: &Path) -> PathBuf {
        assets_dir.join("maps").join(self.file)
    }
}

pub const MAPS: &[GameMap] = &[
    GameMap {
        name: "skeld",
        emoji: "🚀",
        file: "Skeld.jpg",
    },
    GameMap {
        name: "mira",
        emoji: "✈️",
        file: "Mira.png",
    },
    GameMap {
        name: "polus",
        emoji: "❄️",
        file: "Polus.png",
    },
];

pub fn find_map(name: &str) -> Option<&'static GameMap> {
    let name = name.trim();
    MAPS.iter().find(|m| m.name.eq_ignore_ascii_case(name))
}

/// One `emoji - Title` line per map.
pub fn map_list() -> String {
    MAPS.iter()
        .map(|m| format!("{} - {}", m.emoji, m.title()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn map_by_emoji(emoji: &str) -> Option<&'static GameMap> {
    MAPS.iter().find(|m| m.emoji == emoji)
}

/// Posts the map list with one reaction per map and returns the first map
/// someone other than the bot picks, or `None` once `timeout` elapses.
pub async fn pick_map(
    gateway: &dyn Gateway,
    channel: ChannelId,
    timeout: Duration,
) -> Result<Option<&'static GameMap>, Error> {
    let message = gateway
        .send_text(
            channel,
            &format!("Select a map by reacting to this message.\n{}", map_list()),
        )
        .await?;
    for map in MAPS {
        gateway.add_reaction(channel, message, map.emoji).await?;
    }

    let bot = gateway.bot_user_id();
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }

        let Some(reaction) = gateway.next_reaction(message, remaining).await? else {
            return Ok(None);
        };
        if reaction.user_id == bot {
            continue;
        }
        match map_by_emoji(&reaction.emoji) {
            Some(map) => return Ok(Some(map)),
            None => debug!("ignoring {} on the map picker", reaction.emoji),
        }
    }
}

/// Posts a map poll in `channel`, waits `duration`, then counts the live
/// reactions on it, leaving out the bot's own.
pub async fn run_mapvote(
    gateway: &dyn Gateway,
    channel: ChannelId,
    duration: Duration,
) -> Result<Vec<(String, usize)>, Error> {
    let options: Vec<(&str, String)> = MAPS.iter().map(|m| (m.emoji, m.title())).collect();
    let poll: Vec<(&str, &str)> = options.iter().map(|(e, t)| (*e, t.as_str())).collect();
    let minutes = duration.as_secs().div_ceil(60);

    let message = gateway
        .send_embed(channel, embed::mapvote_poll(&poll, minutes))
        .await?;
    for map in MAPS {
        gateway.add_reaction(channel, message, map.emoji).await?;
    }

    info!("map vote open in {channel} for {}s", duration.as_secs());
    tokio::time::sleep(duration).await;

    let bot = gateway.bot_user_id();
    let mut results = Vec::with_capacity(MAPS.len());
    for map in MAPS {
        let votes = match gateway.reaction_users(channel, message, map.emoji).await {
            Ok(users) => users.into_iter().filter(|u| *u != bot).count(),
            Err(e) => {
                warn!("failed to count votes for {}: {e}", map.name);
                0
            }
        };
        results.push((format!("{} {}", map.emoji, map.title()), votes));
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_map_ignores_case() {
        assert_eq!(find_map("Polus").map(|m| m.file), Some("Polus.png"));
        assert_eq!(find_map(" SKELD ").map(|m| m.file), Some("Skeld.jpg"));
        assert!(find_map("airship").is_none());
    }

    #[test]
    fn test_map_by_emoji() {
        assert_eq!(map_by_emoji("🚀").map(|m| m.name), Some("skeld"));
        assert!(map_by_emoji("✅").is_none());
    }

    #[test]
    fn test_map_list() {
        assert_eq!(map_list(), "🚀 - Skeld\n✈️ - Mira\n❄️ - Polus");
    }

    #[test]
    fn test_image_path() {
        let map = find_map("mira").unwrap();
        assert_eq!(
            map.image_path(Path::new("assets")),
            Path::new("assets").join("maps").join("Mira.png")
        );
    }
}
