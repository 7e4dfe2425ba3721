use std::path::PathBuf;

pub const DEFAULT_PREFIX: &str = "!";
pub const DEFAULT_SEED_CHANNEL: &str = "Create New Lobby";
pub const DEFAULT_LOG_CHANNEL: &str = "bot-logs";

#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: String,
    pub prefix: String,
    pub guild_id: Option<u64>,
    pub seed_channel_name: String,
    pub log_channel_name: String,
    pub assets_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            discord_token: std::env::var("DISCORD_TOKEN")
                .expect("DISCORD_TOKEN environment variable is required"),
            prefix: std::env::var("LOBBY_BOT_PREFIX")
                .unwrap_or_else(|_| DEFAULT_PREFIX.to_string()),
            guild_id: std::env::var("LOBBY_BOT_GUILD_ID")
                .ok()
                .and_then(|v| v.parse().ok()),
            seed_channel_name: std::env::var("LOBBY_BOT_SEED_CHANNEL")
                .unwrap_or_else(|_| DEFAULT_SEED_CHANNEL.to_string()),
            log_channel_name: std::env::var("LOBBY_BOT_LOG_CHANNEL")
                .unwrap_or_else(|_| DEFAULT_LOG_CHANNEL.to_string()),
            assets_dir: std::env::var("LOBBY_BOT_ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("assets")),
        }
    }

    /// Configuration with defaults for everything but the token.
    pub fn with_token(discord_token: impl Into<String>) -> Self {
        Self {
            discord_token: discord_token.into(),
            prefix: DEFAULT_PREFIX.to_string(),
            guild_id: None,
            seed_channel_name: DEFAULT_SEED_CHANNEL.to_string(),
            log_channel_name: DEFAULT_LOG_CHANNEL.to_string(),
            assets_dir: PathBuf::from("assets"),
        }
    }
}
