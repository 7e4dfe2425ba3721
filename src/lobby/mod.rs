pub mod access;
pub mod audit;
pub mod gateway;
pub mod maps;
pub mod provision;
pub mod serenity_gateway;
pub mod state;
pub mod teardown;
pub mod vote;

/// Name of the private text channel created in every lobby.
pub const TEXT_CHANNEL_NAME: &str = "text-chat";

/// Name of the voice channel created in every lobby.
pub const VOICE_CHANNEL_NAME: &str = "voice chat";
