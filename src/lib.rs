pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod lobby;
pub mod utils;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use events::voice_state::PresenceQueue;
use lobby::audit::AuditLog;
use lobby::gateway::Gateway;
use lobby::teardown::TeardownRegistry;

pub type Error = error::LobbyError;
pub type Context<'a> = poise::Context<'a, Data, Error>;

pub struct Data {
    pub config: config::Config,
    pub gateway: Arc<dyn Gateway>,
    pub audit: AuditLog,
    pub teardowns: TeardownRegistry,
    pub presence_queue: PresenceQueue,
    /// Set after the first `Ready`, so later ones are reported as reconnects.
    pub connected: AtomicBool,
}

impl Data {
    pub fn new(config: config::Config, gateway: Arc<dyn Gateway>) -> Self {
        let audit = AuditLog::new(Arc::clone(&gateway), config.log_channel_name.clone());
        Self {
            config,
            gateway,
            audit,
            teardowns: lobby::teardown::new_registry(),
            presence_queue: events::voice_state::new_presence_queue(),
            connected: AtomicBool::new(false),
        }
    }
}
