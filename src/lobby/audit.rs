use std::sync::Arc;

use serenity::builder::CreateEmbed;
use serenity::model::id::ChannelId;
use tracing::{info, warn};

use super::gateway::{ChannelKind, Gateway};

/// Operator-facing log posted to a named text channel. Delivery is best-effort:
/// failures are traced and never returned to the caller.
#[derive(Clone)]
pub struct AuditLog {
    gateway: Arc<dyn Gateway>,
    channel_name: String,
}

impl AuditLog {
    pub fn new(gateway: Arc<dyn Gateway>, channel_name: impl Into<String>) -> Self {
        Self {
            gateway,
            channel_name: channel_name.into(),
        }
    }

    async fn channel(&self) -> Option<ChannelId> {
        match self
            .gateway
            .find_channel(&self.channel_name, ChannelKind::Text)
            .await
        {
            Ok(Some(channel)) => Some(channel.id),
            Ok(None) => {
                warn!("audit channel #{} not found", self.channel_name);
                None
            }
            Err(e) => {
                warn!("failed to look up audit channel #{}: {e}", self.channel_name);
                None
            }
        }
    }

    pub async fn log(&self, message: &str) {
        info!("audit: {message}");
        let Some(channel) = self.channel().await else {
            return;
        };
        if let Err(e) = self.gateway.send_text(channel, message).await {
            warn!("failed to write audit entry: {e}");
        }
    }

    pub async fn log_embed(&self, embed: CreateEmbed) {
        let Some(channel) = self.channel().await else {
            return;
        };
        if let Err(e) = self.gateway.send_embed(channel, embed).await {
            warn!("failed to write audit embed: {e}");
        }
    }
}
