pub mod voice_state;

use std::sync::atomic::Ordering;

use poise::serenity_prelude as serenity;
use tracing::info;

use crate::{Data, Error};

pub async fn handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            let verb = if data.connected.swap(true, Ordering::SeqCst) {
                "reconnected"
            } else {
                "connected"
            };
            info!("{} has {verb} to Discord", data_about_bot.user.name);
            data.audit
                .log(&format!("{} has {verb}!", data_about_bot.user.name))
                .await;
        }
        serenity::FullEvent::VoiceStateUpdate { old, new } => {
            voice_state::handle(ctx, old, new, data).await?;
        }
        _ => {}
    }
    Ok(())
}
