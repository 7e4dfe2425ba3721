use std::sync::Arc;

use lobby_bot::error::{self, LobbyError};
use lobby_bot::lobby::serenity_gateway::SerenityGateway;
use lobby_bot::{commands, config, events, Data};
use poise::serenity_prelude as serenity;
use tracing_subscriber::EnvFilter;

/// The guild this instance serves: the configured one, or the only guild the
/// bot is in.
fn resolve_guild(
    configured: Option<u64>,
    ready: &serenity::Ready,
) -> Result<serenity::GuildId, LobbyError> {
    if let Some(id) = configured {
        return Ok(serenity::GuildId::new(id));
    }
    match ready.guilds.as_slice() {
        [only] => Ok(only.id),
        guilds => Err(LobbyError::Config(format!(
            "bot is in {} guilds; set LOBBY_BOT_GUILD_ID",
            guilds.len()
        ))),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let token = config.discord_token.clone();
    let prefix = config.prefix.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                case_insensitive_commands: true,
                ..Default::default()
            },
            on_error: |error| Box::pin(error::on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(events::handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                let guild_id = resolve_guild(config.guild_id, ready)?;
                tracing::info!("serving lobbies in guild {guild_id}");

                let gateway = Arc::new(SerenityGateway::new(ctx.clone(), guild_id));
                Ok(Data::new(config, gateway))
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .expect("failed to create client");

    if let Err(e) = client.start().await {
        tracing::error!("client error: {e}");
    }
}
