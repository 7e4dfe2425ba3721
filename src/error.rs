//! Error kinds and the single place where command failures become user-facing
//! behavior.
//!
//! Handlers raise a [`LobbyError`]; nothing below the command layer decides how
//! a failure is shown. [`on_error`] is installed as poise's `on_error` and maps
//! each [`ErrorKind`] to a reply, a deleted invocation, an audit entry, or a log
//! line.

use poise::{CreateReply, FrameworkError};
use serenity::http::HttpError;
use serenity::model::id::ChannelId;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::lobby::state;
use crate::utils::embed;
use crate::{Context, Data};

#[derive(Error, Debug)]
pub enum LobbyError {
    /// The invoking user misused a command and should be told why.
    #[error("{0}")]
    User(String),

    /// The invoking user lacks the role or permission the command needs.
    #[error("{0}")]
    Permission(String),

    /// Something the server admins should see in the bot log.
    #[error("{0}")]
    Admin(String),

    /// Logged only; never echoed to Discord.
    #[error("{0}")]
    Silent(String),

    /// A channel, member or message disappeared between reads.
    #[error("{0} no longer exists")]
    Vanished(String),

    /// Discord rejected or failed a request.
    #[error(transparent)]
    Platform(#[from] serenity::Error),

    /// A lobby could not be fully deleted.
    #[error("failed to tear down lobby {group}: {source}")]
    Teardown {
        group: ChannelId,
        #[source]
        source: Box<LobbyError>,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    User,
    Permission,
    Admin,
    Silent,
    Transient,
    Teardown,
    Unknown,
}

impl LobbyError {
    pub fn user(message: impl Into<String>) -> Self {
        Self::User(message.into())
    }

    pub fn vanished(what: impl Into<String>) -> Self {
        Self::Vanished(what.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::User(_) => ErrorKind::User,
            Self::Permission(_) => ErrorKind::Permission,
            Self::Admin(_) => ErrorKind::Admin,
            Self::Silent(_) => ErrorKind::Silent,
            Self::Vanished(_) | Self::Platform(_) => ErrorKind::Transient,
            Self::Teardown { .. } => ErrorKind::Teardown,
            Self::Config(_) => ErrorKind::Unknown,
        }
    }

    /// True when the failure means the target object is already gone, which
    /// the lifecycle code treats as an expected outcome of concurrent edits.
    pub fn is_vanished(&self) -> bool {
        match self {
            Self::Vanished(_) => true,
            Self::Platform(serenity::Error::Http(HttpError::UnsuccessfulRequest(
                response,
            ))) => response.status_code.as_u16() == 404,
            _ => false,
        }
    }
}

/// What the translator does with a failed command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Reply(String),
    EphemeralReply(String),
    DeleteInvocation,
    AuditLog(String),
    LogOnly,
    GenericFailure,
}

/// Pure mapping from an error kind to the user-facing behavior.
pub fn response_for(
    error: &LobbyError,
    mention: &str,
    in_lobby: bool,
    is_prefix: bool,
) -> Response {
    match error.kind() {
        ErrorKind::User => Response::Reply(format!("{mention} {error}")),
        ErrorKind::Permission => permission_response(mention, in_lobby, is_prefix),
        ErrorKind::Admin => Response::AuditLog(format!("{mention} {error}")),
        ErrorKind::Silent | ErrorKind::Transient | ErrorKind::Teardown => Response::LogOnly,
        ErrorKind::Unknown => Response::GenericFailure,
    }
}

fn permission_response(mention: &str, in_lobby: bool, is_prefix: bool) -> Response {
    let denial = format!("{mention} You do not have access to run this command.");
    match (in_lobby, is_prefix) {
        (true, _) => Response::Reply(denial),
        (false, true) => Response::DeleteInvocation,
        (false, false) => Response::EphemeralReply(denial),
    }
}

async fn in_lobby_context(ctx: Context<'_>) -> bool {
    match state::lobby_of_channel(ctx.data().gateway.as_ref(), ctx.channel_id()).await {
        Ok(group) => group.is_some(),
        Err(e) => {
            warn!("could not resolve lobby context for {}: {e}", ctx.channel_id());
            false
        }
    }
}

async fn apply(ctx: Context<'_>, response: Response) -> Result<(), serenity::Error> {
    match response {
        Response::Reply(text) => {
            ctx.say(text).await?;
        }
        Response::EphemeralReply(text) => {
            ctx.send(CreateReply::default().content(text).ephemeral(true))
                .await?;
        }
        Response::DeleteInvocation => {
            if let poise::Context::Prefix(prefix) = ctx {
                prefix.msg.delete(ctx.serenity_context()).await?;
            }
        }
        Response::AuditLog(text) => {
            ctx.data().audit.log(&text).await;
        }
        Response::LogOnly => {}
        Response::GenericFailure => {
            ctx.send(
                CreateReply::default()
                    .embed(embed::error("Something went wrong while running that command."))
                    .ephemeral(true),
            )
            .await?;
        }
    }
    Ok(())
}

async fn handle_command_error(ctx: Context<'_>, error: LobbyError) -> Result<(), serenity::Error> {
    let invocation = ctx.invocation_string();
    match error.kind() {
        ErrorKind::User => info!("user error in `{invocation}`: {error}"),
        ErrorKind::Permission => info!("{} was denied `{invocation}`", ctx.author().name),
        _ => error!("command `{invocation}` failed: {error}"),
    }

    let in_lobby = in_lobby_context(ctx).await;
    let is_prefix = matches!(ctx, poise::Context::Prefix(_));
    let response = response_for(&error, &ctx.author().to_string(), in_lobby, is_prefix);
    apply(ctx, response).await
}

async fn handle(error: FrameworkError<'_, Data, LobbyError>) -> Result<(), serenity::Error> {
    match error {
        FrameworkError::Command { error, ctx, .. } => handle_command_error(ctx, error).await,
        FrameworkError::CommandCheckFailed {
            error: Some(error),
            ctx,
            ..
        } => handle_command_error(ctx, error).await,
        FrameworkError::MissingUserPermissions { ctx, .. } => {
            handle_command_error(
                ctx,
                LobbyError::Permission("missing required permissions".to_string()),
            )
            .await
        }
        FrameworkError::ArgumentParse {
            error, input, ctx, ..
        } => {
            let message = match input {
                Some(input) => format!("Could not understand `{input}`: {error}"),
                None => format!("Missing or invalid argument: {error}"),
            };
            handle_command_error(ctx, LobbyError::User(message)).await
        }
        FrameworkError::EventHandler { error, event, .. } => {
            error!("event handler for {} failed: {error}", event.snake_case_name());
            Ok(())
        }
        FrameworkError::Setup { error, .. } => {
            error!("framework setup failed: {error}");
            Ok(())
        }
        other => poise::builtins::on_error(other).await,
    }
}

/// Installed as `FrameworkOptions::on_error`.
pub async fn on_error(error: FrameworkError<'_, Data, LobbyError>) {
    if let Err(e) = handle(error).await {
        error!("error while handling error: {e}");
    }
}
