//! Message handler: routes commands, guards privileged ones, and launches
//! transfers.

use std::sync::Arc;

use ferry_core::{AddOutcome, AdminSet, RemoveOutcome, UserId};
use ferry_telemetry::RequestContext;
use ferry_transfer::{GofileClient, MegaClient, Pipeline, TransferRequest, validate_link};
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode, ReplyParameters};
use tokio::sync::RwLock;
use tracing::{Instrument as _, debug, info, warn};

use crate::command::{ADMIN_USAGE, Action, Command, GOFILE_USAGE, REMOVE_USAGE, parse_user_id};
use crate::config::TelegramConfig;
use crate::error::{CommandError, TelegramBotError, TelegramResult};
use crate::format;
use crate::sink::TelegramSink;

/// The pipeline wired to the production clients.
pub type RelayPipeline = Pipeline<MegaClient, GofileClient>;

/// Shared bot state passed to all handlers.
#[derive(Clone)]
pub struct BotState {
    /// Super-admin plus delegated admins, shared by all handlers.
    pub admins: Arc<RwLock<AdminSet>>,
    /// The relay pipeline.
    pub pipeline: Arc<RelayPipeline>,
    /// Frontend settings.
    pub config: Arc<TelegramConfig>,
}

impl BotState {
    /// Seed the admin set with the super-admin and build the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramBotError::Client`] if an HTTP client cannot be built.
    pub fn new(config: TelegramConfig) -> TelegramResult<Self> {
        let storage = MegaClient::new().map_err(|e| TelegramBotError::Client(e.to_string()))?;
        let host = GofileClient::new().map_err(|e| TelegramBotError::Client(e.to_string()))?;
        let pipeline = Pipeline::new(Arc::new(storage), Arc::new(host), config.pipeline.clone());
        Ok(Self {
            admins: Arc::new(RwLock::new(AdminSet::new(config.main_admin_id))),
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        })
    }
}

/// `/admin` or `/remove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminChange {
    /// Grant delegated rights.
    Add,
    /// Revoke delegated rights.
    Remove,
}

impl AdminChange {
    fn action(self) -> Action {
        match self {
            Self::Add => Action::AddAdmin,
            Self::Remove => Action::RemoveAdmin,
        }
    }

    fn usage(self) -> &'static str {
        match self {
            Self::Add => ADMIN_USAGE,
            Self::Remove => REMOVE_USAGE,
        }
    }
}

/// Apply an admin change and produce the HTML reply.
///
/// Permission is checked before the argument, so a non-super-admin learns
/// nothing about argument syntax.
///
/// # Errors
///
/// Returns a [`CommandError`] when the requester is not the super-admin or
/// the argument is missing or malformed; the set is unchanged.
pub fn apply_admin_change(
    admins: &mut AdminSet,
    requester: UserId,
    change: AdminChange,
    arg: Option<&str>,
) -> Result<String, CommandError> {
    let denied = CommandError::PermissionDenied {
        action: change.action(),
        super_admin: admins.super_admin(),
    };
    if !admins.is_super_admin(requester) {
        return Err(denied);
    }
    let target = parse_user_id(arg, change.usage())?;

    let reply = match change {
        AdminChange::Add => match admins.add_admin(requester, target) {
            AddOutcome::Added => format::admin_added(target, admins),
            AddOutcome::AlreadyAdmin => format::already_admin(target, admins),
            AddOutcome::Denied => return Err(denied),
        },
        AdminChange::Remove => match admins.remove_admin(requester, target) {
            RemoveOutcome::Removed => format::admin_removed(target, admins),
            RemoveOutcome::NotAdmin => format::not_admin(target),
            RemoveOutcome::CannotRemoveSuper => format::cannot_remove_super(),
            RemoveOutcome::Denied => return Err(denied),
        },
    };
    Ok(reply)
}

/// Check that `user` may start a transfer with `arg`, returning the link.
///
/// # Errors
///
/// [`CommandError::PermissionDenied`] for non-admins and
/// [`CommandError::MissingArgument`] when no link was given.
pub fn authorize_transfer(
    admins: &AdminSet,
    user: UserId,
    arg: Option<String>,
) -> Result<String, CommandError> {
    if !admins.is_authorized(user) {
        return Err(CommandError::PermissionDenied {
            action: Action::Transfer,
            super_admin: admins.super_admin(),
        });
    }
    arg.ok_or(CommandError::MissingArgument {
        usage: GOFILE_USAGE,
    })
}

/// Handle an incoming message.
pub async fn handle_message(bot: Bot, msg: Message, state: BotState) -> anyhow::Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(command) = Command::parse(text) else {
        return Ok(());
    };
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = UserId(user.id.0);
    debug!(user = %user_id, ?command, "command received");

    match command {
        Command::Start => handle_start(&bot, &msg, &state, user_id).await,
        Command::Admin(arg) => {
            handle_admin_change(&bot, &msg, &state, user_id, AdminChange::Add, arg).await;
        },
        Command::Remove(arg) => {
            handle_admin_change(&bot, &msg, &state, user_id, AdminChange::Remove, arg).await;
        },
        Command::Gofile(arg) => handle_gofile(bot, msg, state, user_id, arg).await,
    }
    Ok(())
}

async fn reply_html(bot: &Bot, msg: &Message, html: String) {
    if let Err(e) = bot
        .send_message(msg.chat.id, html)
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await
    {
        warn!(chat = %msg.chat.id, error = %e, "failed to send reply");
    }
}

async fn handle_start(bot: &Bot, msg: &Message, state: &BotState, user: UserId) {
    let caption = {
        let admins = state.admins.read().await;
        format::welcome_caption(&admins, user)
    };
    info!(user = %user, "start");

    let animation = InputFile::url(state.config.welcome_animation_url.clone());
    let sent = bot
        .send_animation(msg.chat.id, animation)
        .caption(caption.clone())
        .parse_mode(ParseMode::Html)
        .disable_notification(true)
        .await;
    if let Err(e) = sent {
        warn!(user = %user, error = %e, "welcome animation failed, sending text");
        reply_html(bot, msg, caption).await;
    }
}

async fn handle_admin_change(
    bot: &Bot,
    msg: &Message,
    state: &BotState,
    user: UserId,
    change: AdminChange,
    arg: Option<String>,
) {
    let reply = {
        let mut admins = state.admins.write().await;
        match apply_admin_change(&mut admins, user, change, arg.as_deref()) {
            Ok(reply) => {
                info!(user = %user, ?change, target = ?arg, "admin set updated");
                reply
            },
            Err(e) => {
                warn!(user = %user, ?change, error = %e, "admin command refused");
                format::command_error(&e)
            },
        }
    };
    reply_html(bot, msg, reply).await;
}

async fn handle_gofile(bot: Bot, msg: Message, state: BotState, user: UserId, arg: Option<String>) {
    let authorized = {
        let admins = state.admins.read().await;
        authorize_transfer(&admins, user, arg)
    };
    let link = match authorized {
        Ok(link) => link,
        Err(e) => {
            warn!(user = %user, error = %e, "transfer refused");
            reply_html(&bot, &msg, format::command_error(&e)).await;
            return;
        },
    };
    if validate_link(&link).is_err() {
        warn!(user = %user, "invalid link format");
        reply_html(&bot, &msg, format::invalid_link()).await;
        return;
    }

    let status = match bot
        .send_message(msg.chat.id, format::transfer_accepted())
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await
    {
        Ok(status) => status,
        Err(e) => {
            warn!(user = %user, error = %e, "could not send status message, abandoning transfer");
            return;
        },
    };

    let context = RequestContext::new("telegram")
        .with_user_id(user.get())
        .with_chat_id(msg.chat.id.0)
        .with_operation("gofile");
    let span = context.span();
    let sink = TelegramSink::new(
        bot,
        msg.chat.id,
        status.id,
        msg.id,
        state.config.bar_width,
    );
    let request = TransferRequest::new(link, user);

    tokio::spawn(
        async move {
            info!("transfer started");
            let outcome = state.pipeline.run(&request, &sink).await;
            info!(
                ok = outcome.is_ok(),
                elapsed_ms = context.elapsed_ms(),
                "transfer finished"
            );
        }
        .instrument(span),
    );
}
