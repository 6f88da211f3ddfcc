//! Error types for the Telegram frontend.

use ferry_core::UserId;
use thiserror::Error;

use crate::command::Action;

/// Why a command was refused before doing any work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The sender lacks the rights `action` needs.
    #[error("{action} is not permitted; contact the main admin {super_admin}")]
    PermissionDenied {
        /// What the sender tried to do.
        action: Action,
        /// Who can grant access.
        super_admin: UserId,
    },

    /// An argument was present but unusable.
    #[error("invalid user id {0:?}: must be a number")]
    InvalidArgument(String),

    /// A required argument was missing.
    #[error("missing argument; usage: {usage}")]
    MissingArgument {
        /// Usage line for the command.
        usage: &'static str,
    },
}

/// Errors raised while starting the bot.
#[derive(Debug, Error)]
pub enum TelegramBotError {
    /// Configuration could not be turned into a runnable bot.
    #[error("configuration error: {0}")]
    Config(String),

    /// An HTTP client for a transfer collaborator could not be built.
    #[error("client setup failed: {0}")]
    Client(String),
}

/// Convenience alias.
pub type TelegramResult<T> = Result<T, TelegramBotError>;
