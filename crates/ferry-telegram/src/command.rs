//! Command text parsing.

use std::fmt;

use ferry_core::UserId;

use crate::error::CommandError;

/// Usage line for `/admin`.
pub const ADMIN_USAGE: &str = "/admin <user_id>";
/// Usage line for `/remove`.
pub const REMOVE_USAGE: &str = "/remove <user_id>";
/// Usage line for `/gofile`.
pub const GOFILE_USAGE: &str = "/gofile <mega_link>";

/// A recognized bot command with its raw argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`, and any unrecognized command.
    Start,
    /// `/admin <id>`.
    Admin(Option<String>),
    /// `/remove <id>`.
    Remove(Option<String>),
    /// `/gofile <link>`; multi-word arguments are joined with single spaces.
    Gofile(Option<String>),
}

/// A privileged operation, for permission messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Granting delegated admin rights.
    AddAdmin,
    /// Revoking delegated admin rights.
    RemoveAdmin,
    /// Running a transfer.
    Transfer,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddAdmin => f.write_str("adding admins"),
            Self::RemoveAdmin => f.write_str("removing admins"),
            Self::Transfer => f.write_str("uploading files"),
        }
    }
}

impl Command {
    /// Parse message text. Returns `None` for anything that is not a command.
    ///
    /// A trailing `@botname` on the command word is ignored.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let head = words.next()?.strip_prefix('/')?;
        let name = head.split_once('@').map_or(head, |(name, _)| name);
        if name.is_empty() {
            return None;
        }

        let command = match name.to_ascii_lowercase().as_str() {
            "admin" => Self::Admin(words.next().map(str::to_owned)),
            "remove" => Self::Remove(words.next().map(str::to_owned)),
            "gofile" => {
                let joined = words.collect::<Vec<_>>().join(" ");
                Self::Gofile((!joined.is_empty()).then_some(joined))
            },
            _ => Self::Start,
        };
        Some(command)
    }
}

/// Parse a user-id argument, reporting `usage` when it is absent.
///
/// # Errors
///
/// [`CommandError::MissingArgument`] when `arg` is `None`,
/// [`CommandError::InvalidArgument`] when it is not a number.
pub fn parse_user_id(arg: Option<&str>, usage: &'static str) -> Result<UserId, CommandError> {
    let arg = arg.ok_or(CommandError::MissingArgument { usage })?;
    arg.parse()
        .map_err(|_| CommandError::InvalidArgument(arg.to_owned()))
}
