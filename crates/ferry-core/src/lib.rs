//! Ferry Core - identity and authorization for the Ferry relay bot.
//!
//! This crate provides:
//! - [`UserId`], the chat-platform identity every privileged action is
//!   checked against
//! - [`AdminSet`], the two-tier authorization store (one fixed super-admin
//!   plus a mutable set of delegated admins)
//!
//! The admin set lives only in process memory. It is seeded with the
//! super-admin at startup and is lost when the process exits.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod admin;
pub mod identity;

pub use admin::{AddOutcome, AdminSet, RemoveOutcome};
pub use identity::{ParseUserIdError, UserId};
