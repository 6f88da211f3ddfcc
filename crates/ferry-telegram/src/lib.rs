//! Ferry Telegram Bot - relays MEGA public links to Gofile.
//!
//! Admin management (`/admin`, `/remove`) is reserved for the configured
//! main admin; transfers (`/gofile`) are open to every admin. Progress is
//! reported by editing a single status message.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod bot;
pub mod command;
pub mod config;
pub mod error;
pub mod format;
pub mod handler;
pub mod notify;
pub mod sink;
