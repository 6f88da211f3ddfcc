//! Ferry Telegram Bot - standalone binary.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use ferry_telemetry::{LogConfig, setup_logging};
use ferry_telegram::config::TelegramConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ferry_config::Config::load()?;
    setup_logging(&LogConfig::from_section(&config.logging)?)?;

    let telegram = TelegramConfig::from_config(&config)?;
    Box::pin(ferry_telegram::bot::run(telegram)).await
}
