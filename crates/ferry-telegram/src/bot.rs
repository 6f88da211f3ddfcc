//! Teloxide bot setup and dispatcher.

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use tracing::info;

use crate::config::TelegramConfig;
use crate::handler::{self, BotState};
use crate::notify;

/// Run the bot until Ctrl+C.
///
/// Announces startup to every admin, then serves updates. Messages are
/// handled one at a time per chat; transfers run on their own tasks.
pub async fn run(config: TelegramConfig) -> anyhow::Result<()> {
    let bot = Bot::new(&config.bot_token);
    let state = BotState::new(config)?;

    let delivered = {
        let admins = state.admins.read().await;
        notify::announce_startup(&bot, &admins).await
    };
    info!(delivered, "startup notices sent");

    let handler = Update::filter_message().endpoint({
        let state = state.clone();
        move |bot: Bot, msg: Message| {
            let state = state.clone();
            async move { Box::pin(handler::handle_message(bot, msg, state)).await }
        }
    });

    info!("Starting Telegram bot...");
    Box::pin(
        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch(),
    )
    .await;

    info!("Bot stopped");
    Ok(())
}
