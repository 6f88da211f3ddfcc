//! Transfer status delivery over Telegram.

use async_trait::async_trait;
use ferry_transfer::{SinkError, StatusSink, StatusUpdate};
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId, ParseMode, ReplyParameters};

use crate::format;

/// Edits one status message; replies to the command message as a fallback.
pub struct TelegramSink {
    bot: Bot,
    chat_id: ChatId,
    status_msg: MessageId,
    command_msg: MessageId,
    bar_width: usize,
}

impl TelegramSink {
    /// Sink for the status message `status_msg`, created in reply to
    /// `command_msg`.
    pub fn new(
        bot: Bot,
        chat_id: ChatId,
        status_msg: MessageId,
        command_msg: MessageId,
        bar_width: usize,
    ) -> Self {
        Self {
            bot,
            chat_id,
            status_msg,
            command_msg,
            bar_width,
        }
    }
}

#[async_trait]
impl StatusSink for TelegramSink {
    async fn edit(&self, update: &StatusUpdate) -> Result<(), SinkError> {
        self.bot
            .edit_message_text(
                self.chat_id,
                self.status_msg,
                format::status_text(update, self.bar_width),
            )
            .parse_mode(ParseMode::Html)
            .await
            .map(|_| ())
            .map_err(SinkError::new)
    }

    async fn reply(&self, update: &StatusUpdate) -> Result<(), SinkError> {
        self.bot
            .send_message(self.chat_id, format::status_text(update, self.bar_width))
            .parse_mode(ParseMode::Html)
            .reply_parameters(ReplyParameters::new(self.command_msg))
            .await
            .map(|_| ())
            .map_err(SinkError::new)
    }
}
