//! Startup announcement to every admin.

use ferry_core::AdminSet;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::{info, warn};

use crate::format;

/// Send the startup notice to every admin, super-admin first.
///
/// Failures are logged and skipped. Returns how many notices were delivered.
pub async fn announce_startup(bot: &Bot, admins: &AdminSet) -> usize {
    let text = format::startup_notice(admins);
    let mut delivered = 0usize;

    for admin in admins.all_admins() {
        let Ok(chat) = i64::try_from(admin.get()) else {
            warn!(admin = %admin, "admin id does not fit a chat id, skipping");
            continue;
        };
        match bot
            .send_message(ChatId(chat), text.clone())
            .disable_notification(true)
            .await
        {
            Ok(_) => {
                info!(admin = %admin, "startup notice sent");
                delivered = delivered.saturating_add(1);
            },
            Err(e) => warn!(admin = %admin, error = %e, "failed to send startup notice"),
        }
    }
    delivered
}
