//! Telegram HTML message templates.

use std::fmt::Write as _;

use ferry_core::{AdminSet, UserId};
use ferry_transfer::{Phase, StatusUpdate, render_bar};

use crate::command::Action;
use crate::error::CommandError;

/// Escape text for safe inclusion in Telegram HTML.
///
/// Escapes `&`, `<`, `>`, `"`, and `'` so the output is safe in both text
/// content and HTML attributes (e.g. `href="..."`).
pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Comma-separated delegated admins, or `None`.
fn delegated_list(admins: &AdminSet) -> String {
    let delegated = admins.delegated();
    if delegated.is_empty() {
        return "None".to_owned();
    }
    delegated
        .iter()
        .map(UserId::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Two-line summary of the admin set.
pub fn admin_list(admins: &AdminSet) -> String {
    format!(
        "👑 <b>Main Admin</b>: <code>{}</code>\n👥 <b>Regular Admins</b>: {}",
        admins.super_admin(),
        delegated_list(admins)
    )
}

/// `/start` caption, depending on whether `user` may use the bot.
pub fn welcome_caption(admins: &AdminSet, user: UserId) -> String {
    if admins.is_authorized(user) {
        format!(
            "🚀 <b>MEGA to Gofile Relay</b>\n\n\
             Send <code>/gofile [mega_link]</code> to upload a file\n\n\
             🔐 <b>Admin Management (main admin only)</b>\n\
             • <code>/admin [user_id]</code> - add a regular admin\n\
             • <code>/remove [user_id]</code> - remove a regular admin\n\n\
             {}",
            admin_list(admins)
        )
    } else {
        format!(
            "🔒 <b>Access Restricted</b>\n\n\
             You need to be an admin to use this bot.\n\
             Contact the main admin for access:\n\
             <code>{}</code>\n\n\
             ⚠️ Only the main admin can grant access",
            admins.super_admin()
        )
    }
}

/// Reply after a successful `/admin`.
pub fn admin_added(target: UserId, admins: &AdminSet) -> String {
    format!(
        "✅ Added regular admin: <code>{target}</code>\n\n{}",
        admin_list(admins)
    )
}

/// Reply after a successful `/remove`.
pub fn admin_removed(target: UserId, admins: &AdminSet) -> String {
    format!(
        "🗑️ Removed regular admin: <code>{target}</code>\n\n{}",
        admin_list(admins)
    )
}

/// Reply when `/admin` targets someone already authorized.
pub fn already_admin(target: UserId, admins: &AdminSet) -> String {
    if admins.is_super_admin(target) {
        "👑 That user is already the main admin!".to_owned()
    } else {
        format!("⚠️ User <code>{target}</code> is already a regular admin!")
    }
}

/// Reply when `/remove` targets someone who is not a delegated admin.
pub fn not_admin(target: UserId) -> String {
    format!("⚠️ User <code>{target}</code> is not a regular admin!")
}

/// Reply when `/remove` targets the super-admin.
pub fn cannot_remove_super() -> String {
    "👑 Cannot remove the main admin!".to_owned()
}

/// Reply when a `/gofile` link has the wrong prefix.
pub fn invalid_link() -> String {
    "❌ <b>Invalid MEGA link!</b>\n\n\
     Must start with <code>https://mega.nz/</code> or <code>https://mega.io/</code>"
        .to_owned()
}

/// Reply for a refused command.
pub fn command_error(err: &CommandError) -> String {
    match err {
        CommandError::PermissionDenied {
            action: Action::Transfer,
            super_admin,
        } => format!(
            "❌ <b>Access denied!</b>\n\n\
             You need to be an admin to use this bot.\n\
             Contact the main admin: <code>{super_admin}</code>"
        ),
        CommandError::PermissionDenied {
            action,
            super_admin,
        } => format!(
            "❌ <b>ACCESS DENIED!</b>\n\n\
             Only the main admin can manage admins ({action}).\n\
             Main Admin ID: <code>{super_admin}</code>"
        ),
        CommandError::InvalidArgument(value) => format!(
            "❌ Invalid user ID <code>{}</code>! Must be a number.",
            html_escape(value)
        ),
        CommandError::MissingArgument { usage } => {
            format!("Usage: <code>{}</code>", html_escape(usage))
        },
    }
}

/// Opening text of a `/gofile` status message, shown while metadata is
/// fetched. Differs from every [`status_text`] so the first edit changes it.
pub fn transfer_accepted() -> String {
    "🔎 <b>Fetching file info from MEGA...</b>".to_owned()
}

fn phase_heading(phase: Phase) -> (&'static str, &'static str) {
    match phase {
        Phase::Downloading => ("📥", "Downloading from MEGA"),
        Phase::Uploading => ("⏫", "Uploading to Gofile"),
    }
}

/// Status message text for a pipeline update.
pub fn status_text(update: &StatusUpdate, bar_width: usize) -> String {
    match update {
        StatusUpdate::PhaseStarted { phase } => {
            let start = match phase {
                Phase::Downloading => "📥 <b>Starting download from MEGA...</b>",
                Phase::Uploading => "⏫ <b>Starting upload to Gofile...</b>",
            };
            format!("{start}\n{}", render_bar(0, bar_width))
        },
        StatusUpdate::Progress {
            phase,
            file_name,
            percent,
        } => {
            let (icon, heading) = phase_heading(*phase);
            format!(
                "{icon} <b>{heading}:</b> {}\n{}",
                html_escape(file_name),
                render_bar(*percent, bar_width)
            )
        },
        StatusUpdate::Indeterminate {
            phase,
            file_name,
            bytes,
        } => {
            let (icon, heading) = phase_heading(*phase);
            format!(
                "{icon} <b>{heading}:</b> {}\n{bytes} bytes so far (total size unknown)",
                html_escape(file_name)
            )
        },
        StatusUpdate::Completed {
            file_name,
            download_page,
        } => {
            let page = html_escape(download_page);
            format!(
                "✅ <b>Upload successful!</b>\n\n\
                 📁 <b>File:</b> <code>{}</code>\n\
                 🔗 <b>Download:</b> <a href=\"{page}\">{page}</a>",
                html_escape(file_name)
            )
        },
        StatusUpdate::Failed { message } => {
            format!("❌ <b>Error:</b> <code>{}</code>", html_escape(message))
        },
    }
}

/// Broadcast sent to every admin at startup. Plain text.
pub fn startup_notice(admins: &AdminSet) -> String {
    let mut text = String::from("Ferry is alive 🥳\n\n");
    text.push_str("✅ Ready to relay MEGA links\n");
    text.push_str("✅ Admin management active (main admin only)\n");
    let _ = writeln!(text, "👑 Main Admin: {}", admins.super_admin());
    let _ = write!(text, "👥 Regular Admins: {}", delegated_list(admins));
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPER: UserId = UserId(1000);

    fn admins_with(delegated: &[u64]) -> AdminSet {
        let mut admins = AdminSet::new(SUPER);
        for id in delegated {
            admins.add_admin(SUPER, UserId(*id));
        }
        admins
    }

    #[test]
    fn html_escape_all_special_chars() {
        assert_eq!(
            html_escape(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn admin_list_shows_none_when_empty() {
        let text = admin_list(&admins_with(&[]));
        assert!(text.contains("<code>1000</code>"));
        assert!(text.ends_with("None"));
    }

    #[test]
    fn admin_list_is_sorted() {
        let text = admin_list(&admins_with(&[30, 10, 20]));
        assert!(text.ends_with("10, 20, 30"));
    }

    #[test]
    fn welcome_caption_depends_on_status() {
        let admins = admins_with(&[5]);
        assert!(welcome_caption(&admins, SUPER).contains("/gofile"));
        assert!(welcome_caption(&admins, UserId(5)).contains("/gofile"));
        let restricted = welcome_caption(&admins, UserId(6));
        assert!(restricted.contains("Access Restricted"));
        assert!(restricted.contains("<code>1000</code>"));
    }

    #[test]
    fn already_admin_distinguishes_super() {
        let admins = admins_with(&[5]);
        assert!(already_admin(SUPER, &admins).contains("main admin"));
        assert!(already_admin(UserId(5), &admins).contains("<code>5</code>"));
    }

    #[test]
    fn usage_is_escaped() {
        let text = command_error(&CommandError::MissingArgument {
            usage: "/admin <user_id>",
        });
        assert_eq!(text, "Usage: <code>/admin &lt;user_id&gt;</code>");
    }

    #[test]
    fn invalid_argument_is_escaped() {
        let text = command_error(&CommandError::InvalidArgument("<b>".into()));
        assert!(text.contains("&lt;b&gt;"));
    }

    #[test]
    fn permission_denied_names_super_admin() {
        for action in [Action::AddAdmin, Action::RemoveAdmin, Action::Transfer] {
            let text = command_error(&CommandError::PermissionDenied {
                action,
                super_admin: SUPER,
            });
            assert!(text.contains("<code>1000</code>"), "{action}");
        }
    }

    #[test]
    fn progress_status_has_bar_and_name() {
        let text = status_text(
            &StatusUpdate::Progress {
                phase: Phase::Downloading,
                file_name: "a<b>.mkv".into(),
                percent: 50,
            },
            20,
        );
        assert!(text.contains("a&lt;b&gt;.mkv"));
        assert!(text.ends_with(&render_bar(50, 20)));
    }

    #[test]
    fn completed_status_has_link_and_name() {
        let text = status_text(
            &StatusUpdate::Completed {
                file_name: "movie.mkv".into(),
                download_page: "https://gofile.io/d/XYZ".into(),
            },
            20,
        );
        assert!(text.contains("movie.mkv"));
        assert!(text.contains("https://gofile.io/d/XYZ"));
    }

    #[test]
    fn failed_status_escapes_message() {
        let text = status_text(
            &StatusUpdate::Failed {
                message: "upload failed: <html>".into(),
            },
            20,
        );
        assert_eq!(
            text,
            "❌ <b>Error:</b> <code>upload failed: &lt;html&gt;</code>"
        );
    }

    #[test]
    fn opening_text_differs_from_first_phase_edit() {
        let opening = transfer_accepted();
        for phase in [Phase::Downloading, Phase::Uploading] {
            assert_ne!(opening, status_text(&StatusUpdate::PhaseStarted { phase }, 20));
        }
        assert_ne!(
            opening,
            status_text(
                &StatusUpdate::Progress {
                    phase: Phase::Downloading,
                    file_name: "movie.mkv".into(),
                    percent: 0,
                },
                20,
            )
        );
    }

    #[test]
    fn startup_notice_lists_admins() {
        let text = startup_notice(&admins_with(&[7, 3]));
        assert!(text.contains("Main Admin: 1000"));
        assert!(text.ends_with("Regular Admins: 3, 7"));
        assert!(startup_notice(&admins_with(&[])).ends_with("Regular Admins: None"));
    }
}
