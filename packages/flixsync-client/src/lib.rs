pub mod api;
pub mod batch;
pub mod bell;
pub mod credentials;
pub mod interaction;
pub mod suggest;

pub use api::{NotificationApi, SearchApi};
pub use batch::BatchReport;
pub use bell::{BellConfig, BellSnapshot, DeleteOutcome, MarkOutcome, NotificationSync, SyncPhase};
pub use credentials::{CredentialProvider, FileCredentials, MemoryCredentials};
pub use interaction::{Navigator, Prompter};
pub use suggest::{SearchConfig, SearchPhase, SuggestSearch, SuggestSnapshot};

use chrono::{DateTime, Utc};
use flixsync_sdk::Notification;

/// 铃铛角标文字，没有未读时不显示
pub fn badge_label(unread: usize) -> Option<String> {
    match unread {
        0 => None,
        n if n > 99 => Some("99+".to_string()),
        n => Some(n.to_string()),
    }
}

/// 相对时间显示
pub fn format_relative_time(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - created_at).num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{} minutes ago", minutes)
    } else if hours < 24 {
        format!("{} hours ago", hours)
    } else {
        format!("{} days ago", days)
    }
}

/// 格式化通知显示
pub fn format_notification(notification: &Notification, now: DateTime<Utc>) -> String {
    let when = notification
        .created_at
        .map(|created_at| format_relative_time(created_at, now))
        .unwrap_or_else(|| "unknown time".to_string());
    let marker = if notification.is_read { " " } else { "●" };

    let mut text = format!(
        "{} {}\n   {}\n   {}",
        marker,
        notification.display_title(),
        notification.message,
        when
    );
    if let Some(movie) = &notification.related_movie {
        text.push_str(&format!(" · {}", movie.title));
    }
    text
}
