//! Ephemeral user notifications.
//!
//! Every surfaced error or success message is a transient, auto-dismissing
//! notification; none are fatal and the view stays interactive. Expiry is
//! time-based with `now` passed in explicitly so tests can drive the clock.

use chrono::{DateTime, Utc};

/// How long a notification stays visible.
pub const NOTIFICATION_TTL_SECONDS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub shown_at: DateTime<Utc>,
}

impl Notification {
    pub fn success(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
            shown_at: now,
        }
    }

    pub fn error(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
            shown_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.shown_at).num_seconds() >= NOTIFICATION_TTL_SECONDS
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn expires_after_ttl() {
        let now = Utc::now();
        let notification = Notification::error("Failed to fetch users", now);

        assert!(!notification.is_expired(now));
        assert!(!notification.is_expired(now + Duration::seconds(NOTIFICATION_TTL_SECONDS - 1)));
        assert!(notification.is_expired(now + Duration::seconds(NOTIFICATION_TTL_SECONDS)));
    }
}
