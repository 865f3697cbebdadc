use chrono::{DateTime, Duration, Utc};

/// Bookkeeping for one recurring reset.
///
/// A reset is due iff `last_reset_at < next_reset_at <= now`. Committing moves
/// `last_reset_at` to `now`, which closes the window until `now` passes the new
/// `next_reset_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetWindow {
    pub last_reset_at: DateTime<Utc>,
    pub next_reset_at: DateTime<Utc>,
}

impl ResetWindow {
    /// A window that has never reset and is already due.
    pub fn due_immediately(now: DateTime<Utc>) -> Self {
        Self {
            last_reset_at: DateTime::<Utc>::UNIX_EPOCH,
            next_reset_at: now - Duration::seconds(1),
        }
    }

    pub fn should_reset(&self, now: DateTime<Utc>) -> bool {
        self.last_reset_at < self.next_reset_at && self.next_reset_at <= now
    }

    pub fn committed(self, now: DateTime<Utc>, next_reset_at: DateTime<Utc>) -> Self {
        Self {
            last_reset_at: now,
            next_reset_at,
        }
    }
}
