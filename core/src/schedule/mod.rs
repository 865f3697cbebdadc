//! Reset scheduling
//!
//! Each stat source owns two windows, one daily and one weekly. The weekly slot
//! follows either the calendar or an event the source reports (a WvW match end).
//!
//! ```text
//!   tick ──► should_reset(window)? ──no──► update
//!                    │ yes
//!                    ▼
//!            source.reset_*() ──Unavailable──► skip update, window untouched
//!                    │ Ok(next)
//!                    ▼
//!            commit(window, next) ──► update
//! ```

mod boundary;
mod window;

pub use boundary::{next_daily_reset, next_weekly_reset};
pub use window::ResetWindow;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use stream_out_types::WeeklyReset;

use crate::clock::{Clock, PersistentClock};

/// Grace added to event boundaries to absorb clock skew with the remote service.
pub const EVENT_GRACE_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cadence {
    Daily,
    Weekly,
}

impl Cadence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    fn last_reset_field(self) -> String {
        format!("{}_last_reset", self.as_str())
    }

    fn next_reset_field(self) -> String {
        format!("{}_next_reset", self.as_str())
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the next boundary comes from after a successful reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextReset {
    /// Fixed calendar boundary for the cadence
    Calendar,
    /// Externally supplied instant (e.g. match end); the event grace is added
    At(DateTime<Utc>),
}

pub struct ResetScheduler {
    clock: Arc<dyn Clock>,
    weekly: WeeklyReset,
    event_grace: Duration,
}

impl ResetScheduler {
    pub fn new(clock: Arc<dyn Clock>, weekly: WeeklyReset) -> Self {
        Self {
            clock,
            weekly,
            event_grace: Duration::minutes(EVENT_GRACE_MINUTES),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Load a window, creating it as "due immediately" on first use.
    pub fn load_window(&self, state: &PersistentClock, cadence: Cadence) -> ResetWindow {
        let fresh = ResetWindow::due_immediately(self.now());
        ResetWindow {
            last_reset_at: state.define_timestamp(&cadence.last_reset_field(), fresh.last_reset_at),
            next_reset_at: state.define_timestamp(&cadence.next_reset_field(), fresh.next_reset_at),
        }
    }

    pub fn should_reset(&self, window: &ResetWindow) -> bool {
        window.should_reset(self.now())
    }

    /// Boundary to commit for `cadence` given what the reset reported.
    ///
    /// Event boundaries that are not after `now` (stale match data) are pushed to
    /// `now + grace`; otherwise `last_reset_at = now` would close the window for good.
    pub fn next_boundary(&self, cadence: Cadence, next: NextReset) -> DateTime<Utc> {
        let now = self.now();
        match next {
            NextReset::Calendar => match cadence {
                Cadence::Daily => next_daily_reset(now),
                Cadence::Weekly => next_weekly_reset(now, &self.weekly),
            },
            NextReset::At(at) => {
                let boundary = at + self.event_grace;
                if boundary > now {
                    boundary
                } else {
                    tracing::warn!(%at, %now, "Event boundary already passed, retrying after grace");
                    now + self.event_grace
                }
            }
        }
    }

    /// Record a successful reset and persist the new window.
    ///
    /// Only call this once the reset action has produced a valid baseline.
    pub fn commit(&self, state: &PersistentClock, cadence: Cadence, next: NextReset) -> ResetWindow {
        let window = self
            .load_window(state, cadence)
            .committed(self.now(), self.next_boundary(cadence, next));
        state.set_timestamp(&cadence.last_reset_field(), window.last_reset_at);
        state.set_timestamp(&cadence.next_reset_field(), window.next_reset_at);
        window
    }
}
