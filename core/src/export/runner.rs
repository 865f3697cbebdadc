use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;

use crate::clock::{ClockStore, PersistentClock};
use crate::events::GameEvent;
use crate::schedule::{Cadence, NextReset, ResetScheduler};
use crate::sources::StatSource;

/// What a call to [`ExportRunner::do_update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another cycle of this source was still running
    Busy,
    /// Within the minimum poll interval of the previous cycle
    Throttled,
    /// A due reset could not fetch its baseline; the update was skipped
    ResetFailed(Cadence),
    Updated,
}

struct RunnerState {
    source: Box<dyn StatSource>,
    /// Reset windows of the source
    windows: PersistentClock,
    prev_request: Option<DateTime<Utc>>,
}

/// Drives one [`StatSource`] through its reset and update cycle.
///
/// At most one hook of the source runs at a time. Ticks that find a cycle in
/// flight are dropped; events wait for the lock.
pub struct ExportRunner {
    name: &'static str,
    scheduler: Arc<ResetScheduler>,
    min_interval: TimeDelta,
    inner: Mutex<RunnerState>,
}

impl ExportRunner {
    pub fn new(
        source: Box<dyn StatSource>,
        store: Arc<dyn ClockStore>,
        scheduler: Arc<ResetScheduler>,
        min_interval: Duration,
    ) -> Self {
        let name = source.name();
        Self {
            name,
            scheduler,
            min_interval: TimeDelta::from_std(min_interval).unwrap_or(TimeDelta::MAX),
            inner: Mutex::new(RunnerState {
                source,
                windows: PersistentClock::new(store, name),
                prev_request: None,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn initialize(&self) {
        self.inner.lock().await.source.initialize().await;
    }

    /// One scheduled cycle: daily reset, then weekly reset, then update.
    ///
    /// A reset that fails leaves its window due and skips the update, so the
    /// whole cycle is retried on the next tick past the poll interval.
    pub async fn do_update(&self) -> TickOutcome {
        let Ok(mut guard) = self.inner.try_lock() else {
            tracing::debug!(source = self.name, "Cycle still running, tick dropped");
            return TickOutcome::Busy;
        };

        let now = self.scheduler.now();
        if guard
            .prev_request
            .is_some_and(|prev| now - prev < self.min_interval)
        {
            return TickOutcome::Throttled;
        }
        guard.prev_request = Some(now);

        let RunnerState {
            source, windows, ..
        } = &mut *guard;

        for cadence in [Cadence::Daily, Cadence::Weekly] {
            if !source.cadences().contains(&cadence) {
                continue;
            }
            let window = self.scheduler.load_window(windows, cadence);
            if !self.scheduler.should_reset(&window) {
                continue;
            }

            let result = match cadence {
                Cadence::Daily => source.reset_daily().await.map(|()| NextReset::Calendar),
                Cadence::Weekly => source.reset_weekly().await,
            };
            match result {
                Ok(next) => {
                    let window = self.scheduler.commit(windows, cadence, next);
                    tracing::info!(
                        source = self.name,
                        %cadence,
                        next_reset = %window.next_reset_at,
                        "Reset committed"
                    );
                }
                Err(e) => {
                    tracing::warn!(source = self.name, %cadence, error = %e, "Reset failed, retrying next tick");
                    return TickOutcome::ResetFailed(cadence);
                }
            }
        }

        source.update().await;
        TickOutcome::Updated
    }

    pub async fn handle_event(&self, event: &GameEvent) {
        self.inner.lock().await.source.handle_event(event).await;
    }

    pub async fn clear(&self) {
        self.inner.lock().await.source.clear().await;
    }
}
