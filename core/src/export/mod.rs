//! Export driver
//!
//! ```text
//!   interval (15 s) ─┐
//!                    ├─► runner task ──► ExportRunner ──► StatSource
//!   GameEvent bus ───┘   (one per source)  (lock, throttle, resets)
//! ```
//!
//! Each source gets its own task so a slow API call in one statistic never
//! delays another. The poll interval is enforced per runner; the tick period
//! only bounds how late a due cycle can start.

mod runner;

pub use runner::{ExportRunner, TickOutcome};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::clock::ClockStore;
use crate::events::GameEvent;
use crate::schedule::ResetScheduler;
use crate::sources::StatSource;

/// How often each runner checks whether its next cycle is due.
pub const TICK_PERIOD: Duration = Duration::from_secs(15);

/// Owns a runner per source.
pub struct Exporter {
    runners: Vec<Arc<ExportRunner>>,
}

impl Exporter {
    pub fn new(
        sources: Vec<Box<dyn StatSource>>,
        store: Arc<dyn ClockStore>,
        scheduler: Arc<ResetScheduler>,
        poll_interval: Duration,
    ) -> Self {
        let runners = sources
            .into_iter()
            .map(|source| {
                Arc::new(ExportRunner::new(
                    source,
                    store.clone(),
                    scheduler.clone(),
                    poll_interval,
                ))
            })
            .collect();
        Self { runners }
    }

    pub fn runners(&self) -> &[Arc<ExportRunner>] {
        &self.runners
    }

    pub async fn initialize(&self) {
        for runner in &self.runners {
            runner.initialize().await;
        }
    }

    /// Run one cycle of every source, in order.
    pub async fn do_update(&self) -> Vec<(&'static str, TickOutcome)> {
        let mut outcomes = Vec::with_capacity(self.runners.len());
        for runner in &self.runners {
            outcomes.push((runner.name(), runner.do_update().await));
        }
        outcomes
    }

    pub async fn handle_event(&self, event: &GameEvent) {
        for runner in &self.runners {
            runner.handle_event(event).await;
        }
    }

    pub async fn clear(&self) {
        for runner in &self.runners {
            runner.clear().await;
        }
    }

    /// Start one task per runner. Tasks stop once `shutdown` turns true or its
    /// sender is dropped.
    pub fn spawn(
        &self,
        events: &broadcast::Sender<GameEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> Vec<JoinHandle<()>> {
        self.runners
            .iter()
            .map(|runner| {
                tokio::spawn(drive(
                    runner.clone(),
                    events.subscribe(),
                    shutdown.clone(),
                ))
            })
            .collect()
    }
}

async fn drive(
    runner: Arc<ExportRunner>,
    mut events: broadcast::Receiver<GameEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut events_open = true;

    tracing::debug!(source = runner.name(), "Runner started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = runner.do_update().await;
                tracing::trace!(source = runner.name(), ?outcome, "Tick");
            }
            event = events.recv(), if events_open => match event {
                Ok(event) => runner.handle_event(&event).await,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(source = runner.name(), skipped, "Game events dropped, consumer too slow");
                }
                Err(RecvError::Closed) => events_open = false,
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    tracing::debug!(source = runner.name(), "Runner stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{DeathsSource, MapSource};
    use crate::testing::{Harness, ManualClock};
    use crate::api::models::{MapInfo, MapType};
    use chrono::{TimeZone, Utc};
    use stream_out_types::WeeklyReset;

    fn exporter(h: &Harness) -> Exporter {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 8, 10, 0, 0).unwrap()));
        let scheduler = Arc::new(ResetScheduler::new(clock, WeeklyReset::default()));
        Exporter::new(
            vec![
                Box::new(DeathsSource::new(h.ctx.clone())),
                Box::new(MapSource::new(h.ctx.clone())),
            ],
            h.store.clone(),
            scheduler,
            Duration::from_secs(300),
        )
    }

    #[tokio::test]
    async fn test_do_update_reports_each_source() {
        let h = Harness::new();
        h.api.set_deaths(&[1]);
        let exporter = exporter(&h);

        let outcomes = exporter.do_update().await;
        assert_eq!(
            outcomes,
            vec![("deaths", TickOutcome::Updated), ("map", TickOutcome::Updated)]
        );
        let outcomes = exporter.do_update().await;
        assert!(outcomes.iter().all(|(_, o)| *o == TickOutcome::Throttled));
    }

    #[tokio::test]
    async fn test_initialize_and_clear_cover_all_sources() {
        let h = Harness::new();
        let exporter = exporter(&h);

        exporter.initialize().await;
        assert!(h.sink.contains("deaths_day.txt"));
        assert!(h.sink.contains("map_name.txt"));

        exporter.clear().await;
        assert!(!h.sink.contains("deaths_day.txt"));
        assert!(!h.sink.contains("map_name.txt"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_runners_tick_handle_events_and_stop() {
        let h = Harness::new();
        h.api.set_deaths(&[5]);
        h.api.maps.insert(
            50,
            MapInfo {
                id: 50,
                name: "Lion's Arch".into(),
                region_name: "Kryta".into(),
                region_id: 4,
                continent_id: 1,
                default_floor: 1,
                map_type: MapType::Public,
            },
        );
        let exporter = exporter(&h);
        let (events, _) = broadcast::channel(16);
        let (stop, stopped) = watch::channel(false);

        let handles = exporter.spawn(&events, stopped);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(h.sink.text("deaths_day.txt").as_deref(), Some("0\u{2620}"));

        events.send(GameEvent::MapChanged(50)).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(h.sink.text("map_name.txt").as_deref(), Some("Lion's Arch"));

        stop.send(true).unwrap();
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
