//! Stat sources
//!
//! One source per statistic. A source owns its baselines (through a
//! [`PersistentClock`] namespaced to its name), fetches through the shared
//! [`Fetcher`] and publishes to the [`OutputSink`]. The driver only knows the
//! [`StatSource`] trait.

mod assets;
mod character;
mod deaths;
mod map;
mod pvp;
mod wallet;
mod wvw;

pub use assets::OverlayAssets;
pub use character::CharacterSource;
pub use deaths::DeathsSource;
pub use map::{MapSource, map_type_label};
pub use pvp::{PvpSource, ranked_winrate};
pub use wallet::WalletSource;
pub use wvw::WvwSource;

use std::sync::Arc;

use async_trait::async_trait;
use stream_out_types::{StreamOutConfig, UnicodeSigning, formatting};

use crate::api::AccountApi;
use crate::clock::{ClockStore, PersistentClock};
use crate::events::GameEvent;
use crate::fetch::{Fetcher, Unavailable};
use crate::schedule::{Cadence, NextReset};
use crate::sink::OutputSink;

/// A single statistic driven by the exporter.
///
/// Hooks run strictly one at a time per source. Reset hooks gate the commit of
/// their window: returning `Err` leaves the window due and skips this tick's
/// [`update`](StatSource::update).
#[async_trait]
pub trait StatSource: Send {
    /// Stable name, also the namespace of the source's persisted state.
    fn name(&self) -> &'static str;

    /// Windows the driver schedules for this source.
    fn cadences(&self) -> &'static [Cadence] {
        &[]
    }

    /// Publish placeholders. Must not overwrite values from a previous run.
    async fn initialize(&mut self) {}

    /// Record a new daily baseline.
    async fn reset_daily(&mut self) -> Result<(), Unavailable> {
        Ok(())
    }

    /// Record a new weekly baseline and report where the next boundary comes from.
    async fn reset_weekly(&mut self) -> Result<NextReset, Unavailable> {
        Ok(NextReset::Calendar)
    }

    /// Fetch current values and publish them.
    async fn update(&mut self) {}

    async fn handle_event(&mut self, _event: &GameEvent) {}

    /// Remove every output this source publishes.
    async fn clear(&mut self);
}

/// Collaborators shared by every source.
#[derive(Clone)]
pub struct SourceContext {
    pub api: Arc<dyn AccountApi>,
    pub fetcher: Arc<Fetcher>,
    pub sink: Arc<dyn OutputSink>,
    pub store: Arc<dyn ClockStore>,
    pub signing: UnicodeSigning,
}

impl SourceContext {
    pub fn state(&self, namespace: &str) -> PersistentClock {
        PersistentClock::new(self.store.clone(), namespace)
    }

    pub(crate) fn sign(&self, value: i64, symbol: &str) -> String {
        formatting::sign(value, symbol, self.signing)
    }

    pub(crate) async fn delete_all(&self, names: &[&str]) {
        for name in names {
            self.sink.delete(name).await;
        }
    }
}

/// Every statistic the exporter knows about, in publishing order.
pub fn standard_sources(
    ctx: &SourceContext,
    config: &StreamOutConfig,
    assets: OverlayAssets,
) -> Vec<Box<dyn StatSource>> {
    let pvp = PvpSource::new(ctx.clone()).with_default_rank_icon(assets.rank_icon.clone());
    vec![
        Box::new(DeathsSource::new(ctx.clone())),
        Box::new(pvp),
        Box::new(WvwSource::new(ctx.clone())),
        Box::new(WalletSource::new(ctx.clone())),
        Box::new(MapSource::new(ctx.clone())),
        Box::new(CharacterSource::new(ctx.clone(), assets, config.use_catmander_tag)),
    ]
}

/// Log a fetch that left an output untouched for this tick.
pub(crate) fn log_skipped(source: &'static str, output: &str, reason: &Unavailable) {
    match reason {
        Unavailable::PermissionDenied { .. } => {
            tracing::debug!(source, output, reason = %reason, "Skipping output")
        }
        _ => tracing::info!(source, output, reason = %reason, "Output not refreshed"),
    }
}
