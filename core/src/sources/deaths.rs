use async_trait::async_trait;
use stream_out_types::formatting::SKULL;

use super::{SourceContext, StatSource, log_skipped};
use crate::api::Permission;
use crate::clock::PersistentClock;
use crate::fetch::Unavailable;
use crate::schedule::{Cadence, NextReset};

const NAME: &str = "deaths";
const SCOPES: &[Permission] = &[Permission::Account, Permission::Characters];

const OUT_DAY: &str = "deaths_day.txt";
const OUT_WEEK: &str = "deaths_week.txt";

/// Deaths across every character of the account, since the daily and weekly reset.
pub struct DeathsSource {
    ctx: SourceContext,
    state: PersistentClock,
}

impl DeathsSource {
    pub fn new(ctx: SourceContext) -> Self {
        let state = ctx.state(NAME);
        Self { ctx, state }
    }

    async fn total_deaths(&self) -> Result<i64, Unavailable> {
        let characters = self
            .ctx
            .fetcher
            .fetch("characters", SCOPES, || self.ctx.api.characters())
            .await?;
        Ok(characters.iter().map(|c| c.deaths).sum())
    }
}

#[async_trait]
impl StatSource for DeathsSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn cadences(&self) -> &'static [Cadence] {
        &[Cadence::Daily, Cadence::Weekly]
    }

    async fn initialize(&mut self) {
        let zero = self.ctx.sign(0, SKULL);
        self.ctx.sink.write_placeholder(OUT_DAY, zero.clone()).await;
        self.ctx.sink.write_placeholder(OUT_WEEK, zero).await;
    }

    async fn reset_daily(&mut self) -> Result<(), Unavailable> {
        let total = self.total_deaths().await?;
        self.state.set_integer("daily_baseline", total);
        tracing::debug!(source = NAME, total, "Daily baseline recorded");
        Ok(())
    }

    async fn reset_weekly(&mut self) -> Result<NextReset, Unavailable> {
        let total = self.total_deaths().await?;
        self.state.set_integer("weekly_baseline", total);
        tracing::debug!(source = NAME, total, "Weekly baseline recorded");
        Ok(NextReset::Calendar)
    }

    async fn update(&mut self) {
        let total = match self.total_deaths().await {
            Ok(total) => total,
            Err(e) => return log_skipped(NAME, OUT_DAY, &e),
        };

        let daily = total - self.state.define_integer("daily_baseline", total);
        let weekly = total - self.state.define_integer("weekly_baseline", total);

        self.ctx.sink.write_text(OUT_DAY, self.ctx.sign(daily, SKULL)).await;
        self.ctx.sink.write_text(OUT_WEEK, self.ctx.sign(weekly, SKULL)).await;
    }

    async fn clear(&mut self) {
        self.ctx.delete_all(&[OUT_DAY, OUT_WEEK]).await;
    }
}
