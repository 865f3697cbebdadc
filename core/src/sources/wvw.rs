use async_trait::async_trait;
use stream_out_types::formatting::{SWORDS, format_thousands};

use super::{SourceContext, StatSource, log_skipped};
use crate::api::Permission;
use crate::api::models::{ACHIEVEMENT_REALM_AVENGER, achievement_current};
use crate::clock::PersistentClock;
use crate::fetch::Unavailable;
use crate::rank::resolve_title;
use crate::schedule::{Cadence, NextReset};

const NAME: &str = "wvw";
const ACCOUNT: &[Permission] = &[Permission::Account];
const PROGRESSION: &[Permission] = &[Permission::Account, Permission::Progression];

const OUT_KILLS_DAY: &str = "wvw_kills_day.txt";
const OUT_KILLS_WEEK: &str = "wvw_kills_week.txt";
const OUT_KILLS_TOTAL: &str = "wvw_kills_total.txt";
const OUT_RANK: &str = "wvw_rank.txt";

const PLACEHOLDER_RANK: &str = "1 : Invader";

/// WvW kills since the daily reset and since the current match started, plus
/// the account's WvW rank and title.
///
/// The weekly window follows the match: its reset reports the match end as the
/// next boundary.
pub struct WvwSource {
    ctx: SourceContext,
    state: PersistentClock,
}

impl WvwSource {
    pub fn new(ctx: SourceContext) -> Self {
        let state = ctx.state(NAME);
        Self { ctx, state }
    }

    async fn kills(&self) -> Result<i64, Unavailable> {
        let progress = self
            .ctx
            .fetcher
            .fetch("achievements", PROGRESSION, || self.ctx.api.achievements())
            .await?;
        achievement_current(&progress, ACHIEVEMENT_REALM_AVENGER).ok_or_else(|| {
            Unavailable::Malformed {
                what: "achievements",
                detail: format!("no progress entry for achievement {ACHIEVEMENT_REALM_AVENGER}"),
            }
        })
    }

    async fn publish_kills(&self) -> Result<(), Unavailable> {
        let kills = self.kills().await?;
        let daily = kills - self.state.define_integer("daily_baseline", kills);
        let matchup = kills - self.state.define_integer("match_baseline", kills);

        let sink = &self.ctx.sink;
        sink.write_text(OUT_KILLS_DAY, self.ctx.sign(daily, SWORDS)).await;
        sink.write_text(OUT_KILLS_WEEK, self.ctx.sign(matchup, SWORDS)).await;
        sink.write_text(OUT_KILLS_TOTAL, self.ctx.sign(kills, SWORDS)).await;
        Ok(())
    }

    async fn publish_rank(&self) -> Result<(), Unavailable> {
        let account = self
            .ctx
            .fetcher
            .fetch("account", ACCOUNT, || self.ctx.api.account())
            .await?;
        let Some(rank) = account.wvw_rank.filter(|&r| r > 0) else {
            return Ok(());
        };

        let ranks = self
            .ctx
            .fetcher
            .fetch("wvw ranks", &[], || self.ctx.api.wvw_ranks())
            .await?;
        let title = resolve_title(rank, &ranks).map_err(|e| Unavailable::Malformed {
            what: "wvw ranks",
            detail: e.to_string(),
        })?;

        let line = format!("{} : {}", format_thousands(rank), title.title);
        self.ctx.sink.write_text(OUT_RANK, line).await;
        Ok(())
    }
}

#[async_trait]
impl StatSource for WvwSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn cadences(&self) -> &'static [Cadence] {
        &[Cadence::Daily, Cadence::Weekly]
    }

    async fn initialize(&mut self) {
        let zero = self.ctx.sign(0, SWORDS);
        let sink = &self.ctx.sink;
        sink.write_placeholder(OUT_KILLS_DAY, zero.clone()).await;
        sink.write_placeholder(OUT_KILLS_WEEK, zero.clone()).await;
        sink.write_placeholder(OUT_KILLS_TOTAL, zero).await;
        sink.write_placeholder(OUT_RANK, PLACEHOLDER_RANK.into()).await;
    }

    async fn reset_daily(&mut self) -> Result<(), Unavailable> {
        let kills = self.kills().await?;
        self.state.set_integer("daily_baseline", kills);
        Ok(())
    }

    /// A new match rebases both counters and schedules the next reset at its end.
    async fn reset_weekly(&mut self) -> Result<NextReset, Unavailable> {
        let account = self
            .ctx
            .fetcher
            .fetch("account", ACCOUNT, || self.ctx.api.account())
            .await?;
        let matchup = self
            .ctx
            .fetcher
            .fetch("wvw match", &[], || self.ctx.api.wvw_match(account.world))
            .await?;
        let kills = self.kills().await?;

        self.state.set_integer("daily_baseline", kills);
        self.state.set_integer("match_baseline", kills);
        self.state.set_text("match_id", &matchup.id);
        tracing::info!(source = NAME, matchup = %matchup.id, ends = %matchup.end_time, "WvW match baseline recorded");

        Ok(NextReset::At(matchup.end_time))
    }

    async fn update(&mut self) {
        if let Err(e) = self.publish_kills().await {
            log_skipped(NAME, OUT_KILLS_DAY, &e);
        }
        if let Err(e) = self.publish_rank().await {
            log_skipped(NAME, OUT_RANK, &e);
        }
    }

    async fn clear(&mut self) {
        self.ctx
            .delete_all(&[OUT_KILLS_DAY, OUT_KILLS_WEEK, OUT_KILLS_TOTAL, OUT_RANK])
            .await;
    }
}
