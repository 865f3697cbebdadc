use async_trait::async_trait;
use stream_out_types::formatting::{SWORDS, format_pct_whole, to_roman};

use super::{SourceContext, StatSource, log_skipped};
use crate::api::Permission;
use crate::api::models::{ACHIEVEMENT_SLAYER, PvpSeason, PvpStats, achievement_current};
use crate::clock::PersistentClock;
use crate::fetch::Unavailable;
use crate::rank::{RankTable, resolve};
use crate::schedule::Cadence;
use crate::sink::Payload;

const NAME: &str = "pvp";
const PROGRESSION: &[Permission] = &[Permission::Account, Permission::Progression];
const PVP: &[Permission] = &[Permission::Account, Permission::Pvp];

const OUT_KILLS_DAY: &str = "pvp_kills_day.txt";
const OUT_KILLS_TOTAL: &str = "pvp_kills_total.txt";
const OUT_RANK: &str = "pvp_rank.txt";
const OUT_TIER: &str = "pvp_tier.txt";
const OUT_RANK_ICON: &str = "pvp_rank_icon.png";
const OUT_WINRATE: &str = "pvp_winrate.txt";

const PLACEHOLDER_RANK: &str = "Bronze I";
const PLACEHOLDER_TIER: &str = "1/3";
const PLACEHOLDER_WINRATE: &str = "50%";

/// Win rate over ranked ladders, in percent.
///
/// Byes count as wins. Forfeits are ignored. Returns `None` before any ranked game.
pub fn ranked_winrate(stats: &PvpStats) -> Option<f64> {
    let (won, played) = stats
        .ladders
        .iter()
        .filter(|(ladder, _)| ladder.contains("ranked") && !ladder.contains("unranked"))
        .fold((0i64, 0i64), |(won, played), (_, wl)| {
            (
                won + wl.wins + wl.byes,
                played + wl.wins + wl.losses + wl.desertions + wl.byes,
            )
        });

    (played > 0).then(|| (won * 100) as f64 / played as f64)
}

/// PvP kills, season standing and ranked win rate.
pub struct PvpSource {
    ctx: SourceContext,
    state: PersistentClock,
    default_rank_icon: Option<Vec<u8>>,
}

impl PvpSource {
    pub fn new(ctx: SourceContext) -> Self {
        let state = ctx.state(NAME);
        Self {
            ctx,
            state,
            default_rank_icon: None,
        }
    }

    /// Image written as the rank icon before any standing has been resolved.
    pub fn with_default_rank_icon(mut self, icon: Option<Vec<u8>>) -> Self {
        self.default_rank_icon = icon;
        self
    }

    async fn kills(&self) -> Result<i64, Unavailable> {
        let progress = self
            .ctx
            .fetcher
            .fetch("achievements", PROGRESSION, || self.ctx.api.achievements())
            .await?;
        achievement_current(&progress, ACHIEVEMENT_SLAYER).ok_or_else(|| Unavailable::Malformed {
            what: "achievements",
            detail: format!("no progress entry for achievement {ACHIEVEMENT_SLAYER}"),
        })
    }

    async fn publish_kills(&self) -> Result<(), Unavailable> {
        let kills = self.kills().await?;
        let daily = kills - self.state.define_integer("daily_baseline", kills);

        self.ctx.sink.write_text(OUT_KILLS_DAY, self.ctx.sign(daily, SWORDS)).await;
        self.ctx.sink.write_text(OUT_KILLS_TOTAL, self.ctx.sign(kills, SWORDS)).await;
        Ok(())
    }

    /// Note when the API moves on to a new season.
    fn track_season(&self, season: &PvpSeason) {
        if self.state.guid("season") != Some(season.id) {
            tracing::info!(source = NAME, season = %season.name, id = %season.id, "New PvP season");
            self.state.set_guid("season", season.id);
        }
    }

    async fn publish_standing(&self) -> Result<(), Unavailable> {
        let seasons = self
            .ctx
            .fetcher
            .fetch("pvp seasons", PVP, || self.ctx.api.pvp_seasons())
            .await?;
        let Some(season) = seasons.iter().max_by_key(|s| s.end) else {
            tracing::debug!(source = NAME, "No PvP season listed");
            return Ok(());
        };
        self.track_season(season);

        let standings = self
            .ctx
            .fetcher
            .fetch("pvp standings", PVP, || self.ctx.api.pvp_standings())
            .await?;
        let Some(rating) = standings
            .iter()
            .find(|s| s.season_id == season.id)
            .and_then(|s| s.current.rating)
        else {
            tracing::debug!(source = NAME, season = %season.name, "No rating this season");
            return Ok(());
        };

        let table = RankTable::from(season);
        let standing = table
            .validate()
            .and_then(|()| resolve(rating, &table))
            .map_err(|e| Unavailable::Malformed {
                what: "pvp season ranks",
                detail: e.to_string(),
            })?;

        let rank_line = format!("{} {}", standing.rank_name, to_roman(standing.tier));
        let tier_line = format!("{}/{}", standing.tier, standing.tier_count);
        self.ctx.sink.write_text(OUT_RANK, rank_line).await;
        self.ctx.sink.write_text(OUT_TIER, tier_line).await;

        let overlay = season
            .ranks
            .get(standing.rank_index)
            .and_then(|r| r.overlay.as_deref());
        if let Some(url) = overlay {
            let icon = self
                .ctx
                .fetcher
                .fetch("pvp rank icon", &[], || self.ctx.api.render(url))
                .await?;
            self.ctx.sink.write_image(OUT_RANK_ICON, icon).await;
        }
        Ok(())
    }

    async fn publish_winrate(&self) -> Result<(), Unavailable> {
        let stats = self
            .ctx
            .fetcher
            .fetch("pvp stats", PVP, || self.ctx.api.pvp_stats())
            .await?;
        if let Some(pct) = ranked_winrate(&stats) {
            self.ctx.sink.write_text(OUT_WINRATE, format_pct_whole(pct)).await;
        }
        Ok(())
    }
}

#[async_trait]
impl StatSource for PvpSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn cadences(&self) -> &'static [Cadence] {
        &[Cadence::Daily]
    }

    async fn initialize(&mut self) {
        let zero = self.ctx.sign(0, SWORDS);
        let sink = &self.ctx.sink;
        sink.write_placeholder(OUT_KILLS_DAY, zero.clone()).await;
        sink.write_placeholder(OUT_KILLS_TOTAL, zero).await;
        sink.write_placeholder(OUT_RANK, PLACEHOLDER_RANK.into()).await;
        sink.write_placeholder(OUT_TIER, PLACEHOLDER_TIER.into()).await;
        sink.write_placeholder(OUT_WINRATE, PLACEHOLDER_WINRATE.into()).await;
        if let Some(icon) = &self.default_rank_icon {
            sink.publish(OUT_RANK_ICON, Payload::Image(icon.clone()), false).await;
        }
    }

    async fn reset_daily(&mut self) -> Result<(), Unavailable> {
        let kills = self.kills().await?;
        self.state.set_integer("daily_baseline", kills);
        Ok(())
    }

    async fn update(&mut self) {
        // Independent outputs: one failing leaves the others to refresh
        if let Err(e) = self.publish_kills().await {
            log_skipped(NAME, OUT_KILLS_DAY, &e);
        }
        if let Err(e) = self.publish_standing().await {
            log_skipped(NAME, OUT_RANK, &e);
        }
        if let Err(e) = self.publish_winrate().await {
            log_skipped(NAME, OUT_WINRATE, &e);
        }
    }

    async fn clear(&mut self) {
        self.ctx
            .delete_all(&[
                OUT_KILLS_DAY,
                OUT_KILLS_TOTAL,
                OUT_RANK,
                OUT_TIER,
                OUT_RANK_ICON,
                OUT_WINRATE,
            ])
            .await;
    }
}

#[cfg(test)]
#[path = "pvp_tests.rs"]
mod tests;
