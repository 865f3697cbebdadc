//! Rating → standing resolution over tiered rank tables.

use thiserror::Error;

use crate::api::models::{PvpSeason, WvwRank};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    #[error("rank table is empty")]
    EmptyTable,
    #[error("rank {0:?} has no tiers")]
    EmptyRank(String),
    #[error("tier thresholds of rank {0:?} decrease")]
    Decreasing(String),
    #[error("rank {0} is below every entry of the table")]
    BelowTable(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rank {
    pub name: String,
    /// Tier thresholds, low to high
    pub thresholds: Vec<i64>,
}

/// Ordered ladder of ranks. Fetched fresh for every resolution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RankTable {
    pub ranks: Vec<Rank>,
}

impl RankTable {
    pub fn new(ranks: Vec<Rank>) -> Self {
        Self { ranks }
    }

    /// Check the ordering the resolver relies on.
    pub fn validate(&self) -> Result<(), RankError> {
        if self.ranks.is_empty() {
            return Err(RankError::EmptyTable);
        }
        for rank in &self.ranks {
            if rank.thresholds.is_empty() {
                return Err(RankError::EmptyRank(rank.name.clone()));
            }
            if rank.thresholds.windows(2).any(|w| w[0] > w[1]) {
                return Err(RankError::Decreasing(rank.name.clone()));
            }
        }
        Ok(())
    }
}

impl From<&PvpSeason> for RankTable {
    fn from(season: &PvpSeason) -> Self {
        Self::new(
            season
                .ranks
                .iter()
                .map(|r| Rank {
                    name: r.name.clone(),
                    thresholds: r.tiers.iter().map(|t| t.rating).collect(),
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStanding {
    /// Position of the rank in the table, 0-based
    pub rank_index: usize,
    pub rank_name: String,
    /// 1-based
    pub tier: u32,
    pub tier_count: u32,
}

impl ResolvedStanding {
    fn at(table: &RankTable, rank_index: usize, tier_index: usize) -> Self {
        let rank = &table.ranks[rank_index];
        Self {
            rank_index,
            rank_name: rank.name.clone(),
            tier: tier_index as u32 + 1,
            tier_count: rank.thresholds.len() as u32,
        }
    }
}

/// Resolve `rating` to a (rank, tier) pair.
///
/// Ratings above the table clamp to the last tier of the last rank and ratings
/// below it clamp to the first tier of the first rank. Inside the range the first
/// tier whose threshold is `>= rating` wins, so a rating equal to a threshold
/// resolves to that tier. Tables are tens of entries, a linear scan is enough.
pub fn resolve(rating: i64, table: &RankTable) -> Result<ResolvedStanding, RankError> {
    if table.ranks.is_empty() {
        return Err(RankError::EmptyTable);
    }
    if let Some(rank) = table.ranks.iter().find(|r| r.thresholds.is_empty()) {
        return Err(RankError::EmptyRank(rank.name.clone()));
    }

    let thresholds = || table.ranks.iter().flat_map(|r| r.thresholds.iter().copied());
    let min_rating = thresholds().min().ok_or(RankError::EmptyTable)?;
    let max_rating = thresholds().max().ok_or(RankError::EmptyTable)?;

    let last_rank = table.ranks.len() - 1;
    let overshoot = ResolvedStanding::at(table, last_rank, table.ranks[last_rank].thresholds.len() - 1);

    if rating > max_rating {
        return Ok(overshoot);
    }
    if rating < min_rating {
        return Ok(ResolvedStanding::at(table, 0, 0));
    }

    for (rank_index, rank) in table.ranks.iter().enumerate() {
        if let Some(tier_index) = rank.thresholds.iter().position(|&t| rating <= t) {
            return Ok(ResolvedStanding::at(table, rank_index, tier_index));
        }
    }

    // rating <= max_rating, so some threshold matched above
    Ok(overshoot)
}

/// Title for a WvW rank number: the entry with the highest `min_rank` not above it.
pub fn resolve_title(rank: i64, ranks: &[WvwRank]) -> Result<&WvwRank, RankError> {
    if ranks.is_empty() {
        return Err(RankError::EmptyTable);
    }
    ranks
        .iter()
        .filter(|r| r.min_rank <= rank)
        .max_by_key(|r| r.min_rank)
        .ok_or(RankError::BelowTable(rank))
}
