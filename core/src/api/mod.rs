//! Remote account API port
//!
//! The engine never speaks HTTP itself. Anything that can answer these calls
//! (a live web client, a snapshot file, a test fake) plugs in behind
//! [`AccountApi`] and [`PermissionCheck`].

pub mod models;

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use models::{
    Account, AchievementProgress, Character, MapInfo, MapSector, Profession, PvpSeason,
    PvpStanding, PvpStats, Specialization, WalletEntry, WvwMatch, WvwRank,
};

/// Failure reported by the API client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("rate limited")]
    RateLimited,
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout | Self::RateLimited)
    }
}

/// Scopes an API key can be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Account,
    Characters,
    Progression,
    Pvp,
    Wallet,
}

pub trait PermissionCheck: Send + Sync {
    /// True when every scope in `scopes` is granted.
    fn has_permissions(&self, scopes: &[Permission]) -> bool;
}

/// Fixed set of granted scopes.
#[derive(Debug, Clone, Default)]
pub struct GrantedPermissions(HashSet<Permission>);

impl GrantedPermissions {
    pub fn new(scopes: impl IntoIterator<Item = Permission>) -> Self {
        Self(scopes.into_iter().collect())
    }

    pub fn all() -> Self {
        Self::new([
            Permission::Account,
            Permission::Characters,
            Permission::Progression,
            Permission::Pvp,
            Permission::Wallet,
        ])
    }
}

impl PermissionCheck for GrantedPermissions {
    fn has_permissions(&self, scopes: &[Permission]) -> bool {
        scopes.iter().all(|scope| self.0.contains(scope))
    }
}

#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn account(&self) -> Result<Account, ApiError>;

    async fn achievements(&self) -> Result<Vec<AchievementProgress>, ApiError>;

    async fn wallet(&self) -> Result<Vec<WalletEntry>, ApiError>;

    async fn characters(&self) -> Result<Vec<Character>, ApiError>;

    async fn pvp_seasons(&self) -> Result<Vec<PvpSeason>, ApiError>;

    async fn pvp_standings(&self) -> Result<Vec<PvpStanding>, ApiError>;

    async fn pvp_stats(&self) -> Result<PvpStats, ApiError>;

    /// The match the given world is currently playing in.
    async fn wvw_match(&self, world_id: i64) -> Result<WvwMatch, ApiError>;

    async fn wvw_ranks(&self) -> Result<Vec<WvwRank>, ApiError>;

    async fn specialization(&self, id: i64) -> Result<Specialization, ApiError>;

    async fn profession(&self, id: &str) -> Result<Profession, ApiError>;

    async fn map(&self, id: i64) -> Result<MapInfo, ApiError>;

    async fn map_sectors(
        &self,
        continent_id: i64,
        floor: i64,
        region_id: i64,
        map_id: i64,
    ) -> Result<Vec<MapSector>, ApiError>;

    /// Raw bytes of an icon from the render service.
    async fn render(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}
