//! Account API served from a JSON snapshot file.
//!
//! The file is re-read on every call, so editing it while the exporter runs
//! behaves like the account changing remotely. Permissions are read once at
//! startup. Icon URLs map to image files relative to the snapshot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use stream_out_core::api::models::{
    Account, AchievementProgress, Character, MapInfo, MapSector, Profession, PvpSeason,
    PvpStanding, PvpStats, Specialization, WalletEntry, WvwMatch, WvwRank,
};
use stream_out_core::{AccountApi, ApiError, GrantedPermissions, Permission, PermissionCheck};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid snapshot {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Snapshot {
    permissions: Vec<Permission>,
    account: Option<Account>,
    achievements: Option<Vec<AchievementProgress>>,
    wallet: Option<Vec<WalletEntry>>,
    characters: Option<Vec<Character>>,
    pvp_seasons: Option<Vec<PvpSeason>>,
    pvp_standings: Option<Vec<PvpStanding>>,
    pvp_stats: Option<PvpStats>,
    /// Keyed by world id
    wvw_matches: HashMap<i64, WvwMatch>,
    wvw_ranks: Option<Vec<WvwRank>>,
    specializations: Vec<Specialization>,
    professions: Vec<Profession>,
    maps: Vec<MapInfo>,
    /// Keyed by map id
    map_sectors: HashMap<i64, Vec<MapSector>>,
    /// Render URL → image file
    renders: HashMap<String, PathBuf>,
}

fn missing<T>(what: impl Into<String>) -> impl FnOnce() -> Result<T, ApiError> {
    let what = what.into();
    move || Err(ApiError::NotFound(what))
}

pub struct SnapshotApi {
    path: Option<PathBuf>,
    permissions: GrantedPermissions,
}

impl SnapshotApi {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SnapshotError> {
        let path = path.into();
        let snapshot = read_snapshot(&path).await?;
        tracing::info!(path = %path.display(), scopes = ?snapshot.permissions, "Snapshot loaded");
        Ok(Self {
            permissions: GrantedPermissions::new(snapshot.permissions),
            path: Some(path),
        })
    }

    /// An API with no data and no permissions.
    pub fn empty() -> Self {
        Self {
            path: None,
            permissions: GrantedPermissions::default(),
        }
    }

    async fn load(&self) -> Result<Snapshot, ApiError> {
        let Some(path) = &self.path else {
            return Ok(Snapshot::default());
        };
        read_snapshot(path).await.map_err(|e| match e {
            // Possibly caught mid-save; worth another attempt
            SnapshotError::Read { .. } => ApiError::Network(e.to_string()),
            SnapshotError::Parse { .. } => ApiError::Malformed(e.to_string()),
        })
    }

    fn base_dir(&self) -> &Path {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(Path::new("."))
    }
}

async fn read_snapshot(path: &Path) -> Result<Snapshot, SnapshotError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&contents).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl PermissionCheck for SnapshotApi {
    fn has_permissions(&self, scopes: &[Permission]) -> bool {
        self.permissions.has_permissions(scopes)
    }
}

#[async_trait]
impl AccountApi for SnapshotApi {
    async fn account(&self) -> Result<Account, ApiError> {
        self.load().await?.account.map_or_else(missing("account"), Ok)
    }

    async fn achievements(&self) -> Result<Vec<AchievementProgress>, ApiError> {
        self.load().await?.achievements.map_or_else(missing("achievements"), Ok)
    }

    async fn wallet(&self) -> Result<Vec<WalletEntry>, ApiError> {
        self.load().await?.wallet.map_or_else(missing("wallet"), Ok)
    }

    async fn characters(&self) -> Result<Vec<Character>, ApiError> {
        self.load().await?.characters.map_or_else(missing("characters"), Ok)
    }

    async fn pvp_seasons(&self) -> Result<Vec<PvpSeason>, ApiError> {
        self.load().await?.pvp_seasons.map_or_else(missing("pvp seasons"), Ok)
    }

    async fn pvp_standings(&self) -> Result<Vec<PvpStanding>, ApiError> {
        self.load().await?.pvp_standings.map_or_else(missing("pvp standings"), Ok)
    }

    async fn pvp_stats(&self) -> Result<PvpStats, ApiError> {
        self.load().await?.pvp_stats.map_or_else(missing("pvp stats"), Ok)
    }

    async fn wvw_match(&self, world_id: i64) -> Result<WvwMatch, ApiError> {
        self.load()
            .await?
            .wvw_matches
            .remove(&world_id)
            .map_or_else(missing(format!("wvw match for world {world_id}")), Ok)
    }

    async fn wvw_ranks(&self) -> Result<Vec<WvwRank>, ApiError> {
        self.load().await?.wvw_ranks.map_or_else(missing("wvw ranks"), Ok)
    }

    async fn specialization(&self, id: i64) -> Result<Specialization, ApiError> {
        self.load()
            .await?
            .specializations
            .into_iter()
            .find(|s| s.id == id)
            .map_or_else(missing(format!("specialization {id}")), Ok)
    }

    async fn profession(&self, id: &str) -> Result<Profession, ApiError> {
        self.load()
            .await?
            .professions
            .into_iter()
            .find(|p| p.id == id)
            .map_or_else(missing(format!("profession {id}")), Ok)
    }

    async fn map(&self, id: i64) -> Result<MapInfo, ApiError> {
        self.load()
            .await?
            .maps
            .into_iter()
            .find(|m| m.id == id)
            .map_or_else(missing(format!("map {id}")), Ok)
    }

    async fn map_sectors(
        &self,
        _continent_id: i64,
        _floor: i64,
        _region_id: i64,
        map_id: i64,
    ) -> Result<Vec<MapSector>, ApiError> {
        Ok(self
            .load()
            .await?
            .map_sectors
            .remove(&map_id)
            .unwrap_or_default())
    }

    async fn render(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let snapshot = self.load().await?;
        let Some(file) = snapshot.renders.get(url) else {
            return Err(ApiError::NotFound(format!("render {url}")));
        };
        let path = self.base_dir().join(file);
        tokio::fs::read(&path)
            .await
            .map_err(|e| ApiError::NotFound(format!("{}: {e}", path.display())))
    }
}
