//! Account API payloads, trimmed to the fields the stat sources read.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// "Slayer": lifetime PvP player kills.
pub const ACHIEVEMENT_SLAYER: u32 = 239;
/// "Realm Avenger": lifetime WvW player kills.
pub const ACHIEVEMENT_REALM_AVENGER: u32 = 283;

pub const CURRENCY_COINS: u32 = 1;
pub const CURRENCY_KARMA: u32 = 2;

/// Heart of the Mists, a public map that is the PvP lobby.
pub const MAP_HEART_OF_THE_MISTS: i64 = 350;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub world: i64,
    #[serde(default)]
    pub wvw_rank: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementProgress {
    pub id: u32,
    #[serde(default)]
    pub current: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
    #[serde(default)]
    pub done: bool,
}

/// Current progress of one achievement.
///
/// An entry without `current` has no progress yet. A missing entry is `None`:
/// the payload cannot be trusted as a baseline.
pub fn achievement_current(progress: &[AchievementProgress], id: u32) -> Option<i64> {
    progress
        .iter()
        .find(|a| a.id == id)
        .map(|a| a.current.unwrap_or(0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEntry {
    pub id: u32,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    #[serde(default)]
    pub profession: String,
    pub deaths: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PvpTier {
    pub rating: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvpRank {
    pub name: String,
    /// Render-service URL of the rank emblem
    #[serde(default)]
    pub overlay: Option<String>,
    pub tiers: Vec<PvpTier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvpSeason {
    pub id: Uuid,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub ranks: Vec<PvpRank>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PvpStandingCurrent {
    #[serde(default)]
    pub rating: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvpStanding {
    pub season_id: Uuid,
    #[serde(default)]
    pub current: PvpStandingCurrent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WinLoss {
    pub wins: i64,
    pub losses: i64,
    pub desertions: i64,
    pub byes: i64,
    pub forfeits: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PvpStats {
    #[serde(default)]
    pub ladders: HashMap<String, WinLoss>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WvwMatch {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WvwRank {
    pub id: i64,
    pub title: String,
    pub min_rank: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specialization {
    pub id: i64,
    pub name: String,
    pub profession: String,
    #[serde(default)]
    pub elite: bool,
    #[serde(default)]
    pub profession_icon_big: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profession {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon_big: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapType {
    Center,
    BlueHome,
    GreenHome,
    RedHome,
    JumpPuzzle,
    EdgeOfTheMists,
    WvwLounge,
    Public,
    PublicMini,
    Pvp,
    Gvg,
    CharacterCreate,
    Tutorial,
    Instance,
    Tournament,
    UserTournament,
    FortunesVale,
    #[serde(other)]
    Unknown,
}

impl MapType {
    /// Human-readable name, e.g. `"Character Create"`.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Center => "Center",
            Self::BlueHome => "Blue Home",
            Self::GreenHome => "Green Home",
            Self::RedHome => "Red Home",
            Self::JumpPuzzle => "Jump Puzzle",
            Self::EdgeOfTheMists => "Edge Of The Mists",
            Self::WvwLounge => "Wvw Lounge",
            Self::Public => "Public",
            Self::PublicMini => "Public Mini",
            Self::Pvp => "Pvp",
            Self::Gvg => "Gvg",
            Self::CharacterCreate => "Character Create",
            Self::Tutorial => "Tutorial",
            Self::Instance => "Instance",
            Self::Tournament => "Tournament",
            Self::UserTournament => "User Tournament",
            Self::FortunesVale => "Fortunes Vale",
            Self::Unknown => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub region_name: String,
    #[serde(default)]
    pub region_id: i64,
    #[serde(default)]
    pub continent_id: i64,
    #[serde(default)]
    pub default_floor: i64,
    #[serde(rename = "type")]
    pub map_type: MapType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSector {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_map_with_unknown_type() {
        let json = r#"{"id": 1, "name": "Somewhere", "type": "BrandNewType"}"#;
        let map: MapInfo = serde_json::from_str(json).unwrap();
        assert_eq!(map.map_type, MapType::Unknown);
        assert_eq!(map.region_name, "");
    }

    #[test]
    fn test_parse_pvp_season() {
        let json = r#"{
            "id": "44B85826-B5ED-4890-8C77-82DDF9F2CF2B",
            "name": "PvP League Season One",
            "start": "2015-12-01T20:00:00Z",
            "end": "2016-02-16T20:00:00Z",
            "ranks": [
                {"name": "Amber", "overlay": "https://render/amber.png", "tiers": [{"rating": 10}, {"rating": 20}]}
            ]
        }"#;
        let season: PvpSeason = serde_json::from_str(json).unwrap();
        assert_eq!(season.ranks.len(), 1);
        assert_eq!(season.ranks[0].tiers[1].rating, 20);
    }

    #[test]
    fn test_achievement_current_requires_entry() {
        let progress = vec![
            AchievementProgress {
                id: ACHIEVEMENT_SLAYER,
                current: Some(12),
                max: Some(1000),
                done: false,
            },
            AchievementProgress {
                id: 1,
                current: None,
                max: Some(5),
                done: false,
            },
        ];
        assert_eq!(achievement_current(&progress, ACHIEVEMENT_SLAYER), Some(12));
        assert_eq!(achievement_current(&progress, 1), Some(0));
        assert_eq!(achievement_current(&progress, ACHIEVEMENT_REALM_AVENGER), None);
    }
}
