//! Test doubles for the engine's collaborators.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stream_out_types::UnicodeSigning;

use crate::api::models::{
    Account, AchievementProgress, Character, MapInfo, MapSector, Profession, PvpSeason,
    PvpStanding, PvpStats, Specialization, WalletEntry, WvwMatch, WvwRank,
};
use crate::api::{AccountApi, ApiError, GrantedPermissions, Permission};
use crate::clock::{Clock, ClockStore, MemoryClockStore};
use crate::fetch::{Fetcher, RetryPolicy};
use crate::sink::{OutputSink, Payload};
use crate::sources::SourceContext;

// ─────────────────────────────────────────────────────────────────────────────
// Clock
// ─────────────────────────────────────────────────────────────────────────────

pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Account API
// ─────────────────────────────────────────────────────────────────────────────

/// One canned endpoint response.
pub struct Slot<T>(Mutex<Result<T, ApiError>>);

impl<T: Clone> Slot<T> {
    fn unset(what: &str) -> Self {
        Self(Mutex::new(Err(ApiError::NotFound(what.to_string()))))
    }

    pub fn set(&self, value: T) {
        *self.0.lock().unwrap() = Ok(value);
    }

    pub fn fail(&self, error: ApiError) {
        *self.0.lock().unwrap() = Err(error);
    }

    fn get(&self) -> Result<T, ApiError> {
        self.0.lock().unwrap().clone()
    }
}

/// Lookup endpoint keyed by id; unknown ids answer `NotFound`.
pub struct Table<K, T>(Mutex<HashMap<K, Result<T, ApiError>>>);

impl<K: std::hash::Hash + Eq + std::fmt::Debug, T: Clone> Table<K, T> {
    fn new() -> Self {
        Self(Mutex::new(HashMap::new()))
    }

    pub fn insert(&self, key: K, value: T) {
        self.0.lock().unwrap().insert(key, Ok(value));
    }

    pub fn fail(&self, key: K, error: ApiError) {
        self.0.lock().unwrap().insert(key, Err(error));
    }

    fn get(&self, key: &K) -> Result<T, ApiError> {
        self.0
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_else(|| Err(ApiError::NotFound(format!("{key:?}"))))
    }
}

pub struct FakeApi {
    pub account: Slot<Account>,
    pub achievements: Slot<Vec<AchievementProgress>>,
    pub wallet: Slot<Vec<WalletEntry>>,
    pub characters: Slot<Vec<Character>>,
    pub pvp_seasons: Slot<Vec<PvpSeason>>,
    pub pvp_standings: Slot<Vec<PvpStanding>>,
    pub pvp_stats: Slot<PvpStats>,
    pub wvw_match: Slot<WvwMatch>,
    pub wvw_ranks: Slot<Vec<WvwRank>>,
    pub specializations: Table<i64, Specialization>,
    pub professions: Table<String, Profession>,
    pub maps: Table<i64, MapInfo>,
    pub sectors: Table<i64, Vec<MapSector>>,
    pub renders: Table<String, Vec<u8>>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            account: Slot::unset("account"),
            achievements: Slot::unset("achievements"),
            wallet: Slot::unset("wallet"),
            characters: Slot::unset("characters"),
            pvp_seasons: Slot::unset("pvp seasons"),
            pvp_standings: Slot::unset("pvp standings"),
            pvp_stats: Slot::unset("pvp stats"),
            wvw_match: Slot::unset("wvw match"),
            wvw_ranks: Slot::unset("wvw ranks"),
            specializations: Table::new(),
            professions: Table::new(),
            maps: Table::new(),
            sectors: Table::new(),
            renders: Table::new(),
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl FakeApi {
    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls.lock().unwrap().get(endpoint).copied().unwrap_or(0)
    }

    fn hit(&self, endpoint: &'static str) {
        *self.calls.lock().unwrap().entry(endpoint).or_default() += 1;
    }

    pub fn set_achievement(&self, id: u32, current: i64) {
        let mut list = self.achievements.get().unwrap_or_default();
        list.retain(|a| a.id != id);
        list.push(AchievementProgress {
            id,
            current: Some(current),
            max: None,
            done: false,
        });
        self.achievements.set(list);
    }

    pub fn set_deaths(&self, per_character: &[i64]) {
        self.characters.set(
            per_character
                .iter()
                .enumerate()
                .map(|(i, &deaths)| Character {
                    name: format!("Character {i}"),
                    profession: "Necromancer".into(),
                    deaths,
                })
                .collect(),
        );
    }
}

#[async_trait]
impl AccountApi for FakeApi {
    async fn account(&self) -> Result<Account, ApiError> {
        self.hit("account");
        self.account.get()
    }

    async fn achievements(&self) -> Result<Vec<AchievementProgress>, ApiError> {
        self.hit("achievements");
        self.achievements.get()
    }

    async fn wallet(&self) -> Result<Vec<WalletEntry>, ApiError> {
        self.hit("wallet");
        self.wallet.get()
    }

    async fn characters(&self) -> Result<Vec<Character>, ApiError> {
        self.hit("characters");
        self.characters.get()
    }

    async fn pvp_seasons(&self) -> Result<Vec<PvpSeason>, ApiError> {
        self.hit("pvp_seasons");
        self.pvp_seasons.get()
    }

    async fn pvp_standings(&self) -> Result<Vec<PvpStanding>, ApiError> {
        self.hit("pvp_standings");
        self.pvp_standings.get()
    }

    async fn pvp_stats(&self) -> Result<PvpStats, ApiError> {
        self.hit("pvp_stats");
        self.pvp_stats.get()
    }

    async fn wvw_match(&self, _world_id: i64) -> Result<WvwMatch, ApiError> {
        self.hit("wvw_match");
        self.wvw_match.get()
    }

    async fn wvw_ranks(&self) -> Result<Vec<WvwRank>, ApiError> {
        self.hit("wvw_ranks");
        self.wvw_ranks.get()
    }

    async fn specialization(&self, id: i64) -> Result<Specialization, ApiError> {
        self.hit("specialization");
        self.specializations.get(&id)
    }

    async fn profession(&self, id: &str) -> Result<Profession, ApiError> {
        self.hit("profession");
        self.professions.get(&id.to_string())
    }

    async fn map(&self, id: i64) -> Result<MapInfo, ApiError> {
        self.hit("map");
        self.maps.get(&id)
    }

    async fn map_sectors(
        &self,
        _continent_id: i64,
        _floor: i64,
        _region_id: i64,
        map_id: i64,
    ) -> Result<Vec<MapSector>, ApiError> {
        self.hit("map_sectors");
        self.sectors.get(&map_id)
    }

    async fn render(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.hit("render");
        self.renders.get(&url.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output sink
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemorySink(Mutex<BTreeMap<String, Payload>>);

impl MemorySink {
    pub fn text(&self, name: &str) -> Option<String> {
        match self.0.lock().unwrap().get(name) {
            Some(Payload::Text(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn image(&self, name: &str) -> Option<Vec<u8>> {
        match self.0.lock().unwrap().get(name) {
            Some(Payload::Image(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.lock().unwrap().contains_key(name)
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn publish(&self, name: &str, payload: Payload, overwrite: bool) -> bool {
        let mut outputs = self.0.lock().unwrap();
        if overwrite || !outputs.contains_key(name) {
            outputs.insert(name.to_string(), payload);
        }
        true
    }

    async fn delete(&self, name: &str) -> bool {
        self.0.lock().unwrap().remove(name);
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wiring
// ─────────────────────────────────────────────────────────────────────────────

/// Collaborators of one test, shared with the [`SourceContext`] handed to sources.
pub struct Harness {
    pub api: Arc<FakeApi>,
    pub sink: Arc<MemorySink>,
    pub store: Arc<MemoryClockStore>,
    pub ctx: SourceContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_permissions(GrantedPermissions::all())
    }

    pub fn with_permissions(permissions: GrantedPermissions) -> Self {
        let api = Arc::new(FakeApi::default());
        let sink = Arc::new(MemorySink::default());
        let store = Arc::new(MemoryClockStore::new());
        // Single attempt, no waiting: tests exercise the sources, not the retry loop
        let fetcher = Fetcher::new(
            RetryPolicy::new(1, Duration::ZERO, Duration::from_secs(5)),
            Arc::new(permissions),
        );
        let ctx = SourceContext {
            api: api.clone(),
            fetcher: Arc::new(fetcher),
            sink: sink.clone(),
            store: store.clone() as Arc<dyn ClockStore>,
            signing: UnicodeSigning::Suffixed,
        };
        Self {
            api,
            sink,
            store,
            ctx,
        }
    }

    pub fn without(scope: Permission) -> Self {
        let granted = [
            Permission::Account,
            Permission::Characters,
            Permission::Progression,
            Permission::Pvp,
            Permission::Wallet,
        ]
        .into_iter()
        .filter(|p| *p != scope);
        Self::with_permissions(GrantedPermissions::new(granted))
    }
}
