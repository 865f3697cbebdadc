use async_trait::async_trait;

use super::{SourceContext, StatSource, log_skipped};
use crate::api::ApiError;
use crate::api::models::{MAP_HEART_OF_THE_MISTS, MapInfo, MapType};
use crate::events::GameEvent;
use crate::fetch::Unavailable;

const NAME: &str = "map";

const OUT_NAME: &str = "map_name.txt";
const OUT_TYPE: &str = "map_type.txt";

/// Game mode label for a map, as shown on the overlay.
pub fn map_type_label(map_id: i64, map_type: MapType) -> &'static str {
    match map_type {
        MapType::Center
        | MapType::BlueHome
        | MapType::GreenHome
        | MapType::RedHome
        | MapType::JumpPuzzle
        | MapType::EdgeOfTheMists
        | MapType::WvwLounge => "WvW",
        MapType::Public | MapType::PublicMini if map_id == MAP_HEART_OF_THE_MISTS => "PvP",
        MapType::Public | MapType::PublicMini => "PvE",
        MapType::Pvp => "PvP",
        MapType::Gvg => "GvG",
        MapType::CharacterCreate
        | MapType::Tutorial
        | MapType::Instance
        | MapType::Tournament
        | MapType::UserTournament
        | MapType::FortunesVale => map_type.display_name(),
        MapType::Unknown => "",
    }
}

/// Current map name and mode, driven by map change events.
///
/// A lookup that fails is kept pending and retried on the next tick.
pub struct MapSource {
    ctx: SourceContext,
    pending: Option<i64>,
}

impl MapSource {
    pub fn new(ctx: SourceContext) -> Self {
        Self { ctx, pending: None }
    }

    async fn write(&self, name: &str, kind: &str) {
        self.ctx.sink.write_text(OUT_NAME, name.to_string()).await;
        self.ctx.sink.write_text(OUT_TYPE, kind.to_string()).await;
    }

    /// Maps named after their region (most of the open world) read better
    /// with the first sector's name instead.
    async fn display_name(&self, map: &MapInfo) -> String {
        if map.name.to_lowercase() != map.region_name.to_lowercase() {
            return map.name.clone();
        }
        let sectors = self
            .ctx
            .fetcher
            .fetch("map sectors", &[], || {
                self.ctx.api.map_sectors(map.continent_id, map.default_floor, map.region_id, map.id)
            })
            .await;
        match sectors {
            Ok(sectors) => match sectors.first().and_then(|s| s.name.as_deref()) {
                Some(sector) if !sector.is_empty() => sector.replace("<br>", " "),
                _ => map.name.clone(),
            },
            Err(e) => {
                log_skipped(NAME, OUT_NAME, &e);
                map.name.clone()
            }
        }
    }

    async fn publish(&self, map_id: i64) -> Result<(), Unavailable> {
        if map_id <= 0 {
            self.write("", "").await;
            return Ok(());
        }

        let map = match self
            .ctx
            .fetcher
            .fetch("map", &[], || self.ctx.api.map(map_id))
            .await
        {
            Ok(map) => map,
            Err(Unavailable::Rejected {
                source: ApiError::NotFound(_),
                ..
            }) => {
                tracing::debug!(source = NAME, map_id, "Unknown map");
                self.write("", "").await;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let name = self.display_name(&map).await;
        self.write(&name, map_type_label(map.id, map.map_type)).await;
        Ok(())
    }

    async fn show(&mut self, map_id: i64) {
        match self.publish(map_id).await {
            Ok(()) => self.pending = None,
            Err(e) => {
                log_skipped(NAME, OUT_NAME, &e);
                self.pending = Some(map_id);
            }
        }
    }
}

#[async_trait]
impl StatSource for MapSource {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn initialize(&mut self) {
        self.ctx.sink.write_placeholder(OUT_NAME, String::new()).await;
        self.ctx.sink.write_placeholder(OUT_TYPE, String::new()).await;
    }

    async fn update(&mut self) {
        if let Some(map_id) = self.pending {
            self.show(map_id).await;
        }
    }

    async fn handle_event(&mut self, event: &GameEvent) {
        if let GameEvent::MapChanged(map_id) = event {
            self.show(*map_id).await;
        }
    }

    async fn clear(&mut self) {
        self.pending = None;
        self.ctx.delete_all(&[OUT_NAME, OUT_TYPE]).await;
    }
}
