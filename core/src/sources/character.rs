use async_trait::async_trait;
use stream_out_types::formatting::SWORDS;

use super::{OverlayAssets, SourceContext, StatSource, log_skipped};
use crate::events::GameEvent;
use crate::fetch::Unavailable;

const NAME: &str = "character";

const OUT_NAME: &str = "character_name.txt";
const OUT_PROFESSION: &str = "profession_name.txt";
const OUT_PROFESSION_ICON: &str = "profession_icon.png";
const OUT_COMMANDER_ICON: &str = "commander_icon.png";
const OUT_COMBAT: &str = "combat.txt";
const OUT_COMBAT_ICON: &str = "combat_icon.png";

#[derive(Debug, Clone, PartialEq, Eq)]
struct SpecializationRef {
    id: i64,
    profession: String,
}

/// Live character identity, build and squad/combat state.
pub struct CharacterSource {
    ctx: SourceContext,
    assets: OverlayAssets,
    commander: bool,
    catmander: bool,
    /// Specialization whose lookup failed, retried every tick
    pending: Option<SpecializationRef>,
}

impl CharacterSource {
    pub fn new(ctx: SourceContext, assets: OverlayAssets, use_catmander_tag: bool) -> Self {
        Self {
            ctx,
            assets,
            commander: false,
            catmander: use_catmander_tag,
            pending: None,
        }
    }

    /// Elite specializations show their own name and icon, core ones the profession's.
    async fn publish_specialization(&self, spec: &SpecializationRef) -> Result<(), Unavailable> {
        let sink = &self.ctx.sink;
        if spec.id <= 0 {
            sink.delete(OUT_PROFESSION_ICON).await;
            return Ok(());
        }

        let specialization = self
            .ctx
            .fetcher
            .fetch("specialization", &[], || self.ctx.api.specialization(spec.id))
            .await?;

        let (name, icon_url) = if specialization.elite {
            (specialization.name, specialization.profession_icon_big)
        } else {
            let profession_id = if spec.profession.is_empty() {
                specialization.profession.as_str()
            } else {
                spec.profession.as_str()
            };
            let profession = self
                .ctx
                .fetcher
                .fetch("profession", &[], || self.ctx.api.profession(profession_id))
                .await?;
            (profession.name, profession.icon_big)
        };

        sink.write_text(OUT_PROFESSION, name).await;
        match icon_url {
            Some(url) => {
                let icon = self
                    .ctx
                    .fetcher
                    .fetch("profession icon", &[], || self.ctx.api.render(&url))
                    .await?;
                sink.write_image(OUT_PROFESSION_ICON, icon).await;
            }
            None => {
                sink.delete(OUT_PROFESSION_ICON).await;
            }
        }
        Ok(())
    }

    async fn show_specialization(&mut self, spec: SpecializationRef) {
        match self.publish_specialization(&spec).await {
            Ok(()) => self.pending = None,
            Err(e) => {
                log_skipped(NAME, OUT_PROFESSION, &e);
                self.pending = Some(spec);
            }
        }
    }

    async fn publish_commander(&self) {
        let tag = if self.catmander {
            &self.assets.catmander_tag
        } else {
            &self.assets.commander_tag
        };
        match (self.commander, tag) {
            (true, Some(bytes)) => {
                self.ctx.sink.write_image(OUT_COMMANDER_ICON, bytes.clone()).await;
            }
            (true, None) => {
                tracing::debug!(source = NAME, catmander = self.catmander, "No tag image loaded");
            }
            (false, _) => {
                self.ctx.sink.delete(OUT_COMMANDER_ICON).await;
            }
        }
    }

    async fn publish_combat(&self, in_combat: bool) {
        let sink = &self.ctx.sink;
        if in_combat {
            sink.write_text(OUT_COMBAT, SWORDS.to_string()).await;
            if let Some(icon) = &self.assets.combat_icon {
                sink.write_image(OUT_COMBAT_ICON, icon.clone()).await;
            }
        } else {
            sink.write_text(OUT_COMBAT, String::new()).await;
            sink.delete(OUT_COMBAT_ICON).await;
        }
    }
}

#[async_trait]
impl StatSource for CharacterSource {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn initialize(&mut self) {
        self.ctx.sink.write_placeholder(OUT_NAME, String::new()).await;
        self.ctx.sink.write_placeholder(OUT_PROFESSION, String::new()).await;
        self.ctx.sink.write_placeholder(OUT_COMBAT, String::new()).await;
    }

    async fn update(&mut self) {
        if let Some(spec) = self.pending.clone() {
            self.show_specialization(spec).await;
        }
    }

    async fn handle_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::NameChanged(name) => {
                self.ctx.sink.write_text(OUT_NAME, name.clone()).await;
            }
            GameEvent::SpecializationChanged {
                specialization,
                profession,
            } => {
                let spec = SpecializationRef {
                    id: *specialization,
                    profession: profession.clone(),
                };
                self.show_specialization(spec).await;
            }
            GameEvent::CommanderChanged(on) => {
                self.commander = *on;
                self.publish_commander().await;
            }
            GameEvent::CatmanderTagChanged(on) => {
                self.catmander = *on;
                if self.commander {
                    self.publish_commander().await;
                }
            }
            GameEvent::CombatChanged(on) => self.publish_combat(*on).await,
            GameEvent::MapChanged(_) => {}
        }
    }

    async fn clear(&mut self) {
        self.pending = None;
        self.ctx
            .delete_all(&[
                OUT_NAME,
                OUT_PROFESSION,
                OUT_PROFESSION_ICON,
                OUT_COMMANDER_ICON,
                OUT_COMBAT,
                OUT_COMBAT_ICON,
            ])
            .await;
    }
}

#[cfg(test)]
#[path = "character_tests.rs"]
mod tests;
