/// Live game state changes pushed to the stat sources.
///
/// These arrive from whatever watches the running game client (a mumble link
/// reader, a stdin feed) and are fanned out to every source; each source picks
/// the variants it cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    // Identity
    NameChanged(String),
    SpecializationChanged {
        /// 0 when unknown
        specialization: i64,
        profession: String,
    },

    // Squad state
    CommanderChanged(bool),
    CatmanderTagChanged(bool),

    // Combat lifecycle
    CombatChanged(bool),

    // Area transitions
    MapChanged(i64),
}

impl GameEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NameChanged(_) => "name",
            Self::SpecializationChanged { .. } => "specialization",
            Self::CommanderChanged(_) => "commander",
            Self::CatmanderTagChanged(_) => "catmander",
            Self::CombatChanged(_) => "combat",
            Self::MapChanged(_) => "map",
        }
    }
}
