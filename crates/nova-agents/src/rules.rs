//! The bundle of content tables and tuning every engine step reads.

use nova_world::{EconomyConfig, GameCatalog, UniverseConfig, WorldEventConfig, WorldEventScheduler};

use crate::config::{CombatConfig, MissionConfig, NpcConfig};

/// Borrowed view of the catalog and every configuration section.
///
/// Assembled once per request by the caller and passed by reference into
/// queue, mission, combat, NPC and action functions.
#[derive(Clone, Copy)]
pub struct Ruleset<'a> {
    /// Content tables.
    pub catalog: &'a dyn GameCatalog,
    /// Universe shape and speed.
    pub universe: &'a UniverseConfig,
    /// Production tuning.
    pub economy: &'a EconomyConfig,
    /// Battle tuning.
    pub combat: &'a CombatConfig,
    /// Mission tuning.
    pub missions: &'a MissionConfig,
    /// NPC tuning.
    pub npc: &'a NpcConfig,
    /// World-event tuning.
    pub events: &'a WorldEventConfig,
}

impl std::fmt::Debug for Ruleset<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ruleset")
            .field("universe", self.universe)
            .finish_non_exhaustive()
    }
}

impl<'a> Ruleset<'a> {
    /// World-event scheduler over these rules.
    pub const fn scheduler(&self) -> WorldEventScheduler<'a> {
        WorldEventScheduler::new(self.events, self.catalog)
    }

    /// Convert a catalog duration to game milliseconds at the economy speed.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn build_duration_ms(&self, secs: u64) -> u64 {
        let speed = self.universe.economy_speed.max(f64::MIN_POSITIVE);
        let ms = (secs as f64 * 1000.0 / speed).ceil();
        if ms.is_finite() && ms >= 1.0 { ms as u64 } else { 1 }
    }
}
