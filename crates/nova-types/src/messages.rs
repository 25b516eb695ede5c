//! Message log entries, battle and espionage reports, and notifications.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::coords::Coordinates;
use crate::enums::{BattleOutcome, ExpeditionOutcome, ExplorationOutcome, NotificationKind};
use crate::ids::MessageId;
use crate::structs::{
    BuildingLevels, DebrisField, Defenses, Fleet, ResearchLevels, Resources, Timestamp,
};

/// Full record of one battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BattleReport {
    /// Where the battle happened.
    #[ts(as = "String")]
    pub location: Coordinates,
    /// Attacker display name.
    pub attacker: String,
    /// Defender display name.
    pub defender: String,
    /// Result from the attacker's side.
    pub outcome: BattleOutcome,
    /// Attacker aggregate power.
    pub attacker_power: f64,
    /// Defender aggregate power.
    pub defender_power: f64,
    /// Attacking ships destroyed.
    pub attacker_losses: Fleet,
    /// Defending ships destroyed.
    pub defender_ship_losses: Fleet,
    /// Defense structures destroyed.
    pub defender_defense_losses: Defenses,
    /// Resources taken by the attacker.
    pub loot: Resources,
    /// Salvage added to the slot.
    pub debris: DebrisField,
}

/// Intelligence gathered by a spy mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpyReport {
    /// Spied slot.
    #[ts(as = "String")]
    pub target: Coordinates,
    /// Owner name, or `None` for an empty slot.
    pub owner: Option<String>,
    /// Stockpile.
    pub resources: Resources,
    /// Ships at home.
    pub fleet: Fleet,
    /// Defense structures.
    pub defenses: Defenses,
    /// Building levels.
    pub buildings: BuildingLevels,
    /// Research levels.
    pub research: ResearchLevels,
}

/// Payload of a message log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type")]
#[ts(export, export_to = "bindings/")]
pub enum MessageBody {
    /// A battle the player took part in.
    Battle(BattleReport),
    /// A spy report the player ordered.
    Spy(SpyReport),
    /// Someone spied on the player.
    EspionageEvent {
        /// Where the probe came from.
        #[ts(as = "String")]
        from: Coordinates,
        /// Who sent it.
        by: String,
    },
    /// Expedition result.
    Expedition {
        /// Drawn outcome.
        outcome: ExpeditionOutcome,
        /// Resources found.
        resources: Resources,
        /// Credits found.
        #[ts(as = "String")]
        credits: Decimal,
        /// Ships gained (positive outcomes) or lost (negative outcomes).
        ships: Fleet,
        /// Added return delay in milliseconds.
        delay_ms: u64,
    },
    /// Exploration result.
    Exploration {
        /// Drawn outcome.
        outcome: ExplorationOutcome,
        /// Explored slot.
        #[ts(as = "String")]
        target: Coordinates,
        /// Free-form summary.
        detail: String,
    },
    /// Colonization attempt.
    Colonization {
        /// Target slot.
        #[ts(as = "String")]
        target: Coordinates,
        /// Whether the colony was founded.
        success: bool,
    },
    /// Debris harvest.
    Harvest {
        /// Harvested slot.
        #[ts(as = "String")]
        target: Coordinates,
        /// Metal collected.
        #[ts(as = "String")]
        metal: Decimal,
        /// Crystal collected.
        #[ts(as = "String")]
        crystal: Decimal,
    },
    /// Anything else worth telling the player.
    General {
        /// Headline.
        title: String,
        /// Body text.
        text: String,
    },
}

/// An entry in a player's message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Message {
    /// Message identifier.
    pub id: MessageId,
    /// When the message was written.
    pub timestamp: Timestamp,
    /// Whether the player has read it.
    pub read: bool,
    /// Content.
    pub body: MessageBody,
}

/// A chronological entry returned by the catch-up engine and by actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Notification {
    /// Game time of the underlying event.
    pub at: Timestamp,
    /// Category.
    pub kind: NotificationKind,
    /// Human-readable summary.
    pub text: String,
}

impl Notification {
    /// Build a notification.
    pub fn new(at: Timestamp, kind: NotificationKind, text: impl Into<String>) -> Self {
        Self {
            at,
            kind,
            text: text.into(),
        }
    }
}
