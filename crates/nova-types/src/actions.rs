//! Player commands accepted by the action API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::coords::Coordinates;
use crate::enums::{ArtifactChoice, EntityId, MissionType, QueueKind, Resource, TradeSide};
use crate::ids::{BoostId, MessageId, MissionId};
use crate::structs::Fleet;

/// A command issued by the player.
///
/// Every command is validated in full against the current state before any
/// mutation, so a rejected command leaves the state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum PlayerAction {
    /// Queue a building, research, ship upgrade, ships or defenses.
    AddToQueue {
        /// What to produce.
        entity: EntityId,
        /// Which kind of production.
        kind: QueueKind,
        /// Unit count for ships and defenses; ignored for leveled kinds.
        amount: u32,
    },
    /// Dispatch a fleet from the home planet.
    SendFleet {
        /// Ships to send.
        fleet: Fleet,
        /// Destination slot.
        #[ts(as = "String")]
        target: Coordinates,
        /// What to do there.
        mission_type: MissionType,
    },
    /// Mark a message as read.
    MarkMessageRead {
        /// Message to mark.
        id: MessageId,
    },
    /// Remove a message from the log.
    DeleteMessage {
        /// Message to delete.
        id: MessageId,
    },
    /// Trade resources with the visiting merchant.
    TradeMerchant {
        /// Resource traded.
        resource: Resource,
        /// Units traded.
        #[ts(as = "String")]
        amount: Decimal,
        /// Buy or sell.
        side: TradeSide,
    },
    /// Hire the offered pirate fleet.
    HirePirates,
    /// Claim the available ancient artifact.
    ArtifactChoice {
        /// Reward to take.
        choice: ArtifactChoice,
    },
    /// Activate a boost from inventory.
    ActivateBoost {
        /// Inventory entry to activate.
        boost_id: BoostId,
    },
    /// Turn an outbound fleet around.
    RecallFleet {
        /// Mission to recall.
        mission_id: MissionId,
    },
}
