//! Error types for the nova-agents crate.
//!
//! Every player command is validated in full before any state is touched,
//! so a returned error always means "nothing happened". The variants below
//! form the rejection taxonomy surfaced to clients.

use nova_types::{
    Coordinates, EntityId, MissionType, QueueLane, Requirement, Resources, WorldEventKind,
};
use rust_decimal::Decimal;

/// Reasons a player command is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The stockpile does not cover the cost.
    #[error("insufficient resources: need {needed:?}, have {available:?}")]
    InsufficientResources {
        /// What the command costs.
        needed: Resources,
        /// What the player holds.
        available: Resources,
    },

    /// The credit balance does not cover the price.
    #[error("insufficient credits: need {needed}, have {available}")]
    InsufficientCredits {
        /// What the command costs.
        needed: Decimal,
        /// What the player holds.
        available: Decimal,
    },

    /// The queue lane is at capacity.
    #[error("{lane:?} queue is full ({capacity} slot(s))")]
    QueueFull {
        /// The lane the item would join.
        lane: QueueLane,
        /// Current lane capacity.
        capacity: u32,
    },

    /// Prerequisite buildings or research are missing.
    #[error("requirements not met for {entity:?}: missing {missing:?}")]
    RequirementsNotMet {
        /// The entity that was requested.
        entity: EntityId,
        /// Requirements that do not hold.
        missing: Vec<Requirement>,
    },

    /// The fleet cannot fly the requested mission.
    #[error("invalid mission composition: {reason}")]
    InvalidMissionComposition {
        /// Description of why the fleet was rejected.
        reason: String,
    },

    /// Too many missions of this type are already running.
    #[error("{mission_type:?} mission limit of {limit} reached")]
    MissionLimitExceeded {
        /// The mission type that was requested.
        mission_type: MissionType,
        /// Current limit for the player.
        limit: u32,
    },

    /// The target slot is already taken.
    #[error("target {0} is occupied")]
    TargetOccupied(Coordinates),

    /// The command names something that does not exist or does not fit.
    #[error("unknown entity: {reason}")]
    UnknownEntity {
        /// What could not be resolved.
        reason: String,
    },

    /// The command needs a world event that is not currently on offer.
    #[error("{0:?} is not available right now")]
    EventUnavailable(WorldEventKind),

    /// A quantity was zero, negative or otherwise unusable.
    #[error("invalid amount: {reason}")]
    InvalidAmount {
        /// Description of the problem.
        reason: String,
    },
}

impl ActionError {
    /// Shorthand for an [`ActionError::UnknownEntity`].
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self::UnknownEntity {
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`ActionError::InvalidMissionComposition`].
    pub fn composition(reason: impl Into<String>) -> Self {
        Self::InvalidMissionComposition {
            reason: reason.into(),
        }
    }
}
