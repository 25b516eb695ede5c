//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every addressable entity in the game has a strongly-typed ID so that a
//! mission id can never be passed where a message id is expected. IDs minted
//! at the API edge use UUID v7 (time-ordered). IDs minted inside the
//! catch-up engine are derived from the seeded event RNG via
//! [`from_u128`](PlayerId::from_u128) so that replaying the same interval
//! produces the same identifiers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
        )]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Create an identifier from raw bits (deterministic generation).
            pub const fn from_u128(bits: u128) -> Self {
                Self(Uuid::from_u128(bits))
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a player account.
    PlayerId
}

define_id! {
    /// Unique identifier for a fleet mission (player or NPC).
    MissionId
}

define_id! {
    /// Unique identifier for a message in a player's log.
    MessageId
}

define_id! {
    /// Unique identifier for an unredeemed boost held in inventory.
    BoostId
}

impl PlayerId {
    /// Fold the identifier into a 64-bit seed for per-player RNG streams.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn seed(self) -> u64 {
        let bits = self.0.as_u128();
        (bits as u64) ^ ((bits >> 64) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let player = PlayerId::new();
        let mission = MissionId::new();
        assert_ne!(player.into_inner(), Uuid::nil());
        assert_ne!(mission.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = MissionId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<MissionId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn deterministic_ids_are_stable() {
        assert_eq!(MessageId::from_u128(42), MessageId::from_u128(42));
        assert_ne!(MessageId::from_u128(42), MessageId::from_u128(43));
    }

    #[test]
    fn player_seed_depends_on_both_halves() {
        let low = PlayerId::from_u128(1);
        let high = PlayerId::from_u128(1_u128 << 64);
        assert_eq!(low.seed(), 1);
        assert_eq!(high.seed(), 1);
        assert_ne!(PlayerId::from_u128(3).seed(), low.seed());
    }
}
