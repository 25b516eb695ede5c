//! Error types for the `nova-world` crate.

use nova_types::Coordinates;

/// Errors that can occur during galaxy operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The coordinates lie outside the configured galaxy dimensions.
    #[error("coordinates {0} are outside the universe")]
    OutOfRange(Coordinates),

    /// The requested galaxy/system pair does not exist.
    #[error("system {galaxy}:{system} does not exist")]
    NoSuchSystem {
        /// Galaxy number.
        galaxy: u32,
        /// System number.
        system: u32,
    },

    /// Every slot in the universe is taken by a player or an NPC.
    #[error("no free planet slot left in the universe")]
    UniverseFull,
}
