//! Error types for the player API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.
//! Rejected player commands keep their taxonomy in the `code` field so
//! clients can branch on it without parsing the message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nova_agents::ActionError;
use nova_db::DbError;
use nova_world::WorldError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request itself was malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The player command was rejected by the game rules.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// Galaxy lookup or home claiming failed.
    #[error(transparent)]
    World(#[from] WorldError),

    /// The store failed or kept losing compare-and-swap races.
    #[error("store error: {0}")]
    Store(#[from] DbError),

    /// Every compare-and-swap attempt lost to a concurrent writer.
    #[error("busy, try again: {0}")]
    Busy(String),

    /// A UUID could not be parsed from the request path.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),
}

impl ApiError {
    /// HTTP status and stable machine-readable code.
    pub const fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::InvalidUuid(_) => (StatusCode::BAD_REQUEST, "INVALID_UUID"),
            Self::Action(e) => match e {
                ActionError::InsufficientResources { .. } => {
                    (StatusCode::CONFLICT, "INSUFFICIENT_RESOURCES")
                }
                ActionError::InsufficientCredits { .. } => {
                    (StatusCode::CONFLICT, "INSUFFICIENT_CREDITS")
                }
                ActionError::QueueFull { .. } => (StatusCode::CONFLICT, "QUEUE_FULL"),
                ActionError::RequirementsNotMet { .. } => {
                    (StatusCode::CONFLICT, "REQUIREMENTS_NOT_MET")
                }
                ActionError::MissionLimitExceeded { .. } => {
                    (StatusCode::CONFLICT, "MISSION_LIMIT_EXCEEDED")
                }
                ActionError::TargetOccupied(_) => (StatusCode::CONFLICT, "TARGET_OCCUPIED"),
                ActionError::EventUnavailable(_) => (StatusCode::CONFLICT, "EVENT_UNAVAILABLE"),
                ActionError::InvalidMissionComposition { .. } => {
                    (StatusCode::BAD_REQUEST, "INVALID_MISSION_COMPOSITION")
                }
                ActionError::InvalidAmount { .. } => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
                ActionError::UnknownEntity { .. } => (StatusCode::NOT_FOUND, "UNKNOWN_ENTITY"),
            },
            Self::World(e) => match e {
                WorldError::OutOfRange(_) | WorldError::NoSuchSystem { .. } => {
                    (StatusCode::NOT_FOUND, "NO_SUCH_SYSTEM")
                }
                WorldError::UniverseFull => (StatusCode::SERVICE_UNAVAILABLE, "UNIVERSE_FULL"),
            },
            Self::Busy(_) | Self::Store(DbError::VersionConflict { .. }) => {
                (StatusCode::CONFLICT, "BUSY")
            }
            Self::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "code": code,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
