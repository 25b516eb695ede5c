//! REST API endpoint handlers.
//!
//! Every player endpoint runs a full turn (advance to now, optionally act,
//! persist) through [`crate::turn`]; handlers only parse paths and bodies.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness and store backend |
//! | `POST` | `/api/players` | Create a player |
//! | `GET` | `/api/players/{id}` | Advance and return a player |
//! | `POST` | `/api/players/{id}/actions` | Advance, apply one action |
//! | `GET` | `/api/galaxy/{galaxy}/{system}` | Observe a solar system |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use nova_types::{PlayerAction, PlayerId};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use crate::turn;

/// Body of `POST /api/players`.
#[derive(Debug, serde::Deserialize)]
pub struct CreatePlayerRequest {
    /// Display name.
    pub name: String,
}

/// Liveness probe.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "store": state.store.backend_name(),
        "now": state.clock.now(),
    }))
}

/// Create a player and return its starting state.
pub async fn create_player(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreatePlayerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = turn::create_player(&state, &body.name).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Advance a player to now and return the saved state.
pub async fn get_player(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_player_id(&id_str)?;
    Ok(Json(turn::play_turn(&state, id, None).await?))
}

/// Advance a player to now and apply one action.
pub async fn post_action(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Json(action): Json<PlayerAction>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_player_id(&id_str)?;
    Ok(Json(turn::play_turn(&state, id, Some(action)).await?))
}

/// List the slots of one solar system.
pub async fn get_system(
    State(state): State<Arc<AppState>>,
    Path((galaxy, system)): Path<(u32, u32)>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(turn::observe_system(&state, galaxy, system).await?))
}

fn parse_player_id(s: &str) -> Result<PlayerId, ApiError> {
    Uuid::parse_str(s)
        .map(PlayerId::from)
        .map_err(|e| ApiError::InvalidUuid(format!("{s}: {e}")))
}
