//! One player turn: read, advance, act, write.
//!
//! ## Turn flow
//!
//! 1. Take the player's in-process lock.
//! 2. Read the galaxy and the player with their versions.
//! 3. [`advance`] both to now; apply at most one [`PlayerAction`].
//! 4. Commit both blobs in one compare-and-swap. On a version conflict
//!    (another player's turn touched the galaxy) start again from step 2,
//!    up to `store.cas_attempts` times.
//!
//! A rejected action writes nothing. The advance it would have been applied
//! to is deterministic, so the next request recomputes the same result.

use nova_agents::apply_action;
use nova_core::{advance, new_player};
use nova_db::DbError;
use nova_types::{Notification, PlayerAction, PlayerId, PlayerState};
use nova_world::galaxy::{SystemView, view_system};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Longest accepted player name, in characters.
pub const MAX_NAME_LEN: usize = 32;

/// A player's state after a turn together with what happened during it.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// The saved state.
    pub state: PlayerState,
    /// Everything resolved since the previous save, oldest first.
    pub notifications: Vec<Notification>,
}

/// Create a player, claim a home and persist both blobs.
pub async fn create_player(app: &AppState, name: &str) -> Result<TurnOutcome, ApiError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "name must be 1 to {MAX_NAME_LEN} characters"
        )));
    }
    let id = PlayerId::new();
    app.locks.run(id, insert_player(app, id, name)).await
}

async fn insert_player(app: &AppState, id: PlayerId, name: &str) -> Result<TurnOutcome, ApiError> {
    let rules = app.rules();

    for attempt in 1..=app.config.store.cas_attempts {
        let now = app.clock.now();
        let global = app.store.load_or_init_global(app.config.universe.seed).await?;
        let mut galaxy = global.value;
        let state = new_player(&rules, &mut galaxy, id, name, now)?;

        match app.store.commit_turn(&state, 0, &galaxy, global.version).await {
            Ok(_) => {
                return Ok(TurnOutcome {
                    state,
                    notifications: Vec::new(),
                });
            }
            Err(DbError::VersionConflict { key, .. }) => {
                warn!(player = %id, attempt, %key, "create lost a galaxy write race");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(exhausted(app, id))
}

/// Advance a player to now, apply `action` if given, and persist.
pub async fn play_turn(
    app: &AppState,
    id: PlayerId,
    action: Option<PlayerAction>,
) -> Result<TurnOutcome, ApiError> {
    app.locks.run(id, run_turn(app, id, action)).await
}

async fn run_turn(
    app: &AppState,
    id: PlayerId,
    action: Option<PlayerAction>,
) -> Result<TurnOutcome, ApiError> {
    let rules = app.rules();

    for attempt in 1..=app.config.store.cas_attempts {
        let now = app.clock.now();
        let global = app.store.load_or_init_global(app.config.universe.seed).await?;
        let player = app
            .store
            .load_player(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("player {id}")))?;

        let advanced = advance(&rules, &player.value, &global.value, now);
        let mut notifications = advanced.notifications;
        let state = match action.clone() {
            Some(action) => {
                let outcome =
                    apply_action(&rules, &advanced.state, &advanced.global, action, now)?;
                notifications.extend(outcome.notifications);
                outcome.state
            }
            None => advanced.state,
        };

        match app
            .store
            .commit_turn(&state, player.version, &advanced.global, global.version)
            .await
        {
            Ok((version, _)) => {
                debug!(player = %id, version, events = advanced.events, "turn saved");
                return Ok(TurnOutcome {
                    state,
                    notifications,
                });
            }
            Err(DbError::VersionConflict { key, .. }) => {
                warn!(player = %id, attempt, %key, "turn lost a write race, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(exhausted(app, id))
}

/// Observe a solar system, persisting any NPCs the observation created.
pub async fn observe_system(
    app: &AppState,
    galaxy: u32,
    system: u32,
) -> Result<SystemView, ApiError> {
    for attempt in 1..=app.config.store.cas_attempts {
        let now = app.clock.now();
        let global = app.store.load_or_init_global(app.config.universe.seed).await?;
        let mut observed = global.value.clone();
        let view = view_system(&app.config.universe, &mut observed, galaxy, system, now)?;
        if observed == global.value {
            return Ok(view);
        }
        match app.store.commit_global(&observed, global.version).await {
            Ok(_) => {
                let created = observed.npcs.len().saturating_sub(global.value.npcs.len());
                info!(galaxy, system, created, "system observed");
                return Ok(view);
            }
            Err(DbError::VersionConflict { .. }) => {
                warn!(galaxy, system, attempt, "galaxy view lost a write race, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(ApiError::Busy(format!("system {galaxy}:{system}")))
}

fn exhausted(app: &AppState, id: PlayerId) -> ApiError {
    warn!(
        player = %id,
        attempts = app.config.store.cas_attempts,
        "giving up after repeated write races"
    );
    ApiError::Busy(format!("player {id}"))
}
