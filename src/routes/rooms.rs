//! Room polling routes.
//!
//! Fallback for clients that cannot hold a websocket open: the snapshot
//! returned here is the same `MatchSnapshot` the push path broadcasts, so a
//! poller reconciles against an identical contract. Push delivery over
//! `/ws` stays the primary mechanism.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use crate::registry;
use crate::session::MatchSnapshot;
use crate::state::AppState;

/// `GET /api/room/{id}` — current snapshot of one room.
///
/// # Errors
///
/// `404` when the room does not exist (never created, or evicted after its
/// last member left).
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<MatchSnapshot>, StatusCode> {
    let snapshot = registry::snapshot(&state, room_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(snapshot))
}
