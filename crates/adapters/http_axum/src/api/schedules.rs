//! JSON REST handlers for per-device schedule operations.
//!
//! Every device lives in exactly one group, so these handlers resolve the
//! device to its group once (`Target::Entity`) and reuse the group
//! operations underneath.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use thermoplan_app::coordinator::{ScheduleView, Target};
use thermoplan_app::ports::{Actuator, Clock, EventPublisher, ScheduleStore};

use crate::api::groups::{EnableRequest, IgnoreRequest, SetScheduleRequest};
use crate::api::parse_entity;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for tracking a device.
#[derive(Deserialize)]
pub struct TrackRequest {
    pub entity_id: String,
}

/// `POST /api/entities` — start tracking a device (auto-creates its
/// single-device group).
pub async fn track<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Json(req): Json<TrackRequest>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    let entity = parse_entity(&req.entity_id)?;
    state.coordinator.track_entity(&entity).await?;
    Ok(StatusCode::CREATED)
}

/// `GET /api/schedules/{entity}`
pub async fn get_one<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(entity): Path<String>,
) -> Result<Json<ScheduleView>, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    let entity = parse_entity(&entity)?;
    let view = state
        .coordinator
        .get_schedule(Target::Entity(entity))
        .await?;
    Ok(Json(view))
}

/// `PUT /api/schedules/{entity}`
pub async fn set<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(entity): Path<String>,
    Json(req): Json<SetScheduleRequest>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    let entity = parse_entity(&entity)?;
    state
        .coordinator
        .set_schedule(
            Target::Entity(entity),
            req.schedule_mode,
            req.day,
            req.nodes,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/schedules/{entity}`
pub async fn clear<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(entity): Path<String>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    let entity = parse_entity(&entity)?;
    state
        .coordinator
        .clear_schedule(Target::Entity(entity))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/schedules/{entity}/enable`
pub async fn enable<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(entity): Path<String>,
    Json(req): Json<EnableRequest>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    let entity = parse_entity(&entity)?;
    state
        .coordinator
        .set_enabled(Target::Entity(entity), req.enabled)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/schedules/{entity}/ignore`
pub async fn ignore<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(entity): Path<String>,
    Json(req): Json<IgnoreRequest>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    let entity = parse_entity(&entity)?;
    state
        .coordinator
        .set_ignored(Target::Entity(entity), req.ignored)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
