//! JSON REST handlers for manual advances and their history.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use thermoplan_app::ports::{Actuator, Clock, EventPublisher, ScheduleStore};
use thermoplan_domain::advance::{AdvanceHistoryEntry, AdvanceStatus};
use thermoplan_domain::node::Node;

use crate::api::parse_entity;
use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for the history endpoint.
#[derive(Deserialize)]
pub struct HistoryQuery {
    /// Look-back window in hours; defaults to 24.
    pub hours: Option<u32>,
}

/// `POST /api/advance/{entity}` — jump to the next scheduled node now.
pub async fn advance<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(entity): Path<String>,
) -> Result<Json<Node>, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    let entity = parse_entity(&entity)?;
    let node = state.coordinator.advance(&entity).await?;
    Ok(Json(node))
}

/// `GET /api/advance/{entity}` — current override status.
pub async fn status<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(entity): Path<String>,
) -> Result<Json<AdvanceStatus>, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    let entity = parse_entity(&entity)?;
    Ok(Json(state.coordinator.advance_status(&entity).await))
}

/// `POST /api/advance/{entity}/cancel`
pub async fn cancel<A, S, P, C>(
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
    state.coordinator.cancel_advance(&entity).await;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/advance/{entity}/history?hours=24`
pub async fn history<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(entity): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<AdvanceHistoryEntry>>, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    let entity = parse_entity(&entity)?;
    let hours = query.hours.unwrap_or(24);
    Ok(Json(state.coordinator.advance_history(&entity, hours).await))
}

/// `DELETE /api/advance/{entity}/history`
pub async fn clear_history<A, S, P, C>(
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
    state.coordinator.clear_advance_history(&entity).await;
    Ok(StatusCode::NO_CONTENT)
}
