//! JSON REST handlers for settings, force-sync, and factory reset.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use thermoplan_app::ports::{Actuator, Clock, EventPublisher, ScheduleStore};
use thermoplan_domain::settings::Settings;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body confirming a factory reset.
#[derive(Deserialize)]
pub struct FactoryResetRequest {
    #[serde(default)]
    pub confirm: bool,
}

/// `GET /api/settings`
pub async fn get_settings<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
) -> Result<Json<Settings>, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    Ok(Json(state.coordinator.settings().await?))
}

/// `PUT /api/settings`
pub async fn put_settings<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Json(settings): Json<Settings>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    state.coordinator.save_settings(settings).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/sync` — forget applied-node caches and resync everything.
pub async fn sync<A, S, P, C>(State(state): State<AppState<A, S, P, C>>) -> StatusCode
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    state.coordinator.force_update_all().await;
    StatusCode::ACCEPTED
}

/// `POST /api/factory-reset`
pub async fn factory_reset<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Json(req): Json<FactoryResetRequest>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    state.coordinator.factory_reset(req.confirm).await?;
    Ok(StatusCode::NO_CONTENT)
}
