//! JSON REST handlers for groups and their profiles.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use thermoplan_app::coordinator::{GroupAdvanceReport, ScheduleView, Target};
use thermoplan_app::ports::{Actuator, Clock, EventPublisher, ScheduleStore};
use thermoplan_domain::group::Group;
use thermoplan_domain::node::Node;
use thermoplan_domain::preview::SchedulePreview;
use thermoplan_domain::schedule::{Bucket, ScheduleMode};

use crate::api::parse_entity;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a group or a profile.
#[derive(Deserialize)]
pub struct CreateRequest {
    pub name: String,
}

/// Request body for rename operations.
#[derive(Deserialize)]
pub struct RenameRequest {
    pub new_name: String,
}

/// Request body for adding a device to a group.
#[derive(Deserialize)]
pub struct AddEntityRequest {
    pub entity_id: String,
}

/// Request body replacing one bucket of a schedule.
#[derive(Deserialize)]
pub struct SetScheduleRequest {
    #[serde(default)]
    pub schedule_mode: ScheduleMode,
    #[serde(default = "default_bucket")]
    pub day: Bucket,
    pub nodes: Vec<Node>,
}

fn default_bucket() -> Bucket {
    Bucket::AllDays
}

/// Request body toggling the enabled flag.
#[derive(Deserialize)]
pub struct EnableRequest {
    pub enabled: bool,
}

/// Request body toggling the ignored flag.
#[derive(Deserialize)]
pub struct IgnoreRequest {
    pub ignored: bool,
}

/// `GET /api/groups`
pub async fn list<A, S, P, C>(State(state): State<AppState<A, S, P, C>>) -> Json<Vec<Group>>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    Json(state.coordinator.groups().await)
}

/// `GET /api/groups/names` — user group names for selector widgets.
pub async fn names<A, S, P, C>(State(state): State<AppState<A, S, P, C>>) -> Json<Vec<String>>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    Json(state.coordinator.group_names().await)
}

/// `POST /api/groups`
pub async fn create<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Json(req): Json<CreateRequest>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    state.coordinator.create_group(&req.name).await?;
    Ok(StatusCode::CREATED)
}

/// `GET /api/groups/{name}`
pub async fn get_one<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(name): Path<String>,
) -> Result<Json<ScheduleView>, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    let view = state.coordinator.get_schedule(Target::Group(name)).await?;
    Ok(Json(view))
}

/// `DELETE /api/groups/{name}`
pub async fn delete<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    state.coordinator.delete_group(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/groups/{name}/rename`
pub async fn rename<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(name): Path<String>,
    Json(req): Json<RenameRequest>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    state.coordinator.rename_group(&name, &req.new_name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/groups/{name}/entities`
pub async fn add_entity<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(name): Path<String>,
    Json(req): Json<AddEntityRequest>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    let entity = parse_entity(&req.entity_id)?;
    state.coordinator.add_to_group(&name, &entity).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/groups/{name}/entities/{entity}`
pub async fn remove_entity<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path((name, entity)): Path<(String, String)>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    let entity = parse_entity(&entity)?;
    state.coordinator.remove_from_group(&name, &entity).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /api/groups/{name}/schedule`
pub async fn set_schedule<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(name): Path<String>,
    Json(req): Json<SetScheduleRequest>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    state
        .coordinator
        .set_schedule(Target::Group(name), req.schedule_mode, req.day, req.nodes)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/groups/{name}/schedule`
pub async fn clear_schedule<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    state.coordinator.clear_schedule(Target::Group(name)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/groups/{name}/enable`
pub async fn enable<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(name): Path<String>,
    Json(req): Json<EnableRequest>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    state
        .coordinator
        .set_enabled(Target::Group(name), req.enabled)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/groups/{name}/ignore`
pub async fn ignore<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(name): Path<String>,
    Json(req): Json<IgnoreRequest>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    state
        .coordinator
        .set_ignored(Target::Group(name), req.ignored)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/groups/{name}/advance`
pub async fn advance<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(name): Path<String>,
) -> Result<Json<GroupAdvanceReport>, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    let report = state.coordinator.advance_group(&name).await?;
    Ok(Json(report))
}

/// `GET /api/groups/{name}/preview`
pub async fn preview<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(name): Path<String>,
) -> Result<Json<SchedulePreview>, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    let preview = state.coordinator.preview(Target::Group(name)).await?;
    Ok(Json(preview))
}

/// `POST /api/groups/{name}/profiles`
pub async fn create_profile<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path(name): Path<String>,
    Json(req): Json<CreateRequest>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    state
        .coordinator
        .create_profile(Target::Group(name), &req.name)
        .await?;
    Ok(StatusCode::CREATED)
}

/// `DELETE /api/groups/{name}/profiles/{profile}`
pub async fn delete_profile<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path((name, profile)): Path<(String, String)>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    state
        .coordinator
        .delete_profile(Target::Group(name), &profile)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/groups/{name}/profiles/{profile}/rename`
pub async fn rename_profile<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path((name, profile)): Path<(String, String)>,
    Json(req): Json<RenameRequest>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    state
        .coordinator
        .rename_profile(Target::Group(name), &profile, &req.new_name)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/groups/{name}/profiles/{profile}/activate`
pub async fn activate_profile<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
    Path((name, profile)): Path<(String, String)>,
) -> Result<StatusCode, ApiError>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    state
        .coordinator
        .set_active_profile(Target::Group(name), &profile)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
