//! JSON REST API handler modules.

pub mod advance;
pub mod groups;
pub mod schedules;
pub mod sse;
pub mod system;

use axum::Router;
use axum::routing::{get, post, put};

use thermoplan_app::ports::{Actuator, Clock, EventPublisher, ScheduleStore};
use thermoplan_domain::error::ThermoplanError;
use thermoplan_domain::id::EntityId;

use crate::error::ApiError;
use crate::state::AppState;

/// Parse a path/body device reference, rejecting empty ones.
fn parse_entity(raw: &str) -> Result<EntityId, ApiError> {
    EntityId::new(raw).map_err(|err| ApiError::from(ThermoplanError::from(err)))
}

/// Build the `/api` sub-router.
pub fn routes<A, S, P, C>() -> Router<AppState<A, S, P, C>>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    Router::new()
        // Groups
        .route(
            "/groups",
            get(groups::list::<A, S, P, C>).post(groups::create::<A, S, P, C>),
        )
        .route("/groups/names", get(groups::names::<A, S, P, C>))
        .route(
            "/groups/{name}",
            get(groups::get_one::<A, S, P, C>).delete(groups::delete::<A, S, P, C>),
        )
        .route("/groups/{name}/rename", post(groups::rename::<A, S, P, C>))
        .route(
            "/groups/{name}/entities",
            post(groups::add_entity::<A, S, P, C>),
        )
        .route(
            "/groups/{name}/entities/{entity}",
            axum::routing::delete(groups::remove_entity::<A, S, P, C>),
        )
        .route(
            "/groups/{name}/schedule",
            put(groups::set_schedule::<A, S, P, C>)
                .delete(groups::clear_schedule::<A, S, P, C>),
        )
        .route("/groups/{name}/enable", post(groups::enable::<A, S, P, C>))
        .route("/groups/{name}/ignore", post(groups::ignore::<A, S, P, C>))
        .route("/groups/{name}/advance", post(groups::advance::<A, S, P, C>))
        .route("/groups/{name}/preview", get(groups::preview::<A, S, P, C>))
        // Profiles
        .route(
            "/groups/{name}/profiles",
            post(groups::create_profile::<A, S, P, C>),
        )
        .route(
            "/groups/{name}/profiles/{profile}",
            axum::routing::delete(groups::delete_profile::<A, S, P, C>),
        )
        .route(
            "/groups/{name}/profiles/{profile}/rename",
            post(groups::rename_profile::<A, S, P, C>),
        )
        .route(
            "/groups/{name}/profiles/{profile}/activate",
            post(groups::activate_profile::<A, S, P, C>),
        )
        // Per-device schedules
        .route("/entities", post(schedules::track::<A, S, P, C>))
        .route(
            "/schedules/{entity}",
            get(schedules::get_one::<A, S, P, C>)
                .put(schedules::set::<A, S, P, C>)
                .delete(schedules::clear::<A, S, P, C>),
        )
        .route(
            "/schedules/{entity}/enable",
            post(schedules::enable::<A, S, P, C>),
        )
        .route(
            "/schedules/{entity}/ignore",
            post(schedules::ignore::<A, S, P, C>),
        )
        // Advance / override
        .route(
            "/advance/{entity}",
            get(advance::status::<A, S, P, C>).post(advance::advance::<A, S, P, C>),
        )
        .route(
            "/advance/{entity}/cancel",
            post(advance::cancel::<A, S, P, C>),
        )
        .route(
            "/advance/{entity}/history",
            get(advance::history::<A, S, P, C>)
                .delete(advance::clear_history::<A, S, P, C>),
        )
        // System
        .route(
            "/settings",
            get(system::get_settings::<A, S, P, C>).put(system::put_settings::<A, S, P, C>),
        )
        .route("/sync", post(system::sync::<A, S, P, C>))
        .route("/factory-reset", post(system::factory_reset::<A, S, P, C>))
        // Events
        .route("/events/stream", get(sse::stream::<A, S, P, C>))
}
