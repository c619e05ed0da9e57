//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use thermoplan_app::ports::{Actuator, Clock, EventPublisher, ScheduleStore};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the JSON API under `/api` and includes a [`TraceLayer`] that logs
/// each HTTP request/response at the `DEBUG` level using the `tracing`
/// ecosystem.
pub fn build<A, S, P, C>(state: AppState<A, S, P, C>) -> Router
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
