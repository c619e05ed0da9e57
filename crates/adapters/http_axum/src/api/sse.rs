//! Server-Sent Events (SSE) stream for real-time transition events.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use thermoplan_app::ports::{Actuator, Clock, EventPublisher, ScheduleStore};

use crate::state::AppState;

/// `GET /api/events/stream` — SSE stream of transition events.
///
/// Subscribes to the event bus broadcast channel and sends JSON-encoded
/// events as SSE `data:` frames. The stream continues until the client
/// disconnects or the event bus is closed.
pub async fn stream<A, S, P, C>(
    State(state): State<AppState<A, S, P, C>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    let event_rx = state.event_bus.subscribe();
    let event_stream = BroadcastStream::new(event_rx).filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json) => Some(Ok(Event::default().data(json))),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize event to JSON for SSE stream");
                None
            }
        },
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(
                skipped = n,
                "SSE subscriber lagged, some events were dropped"
            );
            None
        }
    });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}
