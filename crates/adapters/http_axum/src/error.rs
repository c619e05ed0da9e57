//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use thermoplan_domain::error::ThermoplanError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`ThermoplanError`] to an HTTP response with appropriate status code.
pub struct ApiError(ThermoplanError);

impl<E> From<E> for ApiError
where
    E: Into<ThermoplanError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ThermoplanError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ThermoplanError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            ThermoplanError::AlreadyExists(err) => (StatusCode::CONFLICT, err.to_string()),
            ThermoplanError::InvalidOperation(err) => (StatusCode::CONFLICT, err.to_string()),
            ThermoplanError::NoSchedule(err) => (StatusCode::CONFLICT, err.to_string()),
            ThermoplanError::Actuation(err) => {
                tracing::warn!(error = %err, "actuation error surfaced to API");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            ThermoplanError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
