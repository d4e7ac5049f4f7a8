pub mod products;
pub mod users;

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tower_http::trace::TraceLayer;

use snail_core::{error_response, response, status, CoreError, Envelope};
use snail_model::{Lookup, Record, Schema};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(users::routes())
        .merge(products::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// A response envelope sent as the HTTP response: its status, its body as
/// JSON and its CORS headers.
pub struct Reply(pub Envelope);

impl From<Envelope> for Reply {
    fn from(envelope: Envelope) -> Self {
        Reply(envelope)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let Envelope {
            status_code,
            body,
            headers,
        } = self.0;
        let status = StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = (status, Json(body)).into_response();
        for (name, value) in headers.pairs() {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                response.headers_mut().insert(name, value);
            }
        }
        response
    }
}

pub(crate) fn not_found() -> Reply {
    error_response(status::NOT_FOUND, "not found").into()
}

pub(crate) fn storage_failure(e: CoreError) -> Reply {
    error_response(status::INTERNAL_SERVER_ERROR, e).into()
}

/// Turn a mapper lookup into a reply, answering `status_code` when found.
pub(crate) fn found<M: Schema>(
    result: Result<Lookup<Record<M>>, CoreError>,
    status_code: u16,
) -> Reply {
    match result {
        Ok(Lookup::Found(record)) => response(status_code, record.to_json()).into(),
        Ok(Lookup::NotFound) => not_found(),
        Ok(Lookup::Rejected(envelope)) => envelope.into(),
        Err(e) => storage_failure(e),
    }
}

pub(crate) fn records<M: Schema>(result: Result<Vec<Record<M>>, CoreError>) -> Reply {
    match result {
        Ok(records) => response(
            status::OK,
            Value::Array(records.iter().map(Record::to_json).collect()),
        )
        .into(),
        Err(e) => storage_failure(e),
    }
}
