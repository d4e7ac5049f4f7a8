use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};

use snail_core::{check_email, error_response, log_event, response, status, OdooConnection};
use snail_model::{Lookup, User};

use super::{found, not_found, records, storage_failure, Reply};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/{id}/odoo", get(odoo_status))
}

async fn create_user(
    State(state): State<AppState>,
    Json(values): Json<Map<String, Value>>,
) -> Reply {
    log_event(&Value::Object(values.clone()));

    if let Some(email) = values.get("email").and_then(Value::as_str) {
        if !check_email(email) {
            return error_response(status::BAD_REQUEST, format!("invalid email: {}", email)).into();
        }
    }

    found(state.document_model::<User>().create(values), status::CREATED)
}

async fn list_users(State(state): State<AppState>) -> Reply {
    records(state.document_model::<User>().list())
}

async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    found(state.document_model::<User>().get(&id), status::OK)
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(values): Json<Map<String, Value>>,
) -> Reply {
    if let Some(email) = values.get("email").and_then(Value::as_str) {
        if !check_email(email) {
            return error_response(status::BAD_REQUEST, format!("invalid email: {}", email)).into();
        }
    }

    found(state.document_model::<User>().update(&id, values), status::OK)
}

async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    match state.document_model::<User>().delete(&id) {
        Ok(deleted) => response(status::OK, json!({ "deleted": deleted })).into(),
        Err(e) => storage_failure(e),
    }
}

/// Check the user's Odoo login details. The password is never echoed back.
async fn odoo_status(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let user = match state.document_model::<User>().get(&id) {
        Ok(Lookup::Found(user)) => user,
        Ok(_) => return not_found(),
        Err(e) => return storage_failure(e),
    };

    let connection = OdooConnection::new(&[user]);
    if !connection.is_ok() {
        return error_response(connection.status, &connection.fail_message).into();
    }

    let details = &connection.login_details;
    response(
        status::OK,
        json!({
            "odoo_host": details[0],
            "odoo_db": details[1],
            "odoo_login": details[2],
        }),
    )
    .into()
}
