use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use snail_core::{log_event, response, status};
use snail_model::{Change, Product};

use super::{found, not_found, records, storage_failure, Reply};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub attr: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FieldsQuery {
    /// Comma-separated field names.
    pub fields: Option<String>,
}

/// Candidate values for a query string value: the raw text, plus its JSON
/// reading when it parses as something other than a string (`3`, `true`).
fn query_values(raw: &str) -> Vec<Value> {
    let text = Value::String(raw.to_string());
    match serde_json::from_str::<Value>(raw) {
        Ok(parsed) if !parsed.is_string() => vec![parsed, text],
        _ => vec![text],
    }
}

async fn create_product(
    State(state): State<AppState>,
    Json(values): Json<Map<String, Value>>,
) -> Reply {
    log_event(&Value::Object(values.clone()));
    found(state.table_model::<Product>().save(values), status::CREATED)
}

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Reply {
    let mut products = state.table_model::<Product>();
    match (query.attr, query.value) {
        (Some(attr), Some(value)) => records(products.search_any(&attr, &query_values(&value))),
        _ => records(products.list()),
    }
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<FieldsQuery>,
) -> Reply {
    let mut products = state.table_model::<Product>();

    let Some(fields) = query.fields else {
        return found(products.get(&id), status::OK);
    };

    let names: Vec<&str> = fields
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    match products.get_dict(&id, Some(&names)) {
        Ok(Some(fields)) => response(status::OK, Value::Object(fields)).into(),
        Ok(None) => not_found(),
        Err(e) => storage_failure(e),
    }
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(values): Json<Map<String, Value>>,
) -> Reply {
    match state.table_model::<Product>().update(&id, values) {
        Ok(Change::Updated(product)) => response(status::OK, product.to_json()).into(),
        Ok(change @ Change::Unchanged) => {
            response(status::OK, json!({ "message": change.to_string() })).into()
        }
        Ok(Change::Missing) => not_found(),
        Err(e) => storage_failure(e),
    }
}

async fn delete_product(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    match state.table_model::<Product>().delete(&id) {
        Ok(deleted) => response(status::OK, json!({ "deleted": deleted })).into(),
        Err(e) => storage_failure(e),
    }
}
