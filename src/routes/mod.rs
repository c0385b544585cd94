pub mod location;

use axum::{
    Json, Router,
    routing::get,
};
use serde_json::{Value, json};

use crate::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// 地点与路线接口
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/locations",
            get(location::list_locations).post(location::create_location),
        )
        .route(
            "/locations/{id}",
            get(location::get_location).put(location::update_location),
        )
        .route("/route", get(location::get_route))
}
