//! Web front of the stock report manager: one server-rendered page plus a
//! few form endpoints, all backed by a single shared [`Dashboard`].

pub mod page;
pub mod routes;

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use shared::{Config, Dashboard};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub schedule_note: Arc<str>,
}

impl AppState {
    pub fn new(dashboard: Arc<Dashboard>, config: &Config) -> Self {
        Self {
            dashboard,
            schedule_note: Arc::from(config.report_schedule_note.as_str()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let json_api = Router::new()
        .route("/api/state", get(routes::state_json))
        .route("/api/suggestions", get(routes::suggestions))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET]),
        );

    Router::new()
        .route("/", get(routes::index))
        .route("/symbols", post(routes::add_symbol))
        .route("/symbols/cancel-delete", post(routes::cancel_delete))
        .route("/symbols/:id/delete", post(routes::request_delete))
        .route("/symbols/:id/delete/confirm", post(routes::confirm_delete))
        .route("/report/send", post(routes::send_report))
        .route("/health", get(routes::health_check))
        .route("/version", get(routes::version))
        .merge(json_api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
