use std::collections::HashMap;

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::{ActionError, DashboardView, SkipReason, SymbolId};
use tracing::{debug, error, info, warn};

use crate::page::DashboardPage;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddSymbolForm {
    #[serde(default)]
    pub code: String,
}

fn log_outcome<T>(action: &str, result: &Result<T, ActionError>) {
    match result {
        Ok(_) => {}
        Err(ActionError::Skipped(reason)) => debug!("{} skipped: {:?}", action, reason),
        // Already logged by the dashboard with the backend message.
        Err(ActionError::Api(_)) => {}
        Err(e) => error!("{} failed: {}", action, e),
    }
}

fn back_to_dashboard() -> Redirect {
    Redirect::to("/")
}

pub async fn index(State(state): State<AppState>) -> Response {
    state.dashboard.refresh().await;
    let view = state.dashboard.view().await;
    render(&view, &state.schedule_note)
}

fn render(view: &DashboardView, schedule_note: &str) -> Response {
    match DashboardPage::new(view, schedule_note).render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render dashboard: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render dashboard").into_response()
        }
    }
}

pub async fn add_symbol(
    State(state): State<AppState>,
    Form(form): Form<AddSymbolForm>,
) -> Redirect {
    let result = state.dashboard.add_symbol(&form.code).await;
    log_outcome("add", &result);
    back_to_dashboard()
}

pub async fn request_delete(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    let id = SymbolId::from(id.as_str());
    state.dashboard.refresh().await;
    let result = state.dashboard.request_delete(&id).await;
    log_outcome("delete request", &result);
    back_to_dashboard()
}

pub async fn confirm_delete(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    let id = SymbolId::from(id.as_str());
    let result = state.dashboard.confirm_delete(&id).await;
    log_outcome("delete", &result);
    back_to_dashboard()
}

pub async fn cancel_delete(State(state): State<AppState>) -> Redirect {
    state.dashboard.cancel_delete().await;
    back_to_dashboard()
}

/// Starts the report in the background; the page polls until it settles.
pub async fn send_report(State(state): State<AppState>) -> Redirect {
    state.dashboard.refresh().await;
    match state.dashboard.spawn_send_report().await {
        Ok(_) => info!("Report send started from dashboard"),
        Err(ActionError::Skipped(SkipReason::AlreadyPending)) => {
            warn!("Report send already in progress, ignoring duplicate request")
        }
        Err(e) => debug!("report skipped: {}", e),
    }
    back_to_dashboard()
}

pub async fn state_json(State(state): State<AppState>) -> Json<DashboardView> {
    state.dashboard.refresh().await;
    Json(state.dashboard.view().await)
}

pub async fn suggestions(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let query = params.get("q").map(String::as_str).unwrap_or("");
    match state.dashboard.suggest(query).await {
        Ok(listed) => Json(listed).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "message": e.to_string() })),
        )
            .into_response(),
    }
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn version() -> Json<Value> {
    let build_time_raw = option_env!("BUILD_TIME").unwrap_or("unknown");
    let build_time = match build_time_raw.parse::<i64>() {
        Ok(epoch) => chrono::DateTime::from_timestamp(epoch, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| build_time_raw.to_string()),
        Err(_) => build_time_raw.to_string(),
    };

    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "branch": option_env!("GIT_BRANCH").unwrap_or("unknown"),
        "tag": option_env!("GIT_TAG").unwrap_or("unknown"),
        "commit": option_env!("GIT_HASH").unwrap_or("unknown"),
        "build_time": build_time,
        "os": option_env!("CARGO_CFG_TARGET_OS").unwrap_or("unknown"),
    }))
}
