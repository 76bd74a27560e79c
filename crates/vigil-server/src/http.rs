use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use vigil_adapters::persistence::sqlite::SqliteDb;
use vigil_app::alert_service::AlertService;
use vigil_core::alert::{Alert, Severity};
use vigil_core::ids::AlertId;
use vigil_ports::outbound::Clock;
use vigil_ports::types::NewAlert;

/// The fully wired service: SQLite backs the alert store, the timer
/// queue and the event log.
pub type Service = AlertService<SqliteDb, SqliteDb, SqliteDb>;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<Service>,
    pub clock: Arc<dyn Clock>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/alerts", post(create_alert).get(list_alerts))
        .route("/alerts/:id", get(get_alert))
        .route("/alerts/:id/acknowledge", post(acknowledge_alert))
        .route("/alerts/:id/resolve", post(resolve_alert))
        .route("/alerts/:id/close", post(close_alert))
        .route("/stats", get(stats))
        .with_state(state)
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "alert not found".into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct CreateAlertRequest {
    title: String,
    message: String,
    severity: String,
    category: String,
    source: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    dedup_key: Option<String>,
    #[serde(default)]
    tags: BTreeSet<String>,
}

#[derive(Debug, Serialize)]
struct CreateAlertResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ActorRequest {
    actor: String,
    notes: Option<String>,
}

/// Accepted unconditionally: suppression and deduplication are silent,
/// the caller always gets an id back.
async fn create_alert(
    State(state): State<AppState>,
    Json(request): Json<CreateAlertRequest>,
) -> Result<(StatusCode, Json<CreateAlertResponse>), ApiError> {
    let severity = request
        .severity
        .parse::<Severity>()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let new_alert = NewAlert {
        title: request.title,
        message: request.message,
        severity,
        category: request.category,
        source: request.source,
        metadata: request.metadata,
        dedup_key: request.dedup_key,
        tags: request.tags,
    };
    let id = state.service.create(new_alert, state.clock.now()).await;
    Ok((
        StatusCode::ACCEPTED,
        Json(CreateAlertResponse { id: id.to_string() }),
    ))
}

async fn get_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Alert>, ApiError> {
    let alert_id = parse_id(&id)?;
    state
        .service
        .get(alert_id)
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

async fn list_alerts(State(state): State<AppState>) -> Json<Vec<Alert>> {
    Json(state.service.active_alerts())
}

async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Result<StatusCode, ApiError> {
    let alert_id = parse_id(&id)?;
    if state
        .service
        .acknowledge(alert_id, request.actor, state.clock.now())
        .await
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found())
    }
}

async fn resolve_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Result<StatusCode, ApiError> {
    let alert_id = parse_id(&id)?;
    if state
        .service
        .resolve(alert_id, request.actor, request.notes, state.clock.now())
        .await
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found())
    }
}

async fn close_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let alert_id = parse_id(&id)?;
    if state.service.close(alert_id, state.clock.now()).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found())
    }
}

async fn stats(State(state): State<AppState>) -> Json<vigil_ports::types::AlertStats> {
    Json(state.service.stats())
}

fn parse_id(id: &str) -> Result<AlertId, ApiError> {
    AlertId::parse(id).map_err(|e| ApiError::bad_request(e.to_string()))
}
