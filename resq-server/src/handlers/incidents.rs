use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use resq_core::{Incident, IncidentId, IncidentStatus, Severity};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    infra::errors::{AppError, AppResult},
};

/// Registration of an incident accepted by an external intake.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIncidentRequest {
    pub id: String,
    pub severity: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateQuery {
    pub new_status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdateResponse {
    pub message: String,
    pub new_status: IncidentStatus,
    pub previous_status: IncidentStatus,
    pub changed: bool,
    pub delivered: usize,
}

pub async fn create_incident_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateIncidentRequest>,
) -> AppResult<(StatusCode, Json<Incident>)> {
    let id = request.id.trim();
    if id.is_empty() {
        return Err(AppError::bad_request("Incident id must not be empty"));
    }
    let severity = request.severity.parse::<Severity>()?;

    let incident = state.fanout().create(IncidentId::from(id), severity)?;
    Ok((StatusCode::CREATED, Json(incident)))
}

pub async fn list_incidents_handler(
    State(state): State<AppState>,
) -> Json<Vec<Incident>> {
    Json(state.fanout().registry().list().await)
}

pub async fn get_incident_handler(
    Path(incident_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<Incident>> {
    let incident = state
        .fanout()
        .registry()
        .get(&IncidentId::from(incident_id))
        .await?;
    Ok(Json(incident))
}

/// Dispatcher transition; the new status arrives as its wire name.
pub async fn update_status_handler(
    Path(incident_id): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<StatusUpdateQuery>,
) -> AppResult<Json<StatusUpdateResponse>> {
    let outcome = state
        .fanout()
        .apply_transition_str(&IncidentId::from(incident_id), &query.new_status)
        .await?;

    Ok(Json(StatusUpdateResponse {
        message: "Status updated".to_string(),
        new_status: outcome.incident.status,
        previous_status: outcome.previous,
        changed: outcome.changed,
        delivered: outcome.delivered,
    }))
}
