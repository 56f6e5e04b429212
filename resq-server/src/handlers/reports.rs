use axum::{
    Json,
    extract::{Multipart, Query, State},
};
use resq_core::{IncidentId, IncidentStatus, ReportAnalysis, ReportSubmission};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    infra::errors::{AppError, AppResult},
};

#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub message: String,
    pub incident_id: IncidentId,
    pub status: IncidentStatus,
    pub ai_analysis: ReportAnalysis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmsFallbackQuery {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "type")]
    pub emergency_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SmsFallbackResponse {
    pub sms_link: String,
}

pub async fn report_emergency_handler(
    State(state): State<AppState>,
    Json(submission): Json<ReportSubmission>,
) -> AppResult<Json<ReportResponse>> {
    accept_report(&state, submission).await
}

/// Form-encoded intake used by the web client: `description`, `latitude`,
/// `longitude` and any number of `files` parts. Media is not stored; its
/// presence only feeds the severity estimate.
pub async fn report_emergency_form_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ReportResponse>> {
    let mut description = None;
    let mut latitude = None;
    let mut longitude = None;
    let mut has_media = false;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "description" => description = Some(field.text().await?),
            "latitude" => {
                latitude = Some(parse_coordinate("latitude", &field.text().await?)?)
            }
            "longitude" => {
                longitude = Some(parse_coordinate("longitude", &field.text().await?)?)
            }
            "files" => {
                while let Some(chunk) = field.chunk().await? {
                    has_media |= !chunk.is_empty();
                }
            }
            _ => {}
        }
    }

    let submission = ReportSubmission {
        description: description.ok_or_else(|| missing_field("description"))?,
        latitude: latitude.ok_or_else(|| missing_field("latitude"))?,
        longitude: longitude.ok_or_else(|| missing_field("longitude"))?,
        has_media,
    };
    accept_report(&state, submission).await
}

async fn accept_report(
    state: &AppState,
    submission: ReportSubmission,
) -> AppResult<Json<ReportResponse>> {
    validate_submission(&submission)?;

    let receipt = state.intake().submit(submission).await?;

    Ok(Json(ReportResponse {
        message: "Report received".to_string(),
        incident_id: receipt.incident.id,
        status: receipt.incident.status,
        ai_analysis: receipt.analysis,
    }))
}

fn parse_coordinate(name: &str, raw: &str) -> AppResult<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| AppError::bad_request(format!("{name} is not a number: {raw:?}")))
}

fn missing_field(name: &str) -> AppError {
    AppError::bad_request(format!("Missing form field: {name}"))
}

/// Pre-filled SMS link for reporters without a data connection.
pub async fn sms_fallback_handler(
    Query(query): Query<SmsFallbackQuery>,
) -> AppResult<Json<SmsFallbackResponse>> {
    validate_coordinates(query.latitude, query.longitude)?;

    let message = format!(
        "EMERGENCY! Location: https://maps.google.com/?q={},{}. Type: {}. Please send help!",
        query.latitude, query.longitude, query.emergency_type
    );
    Ok(Json(SmsFallbackResponse {
        sms_link: format!("sms:?&body={message}"),
    }))
}

fn validate_submission(submission: &ReportSubmission) -> AppResult<()> {
    if submission.description.trim().is_empty() {
        return Err(AppError::bad_request("Description must not be empty"));
    }
    validate_coordinates(submission.latitude, submission.longitude)
}

fn validate_coordinates(latitude: f64, longitude: f64) -> AppResult<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::bad_request(format!(
            "Latitude out of range: {latitude}"
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::bad_request(format!(
            "Longitude out of range: {longitude}"
        )));
    }
    Ok(())
}
