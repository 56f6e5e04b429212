use anyhow::Result;
use axum::http::StatusCode;
use resq_core::{IncidentStatus, Severity};
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{Value, json};

#[path = "support/mod.rs"]
mod support;

use support::{build_test_server, build_test_state, seed_incident};

#[tokio::test]
async fn create_then_fetch_incident() -> Result<()> {
    let server = build_test_server(build_test_state())?;

    let created = server
        .post("/api/v1/incidents")
        .json(&json!({ "id": "I-1", "severity": "High" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let body: Value = created.json();
    assert_eq!(body["id"], "I-1");
    assert_eq!(body["status"], "Request Received");
    assert_eq!(body["severity"], "High");

    let fetched = server.get("/api/v1/incidents/I-1").await;
    fetched.assert_status_ok();
    assert_eq!(fetched.json::<Value>()["status"], "Request Received");
    Ok(())
}

#[tokio::test]
async fn create_rejects_duplicates_and_bad_input() -> Result<()> {
    let server = build_test_server(build_test_state())?;

    server
        .post("/api/v1/incidents")
        .json(&json!({ "id": "I-1", "severity": "Low" }))
        .await
        .assert_status(StatusCode::CREATED);

    let duplicate = server
        .post("/api/v1/incidents")
        .json(&json!({ "id": "I-1", "severity": "Low" }))
        .await;
    duplicate.assert_status(StatusCode::CONFLICT);
    assert_eq!(duplicate.json::<Value>()["error"]["status"], 409);

    server
        .post("/api/v1/incidents")
        .json(&json!({ "id": "I-2", "severity": "Apocalyptic" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .post("/api/v1/incidents")
        .json(&json!({ "id": "  ", "severity": "Low" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn unknown_incident_is_404() -> Result<()> {
    let server = build_test_server(build_test_state())?;

    server
        .get("/api/v1/incidents/I-404")
        .await
        .assert_status_not_found();

    server
        .patch("/api/v1/incidents/I-404/status")
        .add_query_param("new_status", "Resolved")
        .await
        .assert_status_not_found();
    Ok(())
}

#[tokio::test]
async fn list_is_newest_first() -> Result<()> {
    let state = build_test_state();
    seed_incident(&state, "I-a", Severity::Low)?;
    seed_incident(&state, "I-b", Severity::High)?;
    let server = build_test_server(state)?;

    let listed = server.get("/api/v1/incidents").await;
    listed.assert_status_ok();
    let body: Value = listed.json();
    let ids: Vec<&str> = body
        .as_array()
        .expect("array body")
        .iter()
        .filter_map(|incident| incident["id"].as_str())
        .collect();
    assert_eq!(ids, ["I-b", "I-a"]);

    let legacy = server.get("/incidents/").await;
    legacy.assert_status_ok();
    assert_eq!(legacy.json::<Value>().as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn status_update_reports_previous_and_new() -> Result<()> {
    let state = build_test_state();
    let id = seed_incident(&state, "I-1", Severity::Critical)?;
    let server = build_test_server(state.clone())?;

    let response = server
        .patch("/api/v1/incidents/I-1/status")
        .add_query_param("new_status", "Team Dispatched")
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "message": "Status updated",
        "new_status": "Team Dispatched",
        "previous_status": "Request Received",
        "changed": true,
        "delivered": 0,
    }));

    let again = server
        .patch("/incidents/I-1/status")
        .add_query_param("new_status", "Team Dispatched")
        .await;
    again.assert_status_ok();
    assert_eq!(again.json::<Value>()["changed"], false);

    assert_eq!(
        state.fanout().registry().get(&id).await?.status,
        IncidentStatus::Dispatched
    );
    Ok(())
}

#[tokio::test]
async fn backward_and_unknown_statuses_are_unprocessable() -> Result<()> {
    let state = build_test_state();
    let id = seed_incident(&state, "I-1", Severity::Medium)?;
    state
        .fanout()
        .apply_transition(&id, IncidentStatus::EnRoute)
        .await?;
    let server = build_test_server(state.clone())?;

    let backward = server
        .patch("/api/v1/incidents/I-1/status")
        .add_query_param("new_status", "Preparing")
        .await;
    backward.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let unknown = server
        .patch("/api/v1/incidents/I-1/status")
        .add_query_param("new_status", "Cancelled")
        .await;
    unknown.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(unknown.json::<Value>()["error"]["code"], "unknown_status");
    let message = unknown.json::<Value>()["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    assert!(message.contains("Cancelled"), "message was {message:?}");

    assert_eq!(
        state.fanout().registry().get(&id).await?.status,
        IncidentStatus::EnRoute
    );
    Ok(())
}

#[tokio::test]
async fn report_intake_classifies_and_registers() -> Result<()> {
    let state = build_test_state();
    let server = build_test_server(state.clone())?;

    let response = server
        .post("/api/v1/reports")
        .json(&json!({
            "description": "Massive fire in the building, people hurt",
            "latitude": 12.97,
            "longitude": 77.59,
            "has_media": true
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Report received");
    assert_eq!(body["status"], "Request Received");
    assert_eq!(body["ai_analysis"]["detected_type"], "Fire Station, Ambulance");
    assert_eq!(body["ai_analysis"]["severity"], "Critical");

    let incident_id = body["incident_id"].as_str().expect("incident id");
    let fetched = server.get(&format!("/api/v1/incidents/{incident_id}")).await;
    fetched.assert_status_ok();
    let incident: Value = fetched.json();
    assert_eq!(incident["severity"], "Critical");
    assert_eq!(incident["report"]["has_media"], true);
    assert_eq!(state.fanout().registry().len(), 1);
    Ok(())
}

#[tokio::test]
async fn legacy_report_form_accepts_fields_and_files() -> Result<()> {
    let state = build_test_state();
    let server = build_test_server(state.clone())?;

    let form = MultipartForm::new()
        .add_text("description", "Tree blocking the road")
        .add_text("latitude", "12.97")
        .add_text("longitude", "77.59")
        .add_part(
            "files",
            Part::bytes(vec![0xff, 0xd8, 0xff, 0xe0])
                .file_name("scene.jpg")
                .mime_type("image/jpeg"),
        );
    let response = server.post("/report/").multipart(form).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ai_analysis"]["detected_type"], "General");
    assert_eq!(body["ai_analysis"]["severity"], "High");

    let incident_id = body["incident_id"].as_str().expect("incident id");
    let incident: Value = server
        .get(&format!("/api/v1/incidents/{incident_id}"))
        .await
        .json();
    assert_eq!(incident["report"]["has_media"], true);
    assert_eq!(incident["report"]["latitude"], 12.97);

    let without_media = server
        .post("/report")
        .multipart(
            MultipartForm::new()
                .add_text("description", "Tree blocking the road")
                .add_text("latitude", "12.97")
                .add_text("longitude", "77.59"),
        )
        .await;
    without_media.assert_status_ok();
    assert_eq!(
        without_media.json::<Value>()["ai_analysis"]["severity"],
        "Medium"
    );
    Ok(())
}

#[tokio::test]
async fn legacy_report_form_requires_location() -> Result<()> {
    let state = build_test_state();
    let server = build_test_server(state.clone())?;

    server
        .post("/report/")
        .multipart(MultipartForm::new().add_text("description", "smoke"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .post("/report/")
        .multipart(
            MultipartForm::new()
                .add_text("description", "smoke")
                .add_text("latitude", "north")
                .add_text("longitude", "77.59"),
        )
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    assert!(state.fanout().registry().is_empty());
    Ok(())
}

#[tokio::test]
async fn report_intake_validates_input() -> Result<()> {
    let state = build_test_state();
    let server = build_test_server(state.clone())?;

    server
        .post("/api/v1/reports")
        .json(&json!({ "description": "smoke", "latitude": 123.0, "longitude": 0.0 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .post("/api/v1/reports")
        .json(&json!({ "description": "   ", "latitude": 1.0, "longitude": 1.0 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    assert!(state.fanout().registry().is_empty());
    Ok(())
}

#[tokio::test]
async fn sms_fallback_builds_prefilled_link() -> Result<()> {
    let server = build_test_server(build_test_state())?;

    let response = server
        .post("/sms-fallback/")
        .add_query_param("latitude", 12.5)
        .add_query_param("longitude", 77.25)
        .add_query_param("type", "Fire")
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "sms_link": "sms:?&body=EMERGENCY! Location: https://maps.google.com/?q=12.5,77.25. Type: Fire. Please send help!"
    }));
    Ok(())
}

#[tokio::test]
async fn ping_and_health() -> Result<()> {
    let state = build_test_state();
    seed_incident(&state, "I-1", Severity::Low)?;
    let server = build_test_server(state)?;

    let ping = server.get("/ping").await;
    ping.assert_status_ok();
    assert_eq!(ping.json::<Value>()["status"], "ok");

    let health = server.get("/health").await;
    health.assert_status_ok();
    let body: Value = health.json();
    assert_eq!(body["checks"]["registry"]["incidents"], 1);
    assert_eq!(body["checks"]["subscriptions"]["watchers"], 0);
    Ok(())
}
