#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum_test::TestServer;
use resq_config::Config;
use resq_core::{IncidentId, KeywordAnalyzer, Severity};
use resq_server::{AppState, create_app};

pub fn build_test_state() -> AppState {
    AppState::new(Arc::new(Config::default()), Arc::new(KeywordAnalyzer))
}

pub fn build_test_server(state: AppState) -> Result<TestServer> {
    TestServer::builder()
        .http_transport()
        .build(create_app(state))
        .map_err(|err| anyhow::anyhow!(err.to_string()))
}

pub fn seed_incident(state: &AppState, id: &str, severity: Severity) -> Result<IncidentId> {
    let id = IncidentId::from(id);
    state.fanout().create(id.clone(), severity)?;
    Ok(id)
}
