use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use robo_advisor_core::verify_allocation_table;
use robo_advisor_lex::IntentDispatcher;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    dispatcher: Arc<IntentDispatcher>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub allocation_table: HealthCheck,
    pub checked_at: String,
}

pub fn router(dispatcher: Arc<IntentDispatcher>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { dispatcher })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let service = dispatcher_check(&state.dispatcher);
    let allocation_table = match verify_allocation_table() {
        Ok(()) => HealthCheck { status: "ready", detail: "allocation table verified".to_string() },
        Err(error) => HealthCheck { status: "degraded", detail: error.to_string() },
    };
    let ready = service.status == "ready" && allocation_table.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service,
        allocation_table,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn dispatcher_check(dispatcher: &IntentDispatcher) -> HealthCheck {
    let intents = dispatcher.supported_intents();
    if intents.is_empty() {
        return HealthCheck { status: "degraded", detail: "no intent handlers registered".to_string() };
    }

    HealthCheck { status: "ready", detail: format!("serving intents: {}", intents.join(", ")) }
}
