use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use seafoodtruck_core::{DayToken, FoodTruckDirectory};

#[derive(Clone)]
pub struct HealthState {
    pub directory: Arc<dyn FoodTruckDirectory>,
    /// Location used to check that the food truck API answers.
    pub probe_location: Option<String>,
    pub broadcast_ready: bool,
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
    pub directory: HealthCheck,
    pub broadcast: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let directory = directory_check(&state).await;
    let ready = directory.status != "degraded";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "seafoodtruck-server runtime initialized".to_string(),
        },
        directory,
        broadcast: if state.broadcast_ready {
            HealthCheck { status: "ready", detail: "daily broadcast scheduled".to_string() }
        } else {
            HealthCheck {
                status: "disabled",
                detail: "broadcast channel, locations or bot token not configured".to_string(),
            }
        },
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn directory_check(state: &HealthState) -> HealthCheck {
    let Some(location_id) = state.probe_location.as_deref() else {
        return HealthCheck { status: "skipped", detail: "no location configured".to_string() };
    };

    match state.directory.get_events(location_id, DayToken::Today).await {
        Ok(events) => HealthCheck {
            status: "ready",
            detail: format!("location {location_id} returned {} event(s)", events.len()),
        },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("events lookup failed: {error}") }
        }
    }
}
