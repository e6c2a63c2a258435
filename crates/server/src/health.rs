use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use eatba_core::catalog::Catalog;
use eatba_core::domain::item::MealTime;
use eatba_core::session::SessionStore;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    pub catalog: Arc<Catalog>,
    pub sessions: Arc<dyn SessionStore>,
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
    pub catalog: HealthCheck,
    pub active_sessions: usize,
    pub checked_at: String,
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = catalog_check(&state.catalog);
    let ready = catalog.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "eatba-server runtime initialized".to_string(),
        },
        catalog,
        active_sessions: state.sessions.len(),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn catalog_check(catalog: &Catalog) -> HealthCheck {
    let missing: Vec<&str> = MealTime::ALL
        .into_iter()
        .filter(|category| catalog.groups_of(*category).is_err())
        .map(MealTime::as_str)
        .collect();

    if missing.is_empty() {
        HealthCheck {
            status: "ready",
            detail: format!("{} restaurants loaded", catalog.item_count()),
        }
    } else {
        HealthCheck {
            status: "degraded",
            detail: format!("missing meal times: {}", missing.join(", ")),
        }
    }
}
