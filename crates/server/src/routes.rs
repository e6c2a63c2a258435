use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use eatba_core::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use eatba_line::events::{EventContext, EventDispatcher, HandlerResult, InboundEvent};
use eatba_line::messages::{render, LineMessage};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::health::{health, HealthState};

pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct EventsState {
    pub dispatcher: Arc<EventDispatcher>,
    pub audit_sink: Arc<dyn AuditSink>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventsResponse {
    pub correlation_id: String,
    pub messages: Vec<LineMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn router(health_state: HealthState, events_state: EventsState) -> Router {
    Router::new()
        .route("/health", get(health).with_state(health_state))
        .route("/events", post(events).with_state(events_state))
}

pub async fn events(
    State(state): State<EventsState>,
    headers: HeaderMap,
    Json(event): Json<InboundEvent>,
) -> (StatusCode, Json<EventsResponse>) {
    let correlation_id = correlation_id(&headers);
    let ctx = EventContext::new(correlation_id.clone());

    match state.dispatcher.dispatch(&event, &ctx).await {
        Ok(result) => {
            let messages = match result {
                HandlerResult::Responded(reply) => vec![render(&reply)],
                HandlerResult::Ignored => Vec::new(),
            };
            info!(
                event_name = "system.ingress.event_handled",
                correlation_id = %correlation_id,
                user_id = event.user_id().unwrap_or("unknown"),
                event_type = ?event.event_type(),
                messages = messages.len(),
                "inbound event handled"
            );
            (StatusCode::OK, Json(EventsResponse { correlation_id, messages, error: None }))
        }
        Err(dispatch_error) => {
            warn!(
                event_name = "system.ingress.event_rejected",
                correlation_id = %correlation_id,
                event_type = ?event.event_type(),
                error = %dispatch_error,
                "inbound event rejected"
            );
            state.audit_sink.emit(
                AuditEvent::new(
                    &ctx.audit_context(event.user_id().unwrap_or_default()),
                    "ingress.event_rejected",
                    AuditCategory::Ingress,
                    AuditOutcome::Rejected,
                )
                .with_metadata("event_type", format!("{:?}", event.event_type()))
                .with_metadata("error", dispatch_error.to_string()),
            );
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(EventsResponse {
                    correlation_id,
                    messages: Vec::new(),
                    error: Some(dispatch_error.to_string()),
                }),
            )
        }
    }
}

fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
