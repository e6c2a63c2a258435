use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use eatba_core::audit::AuditContext;
use eatba_core::domain::reply::ReplyPayload;
use eatba_core::flows::replies;
use eatba_core::flows::DialogEngine;
use eatba_core::session::SessionStore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::postback::decode_detail;

/// Events arriving from a transport that has already verified them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    Message { user_id: String, text: String },
    Follow { user_id: String },
    Postback { user_id: String, data: String },
    Unsupported { event_type: String },
}

impl InboundEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Message { .. } => EventType::Message,
            Self::Follow { .. } => EventType::Follow,
            Self::Postback { .. } => EventType::Postback,
            Self::Unsupported { .. } => EventType::Unsupported,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Message { user_id, .. }
            | Self::Follow { user_id }
            | Self::Postback { user_id, .. } => Some(user_id),
            Self::Unsupported { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Message,
    Follow,
    Postback,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl EventContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self { correlation_id: correlation_id.into() }
    }

    pub fn audit_context(&self, user_id: &str) -> AuditContext {
        AuditContext::new(Some(user_id.to_owned()), self.correlation_id.clone(), "line-adapter")
    }
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(ReplyPayload),
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    /// Sessions are keyed by user id, so a blank one cannot be answered.
    #[error("{event_type:?} event has a blank user id")]
    MissingUserId { event_type: EventType },
}

fn require_user_id(event_type: EventType, user_id: &str) -> Result<(), EventHandlerError> {
    if user_id.trim().is_empty() {
        return Err(EventHandlerError::MissingUserId { event_type });
    }
    Ok(())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> EventType;
    async fn handle(
        &self,
        event: &InboundEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<EventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        event: &InboundEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&event.event_type()) else {
            debug!(
                event_name = "line.event.unhandled",
                correlation_id = %ctx.correlation_id,
                event_type = ?event.event_type(),
                "no handler registered for inbound event"
            );
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(event, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Registers the message, follow and postback handlers around `service`.
pub fn dispatcher_for<S>(service: Arc<S>) -> EventDispatcher
where
    S: ConversationService + 'static,
{
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(MessageHandler::new(service));
    dispatcher.register(FollowHandler);
    dispatcher.register(PostbackHandler);
    dispatcher
}

#[async_trait]
pub trait ConversationService: Send + Sync {
    async fn respond(&self, user_id: &str, text: &str, ctx: &EventContext) -> ReplyPayload;
}

#[async_trait]
impl<S> ConversationService for DialogEngine<S>
where
    S: SessionStore + 'static,
{
    async fn respond(&self, user_id: &str, text: &str, ctx: &EventContext) -> ReplyPayload {
        DialogEngine::respond(self, user_id, text, &ctx.audit_context(user_id))
    }
}

pub struct MessageHandler<S> {
    service: Arc<S>,
}

impl<S> MessageHandler<S>
where
    S: ConversationService,
{
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for MessageHandler<S>
where
    S: ConversationService + 'static,
{
    fn event_type(&self) -> EventType {
        EventType::Message
    }

    async fn handle(
        &self,
        event: &InboundEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let InboundEvent::Message { user_id, text } = event else {
            return Ok(HandlerResult::Ignored);
        };
        require_user_id(EventType::Message, user_id)?;

        Ok(HandlerResult::Responded(self.service.respond(user_id, text, ctx).await))
    }
}

pub struct FollowHandler;

#[async_trait]
impl EventHandler for FollowHandler {
    fn event_type(&self) -> EventType {
        EventType::Follow
    }

    async fn handle(
        &self,
        event: &InboundEvent,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let InboundEvent::Follow { user_id } = event else {
            return Ok(HandlerResult::Ignored);
        };
        require_user_id(EventType::Follow, user_id)?;

        Ok(HandlerResult::Responded(replies::welcome()))
    }
}

/// Answers carousel detail buttons. Undecodable data is dropped silently.
pub struct PostbackHandler;

#[async_trait]
impl EventHandler for PostbackHandler {
    fn event_type(&self) -> EventType {
        EventType::Postback
    }

    async fn handle(
        &self,
        event: &InboundEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let InboundEvent::Postback { user_id, data } = event else {
            return Ok(HandlerResult::Ignored);
        };
        require_user_id(EventType::Postback, user_id)?;

        match decode_detail(data) {
            Ok(detail) => {
                Ok(HandlerResult::Responded(replies::detail_answer(detail.kind, &detail.value)))
            }
            Err(error) => {
                debug!(
                    event_name = "line.postback.ignored",
                    correlation_id = %ctx.correlation_id,
                    user_id = %user_id,
                    error = %error,
                    "ignoring undecodable postback data"
                );
                Ok(HandlerResult::Ignored)
            }
        }
    }
}
