use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    client::{deliver, ChatPoster, PostError},
    respond::Responder,
};

const URL_VERIFICATION: &str = "url_verification";
const EVENT_CALLBACK: &str = "event_callback";
const APP_MENTION: &str = "app_mention";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentionEvent {
    pub event_id: String,
    pub channel: String,
    pub user: Option<String>,
    pub text: String,
}

/// Everything the Events API webhook can deliver, closed over the cases the
/// bot acts on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    UrlChallenge { challenge: String },
    Mention(MentionEvent),
    Unsupported { event_type: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InboundEventType {
    UrlChallenge,
    Mention,
    Unsupported,
}

#[derive(Debug, Error)]
#[error("slack event payload could not be decoded: {0}")]
pub struct EventDecodeError(#[from] serde_json::Error);

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    challenge: Option<String>,
    #[serde(default)]
    event_id: Option<String>,
    #[serde(default)]
    event: Option<RawEvent>,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl InboundEvent {
    pub fn from_slice(body: &[u8]) -> Result<Self, EventDecodeError> {
        let raw: RawEnvelope = serde_json::from_slice(body)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawEnvelope) -> Self {
        match (raw.kind.as_str(), raw.challenge, raw.event) {
            (URL_VERIFICATION, Some(challenge), _) => Self::UrlChallenge { challenge },
            (EVENT_CALLBACK, _, Some(event)) if event.kind == APP_MENTION => {
                match (event.channel, event.text) {
                    (Some(channel), Some(text)) => Self::Mention(MentionEvent {
                        event_id: raw.event_id.unwrap_or_default(),
                        channel,
                        user: event.user,
                        text,
                    }),
                    _ => Self::Unsupported { event_type: event.kind },
                }
            }
            (EVENT_CALLBACK, _, Some(event)) => Self::Unsupported { event_type: event.kind },
            (kind, _, _) => Self::Unsupported { event_type: kind.to_owned() },
        }
    }

    pub fn event_type(&self) -> InboundEventType {
        match self {
            Self::UrlChallenge { .. } => InboundEventType::UrlChallenge,
            Self::Mention(_) => InboundEventType::Mention,
            Self::Unsupported { .. } => InboundEventType::Unsupported,
        }
    }
}

/// Drops leading `<@U…>` mention tokens and surrounding whitespace.
pub fn strip_mention(text: &str) -> &str {
    let mut rest = text.trim_start();
    while rest.starts_with("<@") {
        match rest.find('>') {
            Some(end) => rest = rest[end + 1..].trim_start(),
            None => break,
        }
    }
    rest.trim()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

impl EventContext {
    pub fn for_event(event: &InboundEvent) -> Self {
        match event {
            InboundEvent::Mention(mention) if !mention.event_id.is_empty() => {
                Self { correlation_id: mention.event_id.clone() }
            }
            _ => Self::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Challenge(String),
    Posted { messages: usize },
    Ignored,
}

#[derive(Debug, Error)]
pub enum EventHandlerError {
    #[error(transparent)]
    Post(#[from] PostError),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> InboundEventType;
    async fn handle(
        &self,
        event: &InboundEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<InboundEventType, Arc<dyn EventHandler>>,
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
                event_name = "slack.event.ignored",
                correlation_id = %ctx.correlation_id,
                event_type = ?event.event_type(),
                "no handler registered"
            );
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(event, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn default_dispatcher(responder: Arc<Responder>, poster: Arc<dyn ChatPoster>) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(UrlChallengeHandler);
    dispatcher.register(MentionHandler::new(responder, poster));
    dispatcher
}

pub struct UrlChallengeHandler;

#[async_trait]
impl EventHandler for UrlChallengeHandler {
    fn event_type(&self) -> InboundEventType {
        InboundEventType::UrlChallenge
    }

    async fn handle(
        &self,
        event: &InboundEvent,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let InboundEvent::UrlChallenge { challenge } = event else {
            return Ok(HandlerResult::Ignored);
        };
        Ok(HandlerResult::Challenge(challenge.clone()))
    }
}

/// Answers a mention in the channel it came from.
pub struct MentionHandler {
    responder: Arc<Responder>,
    poster: Arc<dyn ChatPoster>,
}

impl MentionHandler {
    pub fn new(responder: Arc<Responder>, poster: Arc<dyn ChatPoster>) -> Self {
        Self { responder, poster }
    }
}

#[async_trait]
impl EventHandler for MentionHandler {
    fn event_type(&self) -> InboundEventType {
        InboundEventType::Mention
    }

    async fn handle(
        &self,
        event: &InboundEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let InboundEvent::Mention(mention) = event else {
            return Ok(HandlerResult::Ignored);
        };

        let text = strip_mention(&mention.text);
        info!(
            event_name = "slack.mention.received",
            correlation_id = %ctx.correlation_id,
            channel = %mention.channel,
            user = mention.user.as_deref().unwrap_or("unknown"),
            text = %text,
            "handling mention"
        );

        let sections = self.responder.respond_to_text(text, ctx).await;
        let messages = deliver(self.poster.as_ref(), &mention.channel, &sections, ctx).await?;
        Ok(HandlerResult::Posted { messages })
    }
}
