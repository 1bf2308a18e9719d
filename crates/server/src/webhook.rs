use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use seafoodtruck_core::{DayToken, FoodTruckDirectory};
use seafoodtruck_slack::events::{EventContext, EventDispatcher, HandlerResult, InboundEvent};

#[derive(Clone)]
pub struct WebhookState {
    pub dispatcher: Arc<EventDispatcher>,
    pub directory: Arc<dyn FoodTruckDirectory>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub git_commit: &'static str,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub id: Option<String>,
    pub day: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(version).post(slack_events))
        .route("/events", get(events))
        .with_state(state)
}

pub async fn version() -> Json<VersionInfo> {
    Json(VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_commit: option_env!("GIT_COMMIT").unwrap_or("unknown"),
    })
}

/// Events API endpoint. Mentions are acknowledged at once and answered on a
/// separate task.
pub async fn slack_events(State(state): State<WebhookState>, body: Bytes) -> Response {
    let event = match InboundEvent::from_slice(&body) {
        Ok(event) => event,
        Err(error) => {
            warn!(
                event_name = "ingress.slack.decode_failed",
                correlation_id = "unknown",
                error = %error,
                "rejecting undecodable slack payload"
            );
            return (StatusCode::BAD_REQUEST, error.to_string()).into_response();
        }
    };
    let ctx = EventContext::for_event(&event);

    match &event {
        InboundEvent::UrlChallenge { .. } => {
            match state.dispatcher.dispatch(&event, &ctx).await {
                Ok(HandlerResult::Challenge(challenge)) => {
                    info!(
                        event_name = "ingress.slack.url_verification",
                        correlation_id = %ctx.correlation_id,
                        "answering url verification"
                    );
                    (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], challenge)
                        .into_response()
                }
                Ok(_) => StatusCode::OK.into_response(),
                Err(error) => {
                    warn!(
                        event_name = "ingress.slack.dispatch_failed",
                        correlation_id = %ctx.correlation_id,
                        error = %error,
                        "url verification failed"
                    );
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
        InboundEvent::Mention(mention) => {
            info!(
                event_name = "ingress.slack.mention_accepted",
                correlation_id = %ctx.correlation_id,
                channel = %mention.channel,
                "mention accepted"
            );
            let dispatcher = state.dispatcher.clone();
            let event = event.clone();
            tokio::spawn(async move {
                if let Err(error) = dispatcher.dispatch(&event, &ctx).await {
                    warn!(
                        event_name = "slack.mention.failed",
                        correlation_id = %ctx.correlation_id,
                        error = %error,
                        "mention handling failed"
                    );
                }
            });
            StatusCode::OK.into_response()
        }
        InboundEvent::Unsupported { event_type } => {
            debug!(
                event_name = "ingress.slack.unsupported",
                correlation_id = %ctx.correlation_id,
                event_type = %event_type,
                "ignoring unsupported slack event"
            );
            StatusCode::OK.into_response()
        }
    }
}

/// JSON view of one location's events, for checking the directory without
/// going through Slack.
pub async fn events(
    State(state): State<WebhookState>,
    Query(query): Query<EventsQuery>,
) -> Response {
    let Some(id) = query.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody { error: "query parameter `id` is required".to_owned(), detail: None }),
        )
            .into_response();
    };
    let day = DayToken::from_token(query.day.as_deref());

    match state.directory.get_events(id, day).await {
        Ok(events) => Json(events).into_response(),
        Err(error) => {
            warn!(
                event_name = "http.events.lookup_failed",
                correlation_id = "unknown",
                location_id = id,
                error = %error,
                "events lookup failed"
            );
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody {
                    error: error.user_message().to_owned(),
                    detail: Some(error.to_string()),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    use seafoodtruck_api::InMemoryDirectory;
    use seafoodtruck_core::domain::{DayToken, Event};
    use seafoodtruck_slack::blocks::MessageTemplate;
    use seafoodtruck_slack::client::{ChatPoster, PostError};
    use seafoodtruck_slack::events::default_dispatcher;
    use seafoodtruck_slack::respond::Responder;

    use super::{router, WebhookState};

    #[derive(Default)]
    struct RecordingPoster {
        posted: Mutex<Vec<(String, MessageTemplate)>>,
    }

    #[async_trait]
    impl ChatPoster for RecordingPoster {
        async fn post_message(
            &self,
            channel: &str,
            message: &MessageTemplate,
        ) -> Result<(), PostError> {
            self.posted.lock().await.push((channel.to_owned(), message.clone()));
            Ok(())
        }
    }

    fn event(id: u64) -> Event {
        Event {
            id,
            name: "Lunch".to_owned(),
            start_time: "2026-10-19T11:00:00-07:00".to_owned(),
            end_time: "2026-10-19T14:00:00-07:00".to_owned(),
            bookings: Vec::new(),
            waitlist: Vec::new(),
        }
    }

    fn app(poster: Arc<RecordingPoster>) -> Router {
        let directory: Arc<InMemoryDirectory> = Arc::new(
            InMemoryDirectory::new().with_events("123", DayToken::Tomorrow, vec![event(7)]),
        );
        let responder = Arc::new(Responder::new(directory.clone(), vec!["123".to_owned()]));
        router(WebhookState {
            dispatcher: Arc::new(default_dispatcher(responder, poster)),
            directory,
        })
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .expect("request")
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    #[tokio::test]
    async fn url_verification_echoes_challenge_as_plain_text() {
        let response = app(Arc::default())
            .oneshot(post_json(r#"{"type":"url_verification","challenge":"abc123"}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).and_then(|value| value.to_str().ok()),
            Some("text/plain")
        );
        assert_eq!(body_text(response).await, "abc123");
    }

    #[tokio::test]
    async fn undecodable_payload_is_rejected() {
        let response = app(Arc::default()).oneshot(post_json("{not json")).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unsupported_events_are_acknowledged() {
        let response = app(Arc::default())
            .oneshot(post_json(r#"{"type":"event_callback","event":{"type":"reaction_added"}}"#))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn mention_is_acknowledged_then_answered_in_background() {
        let poster = Arc::new(RecordingPoster::default());
        let response = app(poster.clone())
            .oneshot(post_json(
                r#"{"type":"event_callback","event_id":"Ev1",
                    "event":{"type":"app_mention","channel":"C9","user":"U1","text":"<@U0BOT> help"}}"#,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        for _ in 0..50 {
            if !poster.posted.lock().await.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let posted = poster.posted.lock().await;
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].0, "C9");
        assert!(posted[0].1.fallback_text.starts_with("You can ask me"));
    }

    #[tokio::test]
    async fn version_route_reports_package_version() {
        let response = app(Arc::default())
            .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_str(&body_text(response).await).expect("json body");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["git_commit"].is_string());
    }

    #[tokio::test]
    async fn events_route_returns_directory_events() {
        let response = app(Arc::default())
            .oneshot(
                Request::builder().uri("/events?id=123&day=tomorrow").body(Body::empty()).expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_str(&body_text(response).await).expect("json body");
        assert_eq!(body[0]["id"], 7);
    }

    #[tokio::test]
    async fn events_route_requires_id() {
        let response = app(Arc::default())
            .oneshot(Request::builder().uri("/events?day=today").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
