use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use seafoodtruck_core::config::SlackConfig;

use crate::blocks::{render, Block, MessageSection, MessageTemplate, MAX_BLOCKS_PER_MESSAGE};
use crate::events::EventContext;

const POST_MESSAGE_METHOD: &str = "chat.postMessage";
const POST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PostError {
    #[error("slack request failed: {0}")]
    Http(String),
    #[error("slack responded with status {0}")]
    Status(u16),
    #[error("slack rejected the message: {0}")]
    Api(String),
}

/// Write-only sink for rendered messages.
#[async_trait]
pub trait ChatPoster: Send + Sync {
    async fn post_message(&self, channel: &str, message: &MessageTemplate)
        -> Result<(), PostError>;
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    blocks: &'a [Block],
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// `chat.postMessage` over the Slack Web API with a bot token.
pub struct SlackWebClient {
    http: Client,
    endpoint: String,
    bot_token: SecretString,
}

impl SlackWebClient {
    pub fn new(config: &SlackConfig) -> Result<Self, PostError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(POST_TIMEOUT_SECS))
            .build()
            .map_err(|error| PostError::Http(error.to_string()))?;
        Ok(Self::with_http_client(&config.api_base_url, config.bot_token.clone(), http))
    }

    pub fn with_http_client(api_base_url: &str, bot_token: SecretString, http: Client) -> Self {
        let endpoint = format!("{}/{POST_MESSAGE_METHOD}", api_base_url.trim_end_matches('/'));
        Self { http, endpoint, bot_token }
    }
}

#[async_trait]
impl ChatPoster for SlackWebClient {
    async fn post_message(
        &self,
        channel: &str,
        message: &MessageTemplate,
    ) -> Result<(), PostError> {
        let request = PostMessageRequest {
            channel,
            text: &message.fallback_text,
            blocks: &message.blocks,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.bot_token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|error| PostError::Http(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PostError::Status(status.as_u16()));
        }

        let body: PostMessageResponse =
            response.json().await.map_err(|error| PostError::Http(error.to_string()))?;
        if body.ok {
            Ok(())
        } else {
            Err(PostError::Api(body.error.unwrap_or_else(|| "unknown_error".to_owned())))
        }
    }
}

/// Renders `sections`, splits at the block limit and posts the pages in
/// order. Stops at the first failed post.
pub async fn deliver(
    poster: &dyn ChatPoster,
    channel: &str,
    sections: &[MessageSection],
    ctx: &EventContext,
) -> Result<usize, PostError> {
    let pages = render(sections).paginate(MAX_BLOCKS_PER_MESSAGE);
    let total = pages.len();

    for (index, page) in pages.iter().enumerate() {
        if let Err(error) = poster.post_message(channel, page).await {
            warn!(
                event_name = "slack.post.failed",
                correlation_id = %ctx.correlation_id,
                channel = %channel,
                page = index + 1,
                pages = total,
                error = %error,
                "failed to post message"
            );
            return Err(error);
        }
        debug!(
            event_name = "slack.post.sent",
            correlation_id = %ctx.correlation_id,
            channel = %channel,
            page = index + 1,
            pages = total,
            blocks = page.blocks.len(),
            "posted message"
        );
    }
    Ok(total)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use httpmock::prelude::*;
    use secrecy::SecretString;
    use serde_json::json;
    use tokio::sync::Mutex;

    use super::{deliver, ChatPoster, PostError, SlackWebClient};
    use crate::blocks::{render, MessageSection, MessageTemplate};
    use crate::events::EventContext;

    #[derive(Default)]
    pub(crate) struct RecordingPoster {
        state: Mutex<RecordingState>,
    }

    #[derive(Default)]
    struct RecordingState {
        results: VecDeque<Result<(), PostError>>,
        posted: Vec<(String, MessageTemplate)>,
    }

    impl RecordingPoster {
        pub(crate) fn with_results(results: Vec<Result<(), PostError>>) -> Self {
            Self {
                state: Mutex::new(RecordingState { results: results.into(), posted: Vec::new() }),
            }
        }

        pub(crate) async fn posted(&self) -> Vec<(String, MessageTemplate)> {
            self.state.lock().await.posted.clone()
        }
    }

    #[async_trait]
    impl ChatPoster for RecordingPoster {
        async fn post_message(
            &self,
            channel: &str,
            message: &MessageTemplate,
        ) -> Result<(), PostError> {
            let mut state = self.state.lock().await;
            state.posted.push((channel.to_owned(), message.clone()));
            state.results.pop_front().unwrap_or(Ok(()))
        }
    }

    fn many_sections(count: usize) -> Vec<MessageSection> {
        (0..count).map(|index| MessageSection::text(format!("row {index}"))).collect()
    }

    #[tokio::test]
    async fn deliver_posts_pages_in_order() {
        let poster = RecordingPoster::default();

        let pages = deliver(&poster, "C1", &many_sections(75), &EventContext::default())
            .await
            .expect("deliver");

        let posted = poster.posted().await;
        assert_eq!(pages, 2);
        assert_eq!(posted[0].1.blocks.len(), 50);
        assert_eq!(posted[1].1.blocks.len(), 25);
        assert!(posted.iter().all(|(channel, _)| channel == "C1"));
    }

    #[tokio::test]
    async fn deliver_stops_after_first_failure() {
        let poster = RecordingPoster::with_results(vec![Err(PostError::Api(
            "channel_not_found".to_owned(),
        ))]);

        let error = deliver(&poster, "C1", &many_sections(120), &EventContext::default())
            .await
            .expect_err("post should fail");

        assert_eq!(error, PostError::Api("channel_not_found".to_owned()));
        assert_eq!(poster.posted().await.len(), 1);
    }

    #[tokio::test]
    async fn web_client_posts_blocks_with_bearer_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/chat.postMessage")
                    .header("authorization", "Bearer xoxb-test")
                    .json_body(json!({
                        "channel": "C1",
                        "text": "hello",
                        "blocks": [{"type": "section", "text": {"type": "mrkdwn", "text": "hello"}}]
                    }));
                then.status(200).json_body(json!({"ok": true, "ts": "1.2"}));
            })
            .await;
        let client = SlackWebClient::with_http_client(
            &server.url("/api/"),
            SecretString::from("xoxb-test".to_owned()),
            reqwest::Client::new(),
        );

        client
            .post_message("C1", &render(&[MessageSection::text("hello")]))
            .await
            .expect("post");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn web_client_surfaces_api_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat.postMessage");
                then.status(200).json_body(json!({"ok": false, "error": "not_in_channel"}));
            })
            .await;
        let client = SlackWebClient::with_http_client(
            &server.base_url(),
            SecretString::from("xoxb-test".to_owned()),
            reqwest::Client::new(),
        );

        let error = client
            .post_message("C1", &render(&[MessageSection::text("hello")]))
            .await
            .expect_err("api error");

        assert_eq!(error, PostError::Api("not_in_channel".to_owned()));
    }
}
