//! Daily "find events for today" post to the configured channel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Days, Local, NaiveDateTime, Weekday};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use seafoodtruck_core::config::{AppConfig, BroadcastConfig};
use seafoodtruck_core::DayToken;
use seafoodtruck_slack::client::{deliver, ChatPoster, PostError};
use seafoodtruck_slack::commands::BotCommand;
use seafoodtruck_slack::events::EventContext;
use seafoodtruck_slack::respond::Responder;

/// First `hour:minute` strictly after `now`, skipping Saturday and Sunday when
/// `weekdays_only` is set. `None` only if the configured time is invalid.
pub fn next_run_after(now: NaiveDateTime, schedule: &BroadcastConfig) -> Option<NaiveDateTime> {
    let mut candidate = now.date().and_hms_opt(schedule.hour, schedule.minute, 0)?;
    if candidate <= now {
        candidate = candidate.checked_add_days(Days::new(1))?;
    }
    while schedule.weekdays_only && matches!(candidate.weekday(), Weekday::Sat | Weekday::Sun) {
        candidate = candidate.checked_add_days(Days::new(1))?;
    }
    Some(candidate)
}

pub struct Broadcaster {
    responder: Arc<Responder>,
    poster: Arc<dyn ChatPoster>,
    channel: String,
    schedule: BroadcastConfig,
}

impl Broadcaster {
    pub fn new(
        responder: Arc<Responder>,
        poster: Arc<dyn ChatPoster>,
        channel: impl Into<String>,
        schedule: BroadcastConfig,
    ) -> Self {
        Self { responder, poster, channel: channel.into(), schedule }
    }

    /// `None` when the broadcast is missing a channel, locations or token.
    pub fn from_config(
        config: &AppConfig,
        responder: Arc<Responder>,
        poster: Arc<dyn ChatPoster>,
    ) -> Option<Self> {
        if !config.broadcast_ready() {
            warn!(
                event_name = "system.broadcast.disabled",
                correlation_id = "bootstrap",
                has_channel = config.broadcast.channel.is_some(),
                locations = config.broadcast.location_ids.len(),
                "daily broadcast not configured; skipping"
            );
            return None;
        }
        let channel = config.broadcast.channel.clone()?;
        Some(Self::new(responder, poster, channel, config.broadcast.clone()))
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// One broadcast, regardless of the clock. Returns the number of posts.
    pub async fn run_once(&self) -> Result<usize, PostError> {
        let ctx = EventContext { correlation_id: Uuid::new_v4().to_string() };
        info!(
            event_name = "broadcast.run.start",
            correlation_id = %ctx.correlation_id,
            channel = %self.channel,
            "running daily broadcast"
        );
        let sections =
            self.responder.respond(&BotCommand::FindEvents { day: DayToken::Today }, &ctx).await;
        let posted = deliver(self.poster.as_ref(), &self.channel, &sections, &ctx).await?;
        info!(
            event_name = "broadcast.run.finished",
            correlation_id = %ctx.correlation_id,
            channel = %self.channel,
            posts = posted,
            "daily broadcast delivered"
        );
        Ok(posted)
    }

    /// A timed run. Failures are logged and the schedule carries on.
    async fn run_scheduled(&self) -> bool {
        match self.run_once().await {
            Ok(_) => true,
            Err(error) => {
                warn!(
                    event_name = "broadcast.run.failed",
                    correlation_id = "scheduler",
                    channel = %self.channel,
                    error = %error,
                    "daily broadcast failed; waiting for next run"
                );
                false
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let now = Local::now().naive_local();
                let Some(next) = next_run_after(now, &self.schedule) else {
                    warn!(
                        event_name = "broadcast.schedule.invalid",
                        correlation_id = "scheduler",
                        hour = self.schedule.hour,
                        minute = self.schedule.minute,
                        "broadcast time cannot be scheduled; stopping"
                    );
                    return;
                };
                let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
                info!(
                    event_name = "broadcast.schedule.next",
                    correlation_id = "scheduler",
                    next_run = %next,
                    "next broadcast scheduled"
                );
                tokio::time::sleep(wait).await;

                self.run_scheduled().await;
            }
        })
    }
}
