use std::sync::Arc;

use seafoodtruck_api::{ClientBuildError, SeattleFoodTruckClient};
use seafoodtruck_core::config::{AppConfig, ConfigError, LoadOptions};
use seafoodtruck_core::FoodTruckDirectory;
use seafoodtruck_slack::client::{ChatPoster, PostError, SlackWebClient};
use seafoodtruck_slack::events::{default_dispatcher, EventDispatcher};
use seafoodtruck_slack::respond::Responder;
use thiserror::Error;
use tracing::info;

use crate::health::HealthState;
use crate::webhook::WebhookState;

pub struct Application {
    pub config: AppConfig,
    pub directory: Arc<dyn FoodTruckDirectory>,
    pub responder: Arc<Responder>,
    pub poster: Arc<dyn ChatPoster>,
    pub dispatcher: Arc<EventDispatcher>,
}

impl Application {
    pub fn webhook_state(&self) -> WebhookState {
        WebhookState { dispatcher: self.dispatcher.clone(), directory: self.directory.clone() }
    }

    pub fn health_state(&self) -> HealthState {
        HealthState {
            directory: self.directory.clone(),
            probe_location: self.config.broadcast.location_ids.first().cloned(),
            broadcast_ready: self.config.broadcast_ready(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("slack.bot_token is required to answer mentions (set SEAFOODTRUCK_SLACK_BOT_TOKEN or TOKEN)")]
    MissingBotToken,
    #[error("food truck api client setup failed: {0}")]
    Directory(#[from] ClientBuildError),
    #[error("slack client setup failed: {0}")]
    Slack(#[source] PostError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    if !config.has_bot_token() {
        return Err(BootstrapError::MissingBotToken);
    }

    let directory: Arc<dyn FoodTruckDirectory> =
        Arc::new(SeattleFoodTruckClient::new(&config.food_truck_api)?);
    info!(
        event_name = "system.bootstrap.directory_ready",
        correlation_id = "bootstrap",
        base_url = %config.food_truck_api.base_url(),
        "food truck api client configured"
    );

    let poster: Arc<dyn ChatPoster> =
        Arc::new(SlackWebClient::new(&config.slack).map_err(BootstrapError::Slack)?);
    let responder =
        Arc::new(Responder::new(directory.clone(), config.broadcast.location_ids.clone()));
    let dispatcher = Arc::new(default_dispatcher(responder.clone(), poster.clone()));
    info!(
        event_name = "system.bootstrap.slack_ready",
        correlation_id = "bootstrap",
        handlers = dispatcher.handler_count(),
        locations = config.broadcast.location_ids.len(),
        "slack event handlers registered"
    );

    Ok(Application { config, directory, responder, poster, dispatcher })
}
