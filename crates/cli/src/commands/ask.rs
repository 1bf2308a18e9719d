use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use seafoodtruck_api::{InMemoryDirectory, SeattleFoodTruckClient};
use seafoodtruck_core::config::{AppConfig, LoadOptions};
use seafoodtruck_core::domain::{DayToken, Event, Location, Neighborhood, Truck};
use seafoodtruck_core::FoodTruckDirectory;
use seafoodtruck_slack::blocks::{render, MAX_BLOCKS_PER_MESSAGE};
use seafoodtruck_slack::events::{strip_mention, EventContext};
use seafoodtruck_slack::respond::Responder;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::commands::CommandResult;

/// Offline directory contents, as read from `--fixtures`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fixtures {
    pub locations: Vec<Location>,
    pub neighborhoods: Vec<Neighborhood>,
    pub events: Vec<EventFixture>,
    pub trucks: Vec<Truck>,
}

#[derive(Debug, Deserialize)]
pub struct EventFixture {
    pub location_id: String,
    #[serde(default)]
    pub day: DayToken,
    pub events: Vec<Event>,
}

impl Fixtures {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("could not read fixtures file `{}`", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("could not parse fixtures file `{}`", path.display()))
    }

    pub fn into_directory(self) -> InMemoryDirectory {
        let directory = self.locations.into_iter().fold(InMemoryDirectory::new(), |dir, location| {
            dir.with_location(location)
        });
        let directory =
            self.neighborhoods.into_iter().fold(directory, |dir, hood| dir.with_neighborhood(hood));
        let directory = self.events.into_iter().fold(directory, |dir, fixture| {
            dir.with_events(&fixture.location_id, fixture.day, fixture.events)
        });
        self.trucks.into_iter().fold(directory, |dir, truck| dir.with_truck(truck))
    }
}

pub fn run(text: &str, fixtures: Option<&Path>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("ask", "config_validation", error.to_string(), 2)
        }
    };

    let directory: Arc<dyn FoodTruckDirectory> = match fixtures {
        Some(path) => match Fixtures::load(path) {
            Ok(fixtures) => Arc::new(fixtures.into_directory()),
            Err(error) => {
                return CommandResult::failure("ask", "fixtures", format!("{error:#}"), 3)
            }
        },
        None => match SeattleFoodTruckClient::new(&config.food_truck_api) {
            Ok(client) => Arc::new(client),
            Err(error) => {
                return CommandResult::failure("ask", "directory_client", error.to_string(), 3)
            }
        },
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            )
        }
    };

    let responder = Responder::new(directory, config.broadcast.location_ids.clone());
    let ctx = EventContext { correlation_id: Uuid::new_v4().to_string() };
    let sections = runtime.block_on(responder.respond_to_text(strip_mention(text), &ctx));

    let template = render(&sections);
    let summary = template.fallback_text.clone();
    let pages = template.paginate(MAX_BLOCKS_PER_MESSAGE);
    CommandResult::success_with_data(
        "ask",
        summary,
        Some(json!({ "correlation_id": ctx.correlation_id, "pages": pages })),
    )
}
