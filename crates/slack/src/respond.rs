use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use seafoodtruck_core::domain::{DayToken, LocationWithEvents};
use seafoodtruck_core::errors::{CommandError, LookupError, Resource};
use seafoodtruck_core::FoodTruckDirectory;

use crate::blocks::MessageSection;
use crate::commands::{interpret, BotCommand};
use crate::events::EventContext;
use crate::format;

pub const CANNOT_HELP_TEXT: &str =
    "Sorry I cannot help you with this, please try help to see things you can ask me";

enum Stop {
    Missing(CommandError),
    Lookup(LookupError),
}

impl From<LookupError> for Stop {
    fn from(error: LookupError) -> Self {
        Self::Lookup(error)
    }
}

/// Turns a classified command into ordered message sections, calling the
/// directory as needed. Every failure ends in a single section.
pub struct Responder {
    directory: Arc<dyn FoodTruckDirectory>,
    location_ids: Vec<String>,
    clock: fn() -> DateTime<Utc>,
}

impl Responder {
    pub fn new(directory: Arc<dyn FoodTruckDirectory>, location_ids: Vec<String>) -> Self {
        Self { directory, location_ids, clock: Utc::now }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn location_ids(&self) -> &[String] {
        &self.location_ids
    }

    /// Entry point for mention text with the bot mention already removed.
    pub async fn respond_to_text(&self, text: &str, ctx: &EventContext) -> Vec<MessageSection> {
        match interpret(text) {
            Ok(command) => self.respond(&command, ctx).await,
            Err(error) => {
                info!(
                    event_name = "respond.command_rejected",
                    correlation_id = %ctx.correlation_id,
                    error = %error,
                    "mention text could not be parsed"
                );
                vec![MessageSection::text(error.user_message())]
            }
        }
    }

    pub async fn respond(&self, command: &BotCommand, ctx: &EventContext) -> Vec<MessageSection> {
        debug!(
            event_name = "respond.command",
            correlation_id = %ctx.correlation_id,
            command = command.name(),
            "building response"
        );

        let outcome = match command {
            BotCommand::Help => return vec![MessageSection::text(format::help_text((self.clock)()))],
            BotCommand::Unknown { keyword } => {
                info!(
                    event_name = "respond.unknown_command",
                    correlation_id = %ctx.correlation_id,
                    keyword = %keyword,
                    "unrecognized command"
                );
                return vec![MessageSection::text(CANNOT_HELP_TEXT)];
            }
            BotCommand::FindTrucks { location, neighborhood, day } => self
                .find_trucks(location.as_deref(), neighborhood.as_deref(), *day)
                .await
                .map(|found| (found, *day)),
            BotCommand::FindEvents { day } => {
                self.find_events(*day).await.map(|found| (found, *day))
            }
        };

        match outcome {
            Ok((found, day)) => self.render_locations(&found, day, ctx).await,
            Err(Stop::Missing(error)) => {
                info!(
                    event_name = "respond.missing_input",
                    correlation_id = %ctx.correlation_id,
                    error = %error,
                    "required input missing"
                );
                vec![MessageSection::text(error.user_message())]
            }
            Err(Stop::Lookup(error)) => {
                warn!(
                    event_name = "respond.lookup_failed",
                    correlation_id = %ctx.correlation_id,
                    resource = %error.resource(),
                    error = %error,
                    "directory lookup failed"
                );
                vec![MessageSection::text(error.user_message())]
            }
        }
    }

    async fn find_trucks(
        &self,
        location: Option<&str>,
        neighborhood: Option<&str>,
        day: DayToken,
    ) -> Result<Vec<LocationWithEvents>, Stop> {
        let location_id = location
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(Stop::Missing(CommandError::MissingArgument("location")))?;

        let location = self.directory.get_location(location_id).await?;

        let neighborhood = match neighborhood.map(str::trim).filter(|hood| !hood.is_empty()) {
            Some(hood) => hood.to_owned(),
            None => {
                let uid = location.neighborhood_uid().ok_or_else(|| {
                    LookupError::not_found(Resource::Neighborhood, location.id.0.clone())
                })?;
                self.directory.get_neighborhood(uid).await?.id
            }
        };

        let ids = vec![location.id.0.clone()];
        Ok(self.directory.find_trucks(&neighborhood, &ids, day).await?)
    }

    async fn find_events(&self, day: DayToken) -> Result<Vec<LocationWithEvents>, Stop> {
        let ids: Vec<&str> =
            self.location_ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()).collect();
        if ids.is_empty() {
            return Err(Stop::Missing(CommandError::MissingArgument("locations")));
        }

        let mut found = Vec::new();
        for id in ids {
            let location = self.directory.get_location(id).await?;
            let events = self.directory.get_events(id, day).await?;
            if events.is_empty() {
                debug!(location_id = id, day = %day, "no events, skipping location");
                continue;
            }
            found.push(LocationWithEvents { location, events });
        }
        Ok(found)
    }

    /// Header per booked event, then one detail per booking; dividers only
    /// between locations that produced output.
    async fn render_locations(
        &self,
        found: &[LocationWithEvents],
        day: DayToken,
        ctx: &EventContext,
    ) -> Vec<MessageSection> {
        let mut sections = Vec::new();

        for entry in found {
            let mut produced = Vec::new();
            for event in entry.events.iter().filter(|event| event.has_bookings()) {
                produced.push(MessageSection::text(format::event_header(&entry.location, event)));
                for booking in &event.bookings {
                    let details = match self.directory.get_truck(&booking.truck.id.0).await {
                        Ok(truck) => Some(truck),
                        Err(error) => {
                            warn!(
                                event_name = "respond.truck_lookup_failed",
                                correlation_id = %ctx.correlation_id,
                                truck_id = %booking.truck.id,
                                error = %error,
                                "rendering truck without rating"
                            );
                            None
                        }
                    };
                    let text = format::truck_detail(&booking.truck, details.as_ref());
                    produced.push(match format::truck_photo(&booking.truck, details.as_ref()) {
                        Some(url) => MessageSection::text_with_image(text, url, &booking.truck.name),
                        None => MessageSection::text(text),
                    });
                }
            }

            if produced.is_empty() {
                continue;
            }
            if !sections.is_empty() {
                sections.push(MessageSection::Divider);
            }
            sections.extend(produced);
        }

        if sections.is_empty() {
            return vec![MessageSection::text(no_results_text(day))];
        }
        sections
    }
}

pub fn no_results_text(day: DayToken) -> String {
    format!("No food trucks are booked {day} at those locations.")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use tokio::sync::Mutex;

    use seafoodtruck_core::domain::{
        BookedTruck, Booking, DayToken, Event, Location, LocationId, LocationWithEvents,
        Neighborhood, NeighborhoodRef, Truck, TruckId,
    };
    use seafoodtruck_core::errors::{LookupError, Resource};
    use seafoodtruck_core::FoodTruckDirectory;

    use super::{no_results_text, Responder, CANNOT_HELP_TEXT};
    use crate::blocks::MessageSection;
    use crate::commands::BotCommand;
    use crate::events::{strip_mention, EventContext};

    #[derive(Default)]
    struct ScriptedDirectory {
        locations: HashMap<String, Location>,
        neighborhoods: HashMap<u64, Neighborhood>,
        search: Vec<LocationWithEvents>,
        events: HashMap<(String, DayToken), Vec<Event>>,
        trucks: HashMap<String, Truck>,
        fail_events: bool,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedDirectory {
        async fn record(&self, call: String) {
            self.calls.lock().await.push(call);
        }

        async fn calls(&self) -> Vec<String> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl FoodTruckDirectory for ScriptedDirectory {
        async fn get_location(&self, id: &str) -> Result<Location, LookupError> {
            self.record(format!("location:{id}")).await;
            self.locations
                .get(id)
                .cloned()
                .ok_or_else(|| LookupError::not_found(Resource::Location, id))
        }

        async fn get_neighborhood(&self, uid: u64) -> Result<Neighborhood, LookupError> {
            self.record(format!("neighborhood:{uid}")).await;
            self.neighborhoods
                .get(&uid)
                .cloned()
                .ok_or_else(|| LookupError::transport(Resource::Neighborhood, "timeout"))
        }

        async fn find_trucks(
            &self,
            neighborhood: &str,
            location_ids: &[String],
            day: DayToken,
        ) -> Result<Vec<LocationWithEvents>, LookupError> {
            self.record(format!("search:{neighborhood}:{}:{day}", location_ids.join(","))).await;
            Ok(self.search.clone())
        }

        async fn get_events(
            &self,
            location_id: &str,
            day: DayToken,
        ) -> Result<Vec<Event>, LookupError> {
            self.record(format!("events:{location_id}:{day}")).await;
            if self.fail_events {
                return Err(LookupError::transport(Resource::Events, "status 500"));
            }
            Ok(self.events.get(&(location_id.to_owned(), day)).cloned().unwrap_or_default())
        }

        async fn get_truck(&self, id: &str) -> Result<Truck, LookupError> {
            self.record(format!("truck:{id}")).await;
            self.trucks.get(id).cloned().ok_or_else(|| LookupError::not_found(Resource::Truck, id))
        }
    }

    fn location(id: &str, name: &str) -> Location {
        Location {
            id: LocationId(id.to_owned()),
            name: name.to_owned(),
            latitude: None,
            longitude: None,
            address: None,
            neighborhood_id: None,
            neighborhood: Some(NeighborhoodRef { id: 17, name: "Downtown".to_owned() }),
        }
    }

    fn booking(truck_id: &str) -> Booking {
        Booking {
            truck: BookedTruck {
                id: TruckId(truck_id.to_owned()),
                name: truck_id.to_uppercase(),
                food_categories: vec!["Tacos".to_owned()],
                featured_photo: Some(format!("{truck_id}.jpg")),
            },
            status: "approved".to_owned(),
        }
    }

    fn event(id: u64, bookings: Vec<Booking>) -> Event {
        Event {
            id,
            name: "Lunch".to_owned(),
            start_time: "2026-10-20T11:00:00-07:00".to_owned(),
            end_time: "2026-10-20T14:00:00-07:00".to_owned(),
            bookings,
            waitlist: Vec::new(),
        }
    }

    fn truck(id: &str, rating: f64) -> Truck {
        Truck {
            id: TruckId(id.to_owned()),
            name: id.to_uppercase(),
            rating,
            rating_count: 10,
            food_categories: vec!["Tacos".to_owned()],
            featured_photo: None,
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 16, 30, 0).single().expect("valid instant")
    }

    fn responder(directory: &Arc<ScriptedDirectory>, ids: &[&str]) -> Responder {
        Responder::new(directory.clone(), ids.iter().map(|id| (*id).to_owned()).collect())
            .with_clock(fixed_now)
    }

    fn ctx() -> EventContext {
        EventContext { correlation_id: "Ev-test".to_owned() }
    }

    fn kinds(sections: &[MessageSection]) -> Vec<&'static str> {
        sections
            .iter()
            .map(|section| match section {
                MessageSection::Text(_) => "text",
                MessageSection::TextWithImage { .. } => "image",
                MessageSection::Divider => "divider",
            })
            .collect()
    }

    #[tokio::test]
    async fn find_events_for_tomorrow_renders_header_then_details() {
        let mut directory = ScriptedDirectory::default();
        directory.locations.insert("123".to_owned(), location("123", "Westlake Park"));
        directory.events.insert(
            ("123".to_owned(), DayToken::Tomorrow),
            vec![event(1, vec![booking("nosh"), booking("marination")])],
        );
        directory.trucks.insert("nosh".to_owned(), truck("nosh", 4.4));
        directory.trucks.insert("marination".to_owned(), truck("marination", 4.6));
        let directory = Arc::new(directory);

        let text = strip_mention("<@U0BOT> find events for tomorrow");
        let sections = responder(&directory, &["123"]).respond_to_text(text, &ctx()).await;

        assert_eq!(kinds(&sections), vec!["text", "image", "image"]);
        let header = sections[0].body().expect("header text");
        assert!(header.contains("*2 truck(s)* on Tue, Oct 20 from 11:00AM–2:00PM"));
        assert!(sections[1].body().expect("detail").contains("★★★★☆ (4.4) 10 reviews"));
        assert!(sections[2].body().expect("detail").contains("★★★★★ (4.6) 10 reviews"));
        assert_eq!(
            directory.calls().await,
            vec!["location:123", "events:123:tomorrow", "truck:nosh", "truck:marination"]
        );
    }

    #[tokio::test]
    async fn location_failure_stops_before_any_other_lookup() {
        let directory = Arc::new(ScriptedDirectory::default());
        let responder = responder(&directory, &["123", "456"]);

        let trucks = responder
            .respond(
                &BotCommand::FindTrucks {
                    location: Some("nowhere".to_owned()),
                    neighborhood: None,
                    day: DayToken::Today,
                },
                &ctx(),
            )
            .await;
        let events = responder.respond(&BotCommand::FindEvents { day: DayToken::Today }, &ctx()).await;

        assert_eq!(trucks.len(), 1);
        assert_eq!(events.len(), 1);
        assert!(trucks[0].body().expect("text").contains("trouble getting location"));
        assert_eq!(directory.calls().await, vec!["location:nowhere", "location:123"]);
    }

    #[tokio::test]
    async fn events_failure_maps_to_single_trouble_section() {
        let mut directory = ScriptedDirectory::default();
        directory.locations.insert("123".to_owned(), location("123", "Westlake Park"));
        directory.fail_events = true;
        let directory = Arc::new(directory);

        let sections = responder(&directory, &["123"])
            .respond(&BotCommand::FindEvents { day: DayToken::Today }, &ctx())
            .await;

        assert_eq!(
            sections,
            vec![MessageSection::text("Sorry, I'm having trouble getting events right now.")]
        );
    }

    #[tokio::test]
    async fn events_without_bookings_are_skipped_but_siblings_render() {
        let mut directory = ScriptedDirectory::default();
        directory.locations.insert("123".to_owned(), location("123", "Westlake Park"));
        directory.events.insert(
            ("123".to_owned(), DayToken::Today),
            vec![event(1, Vec::new()), event(2, vec![booking("nosh")])],
        );
        let directory = Arc::new(directory);

        let sections = responder(&directory, &["123"])
            .respond(&BotCommand::FindEvents { day: DayToken::Today }, &ctx())
            .await;

        assert_eq!(kinds(&sections), vec!["text", "image"]);
        assert!(sections[0].body().expect("header").contains("*1 truck(s)*"));
        assert!(!sections[1].body().expect("detail").contains("reviews"));
    }

    #[tokio::test]
    async fn dividers_separate_locations_with_output_only() {
        let mut directory = ScriptedDirectory::default();
        for (id, name) in [("1", "One"), ("2", "Two"), ("3", "Three")] {
            directory.locations.insert(id.to_owned(), location(id, name));
        }
        directory
            .events
            .insert(("1".to_owned(), DayToken::Today), vec![event(1, vec![booking("a")])]);
        directory.events.insert(("2".to_owned(), DayToken::Today), vec![event(2, Vec::new())]);
        directory
            .events
            .insert(("3".to_owned(), DayToken::Today), vec![event(3, vec![booking("b")])]);
        let directory = Arc::new(directory);

        let sections = responder(&directory, &["1", "2", "3"])
            .respond(&BotCommand::FindEvents { day: DayToken::Today }, &ctx())
            .await;

        assert_eq!(kinds(&sections), vec!["text", "image", "divider", "text", "image"]);
    }

    #[tokio::test]
    async fn no_bookings_anywhere_yields_no_results_section() {
        let mut directory = ScriptedDirectory::default();
        directory.locations.insert("123".to_owned(), location("123", "Westlake Park"));
        let directory = Arc::new(directory);

        let sections = responder(&directory, &["123"])
            .respond(&BotCommand::FindEvents { day: DayToken::Tomorrow }, &ctx())
            .await;

        assert_eq!(sections, vec![MessageSection::text(no_results_text(DayToken::Tomorrow))]);
    }

    #[tokio::test]
    async fn missing_inputs_short_circuit_without_lookups() {
        let directory = Arc::new(ScriptedDirectory::default());

        let no_ids = responder(&directory, &[" "])
            .respond(&BotCommand::FindEvents { day: DayToken::Today }, &ctx())
            .await;
        let no_location = responder(&directory, &["123"])
            .respond_to_text("find trucks in downtown", &ctx())
            .await;

        assert!(no_ids[0].body().expect("text").contains("broadcast.location_ids"));
        assert!(no_location[0].body().expect("text").contains("location is required"));
        assert!(directory.calls().await.is_empty());
    }

    #[tokio::test]
    async fn find_trucks_resolves_neighborhood_from_location() {
        let mut directory = ScriptedDirectory::default();
        directory.locations.insert("westlake-park".to_owned(), location("westlake-park", "Westlake Park"));
        directory.neighborhoods.insert(
            17,
            Neighborhood {
                id: "downtown".to_owned(),
                uid: 17,
                name: "Downtown".to_owned(),
                description: None,
            },
        );
        directory.search = vec![LocationWithEvents {
            location: location("westlake-park", "Westlake Park"),
            events: vec![event(1, vec![booking("nosh")])],
        }];
        directory.trucks.insert("nosh".to_owned(), truck("nosh", 3.0));
        let directory = Arc::new(directory);

        let sections = responder(&directory, &[])
            .respond_to_text("find trucks at westlake-park tomorrow", &ctx())
            .await;

        assert_eq!(kinds(&sections), vec!["text", "image"]);
        assert_eq!(
            directory.calls().await,
            vec![
                "location:westlake-park",
                "neighborhood:17",
                "search:downtown:westlake-park:tomorrow",
                "truck:nosh"
            ]
        );
    }

    #[tokio::test]
    async fn explicit_neighborhood_skips_neighborhood_lookup() {
        let mut directory = ScriptedDirectory::default();
        directory.locations.insert("westlake-park".to_owned(), location("westlake-park", "Westlake Park"));
        let directory = Arc::new(directory);

        let sections = responder(&directory, &[])
            .respond_to_text("find trucks at westlake-park in downtown", &ctx())
            .await;

        assert_eq!(sections, vec![MessageSection::text(no_results_text(DayToken::Today))]);
        assert_eq!(
            directory.calls().await,
            vec!["location:westlake-park", "search:downtown:westlake-park:today"]
        );
    }

    #[tokio::test]
    async fn neighborhood_failure_is_reported_as_trouble() {
        let mut directory = ScriptedDirectory::default();
        directory.locations.insert("westlake-park".to_owned(), location("westlake-park", "Westlake Park"));
        let directory = Arc::new(directory);

        let sections = responder(&directory, &[])
            .respond_to_text("find trucks at westlake-park", &ctx())
            .await;

        assert_eq!(sections.len(), 1);
        assert!(sections[0].body().expect("text").contains("neighborhood"));
        assert_eq!(directory.calls().await, vec!["location:westlake-park", "neighborhood:17"]);
    }

    #[tokio::test]
    async fn help_unknown_and_empty_are_single_sections() {
        let directory = Arc::new(ScriptedDirectory::default());
        let responder = responder(&directory, &["123"]);

        let help = responder.respond_to_text("help", &ctx()).await;
        let unknown = responder.respond_to_text("order me a pizza", &ctx()).await;
        let empty = responder.respond_to_text("   ", &ctx()).await;

        assert_eq!(help.len(), 1);
        assert!(help[0].body().expect("help").ends_with("Slack Events API | 19 Oct 26 09:30 PDT"));
        assert_eq!(unknown, vec![MessageSection::text(CANNOT_HELP_TEXT)]);
        assert_eq!(empty.len(), 1);
        assert!(empty[0].body().expect("guidance").contains("help"));
        assert!(directory.calls().await.is_empty());
    }
}
