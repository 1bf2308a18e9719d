use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use seafoodtruck_core::config::FoodTruckApiConfig;
use seafoodtruck_core::domain::day::query_date as format_query_date;
use seafoodtruck_core::domain::{
    DayToken, Event, Location, LocationWithEvents, Neighborhood, Truck,
};
use seafoodtruck_core::errors::{LookupError, Resource};
use seafoodtruck_core::FoodTruckDirectory;

use crate::wire::{EventsResponse, LocationsResponse, WireTruck};

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid food truck api base url `{url}`")]
    InvalidBaseUrl { url: String },
    #[error("http client could not be built: {0}")]
    Http(#[from] reqwest::Error),
}

/// HTTP client for the seattlefoodtruck.com JSON API.
#[derive(Clone)]
pub struct SeattleFoodTruckClient {
    http: Client,
    base_url: Url,
    /// Fixed clock for tests; the host clock otherwise.
    today: Option<fn() -> NaiveDate>,
}

impl SeattleFoodTruckClient {
    pub fn new(config: &FoodTruckApiConfig) -> Result<Self, ClientBuildError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Self::with_http_client(&config.base_url(), http)
    }

    pub fn with_http_client(base_url: &str, http: Client) -> Result<Self, ClientBuildError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ClientBuildError::InvalidBaseUrl { url: base_url.to_owned() })?;
        Ok(Self { http, base_url, today: None })
    }

    /// Replaces the clock used to turn day tokens into dates.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn query_date(&self, day: DayToken) -> String {
        let date = match self.today {
            Some(today) => day.resolve(today()),
            None => day.resolve_local(),
        };
        format_query_date(date)
    }

    async fn get_json<T>(
        &self,
        resource: Resource,
        id: &str,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, LookupError>
    where
        T: DeserializeOwned,
    {
        debug!(
            event_name = "directory.request",
            resource = %resource,
            endpoint = %url,
            "calling food truck api"
        );

        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|error| LookupError::transport(resource, error.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LookupError::not_found(resource, id));
        }
        if !status.is_success() {
            return Err(LookupError::transport(resource, format!("unexpected status {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|error| LookupError::transport(resource, format!("decode failed: {error}")))
    }
}

fn require_id(resource: Resource, id: &str) -> Result<(), LookupError> {
    if id.trim().is_empty() {
        return Err(LookupError::not_found(resource, id));
    }
    Ok(())
}

#[async_trait]
impl FoodTruckDirectory for SeattleFoodTruckClient {
    async fn get_location(&self, id: &str) -> Result<Location, LookupError> {
        require_id(Resource::Location, id)?;
        let id = id.trim();
        let url = self.endpoint(&["locations", id]);
        self.get_json(Resource::Location, id, url, &[]).await
    }

    async fn get_neighborhood(&self, uid: u64) -> Result<Neighborhood, LookupError> {
        if uid == 0 {
            return Err(LookupError::not_found(Resource::Neighborhood, "0"));
        }
        let id = uid.to_string();
        let url = self.endpoint(&["neighborhoods", &id]);
        self.get_json(Resource::Neighborhood, &id, url, &[]).await
    }

    async fn find_trucks(
        &self,
        neighborhood: &str,
        location_ids: &[String],
        day: DayToken,
    ) -> Result<Vec<LocationWithEvents>, LookupError> {
        require_id(Resource::Events, neighborhood)?;
        let on_day = self.query_date(day);
        let url = self.endpoint(&["locations"]);
        let response: LocationsResponse = self
            .get_json(
                Resource::Events,
                neighborhood,
                url,
                &[
                    ("only_with_events", "true"),
                    ("with_active_trucks", "true"),
                    ("include_events", "true"),
                    ("include_trucks", "true"),
                    ("with_events_on_day", on_day.as_str()),
                    ("neighborhood", neighborhood.trim()),
                ],
            )
            .await?;

        let mut candidates: Vec<LocationWithEvents> =
            response.locations.into_iter().map(LocationWithEvents::from).collect();
        let mut found = Vec::new();
        for wanted in location_ids {
            if let Some(index) =
                candidates.iter().position(|candidate| candidate.location.id.matches(wanted))
            {
                found.push(candidates.swap_remove(index));
            }
        }
        Ok(found)
    }

    async fn get_events(
        &self,
        location_id: &str,
        day: DayToken,
    ) -> Result<Vec<Event>, LookupError> {
        require_id(Resource::Events, location_id)?;
        let on_day = self.query_date(day);
        let url = self.endpoint(&["events"]);
        let response: EventsResponse = self
            .get_json(
                Resource::Events,
                location_id,
                url,
                &[
                    ("include_bookings", "true"),
                    ("with_active_trucks", "true"),
                    ("with_booking_status", "approved"),
                    ("on_day", on_day.as_str()),
                    ("for_locations", location_id.trim()),
                ],
            )
            .await?;
        Ok(response.events.into_iter().map(Event::from).collect())
    }

    async fn get_truck(&self, id: &str) -> Result<Truck, LookupError> {
        require_id(Resource::Truck, id)?;
        let id = id.trim();
        let url = self.endpoint(&["trucks", id]);
        let truck: WireTruck = self.get_json(Resource::Truck, id, url, &[]).await?;
        Ok(truck.into())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use seafoodtruck_core::domain::DayToken;

    use super::SeattleFoodTruckClient;

    #[test]
    fn endpoint_appends_segments_to_base_path() {
        let client =
            SeattleFoodTruckClient::with_http_client("https://example.test/api", Default::default())
                .expect("client");

        assert_eq!(
            client.endpoint(&["locations", "westlake-park"]).as_str(),
            "https://example.test/api/locations/westlake-park"
        );
    }

    #[test]
    fn endpoint_escapes_path_segments() {
        let client =
            SeattleFoodTruckClient::with_http_client("https://example.test/api/", Default::default())
                .expect("client");

        assert_eq!(
            client.endpoint(&["trucks", "a b/c"]).as_str(),
            "https://example.test/api/trucks/a%20b%2Fc"
        );
    }

    #[test]
    fn query_date_uses_host_clock_unless_overridden() {
        let client =
            SeattleFoodTruckClient::with_http_client("https://example.test/api", Default::default())
                .expect("client");
        assert_eq!(
            client.query_date(DayToken::Tomorrow),
            DayToken::Tomorrow.resolve_local().format("%Y-%m-%d").to_string()
        );

        let pinned = client.with_today(|| NaiveDate::from_ymd_opt(2026, 12, 31).expect("date"));
        assert_eq!(pinned.query_date(DayToken::Tomorrow), "2027-01-01");
    }

    #[test]
    fn rejects_base_url_without_host() {
        assert!(SeattleFoodTruckClient::with_http_client("mailto:x", Default::default()).is_err());
    }
}
