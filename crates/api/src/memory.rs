use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use seafoodtruck_core::domain::{
    DayToken, Event, Location, LocationWithEvents, Neighborhood, Truck,
};
use seafoodtruck_core::errors::{LookupError, Resource};
use seafoodtruck_core::FoodTruckDirectory;

fn key(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

/// Fixture-backed directory. Unknown ids answer `NotFound`; locations with
/// no stored events answer an empty list.
#[derive(Default)]
pub struct InMemoryDirectory {
    locations: RwLock<HashMap<String, Location>>,
    neighborhoods: RwLock<HashMap<u64, Neighborhood>>,
    events: RwLock<HashMap<(String, DayToken), Vec<Event>>>,
    trucks: RwLock<HashMap<String, Truck>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.get_mut().insert(key(&location.id.0), location);
        self
    }

    pub fn with_neighborhood(mut self, neighborhood: Neighborhood) -> Self {
        self.neighborhoods.get_mut().insert(neighborhood.uid, neighborhood);
        self
    }

    pub fn with_events(mut self, location_id: &str, day: DayToken, events: Vec<Event>) -> Self {
        self.events.get_mut().insert((key(location_id), day), events);
        self
    }

    pub fn with_truck(mut self, truck: Truck) -> Self {
        self.trucks.get_mut().insert(key(&truck.id.0), truck);
        self
    }
}

#[async_trait]
impl FoodTruckDirectory for InMemoryDirectory {
    async fn get_location(&self, id: &str) -> Result<Location, LookupError> {
        let locations = self.locations.read().await;
        locations.get(&key(id)).cloned().ok_or_else(|| LookupError::not_found(Resource::Location, id))
    }

    async fn get_neighborhood(&self, uid: u64) -> Result<Neighborhood, LookupError> {
        let neighborhoods = self.neighborhoods.read().await;
        neighborhoods
            .get(&uid)
            .cloned()
            .ok_or_else(|| LookupError::not_found(Resource::Neighborhood, uid.to_string()))
    }

    async fn find_trucks(
        &self,
        neighborhood: &str,
        location_ids: &[String],
        day: DayToken,
    ) -> Result<Vec<LocationWithEvents>, LookupError> {
        let locations = self.locations.read().await;
        let neighborhoods = self.neighborhoods.read().await;
        let events = self.events.read().await;
        let wanted_hood = key(neighborhood);

        let in_neighborhood = |location: &Location| {
            location
                .neighborhood_uid()
                .and_then(|uid| neighborhoods.get(&uid))
                .is_some_and(|hood| key(&hood.id) == wanted_hood || key(&hood.name) == wanted_hood)
        };

        Ok(location_ids
            .iter()
            .filter_map(|id| locations.get(&key(id)))
            .filter(|location| in_neighborhood(location))
            .filter_map(|location| {
                let found = events.get(&(key(&location.id.0), day))?;
                (!found.is_empty())
                    .then(|| LocationWithEvents { location: location.clone(), events: found.clone() })
            })
            .collect())
    }

    async fn get_events(
        &self,
        location_id: &str,
        day: DayToken,
    ) -> Result<Vec<Event>, LookupError> {
        let events = self.events.read().await;
        Ok(events.get(&(key(location_id), day)).cloned().unwrap_or_default())
    }

    async fn get_truck(&self, id: &str) -> Result<Truck, LookupError> {
        let trucks = self.trucks.read().await;
        trucks.get(&key(id)).cloned().ok_or_else(|| LookupError::not_found(Resource::Truck, id))
    }
}
