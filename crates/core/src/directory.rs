use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{DayToken, Event, Location, LocationWithEvents, Neighborhood, Truck};
use crate::errors::LookupError;

/// Read-only access to the food-truck location, neighborhood, event and
/// truck resources. One attempt per call, no retries.
#[async_trait]
pub trait FoodTruckDirectory: Send + Sync {
    async fn get_location(&self, id: &str) -> Result<Location, LookupError>;

    async fn get_neighborhood(&self, uid: u64) -> Result<Neighborhood, LookupError>;

    /// Locations in `neighborhood` with events on `day`, narrowed to
    /// `location_ids` (matched case-insensitively) in the order requested.
    async fn find_trucks(
        &self,
        neighborhood: &str,
        location_ids: &[String],
        day: DayToken,
    ) -> Result<Vec<LocationWithEvents>, LookupError>;

    /// Events with approved bookings at one location on `day`.
    async fn get_events(&self, location_id: &str, day: DayToken)
        -> Result<Vec<Event>, LookupError>;

    async fn get_truck(&self, id: &str) -> Result<Truck, LookupError>;
}

#[async_trait]
impl<T> FoodTruckDirectory for Arc<T>
where
    T: FoodTruckDirectory + ?Sized,
{
    async fn get_location(&self, id: &str) -> Result<Location, LookupError> {
        (**self).get_location(id).await
    }

    async fn get_neighborhood(&self, uid: u64) -> Result<Neighborhood, LookupError> {
        (**self).get_neighborhood(uid).await
    }

    async fn find_trucks(
        &self,
        neighborhood: &str,
        location_ids: &[String],
        day: DayToken,
    ) -> Result<Vec<LocationWithEvents>, LookupError> {
        (**self).find_trucks(neighborhood, location_ids, day).await
    }

    async fn get_events(
        &self,
        location_id: &str,
        day: DayToken,
    ) -> Result<Vec<Event>, LookupError> {
        (**self).get_events(location_id, day).await
    }

    async fn get_truck(&self, id: &str) -> Result<Truck, LookupError> {
        (**self).get_truck(id).await
    }
}
