use serde::{Deserialize, Serialize};

use crate::domain::truck::TruckId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedTruck {
    pub id: TruckId,
    pub name: String,
    #[serde(default)]
    pub food_categories: Vec<String>,
    #[serde(default)]
    pub featured_photo: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub truck: BookedTruck,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub position: u32,
    pub truck_slug: String,
}

/// A scheduled gathering of trucks at one location on one day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub name: String,
    /// ISO-8601 timestamps as served by the API.
    pub start_time: String,
    pub end_time: String,
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub waitlist: Vec<WaitlistEntry>,
}

impl Event {
    pub fn has_bookings(&self) -> bool {
        !self.bookings.is_empty()
    }
}
