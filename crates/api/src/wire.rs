//! JSON shapes served by the food-truck API, converted into domain values.

use serde::Deserialize;

use seafoodtruck_core::domain::{
    BookedTruck, Booking, Event, Location, LocationWithEvents, Truck, TruckId, WaitlistEntry,
};

const APPROVED: &str = "approved";

/// Category labels come back as plain strings on search results and as
/// objects on the truck resource.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CategoryLabel {
    Name(String),
    Named { name: String },
}

impl CategoryLabel {
    fn into_name(self) -> String {
        match self {
            Self::Name(name) | Self::Named { name } => name,
        }
    }
}

fn category_names(labels: Vec<CategoryLabel>) -> Vec<String> {
    labels.into_iter().map(CategoryLabel::into_name).collect()
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireBookedTruck {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    food_categories: Vec<CategoryLabel>,
    #[serde(default)]
    featured_photo: Option<String>,
}

impl From<WireBookedTruck> for BookedTruck {
    fn from(wire: WireBookedTruck) -> Self {
        Self {
            name: wire.name.unwrap_or_else(|| wire.id.clone()),
            id: TruckId(wire.id),
            food_categories: category_names(wire.food_categories),
            featured_photo: wire.featured_photo,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireBooking {
    #[serde(default)]
    status: Option<String>,
    truck: WireBookedTruck,
}

#[derive(Debug, Deserialize)]
struct WireWaitlistTruck {
    #[serde(default)]
    slug: String,
}

#[derive(Debug, Deserialize)]
struct WireWaitlistEntry {
    #[serde(default)]
    position: u32,
    truck: WireWaitlistTruck,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireEvent {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    bookings: Vec<WireBooking>,
    #[serde(default)]
    waitlist_entries: Vec<WireWaitlistEntry>,
}

impl From<WireEvent> for Event {
    fn from(wire: WireEvent) -> Self {
        Self {
            id: wire.id,
            name: wire.name.unwrap_or_default(),
            start_time: wire.start_time.unwrap_or_default(),
            end_time: wire.end_time.unwrap_or_default(),
            bookings: wire
                .bookings
                .into_iter()
                .map(|booking| Booking {
                    truck: booking.truck.into(),
                    status: booking.status.unwrap_or_else(|| APPROVED.to_owned()),
                })
                .collect(),
            waitlist: wire
                .waitlist_entries
                .into_iter()
                .map(|entry| WaitlistEntry { position: entry.position, truck_slug: entry.truck.slug })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventsResponse {
    #[serde(default)]
    pub events: Vec<WireEvent>,
}

/// Search results embed events with their active trucks rather than
/// bookings; every listed truck is treated as an approved booking.
#[derive(Debug, Deserialize)]
struct WireLocationEvent {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    trucks: Vec<WireBookedTruck>,
}

impl From<WireLocationEvent> for Event {
    fn from(wire: WireLocationEvent) -> Self {
        Self {
            id: wire.id,
            name: wire.name.unwrap_or_default(),
            start_time: wire.start_time.unwrap_or_default(),
            end_time: wire.end_time.unwrap_or_default(),
            bookings: wire
                .trucks
                .into_iter()
                .map(|truck| Booking { truck: truck.into(), status: APPROVED.to_owned() })
                .collect(),
            waitlist: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireLocationWithEvents {
    #[serde(flatten)]
    location: Location,
    #[serde(default)]
    events: Vec<WireLocationEvent>,
}

impl From<WireLocationWithEvents> for LocationWithEvents {
    fn from(wire: WireLocationWithEvents) -> Self {
        Self { location: wire.location, events: wire.events.into_iter().map(Event::from).collect() }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocationsResponse {
    #[serde(default)]
    pub locations: Vec<WireLocationWithEvents>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireTruck {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    rating_count: Option<u32>,
    #[serde(default)]
    food_categories: Vec<CategoryLabel>,
    #[serde(default)]
    featured_photo: Option<String>,
}

impl From<WireTruck> for Truck {
    fn from(wire: WireTruck) -> Self {
        Self {
            name: wire.name.unwrap_or_else(|| wire.id.clone()),
            id: TruckId(wire.id),
            rating: wire.rating.unwrap_or(0.0).clamp(0.0, 5.0),
            rating_count: wire.rating_count.unwrap_or(0),
            food_categories: category_names(wire.food_categories),
            featured_photo: wire.featured_photo,
        }
    }
}
