pub mod config;
pub mod directory;
pub mod domain;
pub mod errors;

pub use directory::FoodTruckDirectory;
pub use domain::{
    BookedTruck, Booking, DayToken, Event, Location, LocationId, LocationWithEvents,
    Neighborhood, NeighborhoodRef, Truck, TruckId, WaitlistEntry,
};
pub use errors::{CommandError, LookupError, Resource};
