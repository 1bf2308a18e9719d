pub mod day;
pub mod event;
pub mod location;
pub mod truck;

pub use day::DayToken;
pub use event::{BookedTruck, Booking, Event, WaitlistEntry};
pub use location::{Location, LocationId, LocationWithEvents, Neighborhood, NeighborhoodRef};
pub use truck::{Truck, TruckId};
