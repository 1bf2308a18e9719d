//! Food-truck directory backends.
//!
//! - `SeattleFoodTruckClient` talks to the public JSON API over HTTP.
//! - `InMemoryDirectory` serves fixtures, for tests and offline previews.

pub mod client;
pub mod memory;
mod wire;

pub use client::{ClientBuildError, SeattleFoodTruckClient};
pub use memory::InMemoryDirectory;
