use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TruckId(pub String);

impl std::fmt::Display for TruckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Truck {
    pub id: TruckId,
    pub name: String,
    /// Average review score on a 0.0..=5.0 scale.
    pub rating: f64,
    pub rating_count: u32,
    pub food_categories: Vec<String>,
    pub featured_photo: Option<String>,
}
