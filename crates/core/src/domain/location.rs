use serde::{Deserialize, Serialize};

use crate::domain::event::Event;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationId(pub String);

impl LocationId {
    /// Location ids arrive from chat text and config files, so comparisons
    /// ignore surrounding whitespace and ASCII case.
    pub fn matches(&self, other: &str) -> bool {
        self.0.trim().eq_ignore_ascii_case(other.trim())
    }
}

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborhoodRef {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub neighborhood_id: Option<u64>,
    #[serde(default)]
    pub neighborhood: Option<NeighborhoodRef>,
}

impl Location {
    /// Numeric id of the owning neighborhood, from either the flat field or
    /// the embedded reference.
    pub fn neighborhood_uid(&self) -> Option<u64> {
        self.neighborhood_id.or_else(|| self.neighborhood.as_ref().map(|hood| hood.id))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighborhood {
    /// Slug used as the `neighborhood` search filter.
    pub id: String,
    pub uid: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationWithEvents {
    pub location: Location,
    pub events: Vec<Event>,
}

#[cfg(test)]
mod tests {
    use super::{Location, LocationId, NeighborhoodRef};

    #[test]
    fn location_id_match_ignores_case_and_padding() {
        let id = LocationId("Westlake-Park".to_owned());
        assert!(id.matches(" westlake-park "));
        assert!(!id.matches("westlake"));
    }

    #[test]
    fn neighborhood_uid_falls_back_to_embedded_reference() {
        let location = Location {
            id: LocationId("westlake-park".to_owned()),
            name: "Westlake Park".to_owned(),
            latitude: Some(47.61),
            longitude: Some(-122.33),
            address: None,
            neighborhood_id: None,
            neighborhood: Some(NeighborhoodRef { id: 17, name: "Downtown".to_owned() }),
        };

        assert_eq!(location.neighborhood_uid(), Some(17));
    }
}
