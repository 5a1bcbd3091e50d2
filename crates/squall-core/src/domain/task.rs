use serde::{Deserialize, Serialize};
use std::fmt;

use super::TaskId;

/// An opaque location identifier, one per unit of work in a batch.
///
/// The provider decides what it means (city name, "City,CC", ...); we never
/// interpret it beyond trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location(String);

impl Location {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a comma-separated list into locations, dropping blank entries.
    pub fn parse_list(raw: &str) -> Vec<Location> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Location::new)
            .collect()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Location {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One dispatched lookup: the location plus the tag its outcome will carry.
///
/// Created when the batch is received, then moved into its worker.
#[derive(Debug, Clone)]
pub struct WeatherTask {
    task_id: TaskId,
    location: Location,
}

impl WeatherTask {
    pub fn new(location: Location) -> Self {
        Self {
            task_id: TaskId::generate(),
            location,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }
}
