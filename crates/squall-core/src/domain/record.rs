use serde::{Deserialize, Serialize};

use super::{Location, TaskId, WeatherTask};

/// Weather for one location, as returned by the provider.
///
/// `WeatherRecord::default()` is the failure sentinel: a zero-valued record
/// published in place of a failed lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    pub country: String,
    pub temperature: f64,
    pub description: String,
}

impl WeatherRecord {
    pub fn new(
        city: impl Into<String>,
        country: impl Into<String>,
        temperature: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
            temperature,
            description: description.into(),
        }
    }

    /// The failure sentinel.
    pub fn sentinel() -> Self {
        Self::default()
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::default()
    }
}

/// What a worker publishes: exactly one per dispatched task.
///
/// Collectors count these, not successes. A failed lookup still yields one
/// outcome, carrying the sentinel record and the failure text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task_id: TaskId,
    pub location: Location,
    pub record: WeatherRecord,
    pub failure: Option<String>,
}

impl TaskOutcome {
    pub fn success(task: &WeatherTask, record: WeatherRecord) -> Self {
        Self {
            task_id: task.task_id(),
            location: task.location().clone(),
            record,
            failure: None,
        }
    }

    pub fn failure(task: &WeatherTask, reason: impl Into<String>) -> Self {
        Self {
            task_id: task.task_id(),
            location: task.location().clone(),
            record: WeatherRecord::sentinel(),
            failure: Some(reason.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}
