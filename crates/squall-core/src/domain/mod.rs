//! Domain model (IDs, tasks, records, outcomes).

pub mod ids;
pub mod record;
pub mod task;

pub use ids::{BatchId, TaskId};
pub use record::{TaskOutcome, WeatherRecord};
pub use task::{Location, WeatherTask};
