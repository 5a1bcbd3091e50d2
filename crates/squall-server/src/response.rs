//! Wire format for batch responses.

use serde::{Deserialize, Serialize};

use squall_core::{Batch, TaskOutcome};

/// One item of a batch response.
///
/// `temperature` is rendered as text, the way clients of the service already
/// parse it. `error` only appears for failed items, and only when enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherView {
    pub city: String,
    pub country: String,
    pub temperature: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WeatherView {
    pub fn from_outcome(outcome: &TaskOutcome, expose_errors: bool) -> Self {
        let record = &outcome.record;
        Self {
            city: record.city.clone(),
            country: record.country.clone(),
            temperature: record.temperature.to_string(),
            description: record.description.clone(),
            error: if expose_errors { outcome.failure.clone() } else { None },
        }
    }
}

pub fn assemble(batch: &Batch, expose_errors: bool) -> Vec<WeatherView> {
    batch
        .outcomes
        .iter()
        .map(|o| WeatherView::from_outcome(o, expose_errors))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use squall_core::{WeatherRecord, WeatherTask};

    #[test]
    fn renders_success() {
        let task = WeatherTask::new("Paris".into());
        let outcome = TaskOutcome::success(&task, WeatherRecord::new("Paris", "FR", 18.0, "clear"));

        let json = serde_json::to_value(WeatherView::from_outcome(&outcome, true)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"city": "Paris", "country": "FR", "temperature": "18", "description": "clear"})
        );
    }

    #[test]
    fn sentinel_hides_error_unless_exposed() {
        let task = WeatherTask::new("B".into());
        let outcome = TaskOutcome::failure(&task, "timeout");

        let hidden = serde_json::to_value(WeatherView::from_outcome(&outcome, false)).unwrap();
        assert_eq!(
            hidden,
            serde_json::json!({"city": "", "country": "", "temperature": "0", "description": ""})
        );

        let shown = WeatherView::from_outcome(&outcome, true);
        assert_eq!(shown.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn fractional_temperatures_keep_their_digits() {
        let task = WeatherTask::new("Paris".into());
        let outcome = TaskOutcome::success(&task, WeatherRecord::new("Paris", "FR", 291.15, "clear"));
        assert_eq!(WeatherView::from_outcome(&outcome, false).temperature, "291.15");
    }
}
