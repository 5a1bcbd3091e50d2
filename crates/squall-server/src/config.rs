use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use squall_core::Location;

#[derive(Parser, Debug, Clone)]
#[command(name = "squalld", version, about = "Scatter-gather weather service")]
pub struct Config {
    /// Bind address for HTTP
    #[arg(long, env = "SQUALL_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Log filter, used when RUST_LOG is not set
    #[arg(long, env = "SQUALL_LOG", default_value = "info")]
    pub log: String,

    /// File holding the provider API key
    #[arg(long, env = "SQUALL_API_KEY_FILE", default_value = "./api.key")]
    pub api_key_file: PathBuf,

    /// Provider base URL
    #[arg(long, env = "SQUALL_PROVIDER_URL", default_value = "https://api.openweathermap.org")]
    pub provider_url: String,

    /// Per-lookup timeout in milliseconds
    #[arg(long, env = "SQUALL_FETCH_TIMEOUT_MS", default_value_t = 5000)]
    pub fetch_timeout_ms: u64,

    /// Temperature units requested from the provider
    #[arg(long, env = "SQUALL_UNITS", value_enum, default_value_t = Units::Standard)]
    pub units: Units,

    /// Cities used when a batch request names none
    #[arg(
        long,
        env = "SQUALL_DEFAULT_CITIES",
        value_delimiter = ',',
        default_value = "Bengaluru,Vienna,Tokyo,London,Paris"
    )]
    pub default_cities: Vec<String>,

    /// Largest number of cities accepted in one batch request
    #[arg(long, env = "SQUALL_MAX_BATCH", default_value_t = 256)]
    pub max_batch: usize,

    /// Add an `error` field to failed items in batch responses
    #[arg(long, env = "SQUALL_EXPOSE_ERRORS")]
    pub expose_errors: bool,
}

impl Config {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn default_locations(&self) -> Vec<Location> {
        self.default_cities
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(Location::new)
            .collect()
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    /// Kelvin
    Standard,
    /// Celsius
    Metric,
    /// Fahrenheit
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Standard => "standard",
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }
}
