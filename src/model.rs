use serde::{Deserialize, Serialize};

/// Hourly variables requested by the rolling forecast loop.
pub const FORECAST_HOURLY_VARIABLES: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "precipitation_probability",
    "precipitation",
    "cloud_cover",
    "wind_speed_10m",
];

/// Current-conditions variables requested by the weather report.
pub const REPORT_CURRENT_VARIABLES: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "rain",
    "showers",
    "snowfall",
    "cloud_cover",
    "wind_speed_10m",
];

/// Hourly variables requested by the weather report.
pub const REPORT_HOURLY_VARIABLES: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "precipitation_probability",
    "precipitation",
    "rain",
    "showers",
    "snowfall",
    "snow_depth",
    "cloud_cover",
    "wind_speed_10m",
];

pub const TEMPERATURE: &str = "temperature_2m";
pub const PRECIPITATION_PROBABILITY: &str = "precipitation_probability";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

pub fn default_timezone() -> String {
    "Europe/Berlin".to_string()
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, timezone: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            timezone: timezone.into(),
        }
    }
}

impl Default for Location {
    /// Köln
    fn default() -> Self {
        Self::new(50.935173, 6.95310, default_timezone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    ForecastHours(u32),
    Days { past_days: u32, forecast_days: u32 },
}

impl Horizon {
    /// Query parameters the API expects for this horizon.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Horizon::ForecastHours(hours) => vec![("forecast_hours", hours.to_string())],
            Horizon::Days {
                past_days,
                forecast_days,
            } => vec![
                ("past_days", past_days.to_string()),
                ("forecast_days", forecast_days.to_string()),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub location: Location,
    pub horizon: Horizon,
    pub hourly: Vec<String>,
    pub current: Vec<String>,
}

impl ForecastRequest {
    pub fn hourly(location: Location, horizon: Horizon, variables: &[&str]) -> Self {
        Self {
            location,
            horizon,
            hourly: variables.iter().map(|v| v.to_string()).collect(),
            current: Vec::new(),
        }
    }

    pub fn with_current(mut self, variables: &[&str]) -> Self {
        self.current = variables.iter().map(|v| v.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Decoded hourly block: evenly spaced samples in `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySeries {
    pub start: i64,
    pub end: i64,
    pub interval: i64,
    pub variables: Vec<VariableSeries>,
}

impl HourlySeries {
    pub fn expected_len(&self) -> usize {
        if self.interval <= 0 || self.end <= self.start {
            return 0;
        }
        ((self.end - self.start) / self.interval) as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSnapshot {
    pub time: i64,
    pub interval: i64,
    pub values: Vec<(String, Option<f64>)>,
}

impl CurrentSnapshot {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.values.iter().map(|(n, v)| (n.as_str(), *v))
    }
}
