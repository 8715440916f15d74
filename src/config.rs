use crate::error::{AppError, Result};
use crate::model::Location;
use crate::retry::{
    RetryPolicy, DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_BACKOFF_SECONDS, DEFAULT_MAX_RETRIES,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Open-Meteo limits
const MAX_FORECAST_DAYS: u32 = 16;
const MAX_PAST_DAYS: u32 = 92;
const MAX_RETRY_SECONDS: f64 = 3600.0;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub outputs: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    /// On-disk cache directory; memory-only when absent.
    #[serde(default = "default_cache_directory")]
    pub directory: Option<PathBuf>,
}

fn default_ttl_seconds() -> u64 {
    3600
}

fn default_cache_directory() -> Option<PathBuf> {
    Some(PathBuf::from(".cache"))
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            directory: default_cache_directory(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    #[serde(default = "default_max_backoff_seconds")]
    pub max_backoff_seconds: f64,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_backoff_factor() -> f64 {
    DEFAULT_BACKOFF_FACTOR
}

fn default_max_backoff_seconds() -> f64 {
    DEFAULT_MAX_BACKOFF_SECONDS
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            max_backoff_seconds: default_max_backoff_seconds(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            self.backoff_factor,
            Duration::from_secs_f64(self.max_backoff_seconds),
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    #[serde(default = "default_forecast_hours")]
    pub forecast_hours: u32,
}

fn default_forecast_hours() -> u32 {
    6
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            forecast_hours: default_forecast_hours(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default)]
    pub past_days: u32,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
}

fn default_forecast_days() -> u32 {
    3
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            past_days: 0,
            forecast_days: default_forecast_days(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub initial_delay_seconds: u64,
    /// Overrides the default poll interval of one forecast horizon.
    #[serde(default)]
    pub interval_minutes: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_forecast_path")]
    pub forecast: PathBuf,
    #[serde(default = "default_current_path")]
    pub current: PathBuf,
    #[serde(default = "default_hourly_path")]
    pub hourly: PathBuf,
    #[serde(default = "default_flag_path")]
    pub flag: PathBuf,
}

fn default_forecast_path() -> PathBuf {
    PathBuf::from("6_hour_forecast.csv")
}

fn default_current_path() -> PathBuf {
    PathBuf::from("current_weather.csv")
}

fn default_hourly_path() -> PathBuf {
    PathBuf::from("hourly_weather.csv")
}

fn default_flag_path() -> PathBuf {
    PathBuf::from("output.txt")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            forecast: default_forecast_path(),
            current: default_current_path(),
            hourly: default_hourly_path(),
            flag: default_flag_path(),
        }
    }
}

pub const CONFIG_PATH_ENV: &str = "OPENMETEO_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

impl Config {
    /// `$OPENMETEO_CONFIG`, or `config/config.yaml`.
    pub fn path_from_env() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// Load `path`, falling back to built-in defaults when it does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(
                "No config file at {}, using built-in defaults",
                path.display()
            );
            let config = Config::default();
            config.validate()?;
            return Ok(config);
        }
        Self::load(path)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // Substitute environment variables
        let expanded = expand_env_vars(content)?;

        let config: Config = serde_yaml::from_str(&expanded)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Poll interval for the forecast loop.
    pub fn poll_interval(&self) -> Duration {
        match self.scheduler.interval_minutes {
            Some(minutes) => Duration::from_secs(minutes.saturating_mul(60)),
            None => Duration::from_secs(u64::from(self.forecast.forecast_hours) * 3600),
        }
    }

    /// Validate configuration values
    ///
    /// Checks for:
    /// - Unexpanded environment variables
    /// - Coordinate ranges and a known timezone
    /// - Horizons within the API's limits
    /// - Positive intervals and a sane retry policy
    /// - Valid URL formats
    fn validate(&self) -> Result<()> {
        if self.location.timezone.contains("${") || self.api.base_url.contains("${") {
            return Err(AppError::Config(
                "Configuration contains an unexpanded environment variable".to_string(),
            ));
        }

        let latitude = self.location.latitude;
        let longitude = self.location.longitude;

        if !(-90.0..=90.0).contains(&latitude) {
            return Err(AppError::Config(format!(
                "Latitude {} out of range (-90 to 90)",
                latitude
            )));
        }

        if !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::Config(format!(
                "Longitude {} out of range (-180 to 180)",
                longitude
            )));
        }

        validate_timezone(&self.location.timezone)?;

        if self.forecast.forecast_hours == 0 {
            return Err(AppError::Config(
                "forecast_hours must be greater than 0".to_string(),
            ));
        }

        if self.report.forecast_days > MAX_FORECAST_DAYS {
            return Err(AppError::Config(format!(
                "forecast_days {} exceeds the maximum of {}",
                self.report.forecast_days, MAX_FORECAST_DAYS
            )));
        }

        if self.report.past_days > MAX_PAST_DAYS {
            return Err(AppError::Config(format!(
                "past_days {} exceeds the maximum of {}",
                self.report.past_days, MAX_PAST_DAYS
            )));
        }

        if self.scheduler.interval_minutes == Some(0) {
            return Err(AppError::Config(
                "Scheduler interval_minutes must be greater than 0".to_string(),
            ));
        }

        if self.cache.ttl_seconds == 0 {
            return Err(AppError::Config(
                "Cache ttl_seconds must be greater than 0".to_string(),
            ));
        }

        if self.api.timeout_seconds == 0 {
            return Err(AppError::Config(
                "API timeout_seconds must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [
            ("backoff_factor", self.retry.backoff_factor),
            ("max_backoff_seconds", self.retry.max_backoff_seconds),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::Config(format!(
                    "Retry {} must be a non-negative number, got {}",
                    name, value
                )));
            }
            if value > MAX_RETRY_SECONDS {
                return Err(AppError::Config(format!(
                    "Retry {} must be at most {} seconds, got {}",
                    name, MAX_RETRY_SECONDS, value
                )));
            }
        }

        match url::Url::parse(&self.api.base_url) {
            Ok(parsed) if parsed.scheme() == "https" || parsed.scheme() == "http" => {}
            Ok(parsed) => {
                return Err(AppError::Config(format!(
                    "API base_url must use http or https, got: {}",
                    parsed.scheme()
                )));
            }
            Err(e) => {
                return Err(AppError::Config(format!(
                    "Invalid API base_url '{}': {}",
                    self.api.base_url, e
                )));
            }
        }

        Ok(())
    }
}

/// `auto` lets the API pick the zone from the coordinates.
fn validate_timezone(timezone: &str) -> Result<()> {
    if matches!(timezone, "auto" | "GMT" | "UTC") {
        return Ok(());
    }
    timezone
        .parse::<chrono_tz::Tz>()
        .map(|_| ())
        .map_err(|_| AppError::Config(format!("Unknown timezone '{}'", timezone)))
}

fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = content.to_string();
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| AppError::Config(format!("Invalid env var pattern: {}", e)))?;

    let mut missing_vars = Vec::new();

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(value) => {
                result = result.replace(&cap[0], &value);
            }
            Err(_) => {
                missing_vars.push(var_name.to_string());
            }
        }
    }

    if !missing_vars.is_empty() {
        return Err(AppError::Config(format!(
            "Missing required environment variable{}: {}\n\n\
             To fix this:\n\
             1. Create a .env file in the project root (copy .env.example)\n\
             2. Set the missing variable{}: export {}=<value>\n\
             3. Or set {} in your environment before running",
            if missing_vars.len() > 1 { "s" } else { "" },
            missing_vars.join(", "),
            if missing_vars.len() > 1 { "s" } else { "" },
            missing_vars[0],
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}
