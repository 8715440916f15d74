#![allow(dead_code)]

use openmeteo_fetch::cache::ResponseCache;
use openmeteo_fetch::fetcher::WeatherClient;
use openmeteo_fetch::retry::RetryPolicy;
use serde_json::{json, Map, Value};
use std::time::Duration;

pub const START: i64 = 1_718_000_000;

/// Open-Meteo style body with `hours` hourly samples per variable.
///
/// Values are `index + offset` where offset is the variable's position, so
/// every column is distinguishable; `overrides` replaces whole columns.
pub fn forecast_body(hourly: &[&str], current: &[&str], hours: usize, overrides: &[(&str, Value)]) -> Value {
    let mut hourly_block = Map::new();
    hourly_block.insert(
        "time".to_string(),
        json!((0..hours).map(|i| START + i as i64 * 3600).collect::<Vec<_>>()),
    );
    for (pos, name) in hourly.iter().enumerate() {
        let values: Vec<f64> = (0..hours).map(|i| (i + pos * 100) as f64).collect();
        hourly_block.insert(name.to_string(), json!(values));
    }
    for (name, column) in overrides {
        hourly_block.insert(name.to_string(), column.clone());
    }

    let mut body = json!({
        "latitude": 50.94,
        "longitude": 6.960001,
        "generationtime_ms": 0.08,
        "utc_offset_seconds": 7200,
        "timezone": "Europe/Berlin",
        "timezone_abbreviation": "CEST",
        "elevation": 60.0,
        "hourly_units": {"time": "unixtime"},
        "hourly": hourly_block,
    });

    if !current.is_empty() {
        let mut current_block = Map::new();
        current_block.insert("time".to_string(), json!(START));
        current_block.insert("interval".to_string(), json!(900));
        for (pos, name) in current.iter().enumerate() {
            current_block.insert(name.to_string(), json!(pos as f64 + 0.5));
        }
        body["current"] = Value::Object(current_block);
    }

    body
}

pub fn client(base_url: &str, retry: RetryPolicy) -> WeatherClient {
    WeatherClient::new(
        base_url,
        Duration::from_secs(5),
        ResponseCache::new(Duration::from_secs(3600), None),
        retry,
    )
    .expect("Failed to create client")
}

pub fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, 0.0, Duration::ZERO)
}
