use crate::error::{AppError, Result};
use crate::model::{CurrentSnapshot, HourlySeries, VariableSeries};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

/// Hourly sampling assumed when the response carries fewer than two samples.
const DEFAULT_HOURLY_INTERVAL: i64 = 3600;

/// One location's forecast as returned with `timeformat=unixtime`.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub utc_offset_seconds: i64,
    #[serde(default)]
    pub hourly: Option<HourlyBlock>,
    #[serde(default)]
    pub current: Option<CurrentBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HourlyBlock {
    pub time: Vec<i64>,
    #[serde(flatten)]
    pub variables: HashMap<String, Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentBlock {
    pub time: i64,
    #[serde(default)]
    pub interval: i64,
    #[serde(flatten)]
    pub variables: HashMap<String, Option<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseBody {
    Many(Vec<ForecastResponse>),
    One(ForecastResponse),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    reason: String,
}

pub struct Parser;

impl Parser {
    /// Parse a forecast body; the API answers with a bare object for a single
    /// location and an array when several were requested.
    pub fn parse_body(body: &str) -> Result<Vec<ForecastResponse>> {
        let parsed: ResponseBody = serde_json::from_str(body)
            .map_err(|e| AppError::Parse(format!("Failed to decode forecast response: {}", e)))?;

        Ok(match parsed {
            ResponseBody::Many(responses) => responses,
            ResponseBody::One(response) => vec![response],
        })
    }

    /// Pull the `reason` out of an API error body, falling back to the raw text.
    pub fn parse_error_reason(body: &str) -> String {
        serde_json::from_str::<ErrorBody>(body)
            .map(|e| e.reason)
            .unwrap_or_else(|_| body.trim().to_string())
    }

    /// Extract the requested hourly variables by name, in request order.
    pub fn hourly_series(response: &ForecastResponse, names: &[String]) -> Result<HourlySeries> {
        let block = response
            .hourly
            .as_ref()
            .ok_or_else(|| AppError::InvalidData("Response has no hourly block".to_string()))?;

        let interval = Self::hourly_interval(&block.time)?;
        let start = block.time.first().copied().unwrap_or(0);
        let end = start + block.time.len() as i64 * interval;

        let mut variables = Vec::with_capacity(names.len());
        for name in names {
            let values = block
                .variables
                .get(name)
                .ok_or_else(|| AppError::MissingVariable(name.clone()))?;

            if values.len() != block.time.len() {
                return Err(AppError::InvalidData(format!(
                    "Hourly variable '{}' has {} values for {} timestamps",
                    name,
                    values.len(),
                    block.time.len()
                )));
            }

            variables.push(VariableSeries {
                name: name.clone(),
                values: values.clone(),
            });
        }

        let unrequested: Vec<&String> = block
            .variables
            .keys()
            .filter(|k| !names.contains(k))
            .collect();
        if !unrequested.is_empty() {
            warn!("Ignoring unrequested hourly variables: {:?}", unrequested);
        }

        Ok(HourlySeries {
            start,
            end,
            interval,
            variables,
        })
    }

    /// Extract the requested current variables by name, in request order.
    pub fn current_snapshot(
        response: &ForecastResponse,
        names: &[String],
    ) -> Result<CurrentSnapshot> {
        let block = response
            .current
            .as_ref()
            .ok_or_else(|| AppError::InvalidData("Response has no current block".to_string()))?;

        let values = names
            .iter()
            .map(|name| {
                block
                    .variables
                    .get(name)
                    .map(|v| (name.clone(), *v))
                    .ok_or_else(|| AppError::MissingVariable(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CurrentSnapshot {
            time: block.time,
            interval: block.interval,
            values,
        })
    }

    fn hourly_interval(times: &[i64]) -> Result<i64> {
        if times.len() < 2 {
            return Ok(DEFAULT_HOURLY_INTERVAL);
        }

        let interval = times[1] - times[0];
        if interval <= 0 {
            return Err(AppError::InvalidData(format!(
                "Hourly timestamps are not increasing: {} then {}",
                times[0], times[1]
            )));
        }

        if let Some(pair) = times.windows(2).find(|w| w[1] - w[0] != interval) {
            return Err(AppError::InvalidData(format!(
                "Hourly timestamps are not evenly spaced: {} -> {} (expected step {})",
                pair[0], pair[1], interval
            )));
        }

        Ok(interval)
    }
}
