use crate::error::Result;
use crate::fetcher::ForecastSource;
use crate::model::{
    CurrentSnapshot, ForecastRequest, Horizon, Location, PRECIPITATION_PROBABILITY,
    REPORT_CURRENT_VARIABLES, REPORT_HOURLY_VARIABLES, TEMPERATURE,
};
use crate::parser::Parser;
use crate::table::{TableBuilder, WeatherTable};
use crate::writer::TableWriter;
use std::path::Path;
use tracing::info;

/// Current conditions plus an hourly table, fetched and decoded once.
#[derive(Debug, Clone)]
pub struct WeatherReport {
    current: CurrentSnapshot,
    hourly: WeatherTable,
}

impl WeatherReport {
    pub fn request(location: Location, past_days: u32, forecast_days: u32) -> ForecastRequest {
        ForecastRequest::hourly(
            location,
            Horizon::Days {
                past_days,
                forecast_days,
            },
            REPORT_HOURLY_VARIABLES,
        )
        .with_current(REPORT_CURRENT_VARIABLES)
    }

    pub async fn fetch<S: ForecastSource>(
        source: &S,
        location: Location,
        past_days: u32,
        forecast_days: u32,
    ) -> Result<Self> {
        let request = Self::request(location, past_days, forecast_days);
        let response = source.fetch(&request).await?;

        let current = Parser::current_snapshot(&response, &request.current)?;
        let series = Parser::hourly_series(&response, &request.hourly)?;
        let hourly = TableBuilder::reshape(&series)?;

        info!(
            "Weather report: {} current values, {} hourly rows",
            current.values.len(),
            hourly.len()
        );

        Ok(Self { current, hourly })
    }

    pub fn current_weather(&self) -> &CurrentSnapshot {
        &self.current
    }

    pub fn hourly_weather(&self) -> &WeatherTable {
        &self.hourly
    }

    /// `None` when there are no hourly rows or every temperature is missing.
    pub fn highest_temperature(&self) -> Option<f64> {
        self.hourly.max(TEMPERATURE)
    }

    /// Any hour with a nonzero precipitation probability. An empty table is dry.
    pub fn rain_expected(&self) -> bool {
        self.hourly.any_nonzero(PRECIPITATION_PROBABILITY)
    }

    pub fn print_current_weather<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        TableWriter::write_snapshot(path, &self.current)
    }

    pub fn print_hourly_weather<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        TableWriter::write_table(path, &self.hourly)
    }

    pub fn write_rain_flag<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        let rain = self.rain_expected();
        TableWriter::write_flag(path, rain)?;
        Ok(rain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ForecastResponse;

    struct StaticSource(String);

    impl ForecastSource for StaticSource {
        async fn fetch(&self, _request: &ForecastRequest) -> Result<ForecastResponse> {
            Ok(Parser::parse_body(&self.0)?.remove(0))
        }
    }

    fn body(precipitation_probability: &str, temperature: &str, times: &str) -> String {
        let hourly_extra: String = REPORT_HOURLY_VARIABLES
            .iter()
            .filter(|v| **v != TEMPERATURE && **v != PRECIPITATION_PROBABILITY)
            .map(|v| {
                let len = times.matches(',').count() + usize::from(times.trim() != "");
                let zeros = vec!["0"; len].join(",");
                format!(r#""{}": [{}]"#, v, zeros)
            })
            .collect::<Vec<_>>()
            .join(",");
        let current: String = REPORT_CURRENT_VARIABLES
            .iter()
            .map(|v| format!(r#""{}": 1.5"#, v))
            .collect::<Vec<_>>()
            .join(",");

        format!(
            r#"{{"latitude": 50.94, "longitude": 6.96,
                "current": {{"time": 1700000000, "interval": 900, {current}}},
                "hourly": {{"time": [{times}],
                    "temperature_2m": [{temperature}],
                    "precipitation_probability": [{precipitation_probability}],
                    {hourly_extra}}}}}"#
        )
    }

    async fn report(precip: &str, temp: &str, times: &str) -> WeatherReport {
        let source = StaticSource(body(precip, temp, times));
        WeatherReport::fetch(&source, Location::default(), 0, 3)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_highest_temperature() {
        let report = report("0,0,0", "10.0,15.5,12.3", "0,3600,7200").await;
        assert_eq!(report.highest_temperature(), Some(15.5));
        assert_eq!(report.hourly_weather().len(), 3);
        assert_eq!(report.hourly_weather().columns().len(), 11);
    }

    #[tokio::test]
    async fn test_rain_flag_all_zero() {
        let report = report("0,0,0", "1,2,3", "0,3600,7200").await;
        assert!(!report.rain_expected());
    }

    #[tokio::test]
    async fn test_rain_flag_any_nonzero() {
        let report = report("0,null,20", "1,2,3", "0,3600,7200").await;
        assert!(report.rain_expected());
    }

    #[tokio::test]
    async fn test_empty_hourly_table() {
        let report = report("", "", "").await;
        assert!(report.hourly_weather().is_empty());
        assert!(!report.rain_expected());
        assert_eq!(report.highest_temperature(), None);
    }

    #[tokio::test]
    async fn test_current_weather_in_request_order() {
        let report = report("0", "1", "0").await;
        let names: Vec<&str> = report.current_weather().iter().map(|(n, _)| n).collect();
        assert_eq!(names, REPORT_CURRENT_VARIABLES);
        assert_eq!(report.current_weather().get("snowfall"), Some(1.5));
    }
}
