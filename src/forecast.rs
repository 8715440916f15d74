use crate::error::Result;
use crate::fetcher::ForecastSource;
use crate::model::{ForecastRequest, Horizon, Location, FORECAST_HOURLY_VARIABLES};
use crate::parser::Parser;
use crate::table::{TableBuilder, WeatherTable};
use crate::writer::TableWriter;
use std::path::PathBuf;
use tracing::{debug, info};

/// Short-horizon hourly forecast that is re-fetched and rewritten on every cycle.
pub struct RollingForecast<S> {
    source: S,
    location: Location,
    forecast_hours: u32,
    output_path: PathBuf,
}

impl<S: ForecastSource> RollingForecast<S> {
    pub fn new(
        source: S,
        location: Location,
        forecast_hours: u32,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            location,
            forecast_hours,
            output_path: output_path.into(),
        }
    }

    pub fn request(&self) -> ForecastRequest {
        ForecastRequest::hourly(
            self.location.clone(),
            Horizon::ForecastHours(self.forecast_hours),
            FORECAST_HOURLY_VARIABLES,
        )
    }

    pub async fn fetch_weather(&self) -> Result<WeatherTable> {
        let request = self.request();
        let response = self.source.fetch(&request).await?;
        let series = Parser::hourly_series(&response, &request.hourly)?;
        debug!(
            "Hourly series {}..{} step {}s, {} variables",
            series.start,
            series.end,
            series.interval,
            series.variables.len()
        );
        TableBuilder::reshape(&series)
    }

    pub fn save_forecast(&self, table: &WeatherTable) -> Result<()> {
        TableWriter::write_table(&self.output_path, table)?;
        info!(
            "{}-hour forecast saved to '{}'",
            self.forecast_hours,
            self.output_path.display()
        );
        Ok(())
    }

    /// Fetch and persist once.
    pub async fn refresh(&self) -> Result<usize> {
        let table = self.fetch_weather().await?;
        self.save_forecast(&table)?;
        Ok(table.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::parser::ForecastResponse;

    struct Unreachable;

    impl ForecastSource for Unreachable {
        async fn fetch(&self, _request: &ForecastRequest) -> Result<ForecastResponse> {
            Err(AppError::Api {
                status: 503,
                reason: "unreachable".to_string(),
            })
        }
    }

    #[test]
    fn test_request_uses_hour_horizon() {
        let forecast = RollingForecast::new(Unreachable, Location::default(), 6, "out.csv");
        let request = forecast.request();

        assert_eq!(request.horizon, Horizon::ForecastHours(6));
        assert_eq!(request.hourly, FORECAST_HOURLY_VARIABLES);
        assert!(request.current.is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_output_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("6_hour_forecast.csv");
        std::fs::write(&output, "previous").unwrap();

        let forecast = RollingForecast::new(Unreachable, Location::default(), 6, &output);
        assert!(forecast.refresh().await.is_err());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous");
    }
}
