use openmeteo_fetch::config::Config;
use openmeteo_fetch::fetcher::WeatherClient;
use openmeteo_fetch::report::WeatherReport;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,openmeteo_fetch=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = Config::path_from_env();
    let config = Config::load_or_default(&config_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load configuration from {}: {}",
            config_path.display(),
            e
        )
    })?;

    let client = WeatherClient::from_config(&config)?;
    let report = WeatherReport::fetch(
        &client,
        config.location.clone(),
        config.report.past_days,
        config.report.forecast_days,
    )
    .await?;

    report.print_current_weather(&config.outputs.current)?;
    report.print_hourly_weather(&config.outputs.hourly)?;

    match report.highest_temperature() {
        Some(t) => info!("Highest temperature: {} °C", t),
        None => info!("No hourly temperatures in the requested horizon"),
    }

    let rain = report.write_rain_flag(&config.outputs.flag)?;
    info!("Precipitation expected: {}", rain);

    Ok(())
}
