use openmeteo_fetch::config::Config;
use openmeteo_fetch::fetcher::WeatherClient;
use openmeteo_fetch::forecast::RollingForecast;
use openmeteo_fetch::scheduler::Scheduler;
use tokio::signal;
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,openmeteo_fetch=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Open-Meteo forecast loop starting...");

    let config_path = Config::path_from_env();
    let config = Config::load_or_default(&config_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load configuration from {}: {}\n\n\
             Make sure:\n\
             1. The file is valid YAML (see config/config.yaml)\n\
             2. All referenced environment variables are set (check .env.example)",
            config_path.display(),
            e
        )
    })?;
    info!(
        "Configuration loaded: {}, {} ({}), {}h horizon",
        config.location.latitude,
        config.location.longitude,
        config.location.timezone,
        config.forecast.forecast_hours
    );

    let client = WeatherClient::from_config(&config)?;
    let forecast = RollingForecast::new(
        client,
        config.location.clone(),
        config.forecast.forecast_hours,
        config.outputs.forecast.clone(),
    );

    // Set up shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn signal handler
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let mut scheduler = Scheduler::new(
        forecast,
        Duration::from_secs(config.scheduler.initial_delay_seconds),
        config.poll_interval(),
        shutdown_rx,
    );

    if let Err(e) = scheduler.run().await {
        error!("Scheduler error: {}", e);
    }

    info!("Open-Meteo forecast loop shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}
