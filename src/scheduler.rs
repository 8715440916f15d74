use crate::error::Result;
use crate::fetcher::ForecastSource;
use crate::forecast::RollingForecast;
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{error, info};

pub struct Scheduler<S> {
    forecast: RollingForecast<S>,
    initial_delay: Duration,
    poll_interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl<S: ForecastSource> Scheduler<S> {
    pub fn new(
        forecast: RollingForecast<S>,
        initial_delay: Duration,
        poll_interval: Duration,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            forecast,
            initial_delay,
            poll_interval,
            shutdown_rx,
        }
    }

    /// Loop until the shutdown signal fires. A failed cycle is logged and the
    /// loop carries on with the next one.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Scheduler starting with {:?} initial delay, {:?} interval",
            self.initial_delay, self.poll_interval
        );

        if !self.initial_delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(self.initial_delay) => {},
                _ = self.shutdown_rx.changed() => {
                    info!("Shutdown received during initial delay");
                    return Ok(());
                }
            }
        }

        loop {
            if *self.shutdown_rx.borrow() {
                info!("Shutdown signal received, stopping scheduler");
                break;
            }

            if let Err(e) = self.run_cycle().await {
                error!("Forecast cycle error: {}", e);
            }

            if *self.shutdown_rx.borrow() {
                info!("Shutdown signal received, stopping scheduler");
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = self.shutdown_rx.changed() => {
                    info!("Shutdown signal received, stopping scheduler");
                    break;
                }
            }
        }

        Ok(())
    }

    pub async fn run_cycle(&self) -> Result<usize> {
        info!("Starting forecast cycle");
        let rows = self.forecast.refresh().await?;
        info!("Forecast cycle completed: {} rows", rows);
        Ok(rows)
    }
}
