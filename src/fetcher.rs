use crate::cache::ResponseCache;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::model::ForecastRequest;
use crate::parser::{ForecastResponse, Parser};
use crate::retry::RetryPolicy;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const FORECAST_PATH: &str = "v1/forecast";

/// Anything that can answer a forecast request for a single location.
pub trait ForecastSource: Send + Sync {
    fn fetch(
        &self,
        request: &ForecastRequest,
    ) -> impl Future<Output = Result<ForecastResponse>> + Send;
}

pub struct WeatherClient {
    client: Client,
    base_url: Url,
    cache: ResponseCache,
    retry: RetryPolicy,
}

impl WeatherClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        cache: ResponseCache,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("openmeteo-fetch/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        // Trailing slash so `join` appends rather than replaces the last segment
        let base_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .map_err(|e| AppError::Config(format!("Invalid base_url '{}': {}", base_url, e)))?;

        Ok(Self {
            client,
            base_url,
            cache,
            retry,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = ResponseCache::new(
            Duration::from_secs(config.cache.ttl_seconds),
            config.cache.directory.clone(),
        );
        Self::new(
            &config.api.base_url,
            Duration::from_secs(config.api.timeout_seconds),
            cache,
            config.retry.policy(),
        )
    }

    /// Full request URL, which doubles as the cache key.
    pub fn request_url(&self, request: &ForecastRequest) -> Result<Url> {
        let mut url = self
            .base_url
            .join(FORECAST_PATH)
            .map_err(|e| AppError::Config(format!("Invalid forecast URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("latitude", &request.location.latitude.to_string())
                .append_pair("longitude", &request.location.longitude.to_string())
                .append_pair("timezone", &request.location.timezone)
                .append_pair("timeformat", "unixtime");

            if !request.hourly.is_empty() {
                query.append_pair("hourly", &request.hourly.join(","));
            }
            if !request.current.is_empty() {
                query.append_pair("current", &request.current.join(","));
            }
            for (key, value) in request.horizon.query_pairs() {
                query.append_pair(key, &value);
            }
        }

        Ok(url)
    }

    /// One response per requested location.
    pub async fn fetch_all(&self, request: &ForecastRequest) -> Result<Vec<ForecastResponse>> {
        let url = self.request_url(request)?;
        let body = self.get_body(url.as_str()).await?;
        Parser::parse_body(&body)
    }

    async fn get_body(&self, url: &str) -> Result<String> {
        if let Some(body) = self.cache.get(url).await {
            return Ok(body);
        }

        let body = self.retry.run(move || self.download(url)).await?;
        if let Err(e) = self.cache.put(url, &body).await {
            warn!("Failed to cache response for {}: {}", url, e);
        }
        Ok(body)
    }

    async fn download(&self, url: &str) -> Result<String> {
        debug!("Requesting {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AppError::Api {
                status: status.as_u16(),
                reason: Parser::parse_error_reason(&body),
            });
        }

        info!("Received {} bytes from weather API", body.len());
        Ok(body)
    }
}

impl ForecastSource for WeatherClient {
    async fn fetch(&self, request: &ForecastRequest) -> Result<ForecastResponse> {
        self.fetch_all(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::InvalidData("Weather API returned no locations".to_string()))
    }
}
