mod resolution_stage;
mod viacep;
mod weather_api;

pub use resolution_stage::{ForwardError, ForwardedResponse, ResolutionStageClient};
pub use viacep::ViaCepLocationApi;
pub use weather_api::WeatherApiTemperatureApi;

use crate::errors::ResolutionError;
use crate::model::{City, PostalCode};
use crate::telemetry::CorrelationContext;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Turns a postal code into a city name.
#[async_trait]
pub trait LocationApi: Send + Sync {
    async fn resolve(
        &self, code: &PostalCode, context: &CorrelationContext,
    ) -> Result<City, ResolutionError>;
}

/// Turns a city name into its current Celsius reading.
#[async_trait]
pub trait TemperatureApi: Send + Sync {
    async fn resolve(
        &self, city: &City, context: &CorrelationContext,
    ) -> Result<f64, ResolutionError>;
}

fn make_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(60))
        .pool_max_idle_per_host(5)
        .build()
}

fn log_response(label: &str, endpoint: &Url, response: &reqwest::Response) {
    const MESSAGE: &str = "response recd";
    let status = response.status();
    if status.is_success() || status.is_informational() {
        tracing::debug!(%endpoint, ?status, "{label}: {MESSAGE}");
    } else {
        tracing::warn!(%endpoint, ?status, "{label}: {MESSAGE}");
    }
}
