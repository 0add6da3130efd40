use super::{log_response, make_http_client, TemperatureApi};
use crate::errors::{ProviderError, ResolutionError};
use crate::model::City;
use crate::telemetry::{CorrelationContext, CorrelationPropagator, Telemetry};
use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const SUBJECT: &str = "temperature";

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temp_c: f64,
}

#[derive(Debug, Deserialize)]
struct WeatherRecord {
    current: CurrentConditions,
}

/// Current conditions from WeatherAPI: `GET {base}/v1/current.json?key=..&q={city}&aqi=no`.
///
/// The service starts without a credential; every lookup fails until one is configured.
#[derive(Debug, Clone)]
pub struct WeatherApiTemperatureApi {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<Secret<String>>,
    telemetry: Telemetry,
}

impl WeatherApiTemperatureApi {
    pub fn new(
        base_url: Url, api_key: Option<Secret<String>>, timeout: Duration, telemetry: Telemetry,
    ) -> Result<Self, ProviderError> {
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::NotABaseUrl(base_url));
        }

        let client = make_http_client(timeout)?;
        Ok(Self { client, base_url, api_key, telemetry })
    }

    fn current_url(&self, api_key: &str, city: &City) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::NotABaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push("v1")
            .push("current.json");
        url.query_pairs_mut()
            .append_pair("key", api_key)
            .append_pair("q", city.as_str())
            .append_pair("aqi", "no");
        Ok(url)
    }

    async fn fetch_celsius(
        &self, city: &City, context: &CorrelationContext,
    ) -> Result<f64, ProviderError> {
        const LABEL: &str = "weatherapi";

        let api_key = self
            .api_key
            .as_ref()
            .map(|key| key.expose_secret().as_str())
            .filter(|key| !key.trim().is_empty())
            .ok_or(ProviderError::MissingCredential)?;

        let url = self.current_url(api_key, city)?;
        let response = self
            .client
            .get(url)
            .headers(CorrelationPropagator::headers_for(context))
            .send()
            .await?;

        // the query carries the credential, so log without it
        let mut endpoint = response.url().clone();
        endpoint.set_query(None);
        log_response(LABEL, &endpoint, &response);

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ProviderError::Status(status));
        }

        let body = response.bytes().await?;
        let record: WeatherRecord = serde_json::from_slice(&body)?;
        tracing::debug!(?record, "{LABEL} response body");
        Ok(record.current.temp_c)
    }
}

#[async_trait]
impl TemperatureApi for WeatherApiTemperatureApi {
    #[tracing::instrument(level = "debug", skip(self, context), fields(%city))]
    async fn resolve(
        &self, city: &City, context: &CorrelationContext,
    ) -> Result<f64, ResolutionError> {
        let mut span = self.telemetry.start_span("fetch_temperature", context);
        match self.fetch_celsius(city, span.context()).await {
            Ok(celsius) => {
                tracing::debug!(%celsius, "temperature resolved");
                Ok(celsius)
            },
            Err(error) => {
                tracing::warn!(?error, "failed to resolve temperature");
                span.record_error(&error);
                Err(ResolutionError::new(SUBJECT, error))
            },
        }
    }
}
