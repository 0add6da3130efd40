use super::{log_response, make_http_client, LocationApi};
use crate::errors::{ProviderError, ResolutionError};
use crate::model::{City, PostalCode};
use crate::telemetry::{CorrelationContext, CorrelationPropagator, Telemetry};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const SUBJECT: &str = "location";

/// The slice of a ViaCEP lookup this service reads.
#[derive(Debug, Deserialize)]
struct ViaCepRecord {
    #[serde(default)]
    localidade: String,

    #[serde(default, deserialize_with = "deserialize_erro")]
    erro: bool,
}

// ViaCEP has reported the not-found flag both as a boolean and as the string "true".
fn deserialize_erro<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(flag) => flag,
        Flag::Text(flag) => flag.eq_ignore_ascii_case("true"),
    })
}

/// Geocoding backed by ViaCEP: `GET {base}/ws/{code}/json/`.
#[derive(Debug, Clone)]
pub struct ViaCepLocationApi {
    client: reqwest::Client,
    base_url: Url,
    telemetry: Telemetry,
}

impl ViaCepLocationApi {
    pub fn new(
        base_url: Url, timeout: Duration, telemetry: Telemetry,
    ) -> Result<Self, ProviderError> {
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::NotABaseUrl(base_url));
        }

        let client = make_http_client(timeout)?;
        Ok(Self { client, base_url, telemetry })
    }

    fn lookup_url(&self, code: &PostalCode) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::NotABaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push("ws")
            .push(code.as_str())
            .push("json")
            .push("");
        Ok(url)
    }

    async fn fetch_city(
        &self, code: &PostalCode, context: &CorrelationContext,
    ) -> Result<City, ProviderError> {
        const LABEL: &str = "viacep";

        let url = self.lookup_url(code)?;
        let response = self
            .client
            .get(url.clone())
            .headers(CorrelationPropagator::headers_for(context))
            .send()
            .await?;
        log_response(LABEL, &url, &response);

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ProviderError::Status(status));
        }

        let body = response.bytes().await?;
        let record: ViaCepRecord = serde_json::from_slice(&body)?;
        tracing::debug!(?record, "{LABEL} response body");

        if record.erro {
            return Err(ProviderError::NotFound);
        }

        Ok(City::new(record.localidade))
    }
}

#[async_trait]
impl LocationApi for ViaCepLocationApi {
    #[tracing::instrument(level = "debug", skip(self, context), fields(postal_code=%code))]
    async fn resolve(
        &self, code: &PostalCode, context: &CorrelationContext,
    ) -> Result<City, ResolutionError> {
        let mut span = self.telemetry.start_span("fetch_city_by_zip_code", context);
        let outcome = self.fetch_city(code, span.context()).await;
        match outcome {
            Ok(city) => {
                tracing::debug!(%city, "postal code resolved");
                Ok(city)
            },
            Err(error) => {
                tracing::warn!(?error, "failed to resolve postal code");
                span.record_error(&error);
                Err(ResolutionError::new(SUBJECT, error))
            },
        }
    }
}
