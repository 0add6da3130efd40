use super::{log_response, make_http_client};
use crate::model::{PostalCode, PostalCodeRequest};
use crate::telemetry::{CorrelationContext, CorrelationPropagator};
use axum::body::Bytes;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("resolution stage url is not a base url: {0}")]
    NotABaseUrl(Url),

    #[error("failed to reach resolution stage: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to read resolution stage response: {0}")]
    Body(#[source] reqwest::Error),
}

/// Status and body exactly as the resolution stage answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Client for the edge → resolution hop: `POST {base}/weather`.
#[derive(Debug, Clone)]
pub struct ResolutionStageClient {
    client: reqwest::Client,
    weather_url: Url,
}

impl ResolutionStageClient {
    pub const ROUTE: &'static str = "weather";

    /// `timeout` bounds the whole exchange, connection through body.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, ForwardError> {
        let mut weather_url = base_url.clone();
        weather_url
            .path_segments_mut()
            .map_err(|_| ForwardError::NotABaseUrl(base_url.clone()))?
            .pop_if_empty()
            .push(Self::ROUTE);

        let client = make_http_client(timeout).map_err(ForwardError::Transport)?;
        Ok(Self { client, weather_url })
    }

    pub fn weather_url(&self) -> &Url {
        &self.weather_url
    }

    #[tracing::instrument(level = "debug", skip(self, context), fields(postal_code=%code))]
    pub async fn forward(
        &self, code: &PostalCode, context: &CorrelationContext,
    ) -> Result<ForwardedResponse, ForwardError> {
        const LABEL: &str = "resolution stage";

        let response = self
            .client
            .post(self.weather_url.clone())
            .headers(CorrelationPropagator::headers_for(context))
            .json(&PostalCodeRequest::new(code))
            .send()
            .await
            .map_err(ForwardError::Transport)?;
        log_response(LABEL, &self.weather_url, &response);

        let status = response.status();
        let body = response.bytes().await.map_err(ForwardError::Body)?;
        Ok(ForwardedResponse { status, body })
    }
}
