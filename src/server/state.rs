use super::errors::ApiError;
use crate::resolution::WeatherResolution;
use crate::services::{ResolutionStageClient, ViaCepLocationApi, WeatherApiTemperatureApi};
use crate::telemetry::Telemetry;
use crate::Settings;
use axum::extract::FromRef;
use std::sync::Arc;

#[tracing::instrument(level = "trace", skip(settings))]
pub fn initialize_edge_state(
    settings: &Settings, telemetry: Telemetry,
) -> Result<EdgeState, ApiError> {
    let resolution_stage =
        ResolutionStageClient::new(&settings.resolution_url, settings.forward_timeout)?;
    tracing::info!(url=%resolution_stage.weather_url(), "forwarding to resolution stage");
    Ok(EdgeState { resolution_stage, telemetry })
}

#[tracing::instrument(level = "trace", skip(settings))]
pub fn initialize_resolution_state(
    settings: &Settings, telemetry: Telemetry,
) -> Result<ResolutionState, ApiError> {
    let locations = ViaCepLocationApi::new(
        settings.viacep_base_url.clone(),
        settings.provider_timeout,
        telemetry.clone(),
    )?;

    let temperatures = WeatherApiTemperatureApi::new(
        settings.weather_api_base_url.clone(),
        settings.weather_api_key().cloned(),
        settings.provider_timeout,
        telemetry.clone(),
    )?;

    let resolution = WeatherResolution::new(Arc::new(locations), Arc::new(temperatures));
    Ok(ResolutionState { resolution, telemetry })
}

#[derive(Debug, Clone)]
pub struct EdgeState {
    pub resolution_stage: ResolutionStageClient,
    pub telemetry: Telemetry,
}

impl FromRef<EdgeState> for ResolutionStageClient {
    fn from_ref(state: &EdgeState) -> Self {
        state.resolution_stage.clone()
    }
}

impl FromRef<EdgeState> for Telemetry {
    fn from_ref(state: &EdgeState) -> Self {
        state.telemetry.clone()
    }
}

#[derive(Debug, Clone)]
pub struct ResolutionState {
    pub resolution: WeatherResolution,
    pub telemetry: Telemetry,
}

impl FromRef<ResolutionState> for WeatherResolution {
    fn from_ref(state: &ResolutionState) -> Self {
        state.resolution.clone()
    }
}

impl FromRef<ResolutionState> for Telemetry {
    fn from_ref(state: &ResolutionState) -> Self {
        state.telemetry.clone()
    }
}
