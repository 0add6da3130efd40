use crate::errors::ResolutionError;
use crate::model::{PostalCode, Temperature, WeatherResult};
use crate::services::{LocationApi, TemperatureApi};
use crate::telemetry::CorrelationContext;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolutionFailure {
    #[error("postal code location not found: {0}")]
    LocationNotFound(#[source] ResolutionError),

    #[error("temperature unavailable: {0}")]
    TemperatureUnavailable(#[source] ResolutionError),
}

/// Resolves a postal code into a finished weather reading: location first, then the
/// temperature for that city, then unit conversion. The first failure ends the request.
#[derive(Clone)]
pub struct WeatherResolution {
    locations: Arc<dyn LocationApi>,
    temperatures: Arc<dyn TemperatureApi>,
}

impl fmt::Debug for WeatherResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherResolution").finish()
    }
}

impl WeatherResolution {
    pub fn new(locations: Arc<dyn LocationApi>, temperatures: Arc<dyn TemperatureApi>) -> Self {
        Self { locations, temperatures }
    }

    #[tracing::instrument(level = "debug", skip(context))]
    pub async fn resolve(
        &self, code: &PostalCode, context: &CorrelationContext,
    ) -> Result<WeatherResult, ResolutionFailure> {
        let city = self
            .locations
            .resolve(code, context)
            .await
            .map_err(ResolutionFailure::LocationNotFound)?;

        let celsius = self
            .temperatures
            .resolve(&city, context)
            .await
            .map_err(ResolutionFailure::TemperatureUnavailable)?;

        let result = WeatherResult::new(city, Temperature::from_celsius(celsius));
        tracing::info!(?result, "weather resolved for postal code");
        Ok(result)
    }
}
