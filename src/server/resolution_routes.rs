use super::result::{ErrorEnvelope, HttpError, TEMPERATURE_UNAVAILABLE, ZIPCODE_NOT_FOUND};
use super::state::ResolutionState;
use crate::model::{PostalCodeRequest, WeatherResult};
use crate::resolution::{ResolutionFailure, WeatherResolution};
use crate::telemetry::{CorrelationPropagator, Telemetry};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing, Json, Router};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(resolve_weather),
    components(schemas(PostalCodeRequest, WeatherResult, ErrorEnvelope)),
    tags((name = "resolution", description = "Postal code to temperature resolution"))
)]
pub struct ResolutionApiDoc;

pub fn api() -> Router<ResolutionState> {
    Router::new()
        .route("/weather", routing::post(resolve_weather))
        .route("/api-doc/openapi.json", routing::get(serve_api_doc))
}

async fn serve_api_doc() -> impl IntoResponse {
    Json(ResolutionApiDoc::openapi())
}

#[utoipa::path(
    post,
    path = "/weather",
    tag = "resolution",
    request_body = PostalCodeRequest,
    responses(
        (status = 200, description = "Current temperature for the postal code", body = WeatherResult),
        (status = 404, description = "Postal code could not be located", body = ErrorEnvelope),
        (status = 422, description = "Postal code is not eight digits", body = ErrorEnvelope),
        (status = 500, description = "Temperature could not be fetched", body = ErrorEnvelope),
    ),
)]
#[tracing::instrument(level = "debug", skip_all)]
async fn resolve_weather(
    State(resolution): State<WeatherResolution>, State(telemetry): State<Telemetry>,
    headers: HeaderMap, body: Bytes,
) -> Response {
    let inherited = CorrelationPropagator::extract(&headers);
    let mut span = telemetry.start_span("handle_weather", &inherited);

    let Some(code) = PostalCodeRequest::parse_body(&body) else {
        span.record_error(&"invalid zipcode");
        return HttpError::invalid_zipcode().into_response();
    };

    match resolution.resolve(&code, span.context()).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),

        Err(failure) => {
            tracing::warn!(error=?failure, postal_code=%code, "weather resolution failed");
            span.record_error(&failure);
            let error = match failure {
                ResolutionFailure::LocationNotFound(_) => {
                    HttpError::NotFound { message: ZIPCODE_NOT_FOUND.into() }
                },
                ResolutionFailure::TemperatureUnavailable(_) => {
                    HttpError::Internal { message: TEMPERATURE_UNAVAILABLE.into() }
                },
            };
            error.into_response()
        },
    }
}
