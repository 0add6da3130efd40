use super::result::{
    ErrorEnvelope, HttpError, RESOLUTION_STAGE_UNREACHABLE, RESOLUTION_STAGE_UNREADABLE,
};
use super::state::EdgeState;
use crate::model::{PostalCodeRequest, WeatherResult};
use crate::services::{ForwardError, ResolutionStageClient};
use crate::telemetry::{CorrelationPropagator, Telemetry};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::{routing, Json, Router};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(submit_postal_code),
    components(schemas(PostalCodeRequest, WeatherResult, ErrorEnvelope)),
    tags((name = "edge", description = "Postal code weather lookup"))
)]
pub struct EdgeApiDoc;

pub fn api() -> Router<EdgeState> {
    Router::new()
        .route("/zipcode", routing::post(submit_postal_code))
        .route("/api-doc/openapi.json", routing::get(serve_api_doc))
}

async fn serve_api_doc() -> impl IntoResponse {
    Json(EdgeApiDoc::openapi())
}

#[utoipa::path(
    post,
    path = "/zipcode",
    tag = "edge",
    request_body = PostalCodeRequest,
    responses(
        (status = 200, description = "Weather relayed from the resolution stage", body = WeatherResult),
        (status = 404, description = "Relayed from the resolution stage", body = ErrorEnvelope),
        (status = 422, description = "Postal code is not eight digits", body = ErrorEnvelope),
        (status = 500, description = "Resolution stage unreachable or failed", body = ErrorEnvelope),
    ),
)]
#[tracing::instrument(level = "debug", skip_all)]
async fn submit_postal_code(
    State(resolution_stage): State<ResolutionStageClient>, State(telemetry): State<Telemetry>,
    headers: HeaderMap, body: Bytes,
) -> Response {
    let inherited = CorrelationPropagator::extract(&headers);
    let mut span = telemetry.start_span("handle_zip_code", &inherited);

    let Some(code) = PostalCodeRequest::parse_body(&body) else {
        span.record_error(&"invalid zipcode");
        return HttpError::invalid_zipcode().into_response();
    };

    tracing::info!(postal_code=%code, "forwarding postal code to resolution stage");
    let mut forward_span = telemetry.start_span("forward_to_resolution_stage", span.context());
    let outcome = resolution_stage.forward(&code, forward_span.context()).await;
    if let Err(ref error) = outcome {
        forward_span.record_error(error);
    }
    forward_span.end();

    match outcome {
        Ok(relayed) => {
            tracing::info!(status=%relayed.status, "relaying resolution stage response");
            (
                relayed.status,
                [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                relayed.body,
            )
                .into_response()
        },

        Err(error) => {
            tracing::error!(?error, "resolution stage exchange failed");
            span.record_error(&error);
            let message = match error {
                ForwardError::Body(_) => RESOLUTION_STAGE_UNREADABLE,
                ForwardError::Transport(_) | ForwardError::NotABaseUrl(_) => {
                    RESOLUTION_STAGE_UNREACHABLE
                },
            };
            HttpError::Internal { message: message.into() }.into_response()
        },
    }
}
