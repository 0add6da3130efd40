mod edge_routes;
mod errors;
mod resolution_routes;
mod result;
mod state;

pub use errors::ApiError;
pub use result::ErrorEnvelope;

use state::{EdgeState, ResolutionState};

use crate::telemetry::Telemetry;
use crate::{Settings, Stage};
use axum::http::{Request, StatusCode, Uri};
use axum::Router;
use std::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestId, RequestId};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::ServiceBuilderExt;

pub type HttpJoinHandle = JoinHandle<Result<(), ApiError>>;

pub struct Server {
    port: u16,
    server_handle: HttpJoinHandle,
}

impl Server {
    #[tracing::instrument(level = "debug", skip(settings))]
    pub async fn build(
        settings: &Settings, stage: Stage, telemetry: Telemetry,
    ) -> Result<Self, ApiError> {
        let app = match stage {
            Stage::Edge => edge_app(state::initialize_edge_state(settings, telemetry)?),
            Stage::Resolution => {
                resolution_app(state::initialize_resolution_state(settings, telemetry)?)
            },
        };

        let address = settings.address();
        let listener = tokio::net::TcpListener::bind(&address).await?;
        tracing::info!(%stage, "API listening on {address}: {listener:?}");
        let std_listener = listener.into_std()?;
        let port = std_listener.local_addr()?.port();

        let server_handle = run_http_server(std_listener, app, stage)?;
        Ok(Self { port, server_handle })
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), ApiError> {
        self.server_handle.await?
    }
}

/// Routes of the edge stage, ready to serve.
fn edge_app(state: EdgeState) -> Router {
    edge_routes::api().with_state(state)
}

/// Routes of the resolution stage, ready to serve.
fn resolution_app(state: ResolutionState) -> Router {
    resolution_routes::api().with_state(state)
}

#[derive(Debug, Clone, Copy, Default)]
struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let request_id = uuid::Uuid::new_v4().to_string().parse().ok()?;
        Some(RequestId::new(request_id))
    }
}

#[tracing::instrument(level = "trace", skip(app))]
fn run_http_server(
    listener: TcpListener, app: Router, stage: Stage,
) -> Result<HttpJoinHandle, ApiError> {
    let middleware_stack = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .propagate_x_request_id();

    let app = app.fallback(fallback).layer(middleware_stack);

    let builder = axum::Server::from_tcp(listener)?;
    let handle = tokio::spawn(async move {
        tracing::debug!(app_routes=?app, "starting {stage} API server...");
        let server = builder.serve(app.into_make_service());
        let graceful = server.with_graceful_shutdown(shutdown_signal());
        graceful.await?;
        tracing::info!("{stage} API shutting down");
        Ok(())
    });

    Ok(handle)
}

async fn fallback(uri: Uri) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("No route found for {uri}"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("signal received, starting graceful shutdown");
}
