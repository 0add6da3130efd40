use crate::errors::ProviderError;
use crate::services::ForwardError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    IO(#[from] std::io::Error),

    #[error("HTTP engine error: {0}")]
    HttpEngine(#[from] hyper::Error),

    #[error("failed joining with thread: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to build provider client: {0}")]
    Provider(#[from] ProviderError),

    #[error("failed to build resolution stage client: {0}")]
    ResolutionStage(#[from] ForwardError),
}
