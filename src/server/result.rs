use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::ToSchema;

pub const INVALID_ZIPCODE: &str = "invalid zipcode";
pub const ZIPCODE_NOT_FOUND: &str = "can not find zipcode";
pub const TEMPERATURE_UNAVAILABLE: &str = "error fetching temperature";
pub const RESOLUTION_STAGE_UNREACHABLE: &str = "error communicating with weather service";
pub const RESOLUTION_STAGE_UNREADABLE: &str = "error processing response";

/// The only error-shaped payload either stage returns.
#[derive(Debug, Clone, PartialEq, Eq, ToSchema, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[schema(example = "invalid zipcode")]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    Unprocessable { message: Cow<'static, str> },
    NotFound { message: Cow<'static, str> },
    Internal { message: Cow<'static, str> },
}

impl HttpError {
    pub const fn invalid_zipcode() -> Self {
        Self::Unprocessable { message: Cow::Borrowed(INVALID_ZIPCODE) }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Unprocessable { message }
            | Self::NotFound { message }
            | Self::Internal { message } => message,
        };

        (status, Json(ErrorEnvelope { message: message.into_owned() })).into_response()
    }
}
