use axum::http::header::HeaderName;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use gbce_core::{
    Envelope, EnvelopeError, EnvelopeMeta, ErrorKind, Handled, Payload, TransactionId,
};
use serde_json::Value;
use thiserror::Error;

/// Response header carrying the request's transaction id.
pub static TRANSACTION_ID_HEADER: HeaderName = HeaderName::from_static("x-transaction-id");

/// HTTP status for each failure category.
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Referential => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// An enveloped response with its status.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub envelope: Envelope<Value>,
}

impl ApiResponse {
    /// Map a handled operation to a response; `success` is used when it succeeded.
    pub fn from_handled<T: Payload>(
        handled: Handled<T>,
        success: StatusCode,
    ) -> Result<Self, ApiError> {
        let status = handled.error_kind().map_or(success, status_for);
        Ok(Self {
            status,
            envelope: handled.into_envelope()?,
        })
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let transaction_id = self.envelope.meta.transaction_id;
        let mut response = (self.status, Json(self.envelope)).into_response();
        if let Ok(value) = HeaderValue::from_str(&transaction_id.to_string()) {
            response
                .headers_mut()
                .insert(TRANSACTION_ID_HEADER.clone(), value);
        }
        response
    }
}

/// Failures of the HTTP layer itself, outside any exchange operation.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("request worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("no route for {method} {path}")]
    NoRoute { method: String, path: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Serialization(_) | Self::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRoute { .. } => StatusCode::NOT_FOUND,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Serialization(_) | Self::Worker(_) => "INTERNAL",
            Self::NoRoute { .. } => ErrorKind::NotFound.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        ApiResponse {
            status,
            envelope: Envelope::failure(
                EnvelopeMeta::new(TransactionId::new(), 0),
                vec![EnvelopeError::new(self.code(), self.to_string())],
            ),
        }
        .into_response()
    }
}

/// Errors starting or running the server.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
