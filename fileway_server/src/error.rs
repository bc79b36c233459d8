//! Maps [`fileway_core::ConduitError`] and request-validation failures onto
//! HTTP status codes, per spec.md §6/§7.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fileway_core::ConduitError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Conduit(#[from] ConduitError),

    #[error("missing or invalid parameter: {0}")]
    BadRequest(String),

    #[error("secret mismatch")]
    Unauthorized,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Conduit(ConduitError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ServerError::Conduit(ConduitError::Unauthorized) | ServerError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "secret mismatch".to_owned())
            }
            ServerError::Conduit(ConduitError::BadRequest(_)) | ServerError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ServerError::Conduit(ConduitError::Conflict(_)) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            ServerError::Conduit(ConduitError::Gone) => {
                (StatusCode::GONE, self.to_string())
            }
            ServerError::Conduit(ConduitError::UploadTimeout) => {
                (StatusCode::REQUEST_TIMEOUT, self.to_string())
            }
        };
        (status, message).into_response()
    }
}
