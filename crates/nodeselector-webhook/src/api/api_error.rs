use axum::{http::StatusCode, response::IntoResponse};

use crate::mutation::errors::MutationError;

#[derive(Debug)]
/// An error that can be returned by the API.
/// The API server only logs the body, so the error text is sent as is.
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl From<MutationError> for ApiError {
    fn from(error: MutationError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
