use axum::{
    body::Bytes,
    extract,
    http::{header, StatusCode, Uri},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::error;

use crate::api::{api_error::ApiError, state::ApiServerState};

#[tracing::instrument(
    name = "mutate",
    fields(host=crate::config::HOSTNAME.as_str()),
    skip_all)]
/// Compute the JSON-Patch for the Pod carried by an AdmissionReview.
///
/// The body is taken as raw bytes: decoding is part of the mutation and its
/// failures are reported with a 500 holding the error text.
pub(crate) async fn mutate_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.mutator.mutate(&body).map_err(|e| {
        error!(error = %e, "mutation failed");
        ApiError::from(e)
    })?;

    Ok(([(header::CONTENT_TYPE, "application/json")], response))
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

/// Greets whoever hits a path that isn't served by another route.
pub(crate) async fn root_handler(uri: Uri) -> String {
    format!("hello {:?}", escape_html(uri.path()))
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '\'' => escaped.push_str("&#39;"),
            '"' => escaped.push_str("&#34;"),
            c => escaped.push(c),
        }
    }
    escaped
}
