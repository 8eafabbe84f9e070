//! Per-request identifiers.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::errors::{AppError, AppErrorWithRequestId};

/// Response header echoing the request id.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Random id generated once per inbound request, stored in request
/// extensions and echoed in error bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }

    /// The id attached to `request`, or an empty string outside the layer.
    pub fn of(request: &Request) -> String {
        request
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_default()
    }

    /// Tag an error with this request's id.
    pub fn error(&self, err: impl Into<AppError>) -> AppErrorWithRequestId {
        AppErrorWithRequestId::new(err, self.0.clone())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// Assign a request id, run the rest of the stack inside a span carrying
/// it, and echo it back as `x-request-id`.
pub async fn request_id_layer(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::new();
    let span = tracing::info_span!("request", request_id = %request_id.0);
    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id.0) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
