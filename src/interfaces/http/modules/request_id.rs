//! Request ID middleware
//!
//! Every request is tagged with an `X-Request-Id`. A well-formed id sent by
//! the caller (gateway) is kept, otherwise a UUID v4 is generated. The id
//! scopes all log lines of the request and is echoed in the response.

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied id that is propagated as is.
const MAX_REQUEST_ID_LEN: usize = 64;

/// Correlation id stored in request extensions.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

fn incoming_request_id(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    let well_formed = !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    well_formed.then(|| value.to_string())
}

pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id =
        incoming_request_id(request.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(REQUEST_ID_HEADER, value.parse().unwrap());
        map
    }

    #[test]
    fn keeps_well_formed_ids() {
        assert_eq!(
            incoming_request_id(&headers("gw-7f3a.01")).as_deref(),
            Some("gw-7f3a.01")
        );
    }

    #[test]
    fn replaces_missing_or_malformed_ids() {
        assert!(incoming_request_id(&HeaderMap::new()).is_none());
        assert!(incoming_request_id(&headers("  ")).is_none());
        assert!(incoming_request_id(&headers("has space")).is_none());
        assert!(incoming_request_id(&headers(&"a".repeat(65))).is_none());
    }
}
