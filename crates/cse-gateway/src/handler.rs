use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response as AxumResponse};
use cse_dispatch::Dispatcher;
use cse_types::Response;
use tracing::Instrument as _;

use crate::envelope::{build_request, render_response};

/// The single entry point every HTTP method is routed to. Builds a
/// canonical request from the incoming parts, hands it to the dispatcher,
/// and renders whatever comes back.
pub async fn handle(
    State(dispatcher): State<Arc<Dispatcher>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> AxumResponse {
    let request = match build_request(&method, &uri, &headers, &body) {
        Ok(request) => request,
        Err(err) => {
            tracing::debug!(%err, "rejecting malformed request at the gateway");
            let rvi = headers
                .get(crate::constants::HEADER_RELEASE_VERSION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            let rqi = headers
                .get(crate::constants::HEADER_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            return render_response(Response::error(rqi, rvi, err.rsc(), err.to_string()));
        }
    };

    let span = tracing::info_span!(
        "http_request",
        rqi = %request.rqi,
        op = ?request.op,
        to = %request.to,
        originator = %request.originator,
    );

    let response = dispatcher.handle(request).instrument(span).await;
    render_response(response)
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
