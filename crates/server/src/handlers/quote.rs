//! Price quote handshake.

use crate::error::ApiResult;
use crate::headers;
use crate::metrics;
use crate::payment::PayToken;
use crate::state::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

/// OPTIONS /upload - Quote the price of an upload.
///
/// Prices the `Upload-Length` header, or the configured worst-case size when
/// it is absent; the priced size is echoed back either way. A pay token is
/// issued when the client did not present one. No storage is touched.
pub async fn quote(State(state): State<AppState>, request_headers: HeaderMap) -> ApiResult<Response> {
    let declared = headers::upload_length(&request_headers)?;
    let token = headers::pay_token(&request_headers)?.unwrap_or_else(PayToken::generate);

    let quote = state.pricing.quote(declared);
    metrics::QUOTES_ISSUED.inc();
    tracing::debug!(
        size = quote.size,
        price = quote.price,
        defaulted = quote.defaulted,
        "Quote issued"
    );

    let response_headers = headers::quote_headers(&state, &quote, &token).await;
    Ok((StatusCode::NO_CONTENT, response_headers).into_response())
}
