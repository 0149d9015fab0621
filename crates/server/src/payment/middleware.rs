//! Payment enforcement for uploads.

use crate::error::{ApiError, ApiResult};
use crate::headers;
use crate::metrics;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// What the caller paid for, attached to the request for the upload handler.
#[derive(Clone, Debug)]
pub struct PaidUpload {
    /// Declared body length in bytes.
    pub size: u64,
    /// Amount charged.
    pub price: u64,
}

/// Charge the price of the declared `Content-Length` before the body is read.
///
/// Rejected requests get 402 with the same headers a quote would carry, so
/// the client can pay and retry. A charge is refunded when the upload
/// handler answers with a server error.
pub async fn require_payment(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let size = headers::content_length(request.headers())?;
    if let Some(limit) = state.config.server.max_object_size
        && size > limit
    {
        return Err(ApiError::PayloadTooLarge { size, limit });
    }

    let token = headers::pay_token(request.headers())?;
    let price = state.pricing.price(size);

    if let Err(rejection) = state.payments.authorize(token.as_ref(), price).await {
        metrics::PAYMENTS_REJECTED.inc();
        tracing::info!(
            size,
            price,
            gate = state.payments.name(),
            reason = %rejection,
            "Upload payment rejected"
        );

        let token = token.unwrap_or_else(crate::payment::PayToken::generate);
        let quote = state.pricing.quote(Some(size));
        let quote_headers = headers::quote_headers(&state, &quote, &token).await;
        return Ok((quote_headers, ApiError::PaymentRequired(rejection.to_string())).into_response());
    }

    request.extensions_mut().insert(PaidUpload { size, price });
    let response = next.run(request).await;

    if response.status().is_server_error()
        && price > 0
        && let Some(token) = &token
    {
        state.payments.refund(token, price).await;
        tracing::warn!(
            size,
            price,
            status = %response.status(),
            "Upload failed after payment, charge refunded"
        );
    }

    Ok(response)
}
