//! Header names and parsing for the quote and payment handshake.

use crate::error::{ApiError, ApiResult};
use crate::payment::PayToken;
use crate::state::AppState;
use axum::http::header::CONTENT_LENGTH;
use axum::http::{HeaderMap, HeaderValue};
use unhash_core::Quote;

/// Size being quoted, declared by the client or defaulted by the server.
pub const UPLOAD_LENGTH: &str = "upload-length";
/// Price in settlement units.
pub const PAY_PRICE: &str = "pay-price";
/// `interledger-psk <price> <destination> <shared secret>`.
pub const PAY: &str = "pay";
/// Token naming the prepaid balance and payment channel.
pub const PAY_TOKEN: &str = "pay-token";
/// Remaining prepaid balance for the token.
pub const PAY_BALANCE: &str = "pay-balance";

fn parse_size(name: &str, value: &HeaderValue) -> ApiResult<u64> {
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or_else(|| ApiError::BadRequest(format!("invalid {name} header")))
}

/// Size declared on a quote request, if any.
pub fn upload_length(headers: &HeaderMap) -> ApiResult<Option<u64>> {
    headers
        .get(UPLOAD_LENGTH)
        .map(|value| parse_size(UPLOAD_LENGTH, value))
        .transpose()
}

/// Declared length of an upload body. Required.
pub fn content_length(headers: &HeaderMap) -> ApiResult<u64> {
    let value = headers
        .get(CONTENT_LENGTH)
        .ok_or(ApiError::LengthRequired)?;
    parse_size("content-length", value)
}

/// Pay token presented by the client, if any.
pub fn pay_token(headers: &HeaderMap) -> ApiResult<Option<PayToken>> {
    let Some(value) = headers.get(PAY_TOKEN) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::BadRequest("invalid pay-token header".to_string()))?;
    Ok(Some(PayToken::parse(value)?))
}

/// Headers describing `quote` and how to pay it with `token`.
pub async fn quote_headers(state: &AppState, quote: &Quote, token: &PayToken) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(UPLOAD_LENGTH, HeaderValue::from(quote.size));
    headers.insert(PAY_PRICE, HeaderValue::from(quote.price));

    if let Ok(value) = HeaderValue::from_str(token.as_str()) {
        headers.insert(PAY_TOKEN, value);
    }

    if let Some(channel) = &state.channel {
        let address = channel.channel_for(token);
        let pay = format!(
            "interledger-psk {} {} {}",
            quote.price, address.destination, address.shared_secret
        );
        match HeaderValue::from_str(&pay) {
            Ok(value) => {
                headers.insert(PAY, value);
            }
            Err(e) => tracing::warn!(error = %e, "Payment destination is not a valid header value"),
        }
    }

    if state.config.server.expose_balance
        && let Some(balance) = state.payments.balance(token).await
    {
        headers.insert(PAY_BALANCE, HeaderValue::from(balance));
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_upload_length() {
        assert_eq!(upload_length(&HeaderMap::new()).unwrap(), None);
        assert_eq!(
            upload_length(&headers(&[(UPLOAD_LENGTH, "1024")])).unwrap(),
            Some(1024)
        );
        assert!(matches!(
            upload_length(&headers(&[(UPLOAD_LENGTH, "-1")])),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            upload_length(&headers(&[(UPLOAD_LENGTH, "lots")])),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_content_length_required() {
        assert!(matches!(
            content_length(&HeaderMap::new()),
            Err(ApiError::LengthRequired)
        ));
        assert_eq!(
            content_length(&headers(&[("content-length", "0")])).unwrap(),
            0
        );
    }

    #[test]
    fn test_pay_token() {
        assert!(pay_token(&HeaderMap::new()).unwrap().is_none());
        let token = pay_token(&headers(&[(PAY_TOKEN, "abc_123")]))
            .unwrap()
            .unwrap();
        assert_eq!(token.as_str(), "abc_123");
        assert!(matches!(
            pay_token(&headers(&[(PAY_TOKEN, "no/slashes")])),
            Err(ApiError::BadRequest(_))
        ));
    }
}
