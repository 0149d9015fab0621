//! Test fixtures for generating test data and requests.

use axum::body::Body;
use axum::http::{Request, Response};
use bytes::Bytes;
use sha2::{Digest, Sha256};

/// Generate deterministic test data based on a seed.
pub fn seeded_bytes(seed: u64, len: usize) -> Bytes {
    let mut data = vec![0u8; len];
    let mut state = seed;

    for chunk in data.chunks_mut(8) {
        // Simple LCG for deterministic data
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let bytes = state.to_le_bytes();
        for (i, byte) in chunk.iter_mut().enumerate() {
            *byte = bytes[i % 8];
        }
    }

    Bytes::from(data)
}

/// Compute SHA-256 hash of data as hex string.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub fn sha256_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// POST `data` to `uri` with a matching Content-Length.
#[allow(dead_code)]
pub fn upload_request(uri: &str, data: Bytes, pay_token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-length", data.len().to_string());
    if let Some(token) = pay_token {
        builder = builder.header("pay-token", token);
    }
    builder.body(Body::from(data)).unwrap()
}

/// OPTIONS quote request with optional declared size and token.
#[allow(dead_code)]
pub fn quote_request(uri: &str, size: Option<u64>, pay_token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("OPTIONS").uri(uri);
    if let Some(size) = size {
        builder = builder.header("upload-length", size.to_string());
    }
    if let Some(token) = pay_token {
        builder = builder.header("pay-token", token);
    }
    builder.body(Body::empty()).unwrap()
}

/// Simple GET request.
#[allow(dead_code)]
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Collect a response body.
#[allow(dead_code)]
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

/// Collect a JSON response body.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Read a header as a string.
#[allow(dead_code)]
pub fn header<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}
