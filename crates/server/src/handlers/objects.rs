//! Object upload and retrieval.

use crate::error::ApiResult;
use crate::metrics;
use crate::payment::PaidUpload;
use crate::state::AppState;
use axum::Json;
use axum::body::Body;
use axum::extract::{Extension, Path, Request, State};
use axum::http::{Method, StatusCode};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde::Serialize;
use std::time::Instant;
use unhash_core::Digest;
use unhash_storage::{CommitOutcome, StorageError, store_stream};

/// Upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Digest of the stored object.
    pub digest: Digest,
}

/// POST /upload - Store an object.
///
/// Runs behind the payment middleware, which has already charged for the
/// declared length. Responds 201 when the object is new and 200 when an
/// identical object was already stored.
pub async fn upload_object(
    State(state): State<AppState>,
    Extension(paid): Extension<PaidUpload>,
    request: Request,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let start = Instant::now();

    // Never store more than was paid for.
    let limit = paid.size;
    let mut received = 0u64;
    let body = request.into_body().into_data_stream().map(move |chunk| {
        let chunk = chunk.map_err(|e| e.to_string())?;
        received += chunk.len() as u64;
        if received > limit {
            return Err(format!("body exceeds declared length of {limit} bytes"));
        }
        Ok(chunk)
    });

    let stored = match store_stream(state.storage.as_ref(), body).await {
        Ok(stored) => stored,
        Err(e) => {
            metrics::INGEST_FAILURES.inc();
            return Err(e.into());
        }
    };
    metrics::UPLOAD_DURATION.observe(start.elapsed().as_secs_f64());

    let status = match stored.outcome {
        CommitOutcome::Created => {
            metrics::OBJECTS_CREATED.inc();
            metrics::BYTES_STORED.inc_by(stored.size);
            StatusCode::CREATED
        }
        CommitOutcome::AlreadyExists => {
            metrics::OBJECTS_DEDUPLICATED.inc();
            StatusCode::OK
        }
    };

    tracing::info!(
        digest = %stored.digest,
        size = stored.size,
        price = paid.price,
        outcome = stored.outcome.as_str(),
        "Object uploaded"
    );

    Ok((
        status,
        Json(UploadResponse {
            digest: stored.digest,
        }),
    ))
}

/// GET /{hash} - Retrieve an object.
///
/// Malformed and unknown digests are both answered with an empty 404.
/// Uppercase hex is accepted. HEAD reports the size without opening the
/// object and is not counted as served.
pub async fn get_object(
    State(state): State<AppState>,
    method: Method,
    Path(hash): Path<String>,
) -> ApiResult<Response> {
    let Ok(digest) = Digest::parse(&hash) else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let meta = match state.storage.head(&digest).await {
        Ok(meta) => meta,
        Err(StorageError::NotFound(_)) => return Ok(StatusCode::NOT_FOUND.into_response()),
        Err(e) => return Err(e.into()),
    };

    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        let stream = state.storage.get_stream(&digest).await?;
        metrics::OBJECTS_SERVED.inc();
        Body::from_stream(
            stream.map(|result| result.map_err(|e| std::io::Error::other(e.to_string()))),
        )
    };

    let size = meta.size.to_string();
    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/octet-stream"),
            (CONTENT_LENGTH, size.as_str()),
        ],
        body,
    )
        .into_response())
}

/// GET on an upload endpoint. Answered like any path that is not a digest.
pub async fn object_not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
