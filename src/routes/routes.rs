//! Defines routes for the asset store endpoint and operational probes.
//!
//! ## Structure
//! - **Store endpoint (mounted at `/`)**
//!   - `POST/PUT /` — multipart upload; whole-file batch by default, chunked
//!     append when `X-File-Name` is set
//!   - `GET    /?f=<name>` — download one stored object
//!   - `GET    /` — list stored objects
//!   - `HEAD   /` — same as GET, headers only
//!   - `DELETE /?f=<name>` — remove one object
//!   - `OPTIONS /` — advertise the supported method set
//! - **Probes**
//!   - `GET /healthz`, `GET /readyz`
//!
//! Object content changes under stable names (compaction overwrites, chunk
//! appends), so every response opts out of client caching.

use crate::{
    handlers::{
        file_handlers::{delete_file, fetch_or_list, head_fetch_or_list, preflight, upload},
        health_handlers::{healthz, readyz},
    },
    services::upload_service::UploadService,
};
use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
    routing::get,
};

/// Build and return the router for the whole service.
///
/// The router carries shared state (`UploadService`) to all handlers. Upload
/// bodies beyond `max_upload_bytes` are rejected before they reach a handler.
pub fn routes(max_upload_bytes: usize) -> Router<UploadService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // the store itself lives at the root path
        .route(
            "/",
            get(fetch_or_list)
                .head(head_fetch_or_list)
                .post(upload)
                .put(upload)
                .delete(delete_file)
                .options(preflight),
        )
        .layer(middleware::from_fn(no_store))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Stamp no-cache headers onto every reply, error responses included.
async fn no_store(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("private, no-cache"),
    );
    response
}
