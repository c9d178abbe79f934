//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that round-trips a probe object through the store

use crate::services::upload_service::UploadService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// `GET /healthz`
///
/// Liveness probe. Always returns 200 OK with a plain JSON body and never
/// performs I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that performs a best-effort write/read/delete round trip
/// through the storage service. Returns JSON describing the check, HTTP 200
/// when it passes and HTTP 503 when it fails.
pub async fn readyz(State(service): State<UploadService>) -> impl IntoResponse {
    // Dot-prefixed names are storable but hidden from listings, so a probe
    // can never show up as a stored object.
    let probe = format!(".readyz-{}", Uuid::new_v4());
    let storage = &service.storage;

    let disk_check = match storage.write(&probe, b"readyz").await {
        Ok(_) => match storage.read(&probe).await {
            Ok(bytes) if bytes == b"readyz" => match storage.delete(&probe).await {
                Ok(_) => (true, None::<String>),
                Err(e) => (true, Some(format!("could not remove probe object: {}", e))),
            },
            Ok(_) => {
                let _ = storage.delete(&probe).await; // best-effort cleanup
                (false, Some("probe content mismatch".to_string()))
            }
            Err(e) => {
                let _ = storage.delete(&probe).await; // best-effort cleanup
                (false, Some(format!("could not read probe object: {}", e)))
            }
        },
        Err(e) => (false, Some(format!("could not write probe object: {}", e))),
    };

    let disk_ok = disk_check.0;

    let mut checks = HashMap::new();
    checks.insert(
        "disk",
        CheckStatus {
            ok: disk_ok,
            error: disk_check.1,
        },
    );

    let body = ReadyResponse {
        status: if disk_ok { "ok".into() } else { "error".into() },
        checks,
    };

    let status = if disk_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
