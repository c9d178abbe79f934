//! HTTP handlers for the file endpoint.
//! Parses the wire protocol (upload mode header, `f` query, Accept
//! negotiation) and delegates all storage and bundling work to
//! `UploadService`.

use crate::{
    errors::AppError,
    models::{file_status::FileStatus, object::ObjectMeta},
    services::storage_service::StorageService,
    services::upload_service::{UploadService, UploadedFile},
};
use axum::{
    body::Body,
    extract::{FromRequestParts, Multipart, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::convert::Infallible;
use tokio_util::io::ReaderStream;

/// Header that switches an upload request into chunked mode and names the
/// append destination.
const X_FILE_NAME: &str = "x-file-name";

/// Query params accepted by GET/HEAD and DELETE.
#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub f: Option<String>,
}

/// Media type for status and listing replies, negotiated from the Accept
/// header. Anything that is missing, unreadable, or does not mention JSON
/// falls back to plain text; the body is JSON either way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyFormat {
    Json,
    PlainText,
}

impl ReplyFormat {
    fn from_accept(accept: Option<&HeaderValue>) -> Self {
        let json_capable = accept
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.to_ascii_lowercase().contains("application/json"));
        if json_capable {
            Self::Json
        } else {
            Self::PlainText
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::PlainText => "text/plain",
        }
    }
}

impl<S> FromRequestParts<S> for ReplyFormat
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_accept(parts.headers.get(header::ACCEPT)))
    }
}

/// Upload status list, serialized as JSON but delivered with the negotiated
/// media type and a `Vary: Accept` marker.
pub struct StatusReply {
    format: ReplyFormat,
    statuses: Vec<FileStatus>,
}

impl IntoResponse for StatusReply {
    fn into_response(self) -> Response {
        let body = match serde_json::to_string(&self.statuses) {
            Ok(body) => body,
            Err(err) => return AppError::internal(err.to_string()).into_response(),
        };

        let mut response = Response::new(Body::from(body));
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(self.format.content_type()),
        );
        headers.insert(header::VARY, HeaderValue::from_static("Accept"));
        response
    }
}

/// POST/PUT `/` — accept one multipart upload request.
///
/// A non-empty `X-File-Name` header selects chunked mode: its value names
/// the destination and the body must carry exactly one payload. Without the
/// header, every file part is treated as a whole file and the batch is
/// compacted and bundled.
pub async fn upload(
    State(service): State<UploadService>,
    format: ReplyFormat,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<StatusReply, AppError> {
    let files = collect_file_parts(multipart).await?;

    let statuses = match chunk_destination(&headers) {
        Some(destination) => vec![service.append_chunk(&destination, files).await?],
        None => service.process_batch(files).await,
    };

    Ok(StatusReply { format, statuses })
}

/// GET/HEAD `/` — fetch one object when `?f=<name>` is given, otherwise
/// list everything in the store. An empty `f` selects the listing, the same
/// way an empty upload-mode header selects whole-file mode.
pub async fn fetch_or_list(
    State(service): State<UploadService>,
    format: ReplyFormat,
    Query(query): Query<FileQuery>,
) -> Result<Response, AppError> {
    match target_name(&query) {
        Some(name) => fetch_file(&service.storage, name).await,
        None => list_files(&service.storage, format).await,
    }
}

/// HEAD `/` — the same headers GET would send, with no body. Fetches only
/// touch object metadata; listings share the GET path and rely on the body
/// being dropped at the wire.
pub async fn head_fetch_or_list(
    State(service): State<UploadService>,
    format: ReplyFormat,
    Query(query): Query<FileQuery>,
) -> Result<Response, AppError> {
    match target_name(&query) {
        Some(name) => head_file(&service.storage, name).await,
        None => list_files(&service.storage, format).await,
    }
}

/// DELETE `/?f=<name>` — remove one object. Succeeds whether or not the
/// object existed.
pub async fn delete_file(
    State(service): State<UploadService>,
    Query(query): Query<FileQuery>,
) -> Result<Response, AppError> {
    let Some(name) = target_name(&query) else {
        return Err(AppError::bad_request("missing `f` query parameter"));
    };
    if service.storage.exists(name).await? {
        service.storage.delete(name).await?;
    }
    Ok(StatusCode::OK.into_response())
}

/// OPTIONS `/` — advertise the supported method set.
pub async fn preflight() -> Response {
    let mut response = Response::new(Body::empty());
    response.headers_mut().insert(
        header::ALLOW,
        HeaderValue::from_static("DELETE,GET,HEAD,POST,PUT,OPTIONS"),
    );
    response
}

/// Fetch/delete target: the `f` query value, with empty treated as absent.
fn target_name(query: &FileQuery) -> Option<&str> {
    query.f.as_deref().filter(|name| !name.is_empty())
}

/// Chunked mode is selected by a non-empty `X-File-Name` value; an absent
/// or unreadable header means whole-file mode.
fn chunk_destination(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_FILE_NAME)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Drain the multipart body, keeping file parts in submission order and
/// skipping plain form fields.
async fn collect_file_parts(mut multipart: Multipart) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::new(err.status(), format!("malformed multipart body: {err}")))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content = field.bytes().await.map_err(|err| {
            AppError::new(err.status(), format!("unreadable multipart field: {err}"))
        })?;
        files.push(UploadedFile::new(name, content));
    }

    Ok(files)
}

/// Stream one object back as an attachment download.
async fn fetch_file(storage: &StorageService, name: &str) -> Result<Response, AppError> {
    let (meta, file) = storage.open_reader(name).await?;

    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    set_download_headers(response.headers_mut(), &meta);
    Ok(response)
}

/// Answer a HEAD fetch from metadata alone, without opening the object.
async fn head_file(storage: &StorageService, name: &str) -> Result<Response, AppError> {
    let meta = storage.metadata(name).await?;

    let mut response = Response::new(Body::empty());
    set_download_headers(response.headers_mut(), &meta);
    Ok(response)
}

fn set_download_headers(headers: &mut HeaderMap, meta: &ObjectMeta) {
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&meta.size.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
    headers.insert(
        header::LAST_MODIFIED,
        HeaderValue::from_str(&meta.last_modified.to_rfc2822())
            .unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    // Stored names never contain quotes, so the disposition stays well formed.
    if let Ok(value) = HeaderValue::from_str(&attachment_disposition(&meta.name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
}

/// Serialize the store listing in the negotiated format. Every visible
/// object is reported as a status record with its on-disk name and size.
async fn list_files(storage: &StorageService, format: ReplyFormat) -> Result<Response, AppError> {
    let statuses: Vec<FileStatus> = storage
        .list()
        .await?
        .into_iter()
        .map(FileStatus::from)
        .collect();
    let body =
        serde_json::to_string(&statuses).map_err(|err| AppError::internal(err.to_string()))?;

    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(format.content_type()),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Accept"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("inline; filename=\"files.json\""),
    );
    Ok(response)
}

/// Client-facing download name: everything after the first `$` of the
/// stored name. Names without an identity prefix (chunked uploads, foreign
/// files) download under their stored name.
fn download_name(stored: &str) -> &str {
    match stored.split_once('$') {
        Some((_, original)) => original,
        None => stored,
    }
}

fn attachment_disposition(stored: &str) -> String {
    format!("attachment; filename=\"{}\"", download_name(stored))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_name_drops_identity_prefix() {
        assert_eq!(download_name("abc123$report.js"), "report.js");
        assert_eq!(download_name("id$a$b.css"), "a$b.css");
        assert_eq!(download_name("video.bin"), "video.bin");
    }

    #[test]
    fn attachment_disposition_quotes_the_original_name() {
        assert_eq!(
            attachment_disposition("abc123$report.js"),
            "attachment; filename=\"report.js\""
        );
    }

    #[test]
    fn empty_query_target_counts_as_absent() {
        assert_eq!(target_name(&FileQuery { f: None }), None);
        assert_eq!(
            target_name(&FileQuery {
                f: Some(String::new())
            }),
            None
        );
        assert_eq!(
            target_name(&FileQuery {
                f: Some("a.js".into())
            }),
            Some("a.js")
        );
    }

    #[test]
    fn accept_header_negotiates_reply_format() {
        let json = HeaderValue::from_static("application/json");
        assert_eq!(ReplyFormat::from_accept(Some(&json)), ReplyFormat::Json);

        let browser = HeaderValue::from_static("text/html,application/xhtml+xml,*/*;q=0.8");
        assert_eq!(
            ReplyFormat::from_accept(Some(&browser)),
            ReplyFormat::PlainText
        );

        let mixed = HeaderValue::from_static("text/plain, application/json;q=0.9");
        assert_eq!(ReplyFormat::from_accept(Some(&mixed)), ReplyFormat::Json);

        assert_eq!(ReplyFormat::from_accept(None), ReplyFormat::PlainText);

        let unreadable = HeaderValue::from_bytes(b"\xff\xfe").unwrap();
        assert_eq!(
            ReplyFormat::from_accept(Some(&unreadable)),
            ReplyFormat::PlainText
        );
    }
}
