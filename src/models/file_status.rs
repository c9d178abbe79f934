//! Per-file status records reported back to upload and listing callers.

use crate::models::object::ObjectMeta;
use serde::Serialize;

/// The externally visible outcome for one processed file.
///
/// For whole-file uploads `name` is the final stored name and `size` the
/// byte length after compaction; for chunk appends and listings both reflect
/// the object as it sits on disk. Created once per file per request and
/// never mutated afterwards.
#[derive(Serialize, Clone, Debug)]
pub struct FileStatus {
    /// Stored object name (or the submitted name when processing failed).
    pub name: String,

    /// Size in bytes.
    pub size: u64,

    /// Display MIME type guessed from the file name.
    #[serde(rename = "type")]
    pub content_type: String,

    /// Present only when processing this file failed; the rest of the batch
    /// is unaffected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileStatus {
    /// Status for a successfully stored object.
    pub fn stored(name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        let content_type = guess_type(&name);
        Self {
            name,
            size,
            content_type,
            error: None,
        }
    }

    /// Status for a file that could not be processed. Carries the submitted
    /// name so the caller can correlate it with its request.
    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let content_type = guess_type(&name);
        Self {
            name,
            size: 0,
            content_type,
            error: Some(message.into()),
        }
    }
}

impl From<ObjectMeta> for FileStatus {
    fn from(meta: ObjectMeta) -> Self {
        Self::stored(meta.name, meta.size)
    }
}

fn guess_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_status_guesses_type_from_name() {
        let status = FileStatus::stored("abc$logo.png", 42);
        assert_eq!(status.name, "abc$logo.png");
        assert_eq!(status.size, 42);
        assert_eq!(status.content_type, "image/png");
        assert!(status.error.is_none());
    }

    #[test]
    fn unknown_extensions_fall_back_to_octet_stream() {
        let status = FileStatus::stored("blob.weird", 1);
        assert_eq!(status.content_type, "application/octet-stream");
    }

    #[test]
    fn error_field_is_omitted_when_absent() {
        let ok = serde_json::to_value(FileStatus::stored("a.js", 3)).unwrap();
        assert!(ok.get("error").is_none());
        assert_eq!(ok["name"], "a.js");
        assert_eq!(ok["size"], 3);

        let failed = serde_json::to_value(FileStatus::failed("a.js", "boom")).unwrap();
        assert_eq!(failed["error"], "boom");
        assert_eq!(failed["size"], 0);
    }
}
