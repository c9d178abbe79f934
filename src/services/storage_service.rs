//! src/services/storage_service.rs
//!
//! StorageService — a flat, byte-addressable namespace over a single
//! directory. Object names are untrusted request input (upload filenames,
//! download/delete targets), so every entry point reduces them to a bare
//! leaf name before touching the filesystem. There is no metadata store;
//! listing reflects whatever is on disk.

use crate::models::object::ObjectMeta;
use chrono::{DateTime, Utc};
use std::{
    io::{self, ErrorKind},
    path::PathBuf,
};
use thiserror::Error;
use tokio::{
    fs::{self, File, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error("invalid object name `{0}`")]
    InvalidName(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Increment used when copying payload bytes onto the end of an object.
const APPEND_CHUNK_BYTES: usize = 64 * 1024;
/// Longest accepted object name; common filesystems cap components at 255.
const MAX_OBJECT_NAME_LEN: usize = 255;

/// StorageService provides the byte-store operations the upload pipeline
/// builds on:
/// - Overwrite an object (temp file + rename)
/// - Append to an object, creating it when absent
/// - Read an object fully or open it for streaming out
/// - Report whether a name is present
/// - List the namespace (hidden entries excluded)
/// - Delete an object (idempotent)
///
/// The namespace is deliberately flat: one directory, leaf names only.
#[derive(Clone)]
pub struct StorageService {
    /// Root directory holding every stored object.
    pub base_path: PathBuf,
}

impl StorageService {
    /// Create a new StorageService rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Resolve an untrusted name to its sanitized form and on-disk path.
    fn object_path(&self, name: &str) -> StorageResult<(String, PathBuf)> {
        let clean = sanitize_name(name)?;
        let path = self.base_path.join(&clean);
        Ok((clean, path))
    }

    /// Overwrite the object at `name` with `bytes`, creating it if absent.
    ///
    /// Writes into a hidden temp file first and renames it into place, so a
    /// concurrent reader never observes a half-written object.
    pub async fn write(&self, name: &str, bytes: &[u8]) -> StorageResult<ObjectMeta> {
        let (name, path) = self.object_path(name)?;
        fs::create_dir_all(&self.base_path).await?;

        let tmp_path = self.base_path.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;
        if let Err(err) = write_and_sync(&mut file, bytes).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, &path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&path).await?;
                fs::rename(&tmp_path, &path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StorageError::Io(err));
            }
        }

        debug!("wrote object {} ({} bytes)", name, bytes.len());
        let raw = fs::metadata(&path).await?;
        meta_from_fs(name, &raw)
    }

    /// Append `bytes` to the object at `name`, creating it when absent, and
    /// report the object's cumulative state after the append.
    pub async fn append(&self, name: &str, bytes: &[u8]) -> StorageResult<ObjectMeta> {
        let (name, path) = self.object_path(name)?;
        fs::create_dir_all(&self.base_path).await?;

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .await?;
        for chunk in bytes.chunks(APPEND_CHUNK_BYTES) {
            file.write_all(chunk).await?;
        }
        file.flush().await?;

        debug!("appended {} bytes to object {}", bytes.len(), name);
        let raw = file.metadata().await?;
        meta_from_fs(name, &raw)
    }

    /// Read the full content of the object at `name`.
    pub async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        let (name, path) = self.object_path(name)?;
        fs::read(&path)
            .await
            .map_err(|err| missing_as_not_found(err, &name))
    }

    /// Open the object at `name` for streaming out, together with its
    /// current metadata.
    pub async fn open_reader(&self, name: &str) -> StorageResult<(ObjectMeta, File)> {
        let (name, path) = self.object_path(name)?;
        let file = File::open(&path)
            .await
            .map_err(|err| missing_as_not_found(err, &name))?;
        let raw = file.metadata().await?;
        if !raw.is_file() {
            return Err(StorageError::NotFound(name));
        }
        let meta = meta_from_fs(name, &raw)?;
        Ok((meta, file))
    }

    /// Fetch metadata for the object at `name`.
    pub async fn metadata(&self, name: &str) -> StorageResult<ObjectMeta> {
        let (name, path) = self.object_path(name)?;
        let raw = fs::metadata(&path)
            .await
            .map_err(|err| missing_as_not_found(err, &name))?;
        if !raw.is_file() {
            return Err(StorageError::NotFound(name));
        }
        meta_from_fs(name, &raw)
    }

    /// Report whether an object is present at `name`.
    pub async fn exists(&self, name: &str) -> StorageResult<bool> {
        let (_, path) = self.object_path(name)?;
        match fs::metadata(&path).await {
            Ok(raw) => Ok(raw.is_file()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    /// Remove the object at `name`. Deleting a name that does not exist is
    /// a no-op, not an error.
    pub async fn delete(&self, name: &str) -> StorageResult<()> {
        let (name, path) = self.object_path(name)?;
        match fs::remove_file(&path).await {
            Ok(_) => {
                debug!("removed object {}", name);
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("object {} already absent", name);
                Ok(())
            }
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    /// Enumerate the namespace, sorted by name.
    ///
    /// Hidden entries (dot-prefixed names, including in-flight temp files)
    /// and anything that is not a regular file are excluded.
    pub async fn list(&self) -> StorageResult<Vec<ObjectMeta>> {
        let mut dir = fs::read_dir(&self.base_path).await?;
        let mut objects = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let raw = entry.metadata().await?;
            if !raw.is_file() {
                continue;
            }
            objects.push(meta_from_fs(name.to_string(), &raw)?);
        }
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }
}

/// Reduce an untrusted name to a bare leaf suitable for the flat namespace
/// and for HTTP header construction.
///
/// Takes the component after the last `/` or `\`, drops control characters
/// and double quotes, and rejects names that come out empty, `.`, `..`, or
/// longer than the filesystem allows.
pub fn sanitize_name(name: &str) -> StorageResult<String> {
    let leaf = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = leaf
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    if cleaned.len() > MAX_OBJECT_NAME_LEN {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(cleaned)
}

/// Map a missing file onto `NotFound` for `name`, passing other I/O errors
/// through.
fn missing_as_not_found(err: io::Error, name: &str) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(name.to_string())
    } else {
        StorageError::Io(err)
    }
}

fn meta_from_fs(name: String, raw: &std::fs::Metadata) -> StorageResult<ObjectMeta> {
    let last_modified = raw.modified().map(DateTime::<Utc>::from)?;
    Ok(ObjectMeta {
        name,
        size: raw.len(),
        last_modified,
    })
}

async fn write_and_sync(file: &mut File, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}
