//! UploadService — coordinates what happens to uploaded asset files.
//!
//! Whole-file batches are compacted per file and aggregated into at most one
//! bundle per asset kind; chunked transfers are appended verbatim onto their
//! destination object. All persistence goes through [`StorageService`];
//! everything else here is request-scoped and never shared across requests.

use crate::models::asset_kind::AssetKind;
use crate::models::file_status::FileStatus;
use crate::services::compactor::Compactor;
use crate::services::storage_service::{StorageError, StorageService, sanitize_name};
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("chunked upload must carry exactly one file payload per request, got {0}")]
    ProtocolViolation(usize),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type UploadResult<T> = Result<T, UploadError>;

/// One file payload extracted from an upload request.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    /// Client-declared file name. Untrusted; reduced to a leaf before use.
    pub name: String,

    /// Full payload content.
    pub content: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Accumulator for one asset kind within a batch.
#[derive(Default)]
struct BundleGroup {
    /// Identity token of the first contributor; names the bundle.
    representative: Option<String>,

    /// Compacted contents, concatenated in submission order.
    content: Vec<u8>,
}

impl BundleGroup {
    /// First occurrence wins: later contributors extend the content but
    /// never replace the representative identity.
    fn contribute(&mut self, identity: &str, compacted: &[u8]) {
        if self.representative.is_none() {
            self.representative = Some(identity.to_string());
        }
        self.content.extend_from_slice(compacted);
    }
}

/// Request-scoped bundle state: one group per bundled kind.
///
/// Lives on the stack of a single `process_batch` call, so concurrent
/// batches can never observe or interleave each other's accumulators.
#[derive(Default)]
struct BundleAccumulator {
    script: BundleGroup,
    style: BundleGroup,
}

impl BundleAccumulator {
    fn group_mut(&mut self, kind: AssetKind) -> Option<&mut BundleGroup> {
        match kind {
            AssetKind::Script => Some(&mut self.script),
            AssetKind::Style => Some(&mut self.style),
            AssetKind::Other => None,
        }
    }

    fn into_groups(self) -> [(AssetKind, BundleGroup); 2] {
        [
            (AssetKind::Script, self.script),
            (AssetKind::Style, self.style),
        ]
    }
}

/// UploadService drives the two upload modes:
/// - whole-file batches: identity naming, compaction, per-kind bundling
/// - chunked transfers: verbatim append onto a shared destination name
#[derive(Clone)]
pub struct UploadService {
    /// Shared byte store; the only state that outlives a request.
    pub storage: StorageService,

    compactor: Arc<dyn Compactor>,
}

impl UploadService {
    pub fn new(storage: StorageService, compactor: Arc<dyn Compactor>) -> Self {
        Self { storage, compactor }
    }

    /// Process a whole-file batch in submission order.
    ///
    /// Each file is handled independently: a failure is logged, reported in
    /// that file's status entry, and does not stop the rest of the batch.
    /// Once all files are processed, one aggregate per contributing kind is
    /// written.
    pub async fn process_batch(&self, files: Vec<UploadedFile>) -> Vec<FileStatus> {
        let mut statuses = Vec::with_capacity(files.len());
        let mut bundles = BundleAccumulator::default();

        for file in files {
            let submitted = file.name.clone();
            match self.process_one(file, &mut bundles).await {
                Ok(status) => statuses.push(status),
                Err(err) => {
                    warn!("failed to store uploaded file `{}`: {}", submitted, err);
                    statuses.push(FileStatus::failed(submitted, err.to_string()));
                }
            }
        }

        self.write_bundles(bundles).await;
        statuses
    }

    async fn process_one(
        &self,
        file: UploadedFile,
        bundles: &mut BundleAccumulator,
    ) -> UploadResult<FileStatus> {
        let leaf = sanitize_name(&file.name)?;
        let identity = new_identity();
        let stored_name = format!("{identity}${leaf}");
        let kind = AssetKind::from_name(&stored_name);

        // The raw payload lands first, then the compacted form replaces it.
        self.storage.write(&stored_name, &file.content).await?;
        let compacted = self.compactor.compact(&file.content, kind);
        self.storage.write(&stored_name, &compacted).await?;

        if let Some(group) = bundles.group_mut(kind) {
            group.contribute(&identity, &compacted);
        }

        Ok(FileStatus::stored(stored_name, compacted.len() as u64))
    }

    /// Write one aggregate object per kind that saw a contribution, named by
    /// that kind's representative identity. A failed bundle write is logged
    /// and does not withhold the per-file statuses already collected.
    async fn write_bundles(&self, bundles: BundleAccumulator) {
        for (kind, group) in bundles.into_groups() {
            let Some(identity) = group.representative else {
                continue;
            };
            let Some(bundle_name) = kind.bundle_object_name(&identity) else {
                continue;
            };
            match self.storage.write(&bundle_name, &group.content).await {
                Ok(meta) => debug!("wrote bundle {} ({} bytes)", meta.name, meta.size),
                Err(err) => error!("failed to write bundle {}: {}", bundle_name, err),
            }
        }
    }

    /// Append one chunk of a split transfer onto the object named by the
    /// client-declared file name, and report the object's cumulative state.
    ///
    /// Exactly one payload per request is accepted; any other count is a
    /// protocol violation, rejected before any byte is appended. Chunked
    /// content is stored verbatim — compaction only applies to whole files.
    pub async fn append_chunk(
        &self,
        declared_name: &str,
        mut payloads: Vec<UploadedFile>,
    ) -> UploadResult<FileStatus> {
        if payloads.len() != 1 {
            return Err(UploadError::ProtocolViolation(payloads.len()));
        }
        let payload = payloads.remove(0);
        let meta = self.storage.append(declared_name, &payload.content).await?;
        Ok(meta.into())
    }
}

/// Fresh globally unique token. Prefixes whole-file stored names and groups
/// a batch's bundle contributions; v4 randomness makes cross-batch bundle
/// name collisions practically impossible.
fn new_identity() -> String {
    Uuid::new_v4().to_string()
}
