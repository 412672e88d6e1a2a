//! Object-store capability: the transport boundary for multipart uploads.
//!
//! The core never talks to a network itself; it drives any implementation
//! of [`ObjectStore`]. Part-upload progress is a pull-based event sequence
//! the coordinator consumes, not a callback it registers.

pub mod fs;

use crate::session::Target;
use std::path::Path;

/// Errors surfaced by a store backend. The variants map onto the retry
/// classifier: timeouts, throttling, and connection failures are transient;
/// the rest are not.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("throttled by the store: {0}")]
    Throttled(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("store returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// Where the assembled object ended up, as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalLocation {
    pub uri: String,
}

impl std::fmt::Display for FinalLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

/// One (part number, etag) pair for completion; lists are always in
/// ascending part-number order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub number: u32,
    pub etag: String,
}

/// Everything a backend needs to upload one part's byte range.
#[derive(Debug, Clone)]
pub struct PartUploadRequest<'a> {
    pub upload_id: &'a str,
    pub target: &'a Target,
    pub number: u32,
    pub source: &'a Path,
    pub offset: u64,
    pub length: u64,
}

/// One step of an in-flight part upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// Another chunk reached the store; `bytes` is the increment.
    Progress { bytes: u64 },
    /// The store acknowledged the whole part and returned its etag.
    Done { etag: String },
}

/// Pull-based progress sequence for one part upload.
///
/// Yields `Progress` increments and terminates with `Done`. The sequence is
/// bounded and restartable: re-issuing `upload_part` for the same part
/// restarts it from the beginning, which is how a failed attempt is retried.
pub trait PartUpload {
    fn next_event(&mut self) -> Result<UploadEvent, StoreError>;
}

/// Abstract multipart-capable object store.
pub trait ObjectStore {
    type Upload: PartUpload;

    /// Opens a new multipart upload for `target`, returning the upload id
    /// the store expects on every later call.
    fn initiate_multipart_upload(&self, target: &Target) -> Result<String, StoreError>;

    /// Begins uploading one part's byte range from the source file.
    fn upload_part(&self, request: PartUploadRequest<'_>) -> Result<Self::Upload, StoreError>;

    /// Assembles the uploaded parts into the final object.
    fn complete_multipart_upload(
        &self,
        upload_id: &str,
        target: &Target,
        parts: &[CompletedPart],
    ) -> Result<FinalLocation, StoreError>;
}
