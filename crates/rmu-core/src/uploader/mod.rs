//! Upload coordination: create or resume a session, drive the part loop,
//! compose the final etag, and complete the upload.
//!
//! A single thread drives the loop; parts go up strictly one at a time and
//! the session is persisted between parts, so a crash loses at most one
//! part's work and a clean resume never re-uploads a finished part.

mod progress;
mod run;

pub use progress::ProgressPrinter;
pub use run::run;

use crate::planner::{self, PlanError, MAX_PART_COUNT};
use crate::session::{
    validate_for_resume, MismatchError, Session, SessionError, SessionStore, Target,
    TransitionError,
};
use crate::store::{ObjectStore, StoreError};
use std::path::{Path, PathBuf};

/// Errors from the upload coordinator.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("source file {path} is empty; nothing to upload")]
    EmptyFile { path: PathBuf },
    #[error("cannot read source file {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("part size must be positive")]
    ZeroPartSize,
    #[error(
        "part size {part_size} splits {total_size} bytes into {count} parts (store limit {})",
        MAX_PART_COUNT
    )]
    TooManyParts {
        part_size: u64,
        total_size: u64,
        count: u64,
    },
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Mismatch(#[from] MismatchError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("session state: {0}")]
    State(#[from] TransitionError),
    #[error("initiating multipart upload failed: {0}")]
    Initiate(#[source] StoreError),
    #[error("upload of part #{number} failed: {source}")]
    Part {
        number: u32,
        #[source]
        source: StoreError,
    },
    #[error("completing multipart upload failed: {0}")]
    Complete(#[source] StoreError),
    #[error("{count} part(s) still pending; refusing to finalize")]
    IncompleteParts { count: usize },
    #[error(transparent)]
    Etag(#[from] crate::etag::EtagError),
}

/// Plans and persists a fresh session: stat the source, choose a part
/// size, plan the ranges, obtain an upload id from the store, and save the
/// session with every part pending.
///
/// When `part_size` is not given, the smallest size that keeps the plan
/// within the store's part limit is chosen. Empty sources are rejected;
/// uploading zero-byte objects is not this path's job.
pub fn start_new<S: ObjectStore>(
    store: &S,
    session_store: &SessionStore,
    source_file: &Path,
    target: Target,
    part_size: Option<u64>,
) -> Result<Session, UploadError> {
    let meta = std::fs::metadata(source_file).map_err(|source| UploadError::Source {
        path: source_file.to_path_buf(),
        source,
    })?;
    let total_size = meta.len();
    if total_size == 0 {
        return Err(UploadError::EmptyFile {
            path: source_file.to_path_buf(),
        });
    }

    let part_size = match part_size {
        Some(0) => return Err(UploadError::ZeroPartSize),
        Some(size) => {
            let count = total_size.div_ceil(size);
            if count > MAX_PART_COUNT {
                return Err(UploadError::TooManyParts {
                    part_size: size,
                    total_size,
                    count,
                });
            }
            size
        }
        None => planner::minimal_part_size(total_size)?,
    };

    let ranges = planner::plan_parts(total_size, part_size);
    tracing::info!(
        source = %source_file.display(),
        total_size,
        part_size,
        parts = ranges.len(),
        "planned upload"
    );

    let upload_id = store
        .initiate_multipart_upload(&target)
        .map_err(UploadError::Initiate)?;
    tracing::debug!(upload_id = %upload_id, "store issued upload id");

    let session = Session::new(source_file, target, upload_id, &ranges);
    session_store.save(&session)?;
    Ok(session)
}

/// Accepts a previously loaded session for continuation.
///
/// Validates the live source file against the recorded plan and fails fast
/// on mismatch; no store calls, no new planning, no new upload id.
pub fn resume(session: Session) -> Result<Session, UploadError> {
    validate_for_resume(&session)?;
    tracing::info!(
        source = %session.file().display(),
        pending = session.pending_ranges().len(),
        "resuming session"
    );
    Ok(session)
}
