//! The session aggregate and its part bookkeeping.

use crate::planner::PartRange;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Destination object in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub bucket: String,
    pub key: String,
}

/// Completion marker for one part.
///
/// A part moves from `Pending` to `Uploaded` at most once and never
/// reverts, so "attempted but unknown" is not a representable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartStatus {
    Pending,
    Uploaded { etag: String },
}

/// One planned byte range plus its completion marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub range: PartRange,
    pub status: PartStatus,
}

impl Part {
    pub fn pending(range: PartRange) -> Self {
        Self {
            range,
            status: PartStatus::Pending,
        }
    }

    pub fn is_uploaded(&self) -> bool {
        matches!(self.status, PartStatus::Uploaded { .. })
    }

    /// The store's etag for this part, if it has been uploaded.
    pub fn etag(&self) -> Option<&str> {
        match &self.status {
            PartStatus::Pending => None,
            PartStatus::Uploaded { etag } => Some(etag),
        }
    }
}

/// Invariant breach while mutating a session in memory. These indicate a
/// coordinator bug rather than bad input, but they are surfaced as errors
/// instead of panics so a run can fail cleanly.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("no part #{number} in this session")]
    UnknownPart { number: u32 },
    #[error("part #{number} is already uploaded; a part never transitions twice")]
    AlreadyUploaded { number: u32 },
    #[error("composite etag is already set; it is never recomputed")]
    EtagAlreadySet,
    #[error("{pending} part(s) still pending; cannot set the composite etag")]
    PartsPending { pending: usize },
    #[error("cannot record a location before the composite etag is set")]
    NoCompositeEtag,
    #[error("final location is already recorded")]
    LocationAlreadySet,
}

/// Durable record of one multipart upload.
///
/// Invariants: `parts` is exactly the planner output for the source file's
/// length and chosen part size; `upload_id` is assigned once at creation;
/// `multipart_etag` is set once after every part is uploaded and never
/// recomputed; `location` is set once the store confirms completion. An
/// interrupted run leaves a fully valid, reloadable session behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub(crate) file: PathBuf,
    pub(crate) target: Target,
    pub(crate) upload_id: String,
    pub(crate) parts: Vec<Part>,
    pub(crate) multipart_etag: Option<String>,
    pub(crate) location: Option<String>,
}

impl Session {
    /// Builds a fresh session with every part pending.
    pub fn new(file: &Path, target: Target, upload_id: String, ranges: &[PartRange]) -> Self {
        Self {
            file: file.to_path_buf(),
            target,
            upload_id,
            parts: ranges.iter().copied().map(Part::pending).collect(),
            multipart_etag: None,
            location: None,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Composite etag of the assembled object, once every part is uploaded.
    pub fn multipart_etag(&self) -> Option<&str> {
        self.multipart_etag.as_deref()
    }

    /// Store-reported location, once the upload has completed.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Total source size the plan covers (the last range's end).
    pub fn total_size(&self) -> u64 {
        self.parts.last().map(|p| p.range.end()).unwrap_or(0)
    }

    /// The planned maximum part size (every part but the last has it).
    pub fn part_size(&self) -> u64 {
        self.parts.first().map(|p| p.range.length).unwrap_or(0)
    }

    /// Ranges still waiting for upload, in ascending part-number order.
    pub fn pending_ranges(&self) -> Vec<PartRange> {
        self.parts
            .iter()
            .filter(|p| !p.is_uploaded())
            .map(|p| p.range)
            .collect()
    }

    /// Per-part etags in part-number order; skips pending parts, so only
    /// meaningful once [`Session::is_fully_uploaded`] holds.
    pub fn uploaded_etags(&self) -> Vec<String> {
        self.parts
            .iter()
            .filter_map(|p| p.etag().map(str::to_string))
            .collect()
    }

    pub fn is_fully_uploaded(&self) -> bool {
        self.parts.iter().all(Part::is_uploaded)
    }

    /// Records the store's etag for a pending part.
    pub fn record_uploaded(&mut self, number: u32, etag: String) -> Result<(), TransitionError> {
        let part = self
            .parts
            .iter_mut()
            .find(|p| p.range.number == number)
            .ok_or(TransitionError::UnknownPart { number })?;
        if part.is_uploaded() {
            return Err(TransitionError::AlreadyUploaded { number });
        }
        part.status = PartStatus::Uploaded { etag };
        Ok(())
    }

    /// Sets the composite etag; requires every part uploaded and no etag yet.
    pub fn set_multipart_etag(&mut self, etag: String) -> Result<(), TransitionError> {
        if self.multipart_etag.is_some() {
            return Err(TransitionError::EtagAlreadySet);
        }
        let pending = self.parts.iter().filter(|p| !p.is_uploaded()).count();
        if pending > 0 {
            return Err(TransitionError::PartsPending { pending });
        }
        self.multipart_etag = Some(etag);
        Ok(())
    }

    /// Records the store's final location; requires the composite etag.
    pub fn set_location(&mut self, location: String) -> Result<(), TransitionError> {
        if self.multipart_etag.is_none() {
            return Err(TransitionError::NoCompositeEtag);
        }
        if self.location.is_some() {
            return Err(TransitionError::LocationAlreadySet);
        }
        self.location = Some(location);
        Ok(())
    }
}
