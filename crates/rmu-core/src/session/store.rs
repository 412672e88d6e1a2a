//! Durable session persistence: an atomically replaced JSON side file.

use super::types::{Part, PartStatus, Session, Target};
use crate::planner::PartRange;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Errors from loading or saving a session file.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("read session file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write session file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize session: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("corrupt session file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// On-disk mirror of [`Session`]. Field names are the wire schema; keep
/// them stable.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    file: PathBuf,
    target: Target,
    upload_id: String,
    parts: Vec<PartRecord>,
    multipart_etag: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PartRecord {
    range: PartRange,
    etag: Option<String>,
}

impl SessionRecord {
    fn from_session(session: &Session) -> Self {
        Self {
            file: session.file.clone(),
            target: session.target.clone(),
            upload_id: session.upload_id.clone(),
            parts: session
                .parts
                .iter()
                .map(|p| PartRecord {
                    range: p.range,
                    etag: p.etag().map(str::to_string),
                })
                .collect(),
            multipart_etag: session.multipart_etag.clone(),
            location: session.location.clone(),
        }
    }

    /// Rebuilds the aggregate, rejecting any record that violates the
    /// session invariants.
    fn into_session(self, path: &Path) -> Result<Session, SessionError> {
        let corrupt = |reason: String| SessionError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        if self.parts.is_empty() {
            return Err(corrupt("session has no parts".to_string()));
        }

        let mut expected_offset = 0u64;
        for (i, part) in self.parts.iter().enumerate() {
            let expected_number = i as u32 + 1;
            if part.range.number != expected_number {
                return Err(corrupt(format!(
                    "part at position {i} has number {} (expected {expected_number})",
                    part.range.number
                )));
            }
            if part.range.offset != expected_offset {
                return Err(corrupt(format!(
                    "part #{} starts at offset {} (expected {expected_offset})",
                    part.range.number, part.range.offset
                )));
            }
            if part.range.length == 0 {
                return Err(corrupt(format!("part #{} has zero length", part.range.number)));
            }
            expected_offset = part.range.end();
        }

        let pending = self.parts.iter().filter(|p| p.etag.is_none()).count();
        if self.multipart_etag.is_some() && pending > 0 {
            return Err(corrupt(format!(
                "composite etag is set but {pending} part(s) have none"
            )));
        }
        if self.location.is_some() && self.multipart_etag.is_none() {
            return Err(corrupt(
                "final location is set but the composite etag is missing".to_string(),
            ));
        }

        Ok(Session {
            file: self.file,
            target: self.target,
            upload_id: self.upload_id,
            parts: self
                .parts
                .into_iter()
                .map(|p| Part {
                    range: p.range,
                    status: match p.etag {
                        None => PartStatus::Pending,
                        Some(etag) => PartStatus::Uploaded { etag },
                    },
                })
                .collect(),
            multipart_etag: self.multipart_etag,
            location: self.location,
        })
    }
}

/// Owns the session side-file path. Saves replace the file atomically
/// (temp sibling, fsync, rename) so a crash mid-save never clobbers the
/// previously saved state.
///
/// The file is exclusively owned by one coordinator at a time; running two
/// coordinators against the same session file is caller error.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Serializes the full session as pretty JSON and replaces the file.
    /// Call after every state change that must survive a crash.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let record = SessionRecord::from_session(session);
        let json = serde_json::to_string_pretty(&record)?;

        let write_err = |source: std::io::Error| SessionError::Write {
            path: self.path.clone(),
            source,
        };

        let tmp = self.temp_path();
        let mut f = fs::File::create(&tmp).map_err(write_err)?;
        f.write_all(json.as_bytes()).map_err(write_err)?;
        f.sync_all().map_err(write_err)?;
        drop(f);
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }

    /// Deserializes and validates the session. Unreadable files map to
    /// `Read`; unparseable or invariant-violating ones to `Corrupt`.
    pub fn load(&self) -> Result<Session, SessionError> {
        let bytes = fs::read(&self.path).map_err(|source| SessionError::Read {
            path: self.path.clone(),
            source,
        })?;
        let record: SessionRecord =
            serde_json::from_slice(&bytes).map_err(|e| SessionError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        record.into_session(&self.path)
    }
}
