//! Directory-backed object store.
//!
//! Stages parts under `<root>/.uploads/<upload-id>/` and assembles objects
//! under `<root>/<bucket>/<key>`. Part etags are the MD5 of the part's
//! content, so the composite-etag convention holds end to end. Used by the
//! test suite and as a development target; network backends implement the
//! same trait.

use super::{
    CompletedPart, FinalLocation, ObjectStore, PartUpload, PartUploadRequest, StoreError,
    UploadEvent,
};
use crate::session::Target;
use md5::{Digest, Md5};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const CHUNK_SIZE: usize = 64 * 1024;

pub struct FsObjectStore {
    root: PathBuf,
    upload_seq: AtomicU64,
}

impl FsObjectStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            upload_seq: AtomicU64::new(0),
        })
    }

    fn upload_dir(&self, upload_id: &str) -> PathBuf {
        self.root.join(".uploads").join(upload_id)
    }

    fn part_path(&self, upload_id: &str, number: u32) -> PathBuf {
        self.upload_dir(upload_id).join(format!("part-{number}"))
    }

    fn object_path(&self, target: &Target) -> PathBuf {
        self.root.join(&target.bucket).join(&target.key)
    }
}

/// In-flight part upload: each `next_event` moves one chunk from the
/// source range into the staged part file.
pub struct FsPartUpload {
    source: File,
    part_file: File,
    hasher: Md5,
    remaining: u64,
    done: bool,
}

impl PartUpload for FsPartUpload {
    fn next_event(&mut self) -> Result<UploadEvent, StoreError> {
        if self.done {
            return Err(StoreError::Other(
                "part upload already finished".to_string(),
            ));
        }
        if self.remaining == 0 {
            self.part_file.sync_all()?;
            self.done = true;
            let etag = hex::encode(self.hasher.clone().finalize());
            return Ok(UploadEvent::Done { etag });
        }

        let want = CHUNK_SIZE.min(self.remaining as usize);
        let mut buf = vec![0u8; want];
        self.source.read_exact(&mut buf)?;
        self.part_file.write_all(&buf)?;
        self.hasher.update(&buf);
        self.remaining -= buf.len() as u64;
        Ok(UploadEvent::Progress {
            bytes: buf.len() as u64,
        })
    }
}

impl ObjectStore for FsObjectStore {
    type Upload = FsPartUpload;

    fn initiate_multipart_upload(&self, target: &Target) -> Result<String, StoreError> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| StoreError::Other(e.to_string()))?
            .as_nanos();
        let seq = self.upload_seq.fetch_add(1, Ordering::Relaxed);
        let upload_id = format!("{nanos:x}-{seq:x}");

        fs::create_dir_all(self.upload_dir(&upload_id))?;
        tracing::debug!(
            bucket = %target.bucket,
            key = %target.key,
            upload_id = %upload_id,
            "initiated multipart upload"
        );
        Ok(upload_id)
    }

    fn upload_part(&self, request: PartUploadRequest<'_>) -> Result<Self::Upload, StoreError> {
        if !self.upload_dir(request.upload_id).is_dir() {
            return Err(StoreError::Status {
                status: 404,
                message: format!("no such upload: {}", request.upload_id),
            });
        }

        let mut source = File::open(request.source)?;
        source.seek(SeekFrom::Start(request.offset))?;

        // Truncating here gives the restart semantics the trait promises.
        let part_file = File::create(self.part_path(request.upload_id, request.number))?;

        Ok(FsPartUpload {
            source,
            part_file,
            hasher: Md5::new(),
            remaining: request.length,
            done: false,
        })
    }

    fn complete_multipart_upload(
        &self,
        upload_id: &str,
        target: &Target,
        parts: &[CompletedPart],
    ) -> Result<FinalLocation, StoreError> {
        if parts.is_empty() {
            return Err(StoreError::Status {
                status: 400,
                message: "completion requires at least one part".to_string(),
            });
        }
        for (i, part) in parts.iter().enumerate() {
            let expected = i as u32 + 1;
            if part.number != expected {
                return Err(StoreError::Status {
                    status: 400,
                    message: format!(
                        "part list must ascend from 1: found #{} at position {i}",
                        part.number
                    ),
                });
            }
        }

        let object_path = self.object_path(target);
        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut tmp_name = OsString::from(object_path.as_os_str());
        tmp_name.push(".assembling");
        let tmp = PathBuf::from(tmp_name);

        let mut out = File::create(&tmp)?;
        let mut buf = vec![0u8; CHUNK_SIZE];
        for part in parts {
            let staged = self.part_path(upload_id, part.number);
            let mut reader = File::open(&staged).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    StoreError::Status {
                        status: 404,
                        message: format!("part #{} was never uploaded", part.number),
                    }
                } else {
                    StoreError::Io(e)
                }
            })?;

            let mut hasher = Md5::new();
            loop {
                let n = reader.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
                out.write_all(&buf[..n])?;
            }
            let actual = hex::encode(hasher.finalize());
            if actual != part.etag.to_lowercase() {
                return Err(StoreError::Status {
                    status: 400,
                    message: format!(
                        "etag mismatch for part #{}: sent {}, stored {actual}",
                        part.number, part.etag
                    ),
                });
            }
        }
        out.sync_all()?;
        drop(out);
        fs::rename(&tmp, &object_path)?;

        let _ = fs::remove_dir_all(self.upload_dir(upload_id));
        tracing::debug!(upload_id = %upload_id, path = %object_path.display(), "assembled object");

        Ok(FinalLocation {
            uri: format!("file://{}", object_path.display()),
        })
    }
}
