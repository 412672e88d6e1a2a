//! Test doubles wrapping a real store: call counting and injected
//! per-part failures.

use rmu_core::session::Target;
use rmu_core::store::{
    CompletedPart, FinalLocation, ObjectStore, PartUploadRequest, StoreError,
};
use std::cell::Cell;

/// Counts calls while delegating to the wrapped store.
pub struct CountingStore<S> {
    inner: S,
    pub initiates: Cell<u32>,
    pub part_uploads: Cell<u32>,
    pub completes: Cell<u32>,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            initiates: Cell::new(0),
            part_uploads: Cell::new(0),
            completes: Cell::new(0),
        }
    }

    pub fn total_calls(&self) -> u32 {
        self.initiates.get() + self.part_uploads.get() + self.completes.get()
    }
}

impl<S: ObjectStore> ObjectStore for CountingStore<S> {
    type Upload = S::Upload;

    fn initiate_multipart_upload(&self, target: &Target) -> Result<String, StoreError> {
        self.initiates.set(self.initiates.get() + 1);
        self.inner.initiate_multipart_upload(target)
    }

    fn upload_part(&self, request: PartUploadRequest<'_>) -> Result<Self::Upload, StoreError> {
        self.part_uploads.set(self.part_uploads.get() + 1);
        self.inner.upload_part(request)
    }

    fn complete_multipart_upload(
        &self,
        upload_id: &str,
        target: &Target,
        parts: &[CompletedPart],
    ) -> Result<FinalLocation, StoreError> {
        self.completes.set(self.completes.get() + 1);
        self.inner.complete_multipart_upload(upload_id, target, parts)
    }
}

/// Always fails `upload_part` for one part number with a non-retryable
/// error, standing in for a process killed mid-upload.
pub struct FailingStore<S> {
    inner: S,
    fail_part: u32,
}

impl<S> FailingStore<S> {
    pub fn new(inner: S, fail_part: u32) -> Self {
        Self { inner, fail_part }
    }
}

impl<S: ObjectStore> ObjectStore for FailingStore<S> {
    type Upload = S::Upload;

    fn initiate_multipart_upload(&self, target: &Target) -> Result<String, StoreError> {
        self.inner.initiate_multipart_upload(target)
    }

    fn upload_part(&self, request: PartUploadRequest<'_>) -> Result<Self::Upload, StoreError> {
        if request.number == self.fail_part {
            return Err(StoreError::Other(format!(
                "injected failure for part #{}",
                request.number
            )));
        }
        self.inner.upload_part(request)
    }

    fn complete_multipart_upload(
        &self,
        upload_id: &str,
        target: &Target,
        parts: &[CompletedPart],
    ) -> Result<FinalLocation, StoreError> {
        self.inner.complete_multipart_upload(upload_id, target, parts)
    }
}

/// Fails `upload_part` for one part number with a timeout a fixed number
/// of times, then behaves normally; exercises in-process retry.
pub struct FlakyStore<S> {
    inner: S,
    fail_part: u32,
    failures_left: Cell<u32>,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: S, fail_part: u32, failures: u32) -> Self {
        Self {
            inner,
            fail_part,
            failures_left: Cell::new(failures),
        }
    }
}

impl<S: ObjectStore> ObjectStore for FlakyStore<S> {
    type Upload = S::Upload;

    fn initiate_multipart_upload(&self, target: &Target) -> Result<String, StoreError> {
        self.inner.initiate_multipart_upload(target)
    }

    fn upload_part(&self, request: PartUploadRequest<'_>) -> Result<Self::Upload, StoreError> {
        if request.number == self.fail_part && self.failures_left.get() > 0 {
            self.failures_left.set(self.failures_left.get() - 1);
            return Err(StoreError::Timeout(format!(
                "injected timeout for part #{}",
                request.number
            )));
        }
        self.inner.upload_part(request)
    }

    fn complete_multipart_upload(
        &self,
        upload_id: &str,
        target: &Target,
        parts: &[CompletedPart],
    ) -> Result<FinalLocation, StoreError> {
        self.inner.complete_multipart_upload(upload_id, target, parts)
    }
}
