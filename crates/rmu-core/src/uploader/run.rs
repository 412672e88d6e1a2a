//! The upload loop: pending parts in order, persist after each, finalize.

use super::progress::ProgressPrinter;
use super::UploadError;
use crate::etag;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::session::{Session, SessionStore};
use crate::store::{
    CompletedPart, FinalLocation, ObjectStore, PartUpload, PartUploadRequest, UploadEvent,
};

/// Uploads every pending part in ascending part-number order, persisting
/// the session after each success, then composes the multipart etag and
/// asks the store to assemble the object.
///
/// Idempotent on completed sessions: one that already records its final
/// location returns it immediately with zero store calls. On a store
/// failure the session is persisted as-is (the failed part stays pending)
/// and the error surfaces; the caller resumes to continue.
pub fn run<S: ObjectStore>(
    store: &S,
    session_store: &SessionStore,
    session: &mut Session,
    policy: &RetryPolicy,
    progress: &mut ProgressPrinter,
) -> Result<FinalLocation, UploadError> {
    if let Some(location) = session.location() {
        tracing::info!(location = %location, "upload already completed; nothing to do");
        let location = FinalLocation {
            uri: location.to_string(),
        };
        progress.completed(&location);
        return Ok(location);
    }

    let total_parts = session.parts().len();
    let pending = session.pending_ranges();
    progress.session_summary(total_parts, pending.len());

    for range in pending {
        progress.part_started(range.number, range.length);

        let outcome = run_with_retry(policy, || {
            let mut upload = store.upload_part(PartUploadRequest {
                upload_id: session.upload_id(),
                target: session.target(),
                number: range.number,
                source: session.file(),
                offset: range.offset,
                length: range.length,
            })?;
            loop {
                match upload.next_event()? {
                    UploadEvent::Progress { bytes } => progress.bytes_transferred(bytes),
                    UploadEvent::Done { etag } => return Ok(etag),
                }
            }
        });

        let part_etag = match outcome {
            Ok(etag) => etag,
            Err(source) => {
                // The failed part stays pending; leave a fresh, valid
                // session behind for the next resume.
                session_store.save(session)?;
                return Err(UploadError::Part {
                    number: range.number,
                    source,
                });
            }
        };

        progress.part_finished(&part_etag);
        tracing::debug!(part = range.number, etag = %part_etag, "part uploaded");
        session.record_uploaded(range.number, part_etag)?;
        session_store.save(session)?;
    }

    let still_pending = session.pending_ranges().len();
    if still_pending > 0 {
        return Err(UploadError::IncompleteParts {
            count: still_pending,
        });
    }

    let composite = match session.multipart_etag() {
        Some(existing) => existing.to_string(),
        None => {
            let composite = etag::multipart_etag(&session.uploaded_etags())?;
            session.set_multipart_etag(composite.clone())?;
            session_store.save(session)?;
            composite
        }
    };
    progress.composite_etag(&composite);

    let completed: Vec<CompletedPart> = session
        .parts()
        .iter()
        .filter_map(|p| {
            p.etag().map(|etag| CompletedPart {
                number: p.range.number,
                etag: etag.to_string(),
            })
        })
        .collect();

    let location = match run_with_retry(policy, || {
        store.complete_multipart_upload(session.upload_id(), session.target(), &completed)
    }) {
        Ok(location) => location,
        Err(source) => {
            session_store.save(session)?;
            return Err(UploadError::Complete(source));
        }
    };

    session.set_location(location.uri.clone())?;
    session_store.save(session)?;
    tracing::info!(location = %location.uri, etag = %composite, "upload completed");
    progress.completed(&location);
    Ok(location)
}
