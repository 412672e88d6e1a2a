//! Compares a loaded session against the live source file before resume.

use super::types::Session;
use std::path::PathBuf;

/// Refusal to resume: the source file no longer matches the recorded plan.
#[derive(Debug, thiserror::Error)]
pub enum MismatchError {
    #[error("source file {path} is missing: {source}")]
    SourceMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "source file {path} is {actual} bytes but the session was planned for {expected}; \
         start a fresh upload instead"
    )]
    SizeChanged {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
}

/// Returns Ok(()) if the session can be safely resumed against the current
/// source file.
///
/// The plan embeds the file length, so a changed length means the recorded
/// byte ranges no longer describe the file and resuming would upload wrong
/// data. Callers must not issue any store calls on failure.
pub fn validate_for_resume(session: &Session) -> Result<(), MismatchError> {
    let path = session.file();
    let meta = std::fs::metadata(path).map_err(|source| MismatchError::SourceMissing {
        path: path.to_path_buf(),
        source,
    })?;

    let expected = session.total_size();
    if meta.len() != expected {
        return Err(MismatchError::SizeChanged {
            path: path.to_path_buf(),
            expected,
            actual: meta.len(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::plan_parts;
    use crate::session::Target;
    use std::io::Write;

    fn session_for(path: &std::path::Path, total: u64) -> Session {
        Session::new(
            path,
            Target {
                bucket: "b".to_string(),
                key: "k".to_string(),
            },
            "u".to_string(),
            &plan_parts(total, 40),
        )
    }

    #[test]
    fn unchanged_source_is_resumable() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&[7u8; 100]).unwrap();
        f.flush().unwrap();
        let session = session_for(f.path(), 100);
        assert!(validate_for_resume(&session).is_ok());
    }

    #[test]
    fn changed_length_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&[7u8; 120]).unwrap();
        f.flush().unwrap();
        let session = session_for(f.path(), 100);
        assert!(matches!(
            validate_for_resume(&session),
            Err(MismatchError::SizeChanged {
                expected: 100,
                actual: 120,
                ..
            })
        ));
    }

    #[test]
    fn missing_source_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_for(&dir.path().join("gone.bin"), 100);
        assert!(matches!(
            validate_for_resume(&session),
            Err(MismatchError::SourceMissing { .. })
        ));
    }
}
