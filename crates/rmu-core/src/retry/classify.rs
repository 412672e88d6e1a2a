//! Classify store errors into retry policy error kinds.

use super::policy::ErrorKind;
use crate::store::StoreError;

/// Maps a store error onto a retry class. Local I/O failures and
/// unclassified errors are not retried; a failed read of the source file
/// will not succeed on the next attempt either.
pub fn classify(e: &StoreError) -> ErrorKind {
    match e {
        StoreError::Timeout(_) => ErrorKind::Timeout,
        StoreError::Throttled(_) => ErrorKind::Throttled,
        StoreError::Connection(_) => ErrorKind::Connection,
        StoreError::Status { status, .. } => classify_status(*status),
        StoreError::Io(_) | StoreError::Other(_) => ErrorKind::Other,
    }
}

/// Classify an HTTP-style status code for retry decisions.
pub fn classify_status(status: u16) -> ErrorKind {
    match status {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::ServerError(status),
        _ => ErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_statuses() {
        assert_eq!(classify_status(429), ErrorKind::Throttled);
        assert_eq!(classify_status(503), ErrorKind::Throttled);
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(matches!(classify_status(500), ErrorKind::ServerError(500)));
        assert!(matches!(classify_status(502), ErrorKind::ServerError(502)));
    }

    #[test]
    fn client_errors_are_not() {
        assert_eq!(classify_status(404), ErrorKind::Other);
        assert_eq!(classify_status(403), ErrorKind::Other);
    }

    #[test]
    fn store_variants_map_directly() {
        assert_eq!(
            classify(&StoreError::Timeout("read".to_string())),
            ErrorKind::Timeout
        );
        assert_eq!(
            classify(&StoreError::Connection("reset".to_string())),
            ErrorKind::Connection
        );
        assert_eq!(
            classify(&StoreError::Other("bug".to_string())),
            ErrorKind::Other
        );
        assert_eq!(
            classify(&StoreError::Io(std::io::Error::other("disk"))),
            ErrorKind::Other
        );
    }
}
