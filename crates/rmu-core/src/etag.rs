//! Multipart ETag composition.
//!
//! A store names an object assembled from N parts with the MD5 of the
//! concatenated raw per-part digests, suffixed with `-N`. Matching that
//! value bit-for-bit against the store's own is the verification contract
//! for an assembled object.

use md5::{Digest, Md5};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::planner;

const BUF_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum EtagError {
    #[error("part digest at position {index} is not valid hex: {source}")]
    BadDigest {
        index: usize,
        #[source]
        source: hex::FromHexError,
    },
    #[error("cannot compose an etag from zero parts")]
    NoParts,
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Plan(#[from] planner::PlanError),
}

/// Lowercase-hex MD5 of one part's content (what the store reports as the
/// part's ETag).
pub fn part_md5(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Composes the multipart ETag from per-part hex digests, in part order.
///
/// Digests are decoded to raw bytes before concatenation, so hex digit
/// case cannot change the result.
pub fn multipart_etag(part_etags: &[String]) -> Result<String, EtagError> {
    if part_etags.is_empty() {
        return Err(EtagError::NoParts);
    }

    let mut concatenated = Vec::with_capacity(part_etags.len() * 16);
    for (index, etag) in part_etags.iter().enumerate() {
        let raw = hex::decode(etag).map_err(|source| EtagError::BadDigest { index, source })?;
        concatenated.extend_from_slice(&raw);
    }

    Ok(format!(
        "{}-{}",
        hex::encode(Md5::digest(&concatenated)),
        part_etags.len()
    ))
}

/// Computes the composite etag the store would report for `path` uploaded
/// with the given part size.
///
/// Plans the file locally and digests each range with a bounded buffer, so
/// memory use stays flat for arbitrarily large files. Lets an operator
/// predict the final etag before an upload, or verify it after.
pub fn local_multipart_etag(path: &Path, part_size: u64) -> Result<String, EtagError> {
    let read_err = |source: io::Error| EtagError::Read {
        path: path.to_path_buf(),
        source,
    };

    let meta = std::fs::metadata(path).map_err(read_err)?;
    let ranges = planner::plan_parts(meta.len(), part_size);
    if ranges.is_empty() {
        return Err(EtagError::NoParts);
    }

    // Ranges are contiguous from offset 0, so one sequential pass suffices.
    let mut file = File::open(path).map_err(read_err)?;
    let mut buf = vec![0u8; BUF_SIZE];
    let mut part_etags = Vec::with_capacity(ranges.len());

    for range in &ranges {
        let mut hasher = Md5::new();
        let mut remaining = range.length;
        while remaining > 0 {
            let want = BUF_SIZE.min(remaining as usize);
            let n = file.read(&mut buf[..want]).map_err(read_err)?;
            if n == 0 {
                return Err(read_err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "file shrank while digesting",
                )));
            }
            hasher.update(&buf[..n]);
            remaining -= n as u64;
        }
        part_etags.push(hex::encode(hasher.finalize()));
    }

    multipart_etag(&part_etags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn part_md5_known_vectors() {
        assert_eq!(part_md5(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(part_md5(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn compose_two_digests_has_expected_form() {
        let etags = vec!["aa".repeat(16), "bb".repeat(16)];
        let composite = multipart_etag(&etags).unwrap();
        let (digest, count) = composite.split_once('-').unwrap();
        assert_eq!(digest.len(), 32);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(count, "2");
    }

    #[test]
    fn compose_ignores_hex_case() {
        let lower = vec!["ab".repeat(16), "cd".repeat(16)];
        let upper = vec!["AB".repeat(16), "CD".repeat(16)];
        assert_eq!(
            multipart_etag(&lower).unwrap(),
            multipart_etag(&upper).unwrap()
        );
    }

    #[test]
    fn compose_is_order_sensitive() {
        let forward = vec!["ab".repeat(16), "cd".repeat(16)];
        let reversed = vec!["cd".repeat(16), "ab".repeat(16)];
        assert_ne!(
            multipart_etag(&forward).unwrap(),
            multipart_etag(&reversed).unwrap()
        );
    }

    #[test]
    fn compose_rejects_bad_input() {
        assert!(matches!(multipart_etag(&[]), Err(EtagError::NoParts)));
        let bad = vec!["not-hex!".to_string()];
        assert!(matches!(
            multipart_etag(&bad),
            Err(EtagError::BadDigest { index: 0, .. })
        ));
    }

    #[test]
    fn local_etag_matches_manual_composition() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        let body: Vec<u8> = (0u8..=255).cycle().take(100).collect();
        f.write_all(&body).unwrap();
        f.flush().unwrap();

        let expected = multipart_etag(&[
            part_md5(&body[0..40]),
            part_md5(&body[40..80]),
            part_md5(&body[80..100]),
        ])
        .unwrap();
        assert_eq!(local_multipart_etag(f.path(), 40).unwrap(), expected);
        assert!(expected.ends_with("-3"));
    }

    #[test]
    fn local_etag_single_part_still_suffixed() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello").unwrap();
        f.flush().unwrap();

        let composite = local_multipart_etag(f.path(), 1024).unwrap();
        assert!(composite.ends_with("-1"));
    }

    #[test]
    fn local_etag_empty_file_has_no_parts() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            local_multipart_etag(f.path(), 1024),
            Err(EtagError::NoParts)
        ));
    }
}
