//! Part-range planning against the store's multipart limits.

use serde::{Deserialize, Serialize};

/// Smallest allowed size for any part except the last (5 MiB).
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;
/// Largest allowed part size (5 GiB).
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;
/// Hard limit on the number of parts in one multipart upload.
pub const MAX_PART_COUNT: u64 = 10_000;
/// Largest object a multipart upload may assemble (5 TiB).
pub const MAX_OBJECT_SIZE: u64 = 5 * 1024 * 1024 * 1024 * 1024;

/// One contiguous byte range of the source file.
///
/// Serialized as-is into the session file; field names are part of the
/// on-disk schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRange {
    /// Part number (1-based, sequential).
    pub number: u32,
    /// Byte offset into the source file.
    pub offset: u64,
    /// Length in bytes; always positive.
    pub length: u64,
}

impl PartRange {
    /// Offset one past the last byte of this range.
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// Errors from part-size selection.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The object exceeds what a single multipart upload can assemble.
    #[error("object size {size} exceeds the 5 TiB multipart limit")]
    ObjectTooLarge { size: u64 },
}

/// Splits `total_size` bytes into ordered ranges of at most `max_part_size`.
///
/// Ranges are contiguous, start at offset 0, and are numbered from 1; the
/// final range takes the remainder and may be shorter than the rest.
/// Returns an empty plan if `total_size` or `max_part_size` is 0 (callers
/// treat an empty source as an error before planning).
pub fn plan_parts(total_size: u64, max_part_size: u64) -> Vec<PartRange> {
    if total_size == 0 || max_part_size == 0 {
        return Vec::new();
    }

    let capacity = (total_size / max_part_size + 1) as usize;
    let mut out = Vec::with_capacity(capacity);
    let mut offset = 0u64;
    let mut number = 1u32;

    while offset < total_size {
        let length = max_part_size.min(total_size - offset);
        out.push(PartRange {
            number,
            offset,
            length,
        });
        offset += length;
        number += 1;
    }

    out
}

/// Smallest part size >= [`MIN_PART_SIZE`] that keeps the plan within
/// [`MAX_PART_COUNT`] parts.
///
/// Uses ceiling division; flooring here can plan one part over the limit
/// for sizes just above an exact multiple.
pub fn minimal_part_size(total_size: u64) -> Result<u64, PlanError> {
    if total_size > MAX_OBJECT_SIZE {
        return Err(PlanError::ObjectTooLarge { size: total_size });
    }
    Ok(MIN_PART_SIZE.max(total_size.div_ceil(MAX_PART_COUNT)))
}
