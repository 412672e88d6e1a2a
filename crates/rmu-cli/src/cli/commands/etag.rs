//! `rmu etag` – expected composite etag of a local file.

use anyhow::{Context, Result};
use rmu_core::{etag, planner};
use std::path::Path;

pub fn run_etag(file: &Path, part_size: Option<u64>) -> Result<()> {
    let part_size = match part_size {
        Some(size) => size,
        None => {
            let meta = std::fs::metadata(file)
                .with_context(|| format!("stat {}", file.display()))?;
            planner::minimal_part_size(meta.len())?
        }
    };

    let composite = etag::local_multipart_etag(file, part_size)
        .with_context(|| format!("digest {}", file.display()))?;
    println!("{composite}");
    Ok(())
}
