//! `rmu upload` – start a fresh multipart upload.

use anyhow::{Context, Result};
use rmu_core::config::RmuConfig;
use rmu_core::session::{SessionStore, Target};
use rmu_core::uploader::{self, ProgressPrinter};
use std::path::Path;

pub fn run_upload(
    cfg: &RmuConfig,
    bucket: String,
    key: String,
    file: &Path,
    session_file: &Path,
    part_size: Option<u64>,
) -> Result<()> {
    let store = super::open_store(cfg)?;
    let session_store = SessionStore::new(session_file);
    let target = Target { bucket, key };

    let mut session = uploader::start_new(&store, &session_store, file, target, part_size)
        .context("start upload")?;
    println!(
        "Data file size={}, will use part size={}",
        session.total_size(),
        session.part_size()
    );
    println!("Got uploadId={}", session.upload_id());

    let policy = cfg.retry_policy();
    let mut progress = ProgressPrinter::new(cfg.progress_step_bytes);
    uploader::run(&store, &session_store, &mut session, &policy, &mut progress)
        .context("upload")?;
    Ok(())
}
