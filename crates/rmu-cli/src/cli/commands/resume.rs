//! `rmu resume-upload` – continue a previously started upload.

use anyhow::{Context, Result};
use rmu_core::config::RmuConfig;
use rmu_core::session::SessionStore;
use rmu_core::uploader::{self, ProgressPrinter};
use std::path::Path;

pub fn run_resume_upload(cfg: &RmuConfig, session_file: &Path) -> Result<()> {
    let store = super::open_store(cfg)?;
    let session_store = SessionStore::new(session_file);

    let loaded = session_store.load().context("load session")?;
    let mut session = uploader::resume(loaded).context("resume session")?;

    let policy = cfg.retry_policy();
    let mut progress = ProgressPrinter::new(cfg.progress_step_bytes);
    uploader::run(&store, &session_store, &mut session, &policy, &mut progress)
        .context("resume upload")?;
    Ok(())
}
