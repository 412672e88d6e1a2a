//! Command handlers for the RMU CLI.

mod etag;
mod resume;
mod status;
mod upload;

pub use etag::run_etag;
pub use resume::run_resume_upload;
pub use status::run_status;
pub use upload::run_upload;

use anyhow::{Context, Result};
use rmu_core::config::{self, RmuConfig};
use rmu_core::store::fs::FsObjectStore;

/// Opens the configured object-store backend: the local directory store,
/// rooted at `store_root` from config or the XDG data dir. Network
/// backends plug in behind the same trait.
pub(crate) fn open_store(cfg: &RmuConfig) -> Result<FsObjectStore> {
    let root = match &cfg.store_root {
        Some(root) => root.clone(),
        None => config::default_store_root()?,
    };
    FsObjectStore::open(&root)
        .with_context(|| format!("open object store at {}", root.display()))
}
