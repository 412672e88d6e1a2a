//! `rmu status` – per-part state of a session, no store calls.

use anyhow::{Context, Result};
use rmu_core::session::SessionStore;
use std::path::Path;

pub fn run_status(session_file: &Path) -> Result<()> {
    let session = SessionStore::new(session_file)
        .load()
        .context("load session")?;

    println!(
        "{} -> {}/{} (uploadId={})",
        session.file().display(),
        session.target().bucket,
        session.target().key,
        session.upload_id()
    );
    println!("{:<6} {:<14} {:<14} {}", "PART", "OFFSET", "LENGTH", "ETAG");
    for part in session.parts() {
        println!(
            "{:<6} {:<14} {:<14} {}",
            part.range.number,
            part.range.offset,
            part.range.length,
            part.etag().unwrap_or("-")
        );
    }

    let total = session.parts().len();
    let pending = session.pending_ranges().len();
    match session.location() {
        Some(location) => println!("Completed: {location}"),
        None => println!("{} of {total} part(s) uploaded, {pending} pending", total - pending),
    }
    if let Some(etag) = session.multipart_etag() {
        println!("Multipart ETag: {etag}");
    }
    Ok(())
}
