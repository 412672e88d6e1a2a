//! Stdout progress reporting for the upload loop.
//!
//! Observational only: nothing here gates persistence or correctness.

use crate::store::FinalLocation;
use std::io::{self, Write};

/// Prints per-part progress: a summary line, one line per part with a dot
/// per `step_bytes` transferred, and the closing etag/location lines.
#[derive(Debug)]
pub struct ProgressPrinter {
    step_bytes: u64,
    carried: u64,
}

impl ProgressPrinter {
    /// `step_bytes` sets dot granularity: one dot per that many bytes.
    pub fn new(step_bytes: u64) -> Self {
        Self {
            step_bytes: step_bytes.max(1),
            carried: 0,
        }
    }

    pub fn session_summary(&self, total: usize, pending: usize) {
        println!("Total parts={total}, need to upload={pending}");
    }

    pub fn part_started(&mut self, number: u32, length: u64) {
        self.carried = 0;
        print!("Uploading part #{number} ({length} bytes)");
        let _ = io::stdout().flush();
    }

    pub fn bytes_transferred(&mut self, bytes: u64) {
        self.carried += bytes;
        while self.carried >= self.step_bytes {
            self.carried -= self.step_bytes;
            print!(".");
        }
        let _ = io::stdout().flush();
    }

    pub fn part_finished(&self, etag: &str) {
        println!(" ETag={etag}");
    }

    pub fn composite_etag(&self, etag: &str) {
        println!("Multipart ETag: {etag}");
    }

    pub fn completed(&self, location: &FinalLocation) {
        println!("Location: {}", location.uri);
    }
}

impl Default for ProgressPrinter {
    fn default() -> Self {
        Self::new(1024 * 1024)
    }
}
