//! CLI for the RMU resumable multipart uploader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rmu_core::config;
use std::path::PathBuf;

use commands::{run_etag, run_resume_upload, run_status, run_upload};

/// Top-level CLI for the RMU resumable multipart uploader.
#[derive(Debug, Parser)]
#[command(name = "rmu")]
#[command(about = "RMU: resumable multipart uploads to an object store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Start a fresh multipart upload, overwriting the session file.
    Upload {
        /// Destination bucket.
        bucket: String,

        /// Destination object key.
        key: String,

        /// Local file to upload.
        file: PathBuf,

        /// Session side file recording upload progress.
        session_file: PathBuf,

        /// Part size in bytes (default: smallest size that keeps the plan
        /// within the store's part limit).
        #[arg(long, value_name = "BYTES")]
        part_size: Option<u64>,
    },

    /// Load a session file and continue its upload.
    ResumeUpload {
        /// Session side file from a previous `upload` run.
        session_file: PathBuf,
    },

    /// Show per-part state of a session without touching the store.
    Status {
        /// Session side file.
        session_file: PathBuf,
    },

    /// Print the expected composite etag of a local file.
    Etag {
        /// Local file.
        file: PathBuf,

        /// Part size in bytes (default: smallest size that keeps the plan
        /// within the store's part limit).
        #[arg(long, value_name = "BYTES")]
        part_size: Option<u64>,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Upload {
                bucket,
                key,
                file,
                session_file,
                part_size,
            } => run_upload(&cfg, bucket, key, &file, &session_file, part_size)?,
            CliCommand::ResumeUpload { session_file } => run_resume_upload(&cfg, &session_file)?,
            CliCommand::Status { session_file } => run_status(&session_file)?,
            CliCommand::Etag { file, part_size } => run_etag(&file, part_size)?,
        }

        Ok(())
    }
}
