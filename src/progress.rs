use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::timestamp::{now, progress_timestamp};

/// Append-only progress file. One line per call, no rotation, and no
/// coordination between concurrent writers.
#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `<timestamp>:<message>` to the file, creating it if absent.
    /// The handle is closed before returning.
    pub fn log(&self, message: &str) -> Result<()> {
        let line = format_line(&now(), message);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening progress log {}", self.path.display()))?;

        file.write_all(line.as_bytes())
            .with_context(|| format!("writing progress log {}", self.path.display()))?;
        tracing::trace!("progress: {}", message);
        Ok(())
    }
}

pub fn format_line<Tz: TimeZone>(at: &DateTime<Tz>, message: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}:{}\n", progress_timestamp(at), message)
}
