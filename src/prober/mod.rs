use reqwest::StatusCode;
use std::time::Duration;

pub mod http;

/// Result of a single probe. Any HTTP status counts as an outcome; only
/// transport failures are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: StatusCode,
    pub elapsed: Duration,
}

impl ProbeOutcome {
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }
}
