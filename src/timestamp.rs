use chrono::{DateTime, Local, TimeZone};

/// `2026-Oct-18-11:29:03`
pub const PROGRESS_FORMAT: &str = "%Y-%b-%d-%H:%M:%S";

pub fn progress_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(PROGRESS_FORMAT).to_string()
}

pub fn now() -> DateTime<Local> {
    Local::now()
}
