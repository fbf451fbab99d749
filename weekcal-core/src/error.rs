use std::io;

use chrono::NaiveTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Recurrence error: {0}")]
    Recurrence(#[from] RecurrenceError),

    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("end time {end} is not after start time {start}")]
    EndNotAfterStart { start: NaiveTime, end: NaiveTime },

    #[error("range of {days} days is longer than the {max} days allowed")]
    RangeTooLong { days: i64, max: i64 },
}

/// Rejections for manually entered events.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("event title must not be empty")]
    EmptyTitle,

    #[error("event duration must be at least one minute")]
    ZeroDuration,
}

/// A record fetched from an external calendar that cannot be turned into an event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("event `{summary}` has no {field} time")]
    MissingTime {
        summary: String,
        field: &'static str,
    },

    #[error("event `{summary}` has an unreadable timestamp `{value}`")]
    InvalidTime { summary: String, value: String },

    #[error("event `{summary}` does not end after it starts")]
    NonPositiveDuration { summary: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read term file: {0}")]
    Read(#[source] io::Error),

    #[error("Failed to parse term file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid term configuration: {0}")]
    Invalid(String),
}
