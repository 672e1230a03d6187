use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

const HOUR_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Structural problems that make a source sequence unusable as an EPW year.
#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("Source sequence contains no records")]
    EmptySource,

    #[error("Year {0} cannot be represented in an EPW file")]
    InvalidYear(i32),

    #[error("Record at {} lies outside the requested year {year}", .timestamp.format(HOUR_FORMAT))]
    OutsideYear { timestamp: NaiveDateTime, year: i32 },

    #[error("Duplicate record for hour {}", .timestamp.format(HOUR_FORMAT))]
    DuplicateTimestamp { timestamp: NaiveDateTime },

    #[error("Record at {} is out of order, it follows {}", .timestamp.format(HOUR_FORMAT), .after.format(HOUR_FORMAT))]
    OutOfOrder {
        timestamp: NaiveDateTime,
        after: NaiveDateTime,
    },

    #[error("Timestamp gap: no records from {} to {}", .first_missing.format(HOUR_FORMAT), .last_missing.format(HOUR_FORMAT))]
    TimestampGap {
        first_missing: NaiveDateTime,
        last_missing: NaiveDateTime,
    },

    #[error("Source ends early at {}: {found} of {expected} hourly rows present", .first_missing.format(HOUR_FORMAT))]
    TruncatedYear {
        first_missing: NaiveDateTime,
        found: usize,
        expected: usize,
    },

    #[error("Typical-year record at {} falls on February 29", .timestamp.format(HOUR_FORMAT))]
    LeapDayInTypicalYear { timestamp: NaiveDateTime },
}

/// Failures of the converter driver when writing to a file.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Failed to write EPW file '{0}'")]
    WriteFailure(PathBuf, #[source] std::io::Error),
}
