use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NsrdbError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse response from {0}")]
    JsonParse(String, #[source] serde_json::Error),

    #[error("Response from {0} did not contain a download script")]
    MissingScript(String),

    #[error("No location ids found for the requested geometry")]
    PointsNotFound,

    #[error("NSRDB CSV has {0} line(s), expected metadata rows followed by a data header")]
    CsvTooShort(usize),

    #[error("Failed to parse the {section} section of the NSRDB CSV")]
    CsvParse {
        section: &'static str,
        #[source]
        source: PolarsError,
    },

    #[error("Required column '{0}' not found in the NSRDB CSV")]
    MissingColumn(String),

    #[error("Required metadata '{0}' not found in the NSRDB CSV")]
    MissingMetadata(&'static str),

    #[error("Invalid date or time in NSRDB CSV data row {row}")]
    InvalidTimestamp { row: usize },

    #[error("Failed to write downloaded file '{0}'")]
    FileWrite(PathBuf, #[source] std::io::Error),

    #[error("Download stream failed")]
    DownloadIo(#[from] std::io::Error),
}
