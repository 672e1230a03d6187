use crate::config::ConfigError;
use crate::epw::error::{ConvertError, FormatError};
use crate::nsrdb::error::NsrdbError;
use crate::types::dataset::ParseDatasetError;
use crate::types::wkt::WktError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenWeatherError {
    #[error(transparent)]
    Nsrdb(#[from] NsrdbError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Wkt(#[from] WktError),

    #[error(transparent)]
    Dataset(#[from] ParseDatasetError),

    #[error("Failed to create output directory '{0}'")]
    OutputDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read CSV file '{0}'")]
    CsvRead(PathBuf, #[source] std::io::Error),

    #[error("CSV file '{0}' is empty")]
    EmptyCsv(PathBuf),

    #[error("At least one year must be requested")]
    NoYears,

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
