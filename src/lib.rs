//! Download solar and meteorological time series from the NREL National Solar Radiation
//! Database (NSRDB) and convert them into EnergyPlus weather (EPW) files.
//!
//! The conversion can be used on its own with records from any source:
//!
//! ```
//! use chrono::{NaiveDate, TimeDelta};
//! use openweather::{convert_to_epw, ConversionOptions, LocationMetadata, SourceRecord};
//!
//! let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let records = (0..8760).map(|h| {
//!     SourceRecord::new(start + TimeDelta::hours(h))
//!         .with_field("Temperature", 12.5)
//!         .with_field("GHI", 0.0)
//! });
//! let location = LocationMetadata::builder()
//!     .city("Golden")
//!     .latitude(39.74)
//!     .longitude(-105.18)
//!     .time_zone(-7.0)
//!     .elevation(1829.0)
//!     .build();
//!
//! let epw = convert_to_epw(records, &location, 2021, &ConversionOptions::default()).unwrap();
//! assert_eq!(epw.lines().count(), 8 + 8760);
//! ```
//!
//! [`OpenWeather`] wraps the NSRDB API for whole jobs: resolve a WKT geometry to NSRDB
//! location ids, download one CSV per location and year, and convert each file.

mod config;
mod epw;
mod error;
mod nsrdb;
mod openweather;
mod types;
mod utils;

pub use config::{ConfigError, Settings};
pub use error::OpenWeatherError;
pub use openweather::*;

pub use epw::converter::{
    convert_to_epw, write_epw_file, ConversionOptions, EpwFile, LineEnding,
    DEFAULT_UNCERTAINTY_FLAGS,
};
pub use epw::error::{ConvertError, FormatError};
pub use epw::field::{EpwField, MissingValues};
pub use epw::header::{synthesize_header, DataPeriod};
pub use epw::mapping::{
    DerivedField, FieldMapper, FieldMapping, Mapped, NSRDB_DERIVED_FIELDS, NSRDB_FIELD_MAPPINGS,
};
pub use epw::resample::{Aggregation, HourlyResampler};
pub use epw::row::{ConversionReport, EpwRow, EpwValue, RowEncoder, YearLayout};

pub use nsrdb::client::{extract_points, DownloadRequest, NsrdbClient, DEFAULT_ATTRIBUTES};
pub use nsrdb::error::NsrdbError;
pub use nsrdb::parser::{parse_nsrdb_csv, NsrdbCsv, NsrdbMetadata};

pub use types::dataset::{Dataset, ParseDatasetError};
pub use types::location::{LatLon, LocationMetadata};
pub use types::source_record::{SourceRecord, NSRDB_MISSING_MARKER};
pub use types::wkt::{parse as parse_wkt, point_wkt, validate_wkt, Geometry, WktError};
