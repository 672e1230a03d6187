//! Reading NSRDB CSV downloads.
//!
//! An NSRDB CSV starts with two metadata lines (names, then values) describing the
//! location, followed by a regular table whose header begins with
//! `Year,Month,Day,Hour,Minute`. Both parts are read with polars.

use crate::nsrdb::error::NsrdbError;
use crate::types::location::LocationMetadata;
use crate::types::source_record::{SourceRecord, NSRDB_MISSING_MARKER};
use chrono::{Datelike, NaiveDate};
use log::{debug, info};
use polars::prelude::*;
use std::io::Cursor;

const TIME_COLUMNS: [&str; 5] = ["Year", "Month", "Day", "Hour", "Minute"];

/// Location details from the metadata lines of an NSRDB CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct NsrdbMetadata {
    pub source: String,
    pub location_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// `Local Time Zone` when present, otherwise `Time Zone`.
    pub time_zone: f64,
    pub elevation: f64,
}

impl NsrdbMetadata {
    /// Location for the EPW header. The NSRDB location id stands in for the WMO number.
    pub fn to_location(
        &self,
        city: impl Into<String>,
        state_province: impl Into<String>,
        country: impl Into<String>,
    ) -> LocationMetadata {
        LocationMetadata::builder()
            .city(city)
            .state_province(state_province)
            .country(country)
            .source(self.source.clone())
            .maybe_wmo(self.location_id.clone())
            .latitude(self.latitude)
            .longitude(self.longitude)
            .time_zone(self.time_zone)
            .elevation(self.elevation)
            .build()
    }
}

/// A parsed NSRDB CSV.
#[derive(Debug, Clone)]
pub struct NsrdbCsv {
    pub metadata: NsrdbMetadata,
    /// Data columns kept after dropping time columns and columns without any values.
    pub columns: Vec<String>,
    pub records: Vec<SourceRecord>,
}

impl NsrdbCsv {
    /// Year of the first record, which names the converted file.
    pub fn first_year(&self) -> Option<i32> {
        self.records.first().map(|r| r.timestamp.year())
    }
}

/// Byte offset just past the `n`th line break.
fn split_after_lines(bytes: &[u8], n: usize) -> Option<usize> {
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'\n')
        .nth(n - 1)
        .map(|(i, _)| i + 1)
}

fn read_section(bytes: Vec<u8>, section: &'static str) -> Result<DataFrame, NsrdbError> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .map_parse_options(|options| options.with_truncate_ragged_lines(true))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|source| NsrdbError::CsvParse { section, source })
}

fn metadata_f64(df: &DataFrame, name: &str) -> Result<Option<f64>, NsrdbError> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    let column = column
        .cast(&DataType::Float64)
        .map_err(|source| NsrdbError::CsvParse {
            section: "metadata",
            source,
        })?;
    let values = column.f64().map_err(|source| NsrdbError::CsvParse {
        section: "metadata",
        source,
    })?;
    Ok(values.get(0))
}

fn metadata_string(df: &DataFrame, name: &str) -> Result<Option<String>, NsrdbError> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    let column = column
        .cast(&DataType::String)
        .map_err(|source| NsrdbError::CsvParse {
            section: "metadata",
            source,
        })?;
    let values = column.str().map_err(|source| NsrdbError::CsvParse {
        section: "metadata",
        source,
    })?;
    Ok(values
        .get(0)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

fn parse_metadata(df: &DataFrame) -> Result<NsrdbMetadata, NsrdbError> {
    let required = |name: &'static str| -> Result<f64, NsrdbError> {
        metadata_f64(df, name)?.ok_or(NsrdbError::MissingMetadata(name))
    };
    let time_zone = match metadata_f64(df, "Local Time Zone")? {
        Some(tz) => tz,
        None => required("Time Zone")?,
    };
    Ok(NsrdbMetadata {
        source: metadata_string(df, "Source")?.unwrap_or_else(|| "NSRDB".to_string()),
        location_id: metadata_string(df, "Location ID")?,
        latitude: required("Latitude")?,
        longitude: required("Longitude")?,
        time_zone,
        elevation: required("Elevation")?,
    })
}

fn column_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, NsrdbError> {
    let column = df
        .column(name)
        .map_err(|_| NsrdbError::MissingColumn(name.to_string()))?
        .cast(&DataType::Float64)
        .map_err(|source| NsrdbError::CsvParse {
            section: "data",
            source,
        })?;
    let values = column.f64().map_err(|source| NsrdbError::CsvParse {
        section: "data",
        source,
    })?;
    Ok(values.into_iter().collect())
}

fn parse_records(df: &DataFrame) -> Result<(Vec<String>, Vec<SourceRecord>), NsrdbError> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    let year_position = names
        .iter()
        .position(|name| name == "Year")
        .ok_or_else(|| NsrdbError::MissingColumn("Year".to_string()))?;
    if year_position > 0 {
        debug!("Ignoring {} leading index column(s)", year_position);
    }

    let year = column_values(df, "Year")?;
    let month = column_values(df, "Month")?;
    let day = column_values(df, "Day")?;
    let hour = column_values(df, "Hour")?;
    let minute = match df.column("Minute") {
        Ok(_) => column_values(df, "Minute")?,
        Err(_) => vec![Some(0.0); df.height()],
    };

    let mut fields = Vec::new();
    for name in &names[year_position..] {
        if TIME_COLUMNS.contains(&name.as_str()) {
            continue;
        }
        let values = column_values(df, name)?;
        if values.iter().all(Option::is_none) {
            debug!("Dropping empty column '{}'", name);
            continue;
        }
        fields.push((name.clone(), values));
    }

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let part = |values: &[Option<f64>]| values[row].map(|v| v as i64);
        let timestamp = match (
            part(&year),
            part(&month),
            part(&day),
            part(&hour),
            part(&minute),
        ) {
            (Some(y), Some(mo), Some(d), Some(h), Some(mi)) => {
                NaiveDate::from_ymd_opt(y as i32, mo as u32, d as u32)
                    .and_then(|date| date.and_hms_opt(h as u32, mi as u32, 0))
            }
            _ => None,
        }
        .ok_or(NsrdbError::InvalidTimestamp { row: row + 1 })?;

        let mut record = SourceRecord::new(timestamp);
        for (name, values) in &fields {
            record.insert(name.as_str(), values[row].unwrap_or(NSRDB_MISSING_MARKER));
        }
        records.push(record);
    }

    let columns = fields.into_iter().map(|(name, _)| name).collect();
    Ok((columns, records))
}

/// Parses the bytes of an NSRDB CSV download.
pub fn parse_nsrdb_csv(bytes: &[u8]) -> Result<NsrdbCsv, NsrdbError> {
    let line_count = bytes.split(|b| *b == b'\n').filter(|l| !l.is_empty()).count();
    let data_start = split_after_lines(bytes, 2)
        .filter(|&offset| offset < bytes.len())
        .ok_or(NsrdbError::CsvTooShort(line_count))?;

    let metadata_df = read_section(bytes[..data_start].to_vec(), "metadata")?;
    let metadata = parse_metadata(&metadata_df)?;

    let data_df = read_section(bytes[data_start..].to_vec(), "data")?;
    let (columns, records) = parse_records(&data_df)?;

    info!(
        "Parsed NSRDB CSV for location {}: {} rows, columns {:?}",
        metadata.location_id.as_deref().unwrap_or("unknown"),
        records.len(),
        columns
    );
    Ok(NsrdbCsv {
        metadata,
        columns,
        records,
    })
}
