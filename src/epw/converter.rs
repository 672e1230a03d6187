use crate::epw::error::{ConvertError, FormatError};
use crate::epw::field::MissingValues;
use crate::epw::header::{synthesize_header, DataPeriod};
use crate::epw::mapping::FieldMapper;
use crate::epw::resample::HourlyResampler;
use crate::epw::row::{ConversionReport, RowEncoder, YearLayout};
use crate::types::location::LocationMetadata;
use crate::types::source_record::SourceRecord;
use bon::Builder;
use log::{debug, info, warn};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Uncertainty flags written when the source has no per-field quality information.
pub const DEFAULT_UNCERTAINTY_FLAGS: &str = "?9?9?9?9E0?9?9?9?9?9?9?9?9?9?9?9?9?9?9?9*9*9?9?9?9";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

/// Per-conversion settings.
///
/// # Examples
///
/// ```
/// use openweather::{ConversionOptions, LineEnding};
///
/// let options = ConversionOptions::builder()
///     .line_ending(LineEnding::Crlf)
///     .comments_2("Converted from NSRDB")
///     .build();
/// assert_eq!(options.comments_1, None);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ConversionOptions {
    #[builder(default)]
    pub missing_values: MissingValues,
    #[builder(into, default = String::from(DEFAULT_UNCERTAINTY_FLAGS))]
    pub uncertainty_flags: String,
    #[builder(default)]
    pub line_ending: LineEnding,
    #[builder(default)]
    pub layout: YearLayout,
    /// Defaults to the location's data source.
    #[builder(into)]
    pub comments_1: Option<String>,
    #[builder(into)]
    pub comments_2: Option<String>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A converted EPW file held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct EpwFile {
    pub contents: String,
    pub report: ConversionReport,
}

impl EpwFile {
    pub fn as_bytes(&self) -> &[u8] {
        self.contents.as_bytes()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.contents.lines()
    }
}

/// Single pass over the records: header first, then one row per hour, each chunk handed to
/// `emit` as soon as it is ready.
fn drive<I, E, F>(
    records: I,
    location: &LocationMetadata,
    year: i32,
    options: &ConversionOptions,
    mut emit: F,
) -> Result<ConversionReport, E>
where
    I: IntoIterator<Item = SourceRecord>,
    E: From<FormatError>,
    F: FnMut(&str) -> Result<(), E>,
{
    let period = DataPeriod::for_year(options.layout.canvas_year(year))?;
    let mapper = FieldMapper::nsrdb(options.missing_values.clone());
    let mut encoder = RowEncoder::new(
        &mapper,
        year,
        options.layout,
        options.uncertainty_flags.as_str(),
    )?;
    let eol = options.line_ending.as_str();

    for line in synthesize_header(
        location,
        &period,
        options.comments_1.as_deref(),
        options.comments_2.as_deref(),
    ) {
        emit(&line)?;
        emit(eol)?;
    }

    let mut hours = HourlyResampler::new(records.into_iter());
    for record in hours.by_ref() {
        let row = encoder.encode(&record?)?;
        emit(&row.to_line())?;
        emit(eol)?;
    }

    let report = encoder.finish(hours.source_records())?;
    if report.source_records > report.rows {
        debug!(
            "Aggregated {} source records into {} hourly rows",
            report.source_records, report.rows
        );
    }
    Ok(report)
}

/// Converts an ordered record sequence into EPW text for `year`.
///
/// Sub-hourly records are aggregated to hours first. Fails on a gap, duplicate or
/// out-of-year timestamp, or when the sequence does not cover the whole year; no partial
/// output is returned.
///
/// # Examples
///
/// ```no_run
/// use openweather::{convert_to_epw, ConversionOptions, LocationMetadata, SourceRecord};
///
/// # fn records() -> Vec<SourceRecord> { Vec::new() }
/// let location = LocationMetadata::builder()
///     .latitude(39.74)
///     .longitude(-105.18)
///     .time_zone(-7.0)
///     .elevation(1829.0)
///     .build();
/// let epw = convert_to_epw(records(), &location, 2021, &ConversionOptions::default())?;
/// println!("{} rows", epw.report.rows);
/// # Ok::<(), openweather::FormatError>(())
/// ```
pub fn convert_to_epw<I>(
    records: I,
    location: &LocationMetadata,
    year: i32,
    options: &ConversionOptions,
) -> Result<EpwFile, FormatError>
where
    I: IntoIterator<Item = SourceRecord>,
{
    let mut contents = String::new();
    let report = drive(records, location, year, options, |chunk| {
        contents.push_str(chunk);
        Ok::<(), FormatError>(())
    })?;
    Ok(EpwFile { contents, report })
}

/// Converts records straight into the file at `path`.
///
/// Output goes to a temporary file in the same directory that only replaces `path` once
/// every row has been written. On any failure the temporary file is removed and an
/// existing file at `path` is left untouched.
pub fn write_epw_file<I>(
    path: &Path,
    records: I,
    location: &LocationMetadata,
    year: i32,
    options: &ConversionOptions,
) -> Result<ConversionReport, ConvertError>
where
    I: IntoIterator<Item = SourceRecord>,
{
    let write_failure = |e: std::io::Error| ConvertError::WriteFailure(path.to_path_buf(), e);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp = NamedTempFile::new_in(dir).map_err(write_failure)?;
    let mut writer = BufWriter::new(temp);
    let result = drive(records, location, year, options, |chunk| {
        writer.write_all(chunk.as_bytes()).map_err(write_failure)
    });
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            warn!("Discarding partial EPW output for '{}': {}", path.display(), e);
            return Err(e);
        }
    };

    let temp = writer
        .into_inner()
        .map_err(|e| write_failure(e.into_error()))?;
    temp.as_file().sync_all().map_err(write_failure)?;
    temp.persist(path).map_err(|e| write_failure(e.error))?;

    info!("Wrote {} EPW rows to '{}'", report.rows, path.display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epw::field::EpwField;
    use crate::types::source_record::test_support::synthetic_year;
    use crate::types::source_record::NSRDB_MISSING_MARKER;
    use chrono::{Datelike, NaiveDate, Timelike};

    fn location() -> LocationMetadata {
        LocationMetadata::builder()
            .city("Golden")
            .state_province("CO")
            .country("USA")
            .latitude(39.74)
            .longitude(-105.18)
            .time_zone(-7.0)
            .elevation(1829.0)
            .build()
    }

    fn convert(records: Vec<SourceRecord>, year: i32) -> Result<EpwFile, FormatError> {
        convert_to_epw(records, &location(), year, &ConversionOptions::default())
    }

    #[test]
    fn test_full_year_2021() {
        let epw = convert(synthetic_year(2021, 60), 2021).unwrap();
        let lines: Vec<&str> = epw.lines().collect();

        assert_eq!(lines.len(), 8768);
        assert!(lines[0].starts_with("LOCATION,"));
        assert!(lines[7].starts_with("DATA PERIODS,"));
        assert!(lines[8].starts_with("2021,1,1,1,0,"));
        assert!(lines[8767].starts_with("2021,12,31,24,"));
        for line in &lines[8..] {
            assert_eq!(line.split(',').count(), EpwField::COUNT);
        }
        assert_eq!(epw.report.rows, 8760);
        assert!(epw.contents.ends_with('\n'));
        assert!(!epw.contents.contains('\r'));
    }

    #[test]
    fn test_missing_ghi_becomes_9999() {
        let mut records = synthetic_year(2021, 60);
        let noon = records
            .iter_mut()
            .find(|r| r.timestamp.hour() == 12)
            .unwrap();
        noon.insert("GHI", NSRDB_MISSING_MARKER);

        let epw = convert(records, 2021).unwrap();
        let row = epw.lines().nth(8 + 12).unwrap();
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(&fields[..4], &["2021", "1", "1", "13"]);
        assert_eq!(fields[EpwField::GlobalHorizontalRadiation.index()], "9999");
        assert_eq!(fields[EpwField::DirectNormalRadiation.index()], "700");
    }

    #[test]
    fn test_missing_hour_is_a_gap() {
        let gap = NaiveDate::from_ymd_opt(2021, 6, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let records: Vec<SourceRecord> = synthetic_year(2021, 60)
            .into_iter()
            .filter(|r| r.timestamp != gap)
            .collect();

        let err = convert(records, 2021).unwrap_err();
        assert_eq!(
            err,
            FormatError::TimestampGap {
                first_missing: gap,
                last_missing: gap
            }
        );
        assert!(err.to_string().contains("2021-06-15T10:00"));
    }

    #[test]
    fn test_leap_year_2020() {
        let epw = convert(synthetic_year(2020, 60), 2020).unwrap();
        assert_eq!(epw.lines().count(), 8792);
        assert_eq!(epw.report.rows, 8784);
    }

    #[test]
    fn test_sub_hourly_year() {
        let epw = convert(synthetic_year(2021, 30), 2021).unwrap();
        assert_eq!(epw.lines().count(), 8768);
        assert_eq!(epw.report.source_records, 17520);
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let first = convert(synthetic_year(2021, 60), 2021).unwrap();
        let second = convert(synthetic_year(2021, 60), 2021).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_typical_year_data_period() {
        let records: Vec<SourceRecord> = (1..=12u32)
            .flat_map(|month| {
                synthetic_year(2008 + month as i32, 60)
                    .into_iter()
                    .filter(move |r| r.timestamp.month() == month)
            })
            .collect();
        let options = ConversionOptions::builder()
            .layout(YearLayout::Typical)
            .build();

        let epw = convert_to_epw(records, &location(), 2009, &options).unwrap();
        let lines: Vec<&str> = epw.lines().collect();
        // Typical rows sit on 2001, which started on a Monday; 2009 started on a Thursday.
        assert_eq!(lines[7], "DATA PERIODS,1,1,Data,Monday, 1/ 1,12/31");
        assert!(lines[8].starts_with("2009,1,1,1,0,"));
        assert!(lines[8767].starts_with("2020,12,31,24,0,"));
        assert_eq!(epw.report.rows, 8760);
    }

    #[test]
    fn test_crlf_line_endings() {
        let options = ConversionOptions::builder()
            .line_ending(LineEnding::Crlf)
            .build();
        let epw = convert_to_epw(synthetic_year(2021, 60), &location(), 2021, &options).unwrap();
        assert_eq!(epw.contents.matches("\r\n").count(), 8768);
    }

    #[test]
    fn test_write_epw_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("golden.epw");
        let report = write_epw_file(
            &path,
            synthetic_year(2021, 60),
            &location(),
            2021,
            &ConversionOptions::default(),
        )
        .unwrap();

        assert_eq!(report.rows, 8760);
        let written = std::fs::read_to_string(&path).unwrap();
        let in_memory = convert(synthetic_year(2021, 60), 2021).unwrap();
        assert_eq!(written, in_memory.contents);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.epw");
        let mut records = synthetic_year(2021, 60);
        records.truncate(5000);

        let err = write_epw_file(
            &path,
            records,
            &location(),
            2021,
            &ConversionOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ConvertError::Format(FormatError::TruncatedYear { found: 5000, .. })
        ));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unwritable_directory_is_a_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.epw");
        let err = write_epw_file(
            &path,
            synthetic_year(2021, 60),
            &location(),
            2021,
            &ConversionOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::WriteFailure(p, _) if p == path));
    }
}
