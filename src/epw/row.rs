//! EPW data rows and the encoder that builds them from an ordered record sequence.

use crate::epw::error::FormatError;
use crate::epw::field::{format_sentinel, format_value, EpwField};
use crate::epw::mapping::FieldMapper;
use crate::types::source_record::{hour_start, SourceRecord};
use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use log::{info, warn};
use serde::Serialize;
use std::fmt;

/// Non-leap year that typical-year records are laid onto for continuity checks.
const TYPICAL_CANVAS_YEAR: i32 = 2001;

/// A meteorological value in an EPW row: a measurement, or the sentinel written in its place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EpwValue {
    Value(f64),
    Missing(f64),
}

impl EpwValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, EpwValue::Missing(_))
    }

    /// The number written to the file.
    pub fn number(&self) -> f64 {
        match self {
            EpwValue::Value(v) | EpwValue::Missing(v) => *v,
        }
    }

    fn render(&self, field: EpwField) -> String {
        match self {
            EpwValue::Value(v) => format_value(*v, field.decimals()),
            EpwValue::Missing(sentinel) => format_sentinel(*sentinel),
        }
    }
}

/// How timestamps relate to the requested year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum YearLayout {
    /// Every record belongs to the requested calendar year.
    #[default]
    Calendar,
    /// Months may come from different source years (TMY); February 29 is never present
    /// and the year column keeps each record's own year.
    Typical,
}

impl YearLayout {
    /// Calendar year the rows are checked against and the data period is written for.
    pub fn canvas_year(&self, year: i32) -> i32 {
        match self {
            YearLayout::Calendar => year,
            YearLayout::Typical => TYPICAL_CANVAS_YEAR,
        }
    }
}

/// One line of the EPW data section, always 35 fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EpwRow {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Hour ending, 1 to 24.
    pub hour: u32,
    pub minute: u32,
    pub flags: String,
    pub values: [EpwValue; EpwField::DATA_FIELD_COUNT],
}

impl EpwRow {
    /// The value of a meteorological field, `None` for date, time and flag columns.
    pub fn value(&self, field: EpwField) -> Option<EpwValue> {
        field.data_index().map(|i| self.values[i])
    }

    /// Comma-delimited text of the row, without a line terminator.
    pub fn to_line(&self) -> String {
        let mut parts = Vec::with_capacity(EpwField::COUNT);
        parts.push(self.year.to_string());
        parts.push(self.month.to_string());
        parts.push(self.day.to_string());
        parts.push(self.hour.to_string());
        parts.push(self.minute.to_string());
        parts.push(self.flags.clone());
        parts.extend(
            EpwField::data_fields()
                .zip(self.values.iter())
                .map(|(field, value)| value.render(field)),
        );
        parts.join(",")
    }
}

impl fmt::Display for EpwRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// Summary of a finished conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    pub year: i32,
    pub layout: YearLayout,
    /// Records read from the source, before hourly aggregation.
    pub source_records: usize,
    /// Data rows written.
    pub rows: usize,
    /// Mappable fields that no row supplied; written entirely as sentinels.
    pub mapping_gaps: Vec<EpwField>,
    /// Individual readings of mappable fields that were replaced by sentinels.
    pub substituted_values: usize,
}

/// Turns hourly records into EPW rows, enforcing one row per hour of the year in order.
///
/// Feed records with [`RowEncoder::encode`] and call [`RowEncoder::finish`] once the
/// sequence is exhausted; `finish` rejects a year that ends early.
pub struct RowEncoder<'a> {
    mapper: &'a FieldMapper,
    year: i32,
    layout: YearLayout,
    flags: String,
    targets: Vec<EpwField>,
    start: NaiveDateTime,
    expected: NaiveDateTime,
    end: NaiveDateTime,
    rows: usize,
    supplied: [bool; EpwField::DATA_FIELD_COUNT],
    substituted: usize,
}

fn year_start(year: i32) -> Result<NaiveDateTime, FormatError> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or(FormatError::InvalidYear(year))
}

/// Puts a canvas timestamp back into the year the caller knows it by.
fn restamp(canvas: NaiveDateTime, year: i32) -> NaiveDateTime {
    canvas.with_year(year).unwrap_or(canvas)
}

impl<'a> RowEncoder<'a> {
    pub fn new(
        mapper: &'a FieldMapper,
        year: i32,
        layout: YearLayout,
        flags: impl Into<String>,
    ) -> Result<Self, FormatError> {
        if year < 1 {
            return Err(FormatError::InvalidYear(year));
        }
        let canvas_year = layout.canvas_year(year);
        let start = year_start(canvas_year)?;
        let end = year_start(canvas_year + 1).map_err(|_| FormatError::InvalidYear(year))?;
        Ok(Self {
            mapper,
            year,
            layout,
            flags: flags.into(),
            targets: mapper.targets(),
            start,
            expected: start,
            end,
            rows: 0,
            supplied: [false; EpwField::DATA_FIELD_COUNT],
            substituted: 0,
        })
    }

    /// Number of hourly rows a complete year has in this layout.
    pub fn expected_rows(&self) -> usize {
        (self.end - self.start).num_hours() as usize
    }

    /// Where `timestamp` sits on the continuity canvas.
    fn canvas_hour(&self, hour: NaiveDateTime) -> Result<NaiveDateTime, FormatError> {
        match self.layout {
            YearLayout::Calendar => {
                if hour.year() != self.year {
                    return Err(FormatError::OutsideYear {
                        timestamp: hour,
                        year: self.year,
                    });
                }
                Ok(hour)
            }
            YearLayout::Typical => hour
                .with_year(TYPICAL_CANVAS_YEAR)
                .ok_or(FormatError::LeapDayInTypicalYear { timestamp: hour }),
        }
    }

    pub fn encode(&mut self, record: &SourceRecord) -> Result<EpwRow, FormatError> {
        let hour = hour_start(record.timestamp);
        let canvas = self.canvas_hour(hour)?;

        if canvas < self.expected {
            let last = self.expected - TimeDelta::hours(1);
            return Err(if canvas == last {
                FormatError::DuplicateTimestamp { timestamp: hour }
            } else {
                FormatError::OutOfOrder {
                    timestamp: hour,
                    after: restamp(last, hour.year()),
                }
            });
        }
        if canvas > self.expected {
            return Err(FormatError::TimestampGap {
                first_missing: restamp(self.expected, hour.year()),
                last_missing: hour - TimeDelta::hours(1),
            });
        }

        let values = self.mapper.map_record(record);
        for field in &self.targets {
            if let Some(i) = field.data_index() {
                if values[i].is_missing() {
                    self.substituted += 1;
                } else {
                    self.supplied[i] = true;
                }
            }
        }

        self.expected = canvas + TimeDelta::hours(1);
        self.rows += 1;

        Ok(EpwRow {
            year: hour.year(),
            month: hour.month(),
            day: hour.day(),
            hour: hour.hour() + 1,
            minute: 0,
            flags: self.flags.clone(),
            values,
        })
    }

    /// Checks the year is complete and reports what was substituted.
    pub fn finish(self, source_records: usize) -> Result<ConversionReport, FormatError> {
        if self.rows == 0 {
            return Err(FormatError::EmptySource);
        }
        if self.expected != self.end {
            return Err(FormatError::TruncatedYear {
                first_missing: restamp(self.expected, self.year),
                found: self.rows,
                expected: self.expected_rows(),
            });
        }

        let mapping_gaps: Vec<EpwField> = self
            .targets
            .iter()
            .copied()
            .filter(|field| field.data_index().is_some_and(|i| !self.supplied[i]))
            .collect();
        for field in &mapping_gaps {
            warn!(
                "No source values for EPW field '{}' in {}; writing missing-value sentinels",
                field, self.year
            );
        }
        if self.substituted > 0 {
            info!(
                "Substituted {} missing readings with EPW sentinels",
                self.substituted
            );
        }

        Ok(ConversionReport {
            year: self.year,
            layout: self.layout,
            source_records,
            rows: self.rows,
            mapping_gaps,
            substituted_values: self.substituted,
        })
    }
}
