//! The eight header records that precede EPW data rows.

use crate::epw::error::FormatError;
use crate::epw::field::format_value;
use crate::types::location::LocationMetadata;
use chrono::{Datelike, NaiveDate, Weekday};

/// Date range covered by the data rows, as written to `DATA PERIODS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub records_per_hour: u32,
}

impl DataPeriod {
    /// January 1 through December 31 of `year`, one record per hour.
    pub fn for_year(year: i32) -> Result<Self, FormatError> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(FormatError::InvalidYear(year))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31).ok_or(FormatError::InvalidYear(year))?;
        Ok(Self {
            start,
            end,
            records_per_hour: 1,
        })
    }

    pub fn start_weekday(&self) -> Weekday {
        self.start.weekday()
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Header fields are comma separated, so commas and line breaks inside free text are replaced.
fn header_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ',' => ';',
            '\r' | '\n' => ' ',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn month_day(date: NaiveDate) -> String {
    format!("{:>2}/{:>2}", date.month(), date.day())
}

/// Builds the `LOCATION` through `DATA PERIODS` records, without line terminators.
///
/// Design conditions, typical/extreme periods, ground temperatures and holidays cannot be
/// derived from NSRDB data and are written as empty records.
pub fn synthesize_header(
    location: &LocationMetadata,
    period: &DataPeriod,
    comments_1: Option<&str>,
    comments_2: Option<&str>,
) -> Vec<String> {
    let location_line = format!(
        "LOCATION,{},{},{},{},{},{},{},{},{}",
        header_text(&location.city),
        header_text(&location.state_province),
        header_text(&location.country),
        header_text(&location.source),
        header_text(&location.wmo),
        format_value(location.latitude, 2),
        format_value(location.longitude, 2),
        format_value(location.time_zone, 1),
        format_value(location.elevation, 1),
    );
    let comments_1 = comments_1.map_or_else(|| header_text(&location.source), header_text);
    let comments_2 = comments_2.map(header_text).unwrap_or_default();

    vec![
        location_line,
        "DESIGN CONDITIONS,0".to_string(),
        "TYPICAL/EXTREME PERIODS,0".to_string(),
        "GROUND TEMPERATURES,0".to_string(),
        "HOLIDAYS/DAYLIGHT SAVINGS,No,0,0,0".to_string(),
        format!("COMMENTS 1,{comments_1}"),
        format!("COMMENTS 2,{comments_2}"),
        format!(
            "DATA PERIODS,1,{},Data,{},{},{}",
            period.records_per_hour,
            weekday_name(period.start_weekday()),
            month_day(period.start),
            month_day(period.end),
        ),
    ]
}
