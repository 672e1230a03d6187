//! Raw NSRDB observations, one timestamped row at a time.

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;

/// Marker NSRDB writes in place of a reading it does not have.
pub const NSRDB_MISSING_MARKER: f64 = -9999.0;

/// Returns `true` when `value` is the provider's missing marker (or not a number at all).
pub fn is_missing_marker(value: f64) -> bool {
    value.is_nan() || value == NSRDB_MISSING_MARKER
}

/// Truncates a timestamp to the start of the hour it falls in.
pub fn hour_start(timestamp: NaiveDateTime) -> NaiveDateTime {
    let into_hour = TimeDelta::minutes(i64::from(timestamp.minute()))
        + TimeDelta::seconds(i64::from(timestamp.second()))
        + TimeDelta::nanoseconds(i64::from(timestamp.nanosecond()));
    timestamp - into_hour
}

/// One row of an NSRDB time series.
///
/// Fields are keyed by the column name NSRDB uses in its CSV header (`"GHI"`,
/// `"Dew Point"`, ...). A field that is absent was not present in the source row;
/// a field holding [`NSRDB_MISSING_MARKER`] was present but flagged as missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRecord {
    pub timestamp: NaiveDateTime,
    fields: BTreeMap<String, f64>,
}

impl SourceRecord {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style variant of [`SourceRecord::insert`].
    pub fn with_field(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.fields.insert(name.into(), value);
    }

    /// The raw value for `name`, which may be the missing marker.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }

    /// The value for `name`, or `None` when it is absent or flagged as missing.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).filter(|v| !is_missing_marker(*v))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, f64)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::SourceRecord;
    use chrono::{NaiveDate, TimeDelta, Timelike};

    /// A complete year of plausible readings at `step_minutes` resolution.
    pub(crate) fn synthetic_year(year: i32, step_minutes: i64) -> Vec<SourceRecord> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let end = NaiveDate::from_ymd_opt(year + 1, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut records = Vec::new();
        let mut timestamp = start;
        while timestamp < end {
            let hour_of_day = f64::from(timestamp.hour());
            let sun = (hour_of_day - 12.0).abs() < 6.0;
            records.push(
                SourceRecord::new(timestamp)
                    .with_field("Temperature", 10.0 + hour_of_day / 4.0)
                    .with_field("Dew Point", 5.0)
                    .with_field("Pressure", 1013.0)
                    .with_field("GHI", if sun { 500.0 } else { 0.0 })
                    .with_field("DNI", if sun { 700.0 } else { 0.0 })
                    .with_field("DHI", if sun { 100.0 } else { 0.0 })
                    .with_field("Wind Direction", 180.0)
                    .with_field("Wind Speed", 3.2)
                    .with_field("Surface Albedo", 0.16),
            );
            timestamp += TimeDelta::minutes(step_minutes);
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_value_hides_missing_marker() {
        let ts = NaiveDate::from_ymd_opt(2021, 3, 1)
            .unwrap()
            .and_hms_opt(4, 0, 0)
            .unwrap();
        let record = SourceRecord::new(ts)
            .with_field("GHI", NSRDB_MISSING_MARKER)
            .with_field("DNI", 12.0);

        assert_eq!(record.get("GHI"), Some(NSRDB_MISSING_MARKER));
        assert_eq!(record.value("GHI"), None);
        assert_eq!(record.value("DNI"), Some(12.0));
        assert_eq!(record.value("DHI"), None);
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_hour_start_truncates() {
        let ts = NaiveDate::from_ymd_opt(2021, 6, 15)
            .unwrap()
            .and_hms_opt(10, 30, 15)
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(2021, 6, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(hour_start(ts), expected);
        assert_eq!(hour_start(expected), expected);
    }
}
