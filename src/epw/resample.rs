//! Aggregation of sub-hourly NSRDB records (5, 10 or 30 minute intervals) to hourly records.
//!
//! Records are grouped by the hour they start in. Within a group, precipitation amounts are
//! summed, wind direction is averaged as a vector and every other field takes the arithmetic
//! mean. Missing readings are left out of the aggregate; a field missing for the whole hour
//! stays missing. Hourly input passes through unchanged.

use crate::epw::error::FormatError;
use crate::types::source_record::{hour_start, SourceRecord, NSRDB_MISSING_MARKER};
use std::collections::BTreeSet;
use std::iter::Peekable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Mean,
    Sum,
    CircularMean,
}

impl Aggregation {
    pub fn for_field(name: &str) -> Self {
        if name == "Wind Direction" {
            Aggregation::CircularMean
        } else if name.contains("Precipitation") && !name.contains("Precipitable") {
            Aggregation::Sum
        } else {
            Aggregation::Mean
        }
    }

    fn apply(self, values: &[f64]) -> f64 {
        let n = values.len() as f64;
        match self {
            Aggregation::Mean => values.iter().sum::<f64>() / n,
            Aggregation::Sum => values.iter().sum(),
            Aggregation::CircularMean => {
                let (sin, cos) = values.iter().fold((0.0, 0.0), |(s, c), deg: &f64| {
                    let rad = deg.to_radians();
                    (s + rad.sin(), c + rad.cos())
                });
                let degrees = sin.atan2(cos).to_degrees().rem_euclid(360.0);
                ((degrees * 1e6).round() / 1e6) % 360.0
            }
        }
    }
}

/// Adapts an ordered record sequence so that it yields one record per hour.
pub struct HourlyResampler<I: Iterator<Item = SourceRecord>> {
    records: Peekable<I>,
    consumed: usize,
    failed: bool,
}

impl<I: Iterator<Item = SourceRecord>> HourlyResampler<I> {
    pub fn new(records: I) -> Self {
        Self {
            records: records.peekable(),
            consumed: 0,
            failed: false,
        }
    }

    /// Number of source records read so far.
    pub fn source_records(&self) -> usize {
        self.consumed
    }

    fn fail(&mut self, error: FormatError) -> Option<Result<SourceRecord, FormatError>> {
        self.failed = true;
        Some(Err(error))
    }
}

impl<I: Iterator<Item = SourceRecord>> Iterator for HourlyResampler<I> {
    type Item = Result<SourceRecord, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let first = self.records.next()?;
        self.consumed += 1;
        let hour = hour_start(first.timestamp);

        let mut group = vec![first];
        while let Some(next) = self
            .records
            .next_if(|r| hour_start(r.timestamp) == hour)
        {
            self.consumed += 1;
            let last = group[group.len() - 1].timestamp;
            if next.timestamp == last {
                return self.fail(FormatError::DuplicateTimestamp {
                    timestamp: next.timestamp,
                });
            }
            if next.timestamp < last {
                return self.fail(FormatError::OutOfOrder {
                    timestamp: next.timestamp,
                    after: last,
                });
            }
            group.push(next);
        }

        if group.len() == 1 {
            return group.pop().map(Ok);
        }
        Some(Ok(aggregate_hour(&group)))
    }
}

/// Collapses the records of one hour into a record stamped at the start of that hour.
fn aggregate_hour(group: &[SourceRecord]) -> SourceRecord {
    let hour = hour_start(group[0].timestamp);
    let names: BTreeSet<&str> = group
        .iter()
        .flat_map(|r| r.fields().map(|(name, _)| name))
        .collect();

    let mut record = SourceRecord::new(hour);
    for name in names {
        let values: Vec<f64> = group.iter().filter_map(|r| r.value(name)).collect();
        let value = if values.is_empty() {
            NSRDB_MISSING_MARKER
        } else {
            Aggregation::for_field(name).apply(&values)
        };
        record.insert(name, value);
    }
    record
}
