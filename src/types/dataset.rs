//! The NSRDB datasets this crate knows how to request, with the intervals and years each offers.

use crate::epw::row::YearLayout;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

/// An NSRDB GOES v4 dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dataset {
    /// Continental US and Mexico at up to 5-minute resolution.
    Conus,
    /// Full GOES disc (Americas) at up to 10-minute resolution.
    FullDisc,
    /// Long-running aggregated record, 30 or 60 minutes.
    Aggregated,
    /// Typical meteorological year, hourly only.
    Tmy,
}

#[derive(Debug, Error)]
#[error("Unknown NSRDB dataset '{0}'")]
pub struct ParseDatasetError(pub String);

impl Dataset {
    pub const ALL: [Dataset; 4] = [
        Dataset::Conus,
        Dataset::FullDisc,
        Dataset::Aggregated,
        Dataset::Tmy,
    ];

    pub fn short_name(&self) -> &'static str {
        match self {
            Dataset::Conus => "conus",
            Dataset::FullDisc => "full-disc",
            Dataset::Aggregated => "aggregated",
            Dataset::Tmy => "tmy",
        }
    }

    /// The dataset name used in NSRDB API paths.
    pub fn api_name(&self) -> &'static str {
        match self {
            Dataset::Conus => "nsrdb-GOES-conus-v4-0-0",
            Dataset::FullDisc => "nsrdb-GOES-full-disc-v4-0-0",
            Dataset::Aggregated => "nsrdb-GOES-aggregated-v4-0-0",
            Dataset::Tmy => "nsrdb-GOES-tmy-v4-0-0",
        }
    }

    /// Supported sampling intervals in minutes.
    pub fn intervals(&self) -> &'static [u32] {
        match self {
            Dataset::Conus => &[5, 30, 60],
            Dataset::FullDisc => &[10, 30, 60],
            Dataset::Aggregated => &[30, 60],
            Dataset::Tmy => &[60],
        }
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        match self {
            Dataset::Conus => 2021..=2024,
            Dataset::FullDisc => 2018..=2024,
            Dataset::Aggregated => 1998..=2024,
            Dataset::Tmy => 2022..=2024,
        }
    }

    pub fn supports_interval(&self, minutes: u32) -> bool {
        self.intervals().contains(&minutes)
    }

    pub fn supports_year(&self, year: i32) -> bool {
        self.years().contains(&year)
    }

    /// Whether the dataset is a typical year stitched together from different calendar years.
    pub fn is_typical_year(&self) -> bool {
        matches!(self, Dataset::Tmy)
    }

    /// How downloaded records line up with the year they are converted for.
    pub fn year_layout(&self) -> YearLayout {
        if self.is_typical_year() {
            YearLayout::Typical
        } else {
            YearLayout::Calendar
        }
    }

    /// Value for the `names` query parameter of a download.
    pub(crate) fn year_name(&self, year: i32) -> String {
        match self {
            Dataset::Tmy => format!("tmy-{}", year),
            _ => year.to_string(),
        }
    }

    pub(crate) fn download_path(&self) -> String {
        format!("{}-download.csv", self.api_name())
    }
}

/// Accepts either the short name (`conus`) or the API name (`nsrdb-GOES-conus-v4-0-0`),
/// case-insensitively.
impl FromStr for Dataset {
    type Err = ParseDatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Dataset::ALL
            .into_iter()
            .find(|d| {
                d.short_name().eq_ignore_ascii_case(wanted)
                    || d.api_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ParseDatasetError(s.to_string()))
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_and_full_names() {
        assert_eq!("conus".parse::<Dataset>().unwrap(), Dataset::Conus);
        assert_eq!("TMY".parse::<Dataset>().unwrap(), Dataset::Tmy);
        assert_eq!(
            "nsrdb-GOES-full-disc-v4-0-0".parse::<Dataset>().unwrap(),
            Dataset::FullDisc
        );
        assert!("invalid-dataset".parse::<Dataset>().is_err());
    }

    #[test]
    fn test_intervals_and_years() {
        assert!(Dataset::Conus.supports_interval(5));
        assert!(!Dataset::FullDisc.supports_interval(5));
        assert!(Dataset::Tmy.supports_interval(60));
        assert!(!Dataset::Tmy.supports_interval(30));

        assert!(Dataset::Aggregated.supports_year(1998));
        assert!(!Dataset::Conus.supports_year(2020));
        assert_eq!(Dataset::FullDisc.years(), 2018..=2024);

        assert_eq!(Dataset::Tmy.year_layout(), YearLayout::Typical);
        assert_eq!(Dataset::Aggregated.year_layout(), YearLayout::Calendar);
    }

    #[test]
    fn test_api_paths() {
        assert_eq!(Dataset::Aggregated.to_string(), "nsrdb-GOES-aggregated-v4-0-0");
        assert_eq!(
            Dataset::Conus.download_path(),
            "nsrdb-GOES-conus-v4-0-0-download.csv"
        );
        assert_eq!(Dataset::Tmy.year_name(2023), "tmy-2023");
        assert_eq!(Dataset::Conus.year_name(2023), "2023");
    }
}
