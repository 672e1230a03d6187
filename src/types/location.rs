//! Location types: plain coordinates and the metadata that ends up in the EPW `LOCATION` header.

use bon::Builder;
use serde::{Deserialize, Serialize};

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use openweather::LatLon;
///
/// let honolulu = LatLon(21.3122, -157.8589);
/// assert_eq!(honolulu.0, 21.3122); // Latitude
/// assert_eq!(honolulu.1, -157.8589); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.0) && (-180.0..=180.0).contains(&self.1)
    }
}

/// Site description written to the EPW `LOCATION` line.
///
/// The coordinates, time zone and elevation normally come from the metadata rows of an
/// NSRDB CSV; the place names are supplied by the caller since NSRDB does not report them.
///
/// # Examples
///
/// ```
/// use openweather::LocationMetadata;
///
/// let location = LocationMetadata::builder()
///     .city("Honolulu")
///     .state_province("HI")
///     .country("United States")
///     .latitude(21.31)
///     .longitude(-157.86)
///     .time_zone(-10.0)
///     .elevation(5.0)
///     .build();
/// assert_eq!(location.source, "NSRDB");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct LocationMetadata {
    #[builder(into, default = String::from("Unknown"))]
    pub city: String,
    #[builder(into, default = String::from("Unknown"))]
    pub state_province: String,
    #[builder(into, default = String::from("Unknown"))]
    pub country: String,
    /// Data source label, e.g. `NSRDB`.
    #[builder(into, default = String::from("NSRDB"))]
    pub source: String,
    /// Station identifier. NSRDB has no WMO numbers, so the NSRDB location id is used instead.
    #[builder(into, default = String::from("999999"))]
    pub wmo: String,
    /// Decimal degrees, north positive.
    pub latitude: f64,
    /// Decimal degrees, east positive.
    pub longitude: f64,
    /// Hours offset from GMT of the timestamps in the data.
    pub time_zone: f64,
    /// Metres above sea level.
    pub elevation: f64,
}

impl LocationMetadata {
    pub fn coordinates(&self) -> LatLon {
        LatLon(self.latitude, self.longitude)
    }

    /// Replaces the place names, leaving coordinates and source untouched.
    pub fn with_place(
        mut self,
        city: impl Into<String>,
        state_province: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        self.city = city.into();
        self.state_province = state_province.into();
        self.country = country.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let location = LocationMetadata::builder()
            .latitude(42.44)
            .longitude(-76.5)
            .time_zone(-5.0)
            .elevation(123.0)
            .build();

        assert_eq!(location.city, "Unknown");
        assert_eq!(location.state_province, "Unknown");
        assert_eq!(location.source, "NSRDB");
        assert_eq!(location.coordinates(), LatLon(42.44, -76.5));

        let renamed = location.with_place("Ithaca", "NY", "United States");
        assert_eq!(renamed.city, "Ithaca");
        assert_eq!(renamed.latitude, 42.44);
    }

    #[test]
    fn test_lat_lon_validity() {
        assert!(LatLon(42.4, -76.5).is_valid());
        assert!(!LatLon(91.0, 0.0).is_valid());
        assert!(!LatLon(0.0, -181.0).is_valid());
    }
}
