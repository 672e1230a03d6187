//! The 35 columns of an EPW data row, in file order, and the sentinel each uses for
//! "no data".

use serde::Serialize;
use std::fmt;

/// One column of an EPW data row. Discriminants are the zero-based column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EpwField {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    DataSourceFlags,
    DryBulbTemperature,
    DewPointTemperature,
    RelativeHumidity,
    AtmosphericStationPressure,
    ExtraterrestrialHorizontalRadiation,
    ExtraterrestrialDirectNormalRadiation,
    HorizontalInfraredRadiation,
    GlobalHorizontalRadiation,
    DirectNormalRadiation,
    DiffuseHorizontalRadiation,
    GlobalHorizontalIlluminance,
    DirectNormalIlluminance,
    DiffuseHorizontalIlluminance,
    ZenithLuminance,
    WindDirection,
    WindSpeed,
    TotalSkyCover,
    OpaqueSkyCover,
    Visibility,
    CeilingHeight,
    PresentWeatherObservation,
    PresentWeatherCodes,
    PrecipitableWater,
    AerosolOpticalDepth,
    SnowDepth,
    DaysSinceLastSnowfall,
    Albedo,
    LiquidPrecipitationDepth,
    LiquidPrecipitationQuantity,
}

/// Number of columns before the first meteorological field (date, time and flags).
const LEADING_FIELDS: usize = 6;

impl EpwField {
    pub const COUNT: usize = 35;
    pub const DATA_FIELD_COUNT: usize = Self::COUNT - LEADING_FIELDS;

    pub const ALL: [EpwField; Self::COUNT] = [
        EpwField::Year,
        EpwField::Month,
        EpwField::Day,
        EpwField::Hour,
        EpwField::Minute,
        EpwField::DataSourceFlags,
        EpwField::DryBulbTemperature,
        EpwField::DewPointTemperature,
        EpwField::RelativeHumidity,
        EpwField::AtmosphericStationPressure,
        EpwField::ExtraterrestrialHorizontalRadiation,
        EpwField::ExtraterrestrialDirectNormalRadiation,
        EpwField::HorizontalInfraredRadiation,
        EpwField::GlobalHorizontalRadiation,
        EpwField::DirectNormalRadiation,
        EpwField::DiffuseHorizontalRadiation,
        EpwField::GlobalHorizontalIlluminance,
        EpwField::DirectNormalIlluminance,
        EpwField::DiffuseHorizontalIlluminance,
        EpwField::ZenithLuminance,
        EpwField::WindDirection,
        EpwField::WindSpeed,
        EpwField::TotalSkyCover,
        EpwField::OpaqueSkyCover,
        EpwField::Visibility,
        EpwField::CeilingHeight,
        EpwField::PresentWeatherObservation,
        EpwField::PresentWeatherCodes,
        EpwField::PrecipitableWater,
        EpwField::AerosolOpticalDepth,
        EpwField::SnowDepth,
        EpwField::DaysSinceLastSnowfall,
        EpwField::Albedo,
        EpwField::LiquidPrecipitationDepth,
        EpwField::LiquidPrecipitationQuantity,
    ];

    /// Zero-based column position in a data row.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Position among the meteorological fields, `None` for date, time and flags.
    pub fn data_index(self) -> Option<usize> {
        self.index().checked_sub(LEADING_FIELDS)
    }

    pub(crate) fn from_data_index(i: usize) -> EpwField {
        Self::ALL[i + LEADING_FIELDS]
    }

    pub fn data_fields() -> impl Iterator<Item = EpwField> {
        Self::ALL[LEADING_FIELDS..].iter().copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            EpwField::Year => "Year",
            EpwField::Month => "Month",
            EpwField::Day => "Day",
            EpwField::Hour => "Hour",
            EpwField::Minute => "Minute",
            EpwField::DataSourceFlags => "Data Source and Uncertainty Flags",
            EpwField::DryBulbTemperature => "Dry Bulb Temperature",
            EpwField::DewPointTemperature => "Dew Point Temperature",
            EpwField::RelativeHumidity => "Relative Humidity",
            EpwField::AtmosphericStationPressure => "Atmospheric Station Pressure",
            EpwField::ExtraterrestrialHorizontalRadiation => {
                "Extraterrestrial Horizontal Radiation"
            }
            EpwField::ExtraterrestrialDirectNormalRadiation => {
                "Extraterrestrial Direct Normal Radiation"
            }
            EpwField::HorizontalInfraredRadiation => "Horizontal Infrared Radiation Intensity",
            EpwField::GlobalHorizontalRadiation => "Global Horizontal Radiation",
            EpwField::DirectNormalRadiation => "Direct Normal Radiation",
            EpwField::DiffuseHorizontalRadiation => "Diffuse Horizontal Radiation",
            EpwField::GlobalHorizontalIlluminance => "Global Horizontal Illuminance",
            EpwField::DirectNormalIlluminance => "Direct Normal Illuminance",
            EpwField::DiffuseHorizontalIlluminance => "Diffuse Horizontal Illuminance",
            EpwField::ZenithLuminance => "Zenith Luminance",
            EpwField::WindDirection => "Wind Direction",
            EpwField::WindSpeed => "Wind Speed",
            EpwField::TotalSkyCover => "Total Sky Cover",
            EpwField::OpaqueSkyCover => "Opaque Sky Cover",
            EpwField::Visibility => "Visibility",
            EpwField::CeilingHeight => "Ceiling Height",
            EpwField::PresentWeatherObservation => "Present Weather Observation",
            EpwField::PresentWeatherCodes => "Present Weather Codes",
            EpwField::PrecipitableWater => "Precipitable Water",
            EpwField::AerosolOpticalDepth => "Aerosol Optical Depth",
            EpwField::SnowDepth => "Snow Depth",
            EpwField::DaysSinceLastSnowfall => "Days Since Last Snowfall",
            EpwField::Albedo => "Albedo",
            EpwField::LiquidPrecipitationDepth => "Liquid Precipitation Depth",
            EpwField::LiquidPrecipitationQuantity => "Liquid Precipitation Quantity",
        }
    }

    /// Decimal places used when writing a measured value.
    pub fn decimals(self) -> usize {
        match self {
            EpwField::DryBulbTemperature
            | EpwField::DewPointTemperature
            | EpwField::WindSpeed
            | EpwField::Visibility
            | EpwField::LiquidPrecipitationDepth
            | EpwField::LiquidPrecipitationQuantity => 1,
            EpwField::AerosolOpticalDepth | EpwField::Albedo => 3,
            _ => 0,
        }
    }

    /// Missing-data value from the EnergyPlus weather file definition.
    ///
    /// Date, time and flag columns have no sentinel and report `0.0`.
    pub fn epw_missing_value(self) -> f64 {
        match self {
            EpwField::Year
            | EpwField::Month
            | EpwField::Day
            | EpwField::Hour
            | EpwField::Minute
            | EpwField::DataSourceFlags => 0.0,
            EpwField::DryBulbTemperature | EpwField::DewPointTemperature => 99.9,
            EpwField::RelativeHumidity => 999.0,
            EpwField::AtmosphericStationPressure => 999999.0,
            EpwField::ExtraterrestrialHorizontalRadiation
            | EpwField::ExtraterrestrialDirectNormalRadiation
            | EpwField::HorizontalInfraredRadiation
            | EpwField::GlobalHorizontalRadiation
            | EpwField::DirectNormalRadiation
            | EpwField::DiffuseHorizontalRadiation
            | EpwField::ZenithLuminance
            | EpwField::Visibility => 9999.0,
            EpwField::GlobalHorizontalIlluminance
            | EpwField::DirectNormalIlluminance
            | EpwField::DiffuseHorizontalIlluminance => 999999.0,
            EpwField::WindDirection | EpwField::WindSpeed => 999.0,
            EpwField::TotalSkyCover | EpwField::OpaqueSkyCover => 99.0,
            EpwField::CeilingHeight => 99999.0,
            EpwField::PresentWeatherObservation => 9.0,
            EpwField::PresentWeatherCodes => 999999999.0,
            EpwField::PrecipitableWater => 999.0,
            EpwField::AerosolOpticalDepth => 0.999,
            EpwField::SnowDepth => 999.0,
            EpwField::DaysSinceLastSnowfall => 99.0,
            EpwField::Albedo => 999.0,
            EpwField::LiquidPrecipitationDepth => 999.0,
            EpwField::LiquidPrecipitationQuantity => 99.0,
        }
    }
}

impl fmt::Display for EpwField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-field sentinel table used in place of missing readings.
///
/// Defaults to the EnergyPlus values; individual entries can be overridden, e.g. for a
/// downstream tool that expects a different marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingValues {
    sentinels: [f64; EpwField::COUNT],
}

impl Default for MissingValues {
    fn default() -> Self {
        Self {
            sentinels: EpwField::ALL.map(EpwField::epw_missing_value),
        }
    }
}

impl MissingValues {
    pub fn sentinel(&self, field: EpwField) -> f64 {
        self.sentinels[field.index()]
    }

    pub fn with_sentinel(mut self, field: EpwField, value: f64) -> Self {
        self.sentinels[field.index()] = value;
        self
    }
}

/// Formats a measured value with `decimals` places, never producing `-0`.
pub(crate) fn format_value(value: f64, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    let rounded = (value * scale).round() / scale + 0.0;
    format!("{rounded:.decimals$}")
}

/// Sentinels are written in their shortest form (`99.9`, `9999`, `0.999`).
pub(crate) fn format_sentinel(value: f64) -> String {
    format!("{value}")
}
