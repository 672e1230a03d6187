//! Declarative NSRDB column to EPW field table.
//!
//! Every rule that turns an NSRDB reading into an EPW value lives in
//! [`NSRDB_FIELD_MAPPINGS`] or [`NSRDB_DERIVED_FIELDS`]. The [`FieldMapper`] consults these
//! tables together with an explicit [`MissingValues`] sentinel table; nothing else in the
//! conversion knows about column names or units.

use crate::epw::field::{EpwField, MissingValues};
use crate::epw::row::EpwValue;
use crate::types::source_record::{is_missing_marker, SourceRecord};

/// One NSRDB column and how its readings become an EPW field.
#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    /// Column name as it appears in the NSRDB CSV header.
    pub source: &'static str,
    pub target: EpwField,
    /// Unit conversion, applied only to readings that are not missing.
    pub convert: fn(f64) -> f64,
}

/// An EPW field computed from several NSRDB columns, used when no direct column supplies it.
#[derive(Debug, Clone, Copy)]
pub struct DerivedField {
    pub target: EpwField,
    pub inputs: &'static [&'static str],
    /// Receives the input readings in the order of `inputs`.
    pub derive: fn(&[f64]) -> f64,
}

fn passthrough(value: f64) -> f64 {
    value
}

fn millibar_to_pascal(value: f64) -> f64 {
    value * 100.0
}

fn centimetre_to_millimetre(value: f64) -> f64 {
    value * 10.0
}

fn whole_number(value: f64) -> f64 {
    value.round()
}

fn whole_degrees(value: f64) -> f64 {
    value.trunc()
}

/// Relative humidity in whole percent from `[temperature, dew point]` in °C (Magnus form).
fn relative_humidity_from_dew_point(inputs: &[f64]) -> f64 {
    let &[temperature, dew_point] = inputs else {
        return f64::NAN;
    };
    let ratio = (17.62 * dew_point / (dew_point + 243.12)
        - 17.62 * temperature / (temperature + 243.12))
        .exp();
    (ratio * 100.0).round()
}

pub const NSRDB_FIELD_MAPPINGS: &[FieldMapping] = &[
    FieldMapping {
        source: "Temperature",
        target: EpwField::DryBulbTemperature,
        convert: passthrough,
    },
    FieldMapping {
        source: "Dew Point",
        target: EpwField::DewPointTemperature,
        convert: passthrough,
    },
    FieldMapping {
        source: "Relative Humidity",
        target: EpwField::RelativeHumidity,
        convert: whole_number,
    },
    FieldMapping {
        source: "Pressure",
        target: EpwField::AtmosphericStationPressure,
        convert: millibar_to_pascal,
    },
    FieldMapping {
        source: "GHI",
        target: EpwField::GlobalHorizontalRadiation,
        convert: passthrough,
    },
    FieldMapping {
        source: "DNI",
        target: EpwField::DirectNormalRadiation,
        convert: passthrough,
    },
    FieldMapping {
        source: "DHI",
        target: EpwField::DiffuseHorizontalRadiation,
        convert: passthrough,
    },
    FieldMapping {
        source: "Wind Direction",
        target: EpwField::WindDirection,
        convert: whole_degrees,
    },
    FieldMapping {
        source: "Wind Speed",
        target: EpwField::WindSpeed,
        convert: passthrough,
    },
    FieldMapping {
        source: "Precipitable Water",
        target: EpwField::PrecipitableWater,
        convert: centimetre_to_millimetre,
    },
    FieldMapping {
        source: "Surface Albedo",
        target: EpwField::Albedo,
        convert: passthrough,
    },
];

pub const NSRDB_DERIVED_FIELDS: &[DerivedField] = &[DerivedField {
    target: EpwField::RelativeHumidity,
    inputs: &["Temperature", "Dew Point"],
    derive: relative_humidity_from_dew_point,
}];

/// Outcome of mapping a single source reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mapped {
    Value { field: EpwField, value: f64 },
    /// The column maps to `field` but the reading was missing or not finite.
    Missing { field: EpwField, sentinel: f64 },
    /// No EPW field corresponds to this column; the reading is dropped.
    Unmapped,
}

/// Applies the mapping tables to source readings.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    direct: Vec<FieldMapping>,
    derived: Vec<DerivedField>,
    missing: MissingValues,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::nsrdb(MissingValues::default())
    }
}

impl FieldMapper {
    /// The NSRDB tables with the given sentinel table.
    pub fn nsrdb(missing: MissingValues) -> Self {
        Self::new(
            NSRDB_FIELD_MAPPINGS.to_vec(),
            NSRDB_DERIVED_FIELDS.to_vec(),
            missing,
        )
    }

    pub fn new(
        direct: Vec<FieldMapping>,
        derived: Vec<DerivedField>,
        missing: MissingValues,
    ) -> Self {
        Self {
            direct,
            derived,
            missing,
        }
    }

    pub fn missing_values(&self) -> &MissingValues {
        &self.missing
    }

    pub fn mapping_for(&self, source: &str) -> Option<&FieldMapping> {
        self.direct.iter().find(|m| m.source == source)
    }

    /// Maps one reading. Provider missing markers and non-finite conversions produce the
    /// target field's sentinel, never the raw value.
    pub fn map_value(&self, source: &str, raw: f64) -> Mapped {
        let Some(mapping) = self.mapping_for(source) else {
            return Mapped::Unmapped;
        };
        let field = mapping.target;
        if is_missing_marker(raw) {
            return self.missing_for(field);
        }
        let value = (mapping.convert)(raw);
        if value.is_finite() {
            Mapped::Value { field, value }
        } else {
            self.missing_for(field)
        }
    }

    fn missing_for(&self, field: EpwField) -> Mapped {
        Mapped::Missing {
            field,
            sentinel: self.missing.sentinel(field),
        }
    }

    /// Builds the 29 meteorological values of an EPW row from one record.
    ///
    /// Fields start out as their sentinel; direct mappings fill them in, then derived
    /// fields fill whatever is still missing.
    pub fn map_record(&self, record: &SourceRecord) -> [EpwValue; EpwField::DATA_FIELD_COUNT] {
        let mut values: [EpwValue; EpwField::DATA_FIELD_COUNT] = std::array::from_fn(|i| {
            EpwValue::Missing(self.missing.sentinel(EpwField::from_data_index(i)))
        });

        for (name, raw) in record.fields() {
            if let Mapped::Value { field, value } = self.map_value(name, raw) {
                if let Some(i) = field.data_index() {
                    values[i] = EpwValue::Value(value);
                }
            }
        }

        for derived in &self.derived {
            let Some(i) = derived.target.data_index() else {
                continue;
            };
            if !values[i].is_missing() {
                continue;
            }
            let inputs: Option<Vec<f64>> =
                derived.inputs.iter().map(|name| record.value(name)).collect();
            if let Some(inputs) = inputs {
                let value = (derived.derive)(&inputs);
                if value.is_finite() {
                    values[i] = EpwValue::Value(value);
                }
            }
        }

        values
    }

    /// EPW fields this mapper knows how to fill.
    pub fn targets(&self) -> Vec<EpwField> {
        let mut targets: Vec<EpwField> = self
            .direct
            .iter()
            .map(|m| m.target)
            .chain(self.derived.iter().map(|d| d.target))
            .collect();
        targets.sort();
        targets.dedup();
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::source_record::NSRDB_MISSING_MARKER;
    use chrono::NaiveDate;

    fn record() -> SourceRecord {
        let ts = NaiveDate::from_ymd_opt(2021, 7, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        SourceRecord::new(ts)
            .with_field("Temperature", 25.0)
            .with_field("Dew Point", 15.0)
            .with_field("Pressure", 1012.5)
            .with_field("GHI", 850.0)
            .with_field("Wind Direction", 271.8)
            .with_field("Precipitable Water", 2.4)
            .with_field("Cloud Type", 3.0)
    }

    #[test]
    fn test_map_value_conversions() {
        let mapper = FieldMapper::default();
        assert_eq!(
            mapper.map_value("Pressure", 1012.5),
            Mapped::Value {
                field: EpwField::AtmosphericStationPressure,
                value: 101250.0
            }
        );
        assert_eq!(
            mapper.map_value("Wind Direction", 271.8),
            Mapped::Value {
                field: EpwField::WindDirection,
                value: 271.0
            }
        );
        assert_eq!(mapper.map_value("Cloud Type", 3.0), Mapped::Unmapped);
    }

    #[test]
    fn test_missing_marker_becomes_sentinel() {
        let mapper = FieldMapper::default();
        assert_eq!(
            mapper.map_value("GHI", NSRDB_MISSING_MARKER),
            Mapped::Missing {
                field: EpwField::GlobalHorizontalRadiation,
                sentinel: 9999.0
            }
        );
        assert_eq!(
            mapper.map_value("Temperature", NSRDB_MISSING_MARKER),
            Mapped::Missing {
                field: EpwField::DryBulbTemperature,
                sentinel: 99.9
            }
        );
    }

    #[test]
    fn test_injected_sentinels() {
        let missing = MissingValues::default().with_sentinel(EpwField::GlobalHorizontalRadiation, -1.0);
        let mapper = FieldMapper::nsrdb(missing);
        assert_eq!(
            mapper.map_value("GHI", NSRDB_MISSING_MARKER),
            Mapped::Missing {
                field: EpwField::GlobalHorizontalRadiation,
                sentinel: -1.0
            }
        );
    }

    #[test]
    fn test_map_record_fills_every_field() {
        let mapper = FieldMapper::default();
        let values = mapper.map_record(&record());
        let at = |field: EpwField| values[field.data_index().unwrap()];

        assert_eq!(at(EpwField::DryBulbTemperature), EpwValue::Value(25.0));
        assert_eq!(at(EpwField::PrecipitableWater), EpwValue::Value(24.0));
        // 25 °C with a 15 °C dew point is roughly 54 %.
        assert_eq!(at(EpwField::RelativeHumidity), EpwValue::Value(54.0));
        assert_eq!(at(EpwField::DirectNormalRadiation), EpwValue::Missing(9999.0));
        assert_eq!(at(EpwField::TotalSkyCover), EpwValue::Missing(99.0));
        assert_eq!(at(EpwField::Albedo), EpwValue::Missing(999.0));
    }

    #[test]
    fn test_direct_humidity_wins_over_derived() {
        let mapper = FieldMapper::default();
        let values = mapper.map_record(&record().with_field("Relative Humidity", 61.4));
        assert_eq!(
            values[EpwField::RelativeHumidity.data_index().unwrap()],
            EpwValue::Value(61.0)
        );
    }

    #[test]
    fn test_targets() {
        let mapper = FieldMapper::default();
        let targets = mapper.targets();
        assert_eq!(targets.len(), 11);
        assert!(targets.contains(&EpwField::Albedo));
    }
}
