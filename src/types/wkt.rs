//! Checks and summaries for the Well-Known Text geometries NSRDB accepts: `POINT`, `POLYGON`
//! and `MULTIPOLYGON`, with coordinates in `lon lat` order.

use crate::types::location::LatLon;
use geo::{Centroid, CoordsIter, MultiPolygon, Point, Polygon};
use thiserror::Error;
use wkt::{ToWkt, TryFromWkt};

const SUPPORTED_TYPES: [&str; 3] = ["POINT", "POLYGON", "MULTIPOLYGON"];

#[derive(Debug, Error, PartialEq)]
pub enum WktError {
    #[error("WKT geometry string is empty")]
    Empty,

    #[error("Unsupported WKT geometry type '{0}'")]
    UnsupportedType(String),

    #[error("Malformed WKT: {0}")]
    Malformed(String),

    #[error("Coordinate ({lon} {lat}) is outside the valid latitude/longitude range")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("Polygon ring must be closed and have at least four positions")]
    InvalidRing,
}

/// A parsed WKT geometry of one of the supported types.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point<f64>),
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl Geometry {
    /// The point itself, or the area centroid for polygons.
    pub fn representative_point(&self) -> Option<LatLon> {
        let centroid = match self {
            Geometry::Point(point) => Some(*point),
            Geometry::Polygon(polygon) => polygon.centroid(),
            Geometry::MultiPolygon(polygons) => polygons.centroid(),
        };
        centroid.map(|p| LatLon(p.y(), p.x()))
    }

    fn coordinates(&self) -> Vec<LatLon> {
        let coords: Vec<geo::Coord<f64>> = match self {
            Geometry::Point(point) => point.coords_iter().collect(),
            Geometry::Polygon(polygon) => polygon.coords_iter().collect(),
            Geometry::MultiPolygon(polygons) => polygons.coords_iter().collect(),
        };
        coords.into_iter().map(|c| LatLon(c.y, c.x)).collect()
    }

    fn polygons(&self) -> Vec<&Polygon<f64>> {
        match self {
            Geometry::Point(_) => Vec::new(),
            Geometry::Polygon(polygon) => vec![polygon],
            Geometry::MultiPolygon(polygons) => polygons.0.iter().collect(),
        }
    }
}

/// Leading keyword, e.g. `POLYGON` in `POLYGON((...))`.
fn geometry_type(text: &str) -> String {
    text.split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase()
}

/// Parses a WKT string into a [`Geometry`].
pub fn parse(wkt: &str) -> Result<Geometry, WktError> {
    let text = wkt.trim();
    if text.is_empty() {
        return Err(WktError::Empty);
    }
    let kind = geometry_type(text);
    if !SUPPORTED_TYPES.contains(&kind.as_str()) {
        return Err(WktError::UnsupportedType(kind));
    }

    let geometry = match geo::Geometry::<f64>::try_from_wkt_str(text)
        .map_err(|e| WktError::Malformed(e.to_string()))?
    {
        geo::Geometry::Point(point) => Geometry::Point(point),
        geo::Geometry::Polygon(polygon) => Geometry::Polygon(polygon),
        geo::Geometry::MultiPolygon(polygons) => Geometry::MultiPolygon(polygons),
        _ => return Err(WktError::UnsupportedType(kind)),
    };

    for polygon in geometry.polygons() {
        let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());
        for ring in rings {
            if ring.0.len() < 4 || !ring.is_closed() {
                return Err(WktError::InvalidRing);
            }
        }
    }
    if let Some(bad) = geometry.coordinates().into_iter().find(|c| !c.is_valid()) {
        return Err(WktError::InvalidCoordinate {
            lat: bad.0,
            lon: bad.1,
        });
    }
    Ok(geometry)
}

pub fn validate_wkt(wkt: &str) -> bool {
    parse(wkt).is_ok()
}

/// Builds `POINT(lon lat)` for a coordinate.
pub fn point_wkt(point: LatLon) -> String {
    Point::new(point.1, point.0).wkt_string()
}
