//! Input area geometry.
//!
//! A [`GeoArea`] is created once per run from a GeoJSON document. It holds the
//! polygon used for exact membership tests, its bounding box, the inclusive
//! rectangle of coverage tiles that spans the box, and the area digest that
//! namespaces the processing ledger.

mod digest;

pub use digest::{area_digest, canonical_json};

use crate::coord::{bbox_to_tile_rect, CoordError, TileRect, COVERAGE_ZOOM};
use geo::{BoundingRect, Contains};
use geo_types::{Coord, LineString, MultiPolygon, Point, Polygon, Rect};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading an area.
#[derive(Debug, Error)]
pub enum AreaError {
    /// The input file does not exist.
    #[error("input file '{}' was not found", .0.display())]
    InputNotFound(PathBuf),

    /// The input file exists but could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The input is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// No geometry could be located in the document.
    #[error("document contains no geometry")]
    MissingGeometry,

    /// Geometry type other than Polygon or MultiPolygon.
    #[error("unsupported geometry type '{0}' (expected Polygon or MultiPolygon)")]
    UnsupportedGeometry(String),

    /// Malformed coordinate arrays.
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),

    /// Bounding box outside the Web Mercator range.
    #[error("area bounds out of range: {0}")]
    OutOfRange(#[from] CoordError),
}

/// Polygon area of interest with derived bounds.
#[derive(Debug, Clone)]
pub struct GeoArea {
    shape: MultiPolygon<f64>,
    bounds: Rect<f64>,
    tiles: TileRect,
    digest: String,
}

impl GeoArea {
    /// Loads an area from a GeoJSON file.
    pub fn load(path: &Path) -> Result<Self, AreaError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AreaError::InputNotFound(path.to_path_buf())
            } else {
                AreaError::Read {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::from_geojson_str(&text)
    }

    /// Parses an area from GeoJSON text.
    ///
    /// Accepts a FeatureCollection (first feature is used), a Feature, or a
    /// bare Polygon/MultiPolygon geometry.
    pub fn from_geojson_str(text: &str) -> Result<Self, AreaError> {
        let document: Value = serde_json::from_str(text)?;
        let geometry = locate_geometry(&document)?;
        Self::from_geometry(geometry)
    }

    /// Builds an area from a GeoJSON geometry object.
    pub fn from_geometry(geometry: &Value) -> Result<Self, AreaError> {
        let shape = parse_geometry(geometry)?;
        let bounds = shape
            .bounding_rect()
            .ok_or_else(|| AreaError::InvalidCoordinates("geometry has no points".into()))?;

        let tiles = bbox_to_tile_rect(
            bounds.min().x,
            bounds.min().y,
            bounds.max().x,
            bounds.max().y,
            COVERAGE_ZOOM,
        )?;

        Ok(Self {
            shape,
            bounds,
            tiles,
            digest: area_digest(geometry),
        })
    }

    /// Exact point-in-polygon test against the input geometry.
    ///
    /// Points on the boundary are not contained.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.shape.contains(&Point::new(lon, lat))
    }

    /// Bounding box as `(min_lon, min_lat, max_lon, max_lat)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (
            self.bounds.min().x,
            self.bounds.min().y,
            self.bounds.max().x,
            self.bounds.max().y,
        )
    }

    /// Inclusive coverage-tile rectangle spanning the bounding box.
    pub fn tile_rect(&self) -> TileRect {
        self.tiles
    }

    /// Hex SHA-256 of the canonicalized geometry.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

fn locate_geometry(document: &Value) -> Result<&Value, AreaError> {
    match document.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => document
            .get("features")
            .and_then(|f| f.get(0))
            .and_then(|f| f.get("geometry"))
            .filter(|g| !g.is_null())
            .ok_or(AreaError::MissingGeometry),
        Some("Feature") => document
            .get("geometry")
            .filter(|g| !g.is_null())
            .ok_or(AreaError::MissingGeometry),
        Some(_) => Ok(document),
        None => Err(AreaError::MissingGeometry),
    }
}

fn parse_geometry(geometry: &Value) -> Result<MultiPolygon<f64>, AreaError> {
    let kind = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or(AreaError::MissingGeometry)?;
    let coordinates = geometry
        .get("coordinates")
        .ok_or_else(|| AreaError::InvalidCoordinates("missing 'coordinates'".into()))?;

    match kind {
        "Polygon" => Ok(MultiPolygon::new(vec![parse_polygon(coordinates)?])),
        "MultiPolygon" => {
            let polygons = as_array(coordinates, "multipolygon")?
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MultiPolygon::new(polygons))
        }
        other => Err(AreaError::UnsupportedGeometry(other.to_string())),
    }
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>, AreaError> {
    let mut rings = as_array(value, "polygon")?
        .iter()
        .map(parse_ring)
        .collect::<Result<Vec<_>, _>>()?
        .into_iter();

    let exterior = rings
        .next()
        .ok_or_else(|| AreaError::InvalidCoordinates("polygon has no rings".into()))?;
    Ok(Polygon::new(exterior, rings.collect()))
}

fn parse_ring(value: &Value) -> Result<LineString<f64>, AreaError> {
    let coords = as_array(value, "ring")?
        .iter()
        .map(parse_position)
        .collect::<Result<Vec<_>, _>>()?;

    if coords.len() < 3 {
        return Err(AreaError::InvalidCoordinates(format!(
            "ring has {} positions, need at least 3",
            coords.len()
        )));
    }
    Ok(LineString::new(coords))
}

fn parse_position(value: &Value) -> Result<Coord<f64>, AreaError> {
    let position = as_array(value, "position")?;
    match (
        position.first().and_then(Value::as_f64),
        position.get(1).and_then(Value::as_f64),
    ) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err(AreaError::InvalidCoordinates(format!(
            "position {} is not [lon, lat]",
            value
        ))),
    }
}

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>, AreaError> {
    value
        .as_array()
        .ok_or_else(|| AreaError::InvalidCoordinates(format!("{} must be an array", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    /// An L-shaped (concave) polygon around the unit square corner.
    fn l_shape() -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[
                [-122.34, 47.60], [-122.32, 47.60], [-122.32, 47.61],
                [-122.33, 47.61], [-122.33, 47.62], [-122.34, 47.62],
                [-122.34, 47.60]
            ]]
        })
    }

    #[test]
    fn test_feature_collection_uses_first_feature() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "properties": {}, "geometry": l_shape()}]
        });
        let area = GeoArea::from_geojson_str(&doc.to_string()).unwrap();
        assert_eq!(area.digest(), area_digest(&l_shape()));
    }

    #[test]
    fn test_bare_geometry_and_feature_agree() {
        let bare = GeoArea::from_geojson_str(&l_shape().to_string()).unwrap();
        let feature = GeoArea::from_geojson_str(
            &json!({"type": "Feature", "geometry": l_shape()}).to_string(),
        )
        .unwrap();
        assert_eq!(bare.digest(), feature.digest());
        assert_eq!(bare.tile_rect(), feature.tile_rect());
    }

    #[test]
    fn test_contains_uses_polygon_not_bbox() {
        let area = GeoArea::from_geometry(&l_shape()).unwrap();

        // Inside the lower arm
        assert!(area.contains(47.605, -122.325));
        // Inside the bounding box but in the notch of the L
        assert!(!area.contains(47.615, -122.325));
        // Outside entirely
        assert!(!area.contains(47.70, -122.325));
    }

    #[test]
    fn test_bounds() {
        let area = GeoArea::from_geometry(&l_shape()).unwrap();
        let (min_lon, min_lat, max_lon, max_lat) = area.bounds();
        assert_eq!(min_lon, -122.34);
        assert_eq!(min_lat, 47.60);
        assert_eq!(max_lon, -122.32);
        assert_eq!(max_lat, 47.62);
    }

    #[test]
    fn test_tile_rect_matches_bbox_corners() {
        let area = GeoArea::from_geometry(&l_shape()).unwrap();
        let expected = bbox_to_tile_rect(-122.34, 47.60, -122.32, 47.62, COVERAGE_ZOOM).unwrap();
        assert_eq!(area.tile_rect(), expected);
    }

    #[test]
    fn test_multipolygon() {
        let geometry = json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]],
                [[[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 6.0], [5.0, 5.0]]]
            ]
        });
        let area = GeoArea::from_geometry(&geometry).unwrap();
        assert!(area.contains(0.5, 0.5));
        assert!(area.contains(5.5, 5.5));
        assert!(!area.contains(3.0, 3.0));
    }

    #[test]
    fn test_unsupported_geometry() {
        let geometry = json!({"type": "Point", "coordinates": [0.0, 0.0]});
        assert!(matches!(
            GeoArea::from_geometry(&geometry),
            Err(AreaError::UnsupportedGeometry(kind)) if kind == "Point"
        ));
    }

    #[test]
    fn test_missing_geometry() {
        let doc = json!({"type": "FeatureCollection", "features": []});
        assert!(matches!(
            GeoArea::from_geojson_str(&doc.to_string()),
            Err(AreaError::MissingGeometry)
        ));
    }

    #[test]
    fn test_malformed_position() {
        let geometry = json!({"type": "Polygon", "coordinates": [[[0.0], [1.0, 0.0], [1.0, 1.0]]]});
        assert!(matches!(
            GeoArea::from_geometry(&geometry),
            Err(AreaError::InvalidCoordinates(_))
        ));
    }

    #[test]
    fn test_load_missing_file_is_input_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nope.geojson");
        assert!(matches!(
            GeoArea::load(&path),
            Err(AreaError::InputNotFound(p)) if p == path
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("area.geojson");
        std::fs::write(&path, l_shape().to_string()).unwrap();
        let area = GeoArea::load(&path).unwrap();
        assert_eq!(area.digest(), area_digest(&l_shape()));
    }

    /// Rebuilds a JSON object with keys inserted in reverse order.
    fn reverse_keys(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut reversed = serde_json::Map::new();
                for (k, v) in map.iter().rev() {
                    reversed.insert(k.clone(), reverse_keys(v));
                }
                Value::Object(reversed)
            }
            Value::Array(items) => Value::Array(items.iter().map(reverse_keys).collect()),
            other => other.clone(),
        }
    }

    proptest! {
        #[test]
        fn prop_scrambled_serialization_has_same_digest(
            lon in -170.0f64..170.0,
            lat in -70.0f64..70.0,
            size in 0.001f64..0.1,
            pretty in any::<bool>(),
        ) {
            let geometry = json!({
                "type": "Polygon",
                "coordinates": [[
                    [lon, lat], [lon + size, lat], [lon + size, lat + size], [lon, lat]
                ]],
                "bbox": [lon, lat, lon + size, lat + size]
            });
            let scrambled = reverse_keys(&geometry);
            let text = if pretty {
                serde_json::to_string_pretty(&scrambled).unwrap()
            } else {
                serde_json::to_string(&scrambled).unwrap()
            };

            let a = GeoArea::from_geometry(&geometry).unwrap();
            let b = GeoArea::from_geojson_str(&text).unwrap();
            prop_assert_eq!(a.digest(), b.digest());
        }
    }
}
