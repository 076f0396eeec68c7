//! GeoJSON input.
//!
//! Any accepted document is normalised to a feature collection: a bare
//! geometry or a single `Feature` is wrapped. `type` names match
//! case-insensitively. Input that cannot be wrapped yields an empty
//! collection and a warning instead of an error.

use crate::{
    core::geo::{LatLon, LatLonBounds},
    MapError, Result,
};
use serde_json::{json, Map, Value};

/// A raw coordinate pair in document order
pub type Position = [f64; 2];

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    /// Rings; the first is the outer contour, the rest are holes
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
    GeometryCollection(Vec<Geometry>),
    /// A geometry whose `type` is not recognised; never drawn
    Unknown(String),
}

impl Geometry {
    /// Parses a geometry object; `None` if it is not one
    pub fn from_value(value: &Value) -> Option<Geometry> {
        let kind = value.get("type")?.as_str()?;
        let coords = || value.get("coordinates");
        let geometry = match kind.to_ascii_lowercase().as_str() {
            "point" => Geometry::Point(parse_position(coords()?)?),
            "multipoint" => Geometry::MultiPoint(parse_positions(coords()?)?),
            "linestring" => Geometry::LineString(parse_positions(coords()?)?),
            "multilinestring" => Geometry::MultiLineString(parse_rings(coords()?)?),
            "polygon" => Geometry::Polygon(parse_rings(coords()?)?),
            "multipolygon" => Geometry::MultiPolygon(
                coords()?
                    .as_array()?
                    .iter()
                    .map(parse_rings)
                    .collect::<Option<_>>()?,
            ),
            "geometrycollection" => Geometry::GeometryCollection(
                value
                    .get("geometries")?
                    .as_array()?
                    .iter()
                    .filter_map(|child| {
                        let parsed = Geometry::from_value(child);
                        if parsed.is_none() {
                            log::warn!("skipping malformed geometry inside a GeometryCollection");
                        }
                        parsed
                    })
                    .collect(),
            ),
            _ => {
                log::warn!("skipping GeoJSON geometry of unknown type '{kind}'");
                Geometry::Unknown(kind.to_string())
            }
        };
        Some(geometry)
    }

    pub fn to_value(&self) -> Value {
        match self {
            Geometry::Point(p) => json!({ "type": "Point", "coordinates": p }),
            Geometry::MultiPoint(ps) => json!({ "type": "MultiPoint", "coordinates": ps }),
            Geometry::LineString(ps) => json!({ "type": "LineString", "coordinates": ps }),
            Geometry::MultiLineString(ls) => {
                json!({ "type": "MultiLineString", "coordinates": ls })
            }
            Geometry::Polygon(rings) => json!({ "type": "Polygon", "coordinates": rings }),
            Geometry::MultiPolygon(polys) => {
                json!({ "type": "MultiPolygon", "coordinates": polys })
            }
            Geometry::GeometryCollection(gs) => json!({
                "type": "GeometryCollection",
                "geometries": gs.iter().map(Geometry::to_value).collect::<Vec<_>>(),
            }),
            Geometry::Unknown(kind) => json!({ "type": kind }),
        }
    }

    /// Calls `f` for every position in the tree
    pub fn for_each_position(&self, f: &mut impl FnMut(Position)) {
        match self {
            Geometry::Point(p) => f(*p),
            Geometry::MultiPoint(ps) | Geometry::LineString(ps) => ps.iter().copied().for_each(f),
            Geometry::MultiLineString(ls) | Geometry::Polygon(ls) => {
                ls.iter().flatten().copied().for_each(f)
            }
            Geometry::MultiPolygon(polys) => polys.iter().flatten().flatten().copied().for_each(f),
            Geometry::GeometryCollection(gs) => gs.iter().for_each(|g| g.for_each_position(f)),
            Geometry::Unknown(_) => {}
        }
    }
}

fn parse_position(value: &Value) -> Option<Position> {
    let array = value.as_array()?;
    Some([array.first()?.as_f64()?, array.get(1)?.as_f64()?])
}

fn parse_positions(value: &Value) -> Option<Vec<Position>> {
    value.as_array()?.iter().map(parse_position).collect()
}

fn parse_rings(value: &Value) -> Option<Vec<Vec<Position>>> {
    value.as_array()?.iter().map(parse_positions).collect()
}

/// Converts a document-order position to a coordinate. GeoJSON is
/// longitude first; `swap_xy` reads latitude first instead.
pub fn position_to_latlon(position: Position, swap_xy: bool) -> LatLon {
    if swap_xy {
        LatLon::new(position[0], position[1])
    } else {
        LatLon::new(position[1], position[0])
    }
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoJsonFeature {
    pub id: Option<Value>,
    pub geometry: Option<Geometry>,
    pub properties: Map<String, Value>,
}

impl GeoJsonFeature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            ..Self::default()
        }
    }

    fn from_value(value: &Value) -> GeoJsonFeature {
        let geometry = match value.get("geometry") {
            None | Some(Value::Null) => None,
            Some(geometry) => {
                let parsed = Geometry::from_value(geometry);
                if parsed.is_none() {
                    log::warn!("skipping malformed geometry of a GeoJSON feature");
                }
                parsed
            }
        };
        GeoJsonFeature {
            id: value.get("id").cloned(),
            geometry,
            properties: value
                .get("properties")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut feature = json!({
            "type": "Feature",
            "geometry": self.geometry.as_ref().map(Geometry::to_value),
            "properties": self.properties,
        });
        if let (Some(id), Some(object)) = (&self.id, feature.as_object_mut()) {
            object.insert("id".to_string(), id.clone());
        }
        feature
    }
}

/// A FeatureCollection member; anything but a `Feature` is skipped
fn collection_member(value: &Value) -> Option<GeoJsonFeature> {
    let is_feature = value
        .get("type")
        .and_then(Value::as_str)
        .map_or(false, |kind| kind.eq_ignore_ascii_case("feature"));
    if !is_feature {
        log::warn!("skipping FeatureCollection member that is not a Feature");
        return None;
    }
    Some(GeoJsonFeature::from_value(value))
}

/// A normalised GeoJSON document: always a feature collection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoJson {
    features: Vec<GeoJsonFeature>,
}

impl GeoJson {
    pub fn new(features: Vec<GeoJsonFeature>) -> Self {
        Self { features }
    }

    /// Parses JSON text; only invalid JSON syntax is an error
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| MapError::ParseError(format!("Invalid GeoJSON: {}", e)))?;
        Ok(Self::from_value(&value))
    }

    /// Wraps a Feature, FeatureCollection or bare geometry into a collection
    pub fn from_value(value: &Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_ascii_lowercase);

        match kind.as_deref() {
            Some("featurecollection") => {
                let features = value
                    .get("features")
                    .and_then(Value::as_array)
                    .map(|fs| fs.iter().filter_map(collection_member).collect())
                    .unwrap_or_default();
                Self::new(features)
            }
            Some("feature") => Self::new(vec![GeoJsonFeature::from_value(value)]),
            Some(_) => match Geometry::from_value(value) {
                Some(geometry) => Self::new(vec![GeoJsonFeature::new(geometry)]),
                None => {
                    log::warn!("malformed GeoJSON geometry, rendering nothing");
                    Self::default()
                }
            },
            None => {
                log::warn!("GeoJSON object without a type, rendering nothing");
                Self::default()
            }
        }
    }

    pub fn features(&self) -> &[GeoJsonFeature] {
        &self.features
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn push(&mut self, feature: GeoJsonFeature) {
        self.features.push(feature);
    }

    /// Geographic extent of every position, `None` when there are none
    pub fn bounds(&self, swap_xy: bool) -> Option<LatLonBounds> {
        let mut bounds: Option<LatLonBounds> = None;
        for geometry in self.features.iter().filter_map(|f| f.geometry.as_ref()) {
            geometry.for_each_position(&mut |p| {
                let latlon = position_to_latlon(p, swap_xy);
                match bounds.as_mut() {
                    Some(b) => b.extend(&latlon),
                    None => bounds = Some(LatLonBounds::from_point(latlon)),
                }
            });
        }
        bounds
    }

    pub fn to_value(&self) -> Value {
        json!({
            "type": "FeatureCollection",
            "features": self.features.iter().map(GeoJsonFeature::to_value).collect::<Vec<_>>(),
        })
    }
}

impl std::str::FromStr for GeoJson {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        GeoJson::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_geometry_is_wrapped() {
        let doc = GeoJson::parse(r#"{"type": "point", "coordinates": [20.0, 60.0]}"#).unwrap();
        assert_eq!(doc.features().len(), 1);
        assert_eq!(doc.features()[0].geometry, Some(Geometry::Point([20.0, 60.0])));
    }

    #[test]
    fn test_feature_is_wrapped_and_keeps_properties() {
        let doc = GeoJson::parse(
            r#"{"type": "FEATURE", "id": 7, "properties": {"name": "x"},
                "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}}"#,
        )
        .unwrap();
        let feature = &doc.features()[0];
        assert_eq!(feature.id, Some(json!(7)));
        assert_eq!(feature.properties.get("name"), Some(&json!("x")));
        assert!(matches!(feature.geometry, Some(Geometry::LineString(ref ps)) if ps.len() == 2));
    }

    #[test]
    fn test_nested_collection() {
        let doc = GeoJson::parse(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": {"type": "GeometryCollection", "geometries": [
                    {"type": "Point", "coordinates": [1, 2]},
                    {"type": "MultiPolygon", "coordinates": [[[[0,0],[1,0],[1,1],[0,0]]]]}
                ]}}
            ]}"#,
        )
        .unwrap();
        match &doc.features()[0].geometry {
            Some(Geometry::GeometryCollection(children)) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[1], Geometry::MultiPolygon(ref p) if p[0][0].len() == 4));
            }
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_is_kept_as_unknown() {
        let doc = GeoJson::parse(r#"{"type": "Circle", "coordinates": [0, 0], "radius": 5}"#)
            .unwrap();
        assert_eq!(
            doc.features()[0].geometry,
            Some(Geometry::Unknown("Circle".to_string()))
        );
    }

    #[test]
    fn test_malformed_input_yields_empty_collection() {
        assert!(GeoJson::parse("[1, 2, 3]").unwrap().is_empty());
        assert!(GeoJson::parse(r#"{"type": "Polygon", "coordinates": "nope"}"#)
            .unwrap()
            .is_empty());
        assert!(GeoJson::parse("{not json").is_err());
    }

    #[test]
    fn test_collection_skips_malformed_members() {
        let doc: GeoJson = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "GeometryCollection", "geometries": [
                {"type": "Point", "coordinates": [1, 2]},
                {"type": "LineString", "coordinates": "broken"},
                {"coordinates": [3, 4]}
            ]}},
            {"type": "Point", "coordinates": [5, 6]},
            {"type": "Feature", "geometry": null},
            {"type": "feature", "geometry": {"type": "Point", "coordinates": "x"}},
            7
        ]}"#
        .parse()
        .unwrap();

        assert_eq!(doc.features().len(), 3);
        assert_eq!(
            doc.features()[0].geometry,
            Some(Geometry::GeometryCollection(vec![Geometry::Point([1.0, 2.0])]))
        );
        assert_eq!(doc.features()[1].geometry, None);
        assert_eq!(doc.features()[2].geometry, None);
    }

    #[test]
    fn test_bounds_honours_swap() {
        let doc = GeoJson::parse(
            r#"{"type": "MultiPoint", "coordinates": [[176.6, -15.5], [181.9, -19.7]]}"#,
        )
        .unwrap();
        let b = doc.bounds(false).unwrap();
        assert_eq!(b.south_west, LatLon::new(-19.7, 176.6));
        assert_eq!(b.north_east, LatLon::new(-15.5, 181.9));

        let swapped = GeoJson::parse(r#"{"type": "Point", "coordinates": [45.0, 10.0]}"#)
            .unwrap()
            .bounds(true)
            .unwrap();
        assert_eq!(swapped.south_west, LatLon::new(45.0, 10.0));
    }

    #[test]
    fn test_to_value_round_trips_through_parser() {
        let doc = GeoJson::new(vec![GeoJsonFeature::new(Geometry::Polygon(vec![vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 0.0],
        ]]))]);
        assert_eq!(GeoJson::from_value(&doc.to_value()), doc);
    }
}
