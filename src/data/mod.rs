pub mod geojson;
pub mod tissot;

pub use geojson::{GeoJson, GeoJsonFeature, Geometry, Position};
pub use tissot::tissot_indicatrix;
