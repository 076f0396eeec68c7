#[macro_use]
pub mod macros;

pub mod base;
pub mod manager;
pub mod marker;
pub mod shape;
pub mod text;
pub mod tile;
pub mod vector;

pub use base::{Layer, LayerProperties, LayerTrait, LayerType};
pub use manager::LayerManager;
pub use marker::{MarkerIcon, MarkerLayer, MarkerSymbol};
pub use shape::{PolygonLayer, PolylineLayer};
pub use text::TextLayer;
pub use tile::TileLayer;
pub use vector::{VectorLayer, VectorLayerOptions};
