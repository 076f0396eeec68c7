//! Prelude module for common mapforge types and traits
//!
//! `use mapforge::prelude::*;` pulls in everything needed to build a renderer,
//! add layers and draw a map.

pub use crate::core::{
    config::{RenderConfig, TileLoadingConfig},
    crs::{distance, Crs, Epsg3395, Epsg3857, Epsg4326, Projection},
    geo::{LatLon, LatLonBounds, Point, TileCoord},
    grid::TileGrid,
    map::{MapRenderer, RenderedMap},
    matrix::Matrix,
    viewport::Viewport,
};

pub use crate::layers::{
    base::{Layer, LayerProperties, LayerTrait, LayerType},
    manager::LayerManager,
    marker::{MarkerIcon, MarkerLayer, MarkerSymbol},
    shape::{PolygonLayer, PolylineLayer},
    text::TextLayer,
    tile::TileLayer,
    vector::{VectorLayer, VectorLayerOptions},
};

pub use crate::data::geojson::{GeoJson, GeoJsonFeature, Geometry};

pub use crate::rendering::{
    canvas::{Canvas, StateGuard},
    pixmap::PixmapCanvas,
    recording::{DrawCommand, RecordingCanvas},
    style::{Color, LineCap, LineJoin, Style, TextAlign, TextDecoration, TextStyle},
};

pub use crate::tiles::{
    cache::{FileTileCache, MemoryTileCache, NoCache, TileCache, TileKey},
    loader::{HttpTransport, Transport, TransportResponse},
    source::{TileService, TileSource},
    wms::WmsOptions,
};

pub use crate::{Error, MapError, Result};

pub use fxhash::FxHashMap as HashMap;
pub use fxhash::FxHashSet as HashSet;
