//! # mapforge
//!
//! A static map renderer. Given a center and a (possibly fractional) zoom it
//! composites raster base-map tiles with vector overlays (GeoJSON, markers,
//! polygons, polylines, labels) into a single image.
//!
//! The pieces, leaves first:
//! - [`core::matrix`] and [`core::crs`]: affine transforms and projections
//! - [`core::grid`]: tile/pixel addressing for a CRS and tile size
//! - [`tiles`]: the tile source contract plus an HTTP/cache implementation
//! - [`layers`]: everything that can paint itself onto a [`rendering::Canvas`]
//! - [`core::map`]: the renderer that ties it together

pub mod core;
pub mod data;
pub mod layers;
pub mod prelude;
pub mod rendering;
pub mod tiles;

pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{RenderConfig, TileLoadingConfig},
    crs::{Crs, Projection},
    geo::{LatLon, LatLonBounds, Point, TileCoord},
    grid::TileGrid,
    map::{MapRenderer, RenderedMap},
    matrix::Matrix,
    viewport::Viewport,
};

pub use layers::{
    base::{Layer, LayerTrait, LayerType},
    marker::MarkerLayer,
    shape::{PolygonLayer, PolylineLayer},
    text::TextLayer,
    tile::TileLayer,
    vector::VectorLayer,
};

pub use rendering::{
    canvas::{Canvas, StateGuard},
    pixmap::PixmapCanvas,
    recording::RecordingCanvas,
    style::{Color, Style, TextStyle},
};

pub use tiles::source::{TileService, TileSource};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid zoom level: {0}")]
    InvalidZoom(f64),

    #[error("Latitude {0} is outside the open interval (-90, 90)")]
    LatitudeOutOfDomain(f64),

    #[error("Matrix is singular and cannot be inverted")]
    SingularMatrix,

    #[error("WMS source has no layers parameter")]
    MissingWmsLayers,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Error type alias for convenience
pub type Error = MapError;
