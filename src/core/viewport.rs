use crate::core::{
    geo::{LatLon, Point},
    grid::TileGrid,
};
use serde::{Deserialize, Serialize};

/// The rectangle being rendered: a geographic center, a (possibly
/// fractional) zoom and the output size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the image in geographical coordinates
    pub center: LatLon,
    /// The zoom level, fractional values allowed
    pub zoom: f64,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
}

impl Viewport {
    pub fn new(center: LatLon, zoom: f64, width: u32, height: u32) -> Self {
        Self {
            center,
            zoom,
            width,
            height,
        }
    }

    /// Same center and size at another zoom
    pub fn at_zoom(&self, zoom: f64) -> Viewport {
        Viewport { zoom, ..*self }
    }

    fn half_size(&self) -> Point {
        Point::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    /// Map pixel of the center
    pub fn center_pixel(&self, grid: &TileGrid) -> Point {
        grid.latlon_to_map(self.center, self.zoom)
    }

    /// Map pixel of the image's top-left corner
    pub fn top_left_pixel(&self, grid: &TileGrid) -> Point {
        self.center_pixel(grid).subtract(&self.half_size())
    }

    /// Map pixel of the image's bottom-right corner
    pub fn bottom_right_pixel(&self, grid: &TileGrid) -> Point {
        self.center_pixel(grid).add(&self.half_size())
    }

    /// Geographic top-left corner
    pub fn top_left(&self, grid: &TileGrid) -> LatLon {
        grid.map_to_latlon(self.top_left_pixel(grid), self.zoom)
    }

    /// Geographic bottom-right corner
    pub fn bottom_right(&self, grid: &TileGrid) -> LatLon {
        grid.map_to_latlon(self.bottom_right_pixel(grid), self.zoom)
    }

    /// Image pixel of a coordinate, relative to the top-left corner
    pub fn to_canvas(&self, grid: &TileGrid, latlon: LatLon) -> Point {
        grid.latlon_to_map(latlon, self.zoom)
            .subtract(&self.top_left_pixel(grid))
    }
}
