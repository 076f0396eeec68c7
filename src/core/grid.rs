//! Tile grid addressing.
//!
//! A [`TileGrid`] binds a CRS to a tile size and converts between the four
//! coordinate spaces the renderer uses:
//!
//! - geographic ([`LatLon`])
//! - projected CRS units
//! - map pixels at a zoom, `[0, tile_size · 2^zoom)` per axis
//! - tile indices, `floor(pixel / tile_size)`
//!
//! Zoom is an `f64` wherever pixels are involved so that fractional zoom
//! levels scale the pixel space continuously; tile indices only exist at
//! integer zooms.

use crate::{
    core::{
        constants::{MAX_ZOOM, TILE_SIZE},
        crs::{Crs, Projection},
        geo::{LatLon, Point, TileCoord},
    },
    MapError, Result,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGrid {
    crs: Crs,
    tile_size: u32,
}

impl TileGrid {
    /// A grid with 256 pixel tiles
    pub fn new(crs: Crs) -> Self {
        Self::with_tile_size(crs, TILE_SIZE)
    }

    pub fn with_tile_size(crs: Crs, tile_size: u32) -> Self {
        Self {
            crs,
            tile_size: tile_size.max(1),
        }
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Tiles per axis at an integer zoom; fails outside `[0, 30]`
    pub fn num_tiles(&self, zoom: u8) -> Result<i64> {
        if zoom > MAX_ZOOM {
            return Err(MapError::InvalidZoom(zoom as f64));
        }
        Ok(1_i64 << zoom)
    }

    /// The integer zoom used to address tiles for a fractional `zoom`
    pub fn integer_zoom(&self, zoom: f64) -> Result<u8> {
        if !zoom.is_finite() || zoom < 0.0 || zoom.floor() > MAX_ZOOM as f64 {
            return Err(MapError::InvalidZoom(zoom));
        }
        Ok(zoom.floor() as u8)
    }

    /// Width (and height) of the whole map in pixels: `tile_size · 2^zoom`
    pub fn map_size(&self, zoom: f64) -> f64 {
        self.tile_size as f64 * 2_f64.powf(zoom)
    }

    /// Geographic coordinate to map pixels at `zoom`
    pub fn latlon_to_map(&self, latlon: LatLon, zoom: f64) -> Point {
        self.crs_to_map(self.crs.project(latlon), zoom)
    }

    /// Map pixels at `zoom` to a geographic coordinate
    pub fn map_to_latlon(&self, pixel: Point, zoom: f64) -> LatLon {
        self.crs.unproject(self.map_to_crs(pixel, zoom))
    }

    /// Projected CRS units to map pixels at `zoom`
    pub fn crs_to_map(&self, point: Point, zoom: f64) -> Point {
        self.crs
            .crs_to_map_transform(self.map_size(zoom))
            .transform(point)
    }

    /// Map pixels at `zoom` to projected CRS units
    pub fn map_to_crs(&self, pixel: Point, zoom: f64) -> Point {
        self.crs
            .map_to_crs_transform(self.map_size(zoom))
            .transform(pixel)
    }

    /// Geographic coordinate to the zoom independent unit square
    pub fn latlon_to_unit_square(&self, latlon: LatLon) -> Point {
        self.crs
            .crs_to_map_transform(1.0)
            .transform(self.crs.project(latlon))
    }

    /// Unit square position back to a geographic coordinate
    pub fn unit_square_to_latlon(&self, point: Point) -> LatLon {
        self.crs
            .unproject(self.crs.map_to_crs_transform(1.0).transform(point))
    }

    /// Tile containing a map pixel; indices may be negative or `>= 2^zoom`
    pub fn get_tile(&self, pixel: Point, zoom: u8) -> TileCoord {
        let size = self.tile_size as f64;
        TileCoord::new(
            (pixel.x / size).floor() as i64,
            (pixel.y / size).floor() as i64,
            zoom,
        )
    }

    /// Wraps a tile column into `[0, 2^zoom)`. Rows are never wrapped.
    pub fn wrap_tile_x(&self, x: i64, zoom: u8) -> Result<i64> {
        Ok(x.rem_euclid(self.num_tiles(zoom)?))
    }

    /// True when both indices lie in `[0, 2^z)`
    pub fn is_tile_valid(&self, tile: TileCoord) -> bool {
        match self.num_tiles(tile.z) {
            Ok(n) => (0..n).contains(&tile.x) && (0..n).contains(&tile.y),
            Err(_) => false,
        }
    }

    /// Pixel rectangle of a tile as (top-left, bottom-right)
    pub fn tile_map_bounds(&self, tile: TileCoord) -> (Point, Point) {
        let size = self.tile_size as f64;
        (
            Point::new(tile.x as f64 * size, tile.y as f64 * size),
            Point::new((tile.x + 1) as f64 * size, (tile.y + 1) as f64 * size),
        )
    }

    /// Tile corners in projected CRS units as (top-left, bottom-right)
    pub fn tile_crs_bounds(&self, tile: TileCoord) -> (Point, Point) {
        let (top_left, bottom_right) = self.tile_map_bounds(tile);
        let zoom = tile.z as f64;
        (
            self.map_to_crs(top_left, zoom),
            self.map_to_crs(bottom_right, zoom),
        )
    }

    /// Tile corners as geographic (top-left, bottom-right)
    pub fn tile_latlon_bounds(&self, tile: TileCoord) -> (LatLon, LatLon) {
        let (top_left, bottom_right) = self.tile_crs_bounds(tile);
        (self.crs.unproject(top_left), self.crs.unproject(bottom_right))
    }

    /// Center and zoom that frame the box spanned by `p1` and `p2` in a
    /// `width` × `height` image.
    ///
    /// The midpoint is taken in unit-square space, so it is the visual
    /// center of the box under the projection, not the average of degrees.
    pub fn fit_bounds(
        &self,
        p1: LatLon,
        p2: LatLon,
        width: u32,
        height: u32,
        max_zoom: f64,
    ) -> (LatLon, f64) {
        let u1 = self.latlon_to_unit_square(p1);
        let u2 = self.latlon_to_unit_square(p2);
        let center = self.unit_square_to_latlon(Point::new((u1.x + u2.x) / 2.0, (u1.y + u2.y) / 2.0));

        let tile_size = self.tile_size as f64;
        let zoom_w = fit_zoom_axis(width as f64, tile_size, (u1.x - u2.x).abs(), max_zoom);
        let zoom_h = fit_zoom_axis(height as f64, tile_size, (u1.y - u2.y).abs(), max_zoom);

        (center, zoom_w.min(zoom_h).clamp(0.0, max_zoom.max(0.0)))
    }
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::new(Crs::default())
    }
}

/// Zoom at which `unit_extent` of the unit square spans `render_size` pixels.
///
/// A zero extent yields `max_zoom`. The result is not clamped.
pub fn fit_zoom_axis(render_size: f64, tile_size: f64, unit_extent: f64, max_zoom: f64) -> f64 {
    if unit_extent == 0.0 {
        return max_zoom;
    }
    (render_size / (tile_size * unit_extent)).log2()
}
