//! Raster base map assembled from tiles.
//!
//! Tiles are always fetched at the integer part of the zoom. The mosaic of
//! whole tiles covering the viewport is then scaled up by the fractional
//! remainder and composited so the viewport center stays put.

use crate::{
    core::{geo::TileCoord, grid::TileGrid, viewport::Viewport},
    layers::base::{LayerProperties, LayerTrait, LayerType},
    rendering::canvas::Canvas,
    tiles::source::TileSource,
    Result,
};
use image::{imageops, RgbaImage};

pub struct TileLayer {
    properties: LayerProperties,
    source: Box<dyn TileSource>,
}

impl TileLayer {
    pub fn new(id: impl Into<String>, source: impl TileSource + 'static) -> Self {
        Self::from_boxed(id, Box::new(source))
    }

    pub fn from_boxed(id: impl Into<String>, source: Box<dyn TileSource>) -> Self {
        Self {
            properties: LayerProperties::new(id, LayerType::Tile),
            source,
        }
    }

    crate::impl_layer_builders!(properties);

    pub fn source(&self) -> &dyn TileSource {
        self.source.as_ref()
    }

    /// Fetches and decodes one tile; `None` leaves the cell blank
    fn load_tile(&self, tile: TileCoord, grid: &TileGrid) -> Option<RgbaImage> {
        let bytes = self.source.fetch_tile(tile, grid)?;
        match image::load_from_memory(&bytes) {
            Ok(decoded) => Some(decoded.to_rgba8()),
            Err(e) => {
                log::warn!("{}: cannot decode tile {}: {}", self.source.name(), tile, e);
                None
            }
        }
    }

    /// The whole tiles covering `viewport` at integer zoom `izoom`, drawn
    /// row by row, plus the first tile's index
    fn build_mosaic(
        &self,
        grid: &TileGrid,
        viewport: &Viewport,
        izoom: u8,
    ) -> Result<(RgbaImage, TileCoord)> {
        let at_izoom = viewport.at_zoom(izoom as f64);
        let top_left = grid.get_tile(at_izoom.top_left_pixel(grid), izoom);
        let bottom_right = grid.get_tile(at_izoom.bottom_right_pixel(grid), izoom);

        let tile_size = grid.tile_size();
        let columns = (bottom_right.x - top_left.x + 1) as u32;
        let rows = (bottom_right.y - top_left.y + 1) as u32;
        let mut mosaic = RgbaImage::new(tile_size * columns, tile_size * rows);

        for (row, ty) in (top_left.y..=bottom_right.y).enumerate() {
            for (column, tx) in (top_left.x..=bottom_right.x).enumerate() {
                let tile = TileCoord::new(grid.wrap_tile_x(tx, izoom)?, ty, izoom);
                if !grid.is_tile_valid(tile) {
                    continue;
                }
                // a source that cannot address tiles is misconfigured, not
                // merely offline
                self.source.make_url(tile, grid)?;
                if let Some(image) = self.load_tile(tile, grid) {
                    imageops::replace(
                        &mut mosaic,
                        &image,
                        column as i64 * tile_size as i64,
                        row as i64 * tile_size as i64,
                    );
                }
            }
        }
        Ok((mosaic, top_left))
    }
}

impl std::fmt::Debug for TileLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileLayer")
            .field("properties", &self.properties)
            .field("source", &self.source.name())
            .finish()
    }
}

impl LayerTrait for TileLayer {
    crate::impl_layer_trait!(properties);

    fn render(&self, canvas: &mut dyn Canvas, grid: &TileGrid, viewport: &Viewport) -> Result<()> {
        let izoom = grid.integer_zoom(viewport.zoom)?;
        let (mut mosaic, first_tile) = self.build_mosaic(grid, viewport, izoom)?;

        let scale = 2f64.powf(viewport.zoom - izoom as f64);
        if scale > 1.0 {
            let (w, h) = mosaic.dimensions();
            mosaic = imageops::resize(
                &mosaic,
                (w as f64 * scale) as u32,
                (h as f64 * scale) as u32,
                imageops::FilterType::Triangle,
            );
        }

        // offset of the viewport inside the unscaled mosaic, scaled, then
        // shifted by half the growth so scaling happens about the center
        let top_left = viewport.at_zoom(izoom as f64).top_left_pixel(grid);
        let tile_size = grid.tile_size() as f64;
        let grow_x = (viewport.width as f64 * scale - viewport.width as f64) / 2.0;
        let grow_y = (viewport.height as f64 * scale - viewport.height as f64) / 2.0;
        let crop_x = ((top_left.x - tile_size * first_tile.x as f64) * scale + grow_x).floor();
        let crop_y = ((top_left.y - tile_size * first_tile.y as f64) * scale + grow_y).floor();

        log::debug!(
            "{}: {}x{} mosaic at z{} scaled {:.3}",
            self.source.name(),
            mosaic.width(),
            mosaic.height(),
            izoom,
            scale
        );
        canvas.draw_image(&mosaic, -(crop_x as i64), -(crop_y as i64));
        Ok(())
    }
}
