//! Render orchestration
//!
//! A [`MapRenderer`] owns the tile grid and an ordered list of layers. Each
//! render call builds a fresh canvas, lets every visible layer paint into it
//! and reports the geographic corners of what was drawn.

use crate::{
    core::{
        config::RenderConfig,
        constants::MAX_ZOOM,
        geo::LatLon,
        grid::TileGrid,
        viewport::Viewport,
    },
    layers::{base::Layer, manager::LayerManager},
    rendering::{canvas::Canvas, pixmap::PixmapCanvas, style::Color},
    MapError, Result,
};

/// A finished render: the image and the corners it covers
pub struct RenderedMap {
    pub image: PixmapCanvas,
    pub top_left: LatLon,
    pub bottom_right: LatLon,
}

impl std::fmt::Debug for RenderedMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedMap")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("top_left", &self.top_left)
            .field("bottom_right", &self.bottom_right)
            .finish()
    }
}

#[derive(Debug)]
pub struct MapRenderer {
    grid: TileGrid,
    layers: LayerManager,
    background: Color,
    min_zoom: f64,
    max_zoom: f64,
}

impl MapRenderer {
    pub fn new(grid: TileGrid) -> Self {
        Self {
            grid,
            layers: LayerManager::new(),
            background: Color::rgb(0x7f, 0x7f, 0x7f),
            min_zoom: 0.0,
            max_zoom: MAX_ZOOM as f64,
        }
    }

    pub fn from_config(config: &RenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            grid: config.grid()?,
            layers: LayerManager::new(),
            background: config.background_color()?,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
        })
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    /// Appends a layer; it will be drawn above the ones added before it
    pub fn add_layer(&mut self, layer: impl Into<Layer>) -> Result<()> {
        self.layers.add_layer(layer)
    }

    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut LayerManager {
        &mut self.layers
    }

    /// Center and fractional zoom that frame the box spanned by `p1` and
    /// `p2` in a `width` x `height` image
    pub fn fit_bounds(&self, p1: LatLon, p2: LatLon, width: u32, height: u32, max_zoom: f64) -> (LatLon, f64) {
        self.grid.fit_bounds(p1, p2, width, height, max_zoom.min(self.max_zoom))
    }

    fn check_zoom(&self, zoom: f64) -> Result<()> {
        if !zoom.is_finite() || zoom < self.min_zoom || zoom > self.max_zoom {
            return Err(MapError::InvalidZoom(zoom));
        }
        Ok(())
    }

    /// Renders onto a new canvas filled with the configured background
    pub fn render_map(&self, center: LatLon, zoom: f64, width: u32, height: u32) -> Result<RenderedMap> {
        self.render_map_with_background(center, zoom, width, height, self.background)
    }

    pub fn render_map_with_background(
        &self,
        center: LatLon,
        zoom: f64,
        width: u32,
        height: u32,
        background: Color,
    ) -> Result<RenderedMap> {
        self.check_zoom(zoom)?;
        let mut image = PixmapCanvas::with_background(width, height, background)?;
        let (top_left, bottom_right) = self.render_into(&mut image, center, zoom)?;
        Ok(RenderedMap {
            image,
            top_left,
            bottom_right,
        })
    }

    /// Draws every visible layer onto `canvas`, whose size is the viewport
    /// size, and returns the top-left and bottom-right corners at the exact
    /// fractional zoom
    pub fn render_into(&self, canvas: &mut dyn Canvas, center: LatLon, zoom: f64) -> Result<(LatLon, LatLon)> {
        self.check_zoom(zoom)?;
        let viewport = Viewport::new(center, zoom, canvas.width(), canvas.height());
        self.layers.render(canvas, &self.grid, &viewport)?;

        let corners = (viewport.top_left(&self.grid), viewport.bottom_right(&self.grid));
        log::info!(
            "rendered {} layers at {} z{:.2} ({}x{})",
            self.layers.len(),
            center,
            zoom,
            viewport.width,
            viewport.height
        );
        Ok(corners)
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new(TileGrid::default())
    }
}
