use crate::{
    core::{geo::LatLon, geo::Point, grid::TileGrid, viewport::Viewport},
    layers::base::{LayerProperties, LayerTrait, LayerType},
    rendering::{canvas::Canvas, style::TextStyle},
    Result,
};

/// A single label anchored at a geographic position
#[derive(Debug, Clone)]
pub struct TextLayer {
    properties: LayerProperties,
    position: LatLon,
    text: String,
    style: TextStyle,
    /// Pixel offset from the projected position
    offset: Point,
}

impl TextLayer {
    pub fn new(id: impl Into<String>, position: LatLon, text: impl Into<String>) -> Self {
        Self {
            properties: LayerProperties::new(id, LayerType::Text),
            position,
            text: text.into(),
            style: TextStyle::default(),
            offset: Point::new(0.0, 0.0),
        }
    }

    crate::impl_layer_builders!(properties);

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_offset(mut self, dx: f64, dy: f64) -> Self {
        self.offset = Point::new(dx, dy);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn position(&self) -> LatLon {
        self.position
    }
}

impl LayerTrait for TextLayer {
    crate::impl_layer_trait!(properties);

    fn render(&self, canvas: &mut dyn Canvas, grid: &TileGrid, viewport: &Viewport) -> Result<()> {
        let anchor = viewport.to_canvas(grid, self.position).add(&self.offset);
        canvas.draw_text(anchor, &self.text, &self.style);
        Ok(())
    }
}
