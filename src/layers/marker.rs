//! Point markers: either a bitmap icon or a drawn teardrop symbol.

use crate::{
    core::{
        constants::MARKER_SIZE, geo::LatLon, geo::Point, grid::TileGrid, matrix::Matrix,
        viewport::Viewport,
    },
    layers::base::{LayerProperties, LayerTrait, LayerType},
    rendering::{
        canvas::{Canvas, StateGuard},
        style::{Color, Style},
    },
    Result,
};
use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Angular step of the symbol outline, in degrees
const OUTLINE_STEP: i32 = 5;

/// The procedural teardrop marker.
///
/// Sizes are in pixels. The symbol is built in its own frame with the tip
/// at the origin and y pointing up, then flipped into canvas space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSymbol {
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub style: Style,
    /// Radius of the hole in the head, relative to the head radius
    pub inner_radius_ratio: f64,
    /// Radius of the dot inside the hole, relative to the head radius
    pub dot_radius_ratio: f64,
    pub dot_color: Color,
}

impl Default for MarkerSymbol {
    fn default() -> Self {
        Self {
            width: MARKER_SIZE.0,
            height: MARKER_SIZE.1,
            style: Style::new()
                .fill_color(Color::rgb(0x33, 0x88, 0xff))
                .stroke_color(Color::rgb(0x1f, 0x5f, 0xbf))
                .stroke_width(1.5),
            inner_radius_ratio: 0.5,
            dot_radius_ratio: 0.3,
            dot_color: Color::WHITE,
        }
    }
}

impl MarkerSymbol {
    fn head_radius(&self) -> f64 {
        self.width / 2.0
    }

    fn head_center(&self) -> Point {
        Point::new(0.0, self.height - self.head_radius())
    }

    /// Outline and hole rings in symbol space.
    ///
    /// The head is traced from 215° down to -35°, which leaves the wedge
    /// under the head open; closing the ring at the origin forms the tip.
    pub fn rings(&self) -> Vec<Vec<Point>> {
        let r = self.head_radius();
        let head = self.head_center();

        let mut outline: Vec<Point> = (-35..=215)
            .rev()
            .step_by(OUTLINE_STEP as usize)
            .map(|deg| {
                let a = (deg as f64).to_radians();
                Point::new(head.x + r * a.cos(), head.y + r * a.sin())
            })
            .collect();
        outline.push(Point::new(0.0, 0.0));

        let hole_r = r * self.inner_radius_ratio;
        let hole = (0..360)
            .step_by(OUTLINE_STEP as usize)
            .map(|deg| {
                let a = (deg as f64).to_radians();
                Point::new(head.x + hole_r * a.cos(), head.y + hole_r * a.sin())
            })
            .collect();

        vec![outline, hole]
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        canvas.apply_style(&self.style);
        canvas.draw_polygon(&self.rings());

        canvas.apply_style(
            &Style::new()
                .fill_color(self.dot_color)
                .stroke_color(Color::TRANSPARENT)
                .stroke_width(0.0),
        );
        canvas.draw_circle(self.head_center(), self.head_radius() * self.dot_radius_ratio);
    }
}

/// A bitmap marker, optionally with a shadow bitmap behind it.
///
/// Anchors are the pixel of the image that sits on the marker position;
/// the icon anchor defaults to the bottom centre and the shadow shares it
/// unless given its own.
#[derive(Debug, Clone)]
pub struct MarkerIcon {
    image: RgbaImage,
    anchor: Option<Point>,
    shadow: Option<RgbaImage>,
    shadow_anchor: Option<Point>,
}

impl MarkerIcon {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            anchor: None,
            shadow: None,
            shadow_anchor: None,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(image::load_from_memory(bytes)?.to_rgba8()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(image::open(path)?.to_rgba8()))
    }

    /// Resizes the icon; an explicit anchor is kept in the original
    /// image's pixel units and scaled along
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        let (sx, sy) = (
            width as f64 / self.image.width().max(1) as f64,
            height as f64 / self.image.height().max(1) as f64,
        );
        self.anchor = self.anchor.map(|a| Point::new(a.x * sx, a.y * sy));
        self.image = imageops::resize(&self.image, width, height, imageops::FilterType::Triangle);
        self
    }

    pub fn with_anchor(mut self, anchor: Point) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_shadow(mut self, shadow: RgbaImage) -> Self {
        self.shadow = Some(shadow);
        self
    }

    pub fn with_shadow_anchor(mut self, anchor: Point) -> Self {
        self.shadow_anchor = Some(anchor);
        self
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn anchor(&self) -> Point {
        self.anchor.unwrap_or_else(|| {
            Point::new(self.image.width() as f64 / 2.0, self.image.height() as f64)
        })
    }

    fn draw(&self, canvas: &mut dyn Canvas, position: Point) {
        if let Some(shadow) = &self.shadow {
            let origin = position.subtract(&self.shadow_anchor.unwrap_or_else(|| self.anchor()));
            canvas.draw_image(shadow, origin.x.floor() as i64, origin.y.floor() as i64);
        }
        let origin = position.subtract(&self.anchor());
        canvas.draw_image(&self.image, origin.x.floor() as i64, origin.y.floor() as i64);
    }
}

#[derive(Debug, Clone)]
enum Appearance {
    Symbol(MarkerSymbol),
    Icon(MarkerIcon),
}

#[derive(Debug, Clone)]
pub struct MarkerLayer {
    properties: LayerProperties,
    positions: Vec<LatLon>,
    appearance: Appearance,
}

impl MarkerLayer {
    /// Markers drawn with the default symbol
    pub fn new(id: impl Into<String>, positions: Vec<LatLon>) -> Self {
        Self {
            properties: LayerProperties::new(id, LayerType::Marker),
            positions,
            appearance: Appearance::Symbol(MarkerSymbol::default()),
        }
    }

    crate::impl_layer_builders!(properties);

    pub fn with_symbol(mut self, symbol: MarkerSymbol) -> Self {
        self.appearance = Appearance::Symbol(symbol);
        self
    }

    pub fn with_icon(mut self, icon: MarkerIcon) -> Self {
        self.appearance = Appearance::Icon(icon);
        self
    }

    pub fn add_position(&mut self, position: LatLon) {
        self.positions.push(position);
    }

    pub fn positions(&self) -> &[LatLon] {
        &self.positions
    }
}

impl LayerTrait for MarkerLayer {
    crate::impl_layer_trait!(properties);

    fn render(&self, canvas: &mut dyn Canvas, grid: &TileGrid, viewport: &Viewport) -> Result<()> {
        match &self.appearance {
            Appearance::Icon(icon) => {
                for position in &self.positions {
                    icon.draw(canvas, viewport.to_canvas(grid, *position));
                }
            }
            Appearance::Symbol(symbol) => {
                let top_left = viewport.top_left_pixel(grid);
                for position in &self.positions {
                    let p = grid.latlon_to_map(*position, viewport.zoom);
                    let mut canvas = StateGuard::new(canvas);
                    canvas.concat_transform(&Matrix::translation(-top_left.x, -top_left.y));
                    canvas.concat_transform(
                        &(Matrix::translation(p.x, p.y) * Matrix::reflection(1.0, -1.0)),
                    );
                    symbol.draw(&mut *canvas);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crs::Crs;
    use crate::rendering::recording::{DrawCommand, RecordingCanvas};
    use image::Rgba;

    fn setup() -> (TileGrid, Viewport, RecordingCanvas) {
        (
            TileGrid::new(Crs::Epsg3857),
            Viewport::new(LatLon::new(0.0, 0.0), 2.0, 200, 200),
            RecordingCanvas::new(200, 200),
        )
    }

    #[test]
    fn test_symbol_outline() {
        let symbol = MarkerSymbol::default();
        let rings = symbol.rings();
        assert_eq!(rings.len(), 2);

        // 215..=-35 in 5° steps plus the tip
        let outline = &rings[0];
        assert_eq!(outline.len(), 51 + 1);
        assert_eq!(*outline.last().unwrap(), Point::new(0.0, 0.0));
        // the head reaches the full height at 90°
        let top = outline.iter().map(|p| p.y).fold(f64::MIN, f64::max);
        assert!((top - 41.0).abs() < 1e-9);
    }

    #[test]
    fn test_symbol_tip_lands_on_position() {
        let (grid, viewport, mut canvas) = setup();
        let layer = MarkerLayer::new("m", vec![LatLon::new(0.0, 0.0), LatLon::new(10.0, 10.0)]);
        layer.render(&mut canvas, &grid, &viewport).unwrap();
        assert_eq!(canvas.depth(), 0);

        let draws = canvas.draw_commands();
        assert_eq!(draws.len(), 4);
        match draws[0] {
            DrawCommand::Polygon { rings, .. } => {
                assert!(rings[0].last().unwrap().distance_to(&Point::new(100.0, 100.0)) < 1e-9);
                // symbol space y-up becomes canvas y-down: the head is above the tip
                assert!(rings[0].iter().all(|p| p.y <= 100.0 + 1e-9));
            }
            other => panic!("unexpected command {other:?}"),
        }
        match draws[1] {
            DrawCommand::Circle { center, state, .. } => {
                assert!((center.y - (100.0 - 28.5)).abs() < 1e-9);
                assert_eq!(state.fill_color, Color::WHITE);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_style_does_not_leak_between_markers() {
        let (grid, viewport, mut canvas) = setup();
        let layer = MarkerLayer::new("m", vec![LatLon::new(0.0, 0.0), LatLon::new(1.0, 1.0)]);
        layer.render(&mut canvas, &grid, &viewport).unwrap();

        let fills: Vec<Color> = canvas
            .draw_commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Polygon { state, .. } => Some(state.fill_color),
                _ => None,
            })
            .collect();
        assert_eq!(fills, vec![Color::rgb(0x33, 0x88, 0xff); 2]);
        assert_eq!(canvas.state(), Default::default());
    }

    #[test]
    fn test_icon_and_shadow_are_anchored() {
        let (grid, viewport, mut canvas) = setup();
        let icon = MarkerIcon::new(RgbaImage::from_pixel(20, 30, Rgba([255, 0, 0, 255])))
            .with_shadow(RgbaImage::new(40, 30));
        let layer = MarkerLayer::new("i", vec![LatLon::new(0.0, 0.0)]).with_icon(icon);
        layer.render(&mut canvas, &grid, &viewport).unwrap();

        let images: Vec<(i64, i64, u32)> = canvas
            .draw_commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Image { x, y, width, .. } => Some((*x, *y, *width)),
                _ => None,
            })
            .collect();
        assert_eq!(images, vec![(90, 70, 40), (90, 70, 20)]);
    }

    #[test]
    fn test_icon_resize_scales_anchor() {
        let icon = MarkerIcon::new(RgbaImage::new(10, 10))
            .with_anchor(Point::new(5.0, 2.0))
            .with_size(20, 40);
        assert_eq!(icon.image().dimensions(), (20, 40));
        assert_eq!(icon.anchor(), Point::new(10.0, 8.0));
    }
}
