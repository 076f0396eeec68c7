//! Fixed polygons and polylines given directly as coordinates.

use crate::{
    core::{geo::LatLon, grid::TileGrid, matrix::Matrix, viewport::Viewport},
    layers::base::{LayerProperties, LayerTrait, LayerType},
    rendering::{
        canvas::{Canvas, StateGuard},
        style::Style,
    },
    Result,
};

/// Starts a scoped drawing state whose origin is the viewport's top-left
/// map pixel.
fn viewport_origin<'a>(
    canvas: &'a mut dyn Canvas,
    grid: &TileGrid,
    viewport: &Viewport,
    style: &Style,
) -> StateGuard<'a> {
    let top_left = viewport.top_left_pixel(grid);
    let mut guard = StateGuard::new(canvas);
    guard.concat_transform(&Matrix::translation(-top_left.x, -top_left.y));
    guard.apply_style(style);
    guard
}

/// Polygons with optional holes, filled with the even-odd rule
#[derive(Debug, Clone)]
pub struct PolygonLayer {
    properties: LayerProperties,
    /// Each polygon is a ring list: outer contour first, then holes
    polygons: Vec<Vec<Vec<LatLon>>>,
    style: Style,
}

impl PolygonLayer {
    /// A layer holding one polygon
    pub fn new(id: impl Into<String>, rings: Vec<Vec<LatLon>>) -> Self {
        Self {
            properties: LayerProperties::new(id, LayerType::Polygon),
            polygons: vec![rings],
            style: Style::default(),
        }
    }

    crate::impl_layer_builders!(properties);

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn add_polygon(&mut self, rings: Vec<Vec<LatLon>>) {
        self.polygons.push(rings);
    }

    pub fn polygons(&self) -> &[Vec<Vec<LatLon>>] {
        &self.polygons
    }
}

impl LayerTrait for PolygonLayer {
    crate::impl_layer_trait!(properties);

    fn render(&self, canvas: &mut dyn Canvas, grid: &TileGrid, viewport: &Viewport) -> Result<()> {
        let mut canvas = viewport_origin(canvas, grid, viewport, &self.style);
        for polygon in &self.polygons {
            let rings: Vec<_> = polygon
                .iter()
                .map(|ring| {
                    ring.iter()
                        .map(|p| grid.latlon_to_map(*p, viewport.zoom))
                        .collect()
                })
                .collect();
            canvas.draw_polygon(&rings);
        }
        Ok(())
    }
}

/// Open lines
#[derive(Debug, Clone)]
pub struct PolylineLayer {
    properties: LayerProperties,
    lines: Vec<Vec<LatLon>>,
    style: Style,
}

impl PolylineLayer {
    pub fn new(id: impl Into<String>, lines: Vec<Vec<LatLon>>) -> Self {
        Self {
            properties: LayerProperties::new(id, LayerType::Polyline),
            lines,
            style: Style::default(),
        }
    }

    crate::impl_layer_builders!(properties);

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn add_line(&mut self, line: Vec<LatLon>) {
        self.lines.push(line);
    }
}

impl LayerTrait for PolylineLayer {
    crate::impl_layer_trait!(properties);

    fn render(&self, canvas: &mut dyn Canvas, grid: &TileGrid, viewport: &Viewport) -> Result<()> {
        let mut canvas = viewport_origin(canvas, grid, viewport, &self.style);
        for line in &self.lines {
            let points: Vec<_> = line
                .iter()
                .map(|p| grid.latlon_to_map(*p, viewport.zoom))
                .collect();
            canvas.draw_polyline(&points);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{crs::Crs, geo::Point};
    use crate::rendering::{
        recording::{DrawCommand, RecordingCanvas},
        style::Color,
    };

    fn setup() -> (TileGrid, Viewport, RecordingCanvas) {
        (
            TileGrid::new(Crs::Epsg3857),
            Viewport::new(LatLon::new(0.0, 0.0), 1.0, 200, 100),
            RecordingCanvas::new(200, 100),
        )
    }

    #[test]
    fn test_polygon_points_are_relative_to_viewport() {
        let (grid, viewport, mut canvas) = setup();
        let layer = PolygonLayer::new(
            "square",
            vec![vec![
                LatLon::new(0.0, 0.0),
                LatLon::new(0.0, 90.0),
                LatLon::new(-45.0, 90.0),
            ]],
        )
        .with_style(Style::new().fill_color(Color::BLACK));
        layer.render(&mut canvas, &grid, &viewport).unwrap();

        match canvas.draw_commands()[0] {
            DrawCommand::Polygon { rings, state } => {
                assert_eq!(rings.len(), 1);
                assert!(rings[0][0].distance_to(&Point::new(100.0, 50.0)) < 1e-9);
                assert!((rings[0][1].x - 228.0).abs() < 1e-9);
                assert_eq!(state.fill_color, Color::BLACK);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(canvas.depth(), 0);
    }

    #[test]
    fn test_polyline_draws_each_line() {
        let (grid, viewport, mut canvas) = setup();
        let mut layer = PolylineLayer::new("lines", vec![vec![LatLon::new(0.0, 0.0), LatLon::new(10.0, 10.0)]]);
        layer.add_line(vec![LatLon::new(5.0, 5.0), LatLon::new(6.0, 6.0)]);
        layer.render(&mut canvas, &grid, &viewport).unwrap();

        let draws = canvas.draw_commands();
        assert_eq!(draws.len(), 2);
        assert!(draws.iter().all(|c| matches!(c, DrawCommand::Polyline { .. })));
    }
}
