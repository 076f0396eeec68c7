//! GeoJSON overlay with antimeridian wraparound.
//!
//! The whole geometry tree is drawn several times, shifted by whole map
//! widths, so a feature whose longitudes run past ±180° (or sit one world
//! away from the viewport) still lands in the image as one shape.

use crate::{
    core::{
        constants::DEFAULT_POINT_RADIUS,
        geo::Point,
        grid::TileGrid,
        matrix::Matrix,
        viewport::Viewport,
    },
    data::geojson::{position_to_latlon, GeoJson, Geometry, Position},
    layers::base::{LayerProperties, LayerTrait, LayerType},
    rendering::{
        canvas::{Canvas, StateGuard},
        style::Style,
    },
    Result,
};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorLayerOptions {
    /// Read positions as `[lat, lon]` instead of GeoJSON's `[lon, lat]`
    #[serde(rename = "swapxy")]
    pub swap_xy: bool,
    /// Radius of Point geometries; falls back to the style's
    /// `pointradius`, then 1
    #[serde(rename = "pointradius")]
    pub point_radius: Option<f64>,
    #[serde(flatten)]
    pub style: Style,
}

#[derive(Debug, Clone)]
pub struct VectorLayer {
    properties: LayerProperties,
    data: GeoJson,
    options: VectorLayerOptions,
}

impl VectorLayer {
    pub fn new(id: impl Into<String>, data: GeoJson) -> Self {
        Self {
            properties: LayerProperties::new(id, LayerType::Vector),
            data,
            options: VectorLayerOptions::default(),
        }
    }

    /// Parses GeoJSON text; only invalid JSON is an error
    pub fn from_geojson_str(id: impl Into<String>, geojson: &str) -> Result<Self> {
        Ok(Self::new(id, GeoJson::parse(geojson)?))
    }

    crate::impl_layer_builders!(properties);

    pub fn with_options(mut self, options: VectorLayerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.options.style = style;
        self
    }

    pub fn data(&self) -> &GeoJson {
        &self.data
    }

    pub fn options(&self) -> &VectorLayerOptions {
        &self.options
    }

    fn point_radius(&self) -> f64 {
        self.options
            .point_radius
            .or(self.options.style.point_radius)
            .unwrap_or(DEFAULT_POINT_RADIUS)
    }

    fn draw_geometry(&self, canvas: &mut dyn Canvas, grid: &TileGrid, zoom: f64, geometry: &Geometry) {
        let project = |p: &Position| grid.latlon_to_map(position_to_latlon(*p, self.options.swap_xy), zoom);
        let project_all = |ps: &[Position]| ps.iter().map(project).collect::<Vec<Point>>();

        match geometry {
            Geometry::Point(p) => canvas.draw_circle(project(p), self.point_radius()),
            Geometry::MultiPoint(ps) => {
                for p in ps {
                    canvas.draw_circle(project(p), self.point_radius());
                }
            }
            Geometry::LineString(ps) => canvas.draw_polyline(&project_all(ps)),
            Geometry::MultiLineString(lines) => {
                for line in lines {
                    canvas.draw_polyline(&project_all(line));
                }
            }
            Geometry::Polygon(rings) => {
                let rings: Vec<_> = rings.iter().map(|r| project_all(r)).collect();
                canvas.draw_polygon(&rings);
            }
            Geometry::MultiPolygon(polygons) => {
                for polygon in polygons {
                    let rings: Vec<_> = polygon.iter().map(|r| project_all(r)).collect();
                    canvas.draw_polygon(&rings);
                }
            }
            Geometry::GeometryCollection(children) => {
                for child in children {
                    self.draw_geometry(canvas, grid, zoom, child);
                }
            }
            Geometry::Unknown(_) => {}
        }
    }
}

/// World copies to draw for a viewport: `-max_wrap..=max_wrap`, where
/// `max_wrap` is the larger of the wrap indices of the viewport's left and
/// right edges, and never less than 1.
pub fn wrap_copies(grid: &TileGrid, viewport: &Viewport) -> RangeInclusive<i64> {
    let map_size = grid.map_size(viewport.zoom);
    let wrap_start = (viewport.top_left_pixel(grid).x / map_size).floor() as i64;
    let wrap_end = (viewport.bottom_right_pixel(grid).x / map_size).floor() as i64;
    let max_wrap = wrap_start.abs().max(wrap_end).max(1);
    -max_wrap..=max_wrap
}

impl LayerTrait for VectorLayer {
    crate::impl_layer_trait!(properties);

    fn render(&self, canvas: &mut dyn Canvas, grid: &TileGrid, viewport: &Viewport) -> Result<()> {
        if self.data.is_empty() {
            return Ok(());
        }
        let top_left = viewport.top_left_pixel(grid);
        let map_size = grid.map_size(viewport.zoom);

        for copy in wrap_copies(grid, viewport) {
            let mut canvas = StateGuard::new(canvas);
            canvas.concat_transform(&Matrix::translation(
                -(top_left.x + copy as f64 * map_size),
                -top_left.y,
            ));
            canvas.apply_style(&self.options.style);
            for geometry in self.data.features().iter().filter_map(|f| f.geometry.as_ref()) {
                self.draw_geometry(&mut *canvas, grid, viewport.zoom, geometry);
            }
        }
        Ok(())
    }
}
