//! End-to-end renders through `MapRenderer` onto real pixels.

use image::{ImageOutputFormat, Rgba, RgbaImage};
use mapforge::prelude::*;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const RED: Color = Color::rgb(255, 0, 0);

fn box_ring(west: f64, east: f64, south: f64, north: f64) -> Vec<LatLon> {
    vec![
        LatLon::new(south, west),
        LatLon::new(south, east),
        LatLon::new(north, east),
        LatLon::new(north, west),
        LatLon::new(south, west),
    ]
}

fn solid_fill(color: Color) -> Style {
    Style::new()
        .fill_color(color)
        .stroke_color(Color::TRANSPARENT)
        .stroke_width(0.0)
}

fn render_polygon_at_dateline(west: f64, east: f64) -> RenderedMap {
    let mut renderer = MapRenderer::new(TileGrid::new(Crs::Epsg3857));
    let doc = GeoJson::new(vec![GeoJsonFeature::new(Geometry::Polygon(vec![box_ring(
        west, east, -10.0, 10.0,
    )
    .into_iter()
    .map(|p| [p.lon, p.lat])
    .collect()]))]);
    renderer
        .add_layer(VectorLayer::new("box", doc).with_style(solid_fill(RED)))
        .unwrap();
    renderer
        .render_map_with_background(LatLon::new(0.0, 180.0), 3.0, 256, 256, Color::WHITE)
        .unwrap()
}

#[test]
fn dateline_polygon_is_one_shape_whichever_side_it_is_written_on() {
    let east = render_polygon_at_dateline(160.0, 200.0);
    let west = render_polygon_at_dateline(-200.0, -160.0);

    for x in [20, 128, 236] {
        assert_eq!(east.image.pixel(x, 128), Some(RED), "x = {x}");
        assert_eq!(west.image.pixel(x, 128), Some(RED), "x = {x}");
    }
    // 160°..200° is 14.2..241.8 px across the viewport
    assert_eq!(east.image.pixel(5, 128), Some(Color::WHITE));
    assert_eq!(east.image.pixel(250, 128), Some(Color::WHITE));

    let (a, b) = (east.image.to_rgba_image(), west.image.to_rgba_image());
    let max_diff = a
        .pixels()
        .zip(b.pixels())
        .flat_map(|(p, q)| p.0.iter().zip(q.0.iter()).map(|(x, y)| x.abs_diff(*y)))
        .max()
        .unwrap_or(0);
    assert!(max_diff <= 2, "renders differ by {max_diff}");
}

#[test]
fn fiji_straddling_the_seam_reaches_both_halves() {
    let fiji = r#"{"type": "Polygon", "coordinates": [[
        [176.6, -15.5], [181.9, -15.5], [181.9, -19.7], [176.6, -19.7], [176.6, -15.5]
    ]]}"#;
    let layer = VectorLayer::from_geojson_str("fiji", fiji).unwrap().with_style(solid_fill(RED));
    let bounds = layer.data().bounds(false).unwrap();

    let mut renderer = MapRenderer::default().with_background(Color::WHITE);
    renderer.add_layer(layer).unwrap();
    let (center, zoom) =
        renderer.fit_bounds(bounds.south_west, bounds.north_east, 200, 200, 18.0);
    assert!(center.lon > 176.6 && center.lon < 181.9);

    // look at the seam itself, with a west-of-seam center
    let rendered = renderer.render_map(LatLon::new(center.lat, -179.9), zoom - 0.5, 200, 200).unwrap();
    let row = (0..200).map(|x| rendered.image.pixel(x, 100)).collect::<Vec<_>>();
    let red = row.iter().filter(|c| **c == Some(RED)).count();
    assert!(red > 0);
    assert_eq!(rendered.image.pixel(100, 100), Some(RED));
}

fn png_tile(color: [u8; 4]) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    RgbaImage::from_pixel(256, 256, Rgba(color))
        .write_to(&mut bytes, ImageOutputFormat::Png)
        .unwrap();
    bytes.into_inner()
}

/// Serves a PNG whose colour depends on the requested path
struct CountingTransport {
    calls: Arc<AtomicUsize>,
}

impl Transport for CountingTransport {
    fn get(&self, url: &str) -> Result<TransportResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let shade = (url.len() * 37 % 256) as u8;
        Ok(TransportResponse {
            status: 200,
            body: png_tile([shade, 255 - shade, 80, 255]),
        })
    }
}

fn cached_renderer(calls: Arc<AtomicUsize>) -> MapRenderer {
    let service = TileService::template("test", "https://tiles.invalid/{z}/{x}/{y}.png")
        .with_cache(Box::new(MemoryTileCache::new(64)))
        .with_transport(Box::new(CountingTransport { calls }));
    let mut renderer = MapRenderer::default();
    renderer.add_layer(TileLayer::new("base", service)).unwrap();
    renderer
        .add_layer(
            PolylineLayer::new(
                "route",
                vec![vec![LatLon::new(51.5, -0.12), LatLon::new(48.85, 2.35)]],
            )
            .with_style(Style::new().stroke_color(RED).stroke_width(3.0)),
        )
        .unwrap();
    renderer
        .add_layer(MarkerLayer::new("pins", vec![LatLon::new(51.5, -0.12)]))
        .unwrap();
    renderer
}

#[test]
fn rendering_twice_from_a_warm_cache_is_pixel_identical() {
    let calls = Arc::new(AtomicUsize::new(0));
    let renderer = cached_renderer(calls.clone());
    let center = LatLon::new(50.0, 1.0);

    let first = renderer.render_map(center, 5.3, 300, 200).unwrap();
    let fetched = calls.load(Ordering::SeqCst);
    assert!(fetched > 0);

    let second = renderer.render_map(center, 5.3, 300, 200).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), fetched, "second render hit the network");
    assert_eq!(first.image.to_png_bytes().unwrap(), second.image.to_png_bytes().unwrap());
    assert_eq!(first.top_left, second.top_left);
}

#[test]
fn tiles_cover_the_whole_viewport_across_the_seam() {
    let calls = Arc::new(AtomicUsize::new(0));
    let renderer = cached_renderer(calls);
    let rendered = renderer
        .render_map_with_background(LatLon::new(0.0, 180.0), 2.0, 256, 256, Color::TRANSPARENT)
        .unwrap();
    for x in [0, 127, 128, 255] {
        let pixel = rendered.image.pixel(x, 128).unwrap();
        assert_eq!(pixel.a, 255, "hole at x = {x}");
    }
}

#[test]
fn out_of_range_zoom_fails_before_drawing() {
    let config = RenderConfig::from_json_str(r#"{"max_zoom": 18}"#).unwrap();
    let renderer = MapRenderer::from_config(&config).unwrap();
    assert!(matches!(
        renderer.render_map(LatLon::new(0.0, 0.0), 19.0, 64, 64),
        Err(MapError::InvalidZoom(z)) if z == 19.0
    ));
    assert!(renderer.render_map(LatLon::new(0.0, 0.0), -1.0, 64, 64).is_err());
}

#[test]
fn wms_source_without_layers_fails_the_render() {
    let calls = Arc::new(AtomicUsize::new(0));
    let service = TileService::wms(
        "wms",
        WmsOptions {
            url: "https://maps.example.invalid/wms".to_string(),
            ..WmsOptions::default()
        },
    )
    .with_transport(Box::new(CountingTransport { calls: calls.clone() }));
    let mut renderer = MapRenderer::default();
    renderer.add_layer(TileLayer::new("base", service)).unwrap();

    assert!(matches!(
        renderer.render_map(LatLon::new(0.0, 0.0), 2.0, 64, 64),
        Err(MapError::MissingWmsLayers)
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // layers embedded in the service URL are enough
    let service = TileService::wms(
        "wms",
        WmsOptions {
            url: "https://maps.example.invalid/wms?layers=coast".to_string(),
            ..WmsOptions::default()
        },
    )
    .with_transport(Box::new(CountingTransport { calls: calls.clone() }));
    let mut renderer = MapRenderer::default();
    renderer.add_layer(TileLayer::new("base", service)).unwrap();
    assert!(renderer.render_map(LatLon::new(0.0, 0.0), 2.0, 64, 64).is_ok());
    assert!(calls.load(Ordering::SeqCst) > 0);
}

#[test]
fn fit_bounds_frames_the_box() {
    let grid = TileGrid::new(Crs::Epsg3857);
    let renderer = MapRenderer::new(grid);
    let (sw, ne) = (LatLon::new(-19.7, 176.6), LatLon::new(-15.5, 181.9));
    let (center, zoom) = renderer.fit_bounds(sw, ne, 400, 300, 18.0);

    let rendered = renderer.render_map(center, zoom, 400, 300).unwrap();
    // the box fits on both axes and touches the tighter one
    assert!(rendered.top_left.lon <= sw.lon + 1e-9);
    assert!(rendered.bottom_right.lon >= ne.lon - 1e-9);
    assert!(rendered.top_left.lat >= ne.lat - 1e-9);
    assert!(rendered.bottom_right.lat <= sw.lat + 1e-9);
    let tight_x = (rendered.top_left.lon - sw.lon).abs() < 1e-6;
    let tight_y = (rendered.top_left.lat - ne.lat).abs() < 1e-6;
    assert!(tight_x || tight_y);
}
