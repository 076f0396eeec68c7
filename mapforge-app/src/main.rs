use anyhow::{bail, Context, Result};
use mapforge::{data::tissot::tissot_indicatrix, prelude::*};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A render job as read from JSON
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Job {
    #[serde(default)]
    config: RenderConfig,
    width: u32,
    height: u32,
    /// Explicit view; ignored when `fit` is given
    center: Option<LatLon>,
    zoom: Option<f64>,
    fit: Option<FitJob>,
    tiles: Option<TilesJob>,
    #[serde(default)]
    geojson: Vec<GeoJsonJob>,
    tissot: Option<TissotJob>,
    #[serde(default)]
    polygons: Vec<ShapeJob>,
    #[serde(default)]
    polylines: Vec<ShapeJob>,
    markers: Option<MarkersJob>,
    #[serde(default)]
    texts: Vec<TextJob>,
}

#[derive(Debug, Deserialize)]
struct FitJob {
    corners: [LatLon; 2],
    max_zoom: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TilesJob {
    Template { name: String, url: String },
    Wms { name: String, options: WmsOptions },
}

#[derive(Debug, Deserialize)]
struct GeoJsonJob {
    path: PathBuf,
    #[serde(default)]
    options: VectorLayerOptions,
}

#[derive(Debug, Deserialize)]
struct TissotJob {
    lats: Vec<f64>,
    lons: Vec<f64>,
    radius_m: f64,
    #[serde(default = "default_segments")]
    segments: usize,
    #[serde(default)]
    options: VectorLayerOptions,
}

fn default_segments() -> usize {
    72
}

#[derive(Debug, Deserialize)]
struct ShapeJob {
    rings: Vec<Vec<LatLon>>,
    #[serde(default)]
    style: Style,
}

#[derive(Debug, Deserialize)]
struct MarkersJob {
    positions: Vec<LatLon>,
    /// Bitmap icon; the drawn symbol is used when absent
    icon: Option<PathBuf>,
    shadow: Option<PathBuf>,
    #[serde(default)]
    symbol: MarkerSymbol,
}

#[derive(Debug, Deserialize)]
struct TextJob {
    position: LatLon,
    text: String,
    #[serde(default)]
    style: TextStyle,
}

fn tile_layer(tiles: &TilesJob, config: &TileLoadingConfig) -> Result<TileLayer> {
    let service = match tiles {
        TilesJob::Template { name, url } => TileService::template(name.clone(), url.clone()),
        TilesJob::Wms { name, options } => TileService::wms(name.clone(), options.clone()),
    };
    let service = service
        .with_cache(config.build_cache())
        .with_transport(config.build_transport()?);
    Ok(TileLayer::new("tiles", service))
}

fn load_icon(path: &Path) -> Result<MarkerIcon> {
    MarkerIcon::from_path(path).with_context(|| format!("loading {}", path.display()))
}

fn build_renderer(job: &Job) -> Result<MapRenderer> {
    let mut renderer = MapRenderer::from_config(&job.config)?;

    if let Some(tiles) = &job.tiles {
        renderer.add_layer(tile_layer(tiles, &job.config.tile_loading)?)?;
    }
    for (i, layer) in job.geojson.iter().enumerate() {
        let text = std::fs::read_to_string(&layer.path)
            .with_context(|| format!("reading {}", layer.path.display()))?;
        renderer.add_layer(
            VectorLayer::from_geojson_str(format!("geojson-{i}"), &text)?.with_options(layer.options.clone()),
        )?;
    }
    if let Some(tissot) = &job.tissot {
        let doc = tissot_indicatrix(
            renderer.grid().crs(),
            &tissot.lats,
            &tissot.lons,
            tissot.radius_m,
            tissot.segments,
        )?;
        renderer.add_layer(VectorLayer::new("tissot", doc).with_options(tissot.options.clone()))?;
    }
    for (i, polygon) in job.polygons.iter().enumerate() {
        renderer.add_layer(
            PolygonLayer::new(format!("polygon-{i}"), polygon.rings.clone())
                .with_style(polygon.style.clone()),
        )?;
    }
    for (i, polyline) in job.polylines.iter().enumerate() {
        renderer.add_layer(
            PolylineLayer::new(format!("polyline-{i}"), polyline.rings.clone())
                .with_style(polyline.style.clone()),
        )?;
    }
    if let Some(markers) = &job.markers {
        let layer = MarkerLayer::new("markers", markers.positions.clone());
        let layer = match &markers.icon {
            Some(icon) => {
                let mut icon = load_icon(icon)?;
                if let Some(shadow) = &markers.shadow {
                    icon = icon.with_shadow(load_icon(shadow)?.image().clone());
                }
                layer.with_icon(icon)
            }
            None => layer.with_symbol(markers.symbol.clone()),
        };
        renderer.add_layer(layer)?;
    }
    for (i, text) in job.texts.iter().enumerate() {
        renderer.add_layer(
            TextLayer::new(format!("text-{i}"), text.position, text.text.clone())
                .with_style(text.style.clone()),
        )?;
    }
    Ok(renderer)
}

fn view(job: &Job, renderer: &MapRenderer) -> Result<(LatLon, f64)> {
    if let Some(fit) = &job.fit {
        let [p1, p2] = fit.corners;
        let max_zoom = fit.max_zoom.unwrap_or(renderer.max_zoom());
        return Ok(renderer.fit_bounds(p1, p2, job.width, job.height, max_zoom));
    }
    match (job.center, job.zoom) {
        (Some(center), Some(zoom)) => Ok((center, zoom)),
        _ => bail!("job needs either `fit` or both `center` and `zoom`"),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        bail!("usage: {} <job.json> <output image>", args[0]);
    }
    let job: Job = serde_json::from_str(
        &std::fs::read_to_string(&args[1]).with_context(|| format!("reading {}", args[1]))?,
    )
    .with_context(|| format!("parsing {}", args[1]))?;

    let renderer = build_renderer(&job)?;
    let (center, zoom) = view(&job, &renderer)?;
    log::info!("rendering {} at z{:.2}", center, zoom);

    let rendered = renderer.render_map(center, zoom, job.width, job.height)?;
    rendered.image.save(&args[2])?;
    println!("{}: {} .. {}", args[2], rendered.top_left, rendered.bottom_right);
    Ok(())
}
