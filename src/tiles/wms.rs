//! WMS `GetMap` URL synthesis.
//!
//! Parameters are resolved in three layers, later ones winning: built-in
//! defaults, parameters already present in the service URL, and the
//! caller's [`WmsOptions`]. `bbox` is always computed from the tile.

use crate::{
    core::{crs::Projection, geo::TileCoord, grid::TileGrid},
    prelude::HashMap,
    MapError, Result,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters emitted first, in this order
const ORDERED_PARAMS: [&str; 10] = [
    "service",
    "request",
    "version",
    "layers",
    "styles",
    "format",
    "transparent",
    "width",
    "height",
    "srs",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WmsOptions {
    /// Service endpoint, may already carry query parameters
    pub url: String,
    pub layers: Option<String>,
    pub styles: Option<String>,
    /// MIME type such as `image/png`
    pub format: Option<String>,
    pub transparent: Option<bool>,
    pub version: Option<String>,
    /// Any other parameter, sent as given
    pub extra: BTreeMap<String, String>,
}

impl WmsOptions {
    pub fn new(url: impl Into<String>, layers: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            layers: Some(layers.into()),
            ..Self::default()
        }
    }

    fn caller_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = [
            ("layers", self.layers.clone()),
            ("styles", self.styles.clone()),
            ("format", self.format.clone()),
            ("transparent", self.transparent.map(|t| t.to_string())),
            ("version", self.version.clone()),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
        .collect();
        params.extend(
            self.extra
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone())),
        );
        params
    }

    /// Cache file extension derived from the resolved `format`
    pub fn file_extension(&self) -> String {
        let base = Url::parse(&self.url).ok();
        let embedded = base.as_ref().and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k.eq_ignore_ascii_case("format"))
                .map(|(_, v)| v.into_owned())
        });
        let format = self
            .format
            .clone()
            .or(embedded)
            .unwrap_or_else(|| "image/jpeg".to_string());
        let subtype = format.rsplit('/').next().unwrap_or(&format).to_ascii_lowercase();
        match subtype.as_str() {
            "jpeg" => "jpg".to_string(),
            other => other.split(';').next().unwrap_or(other).to_string(),
        }
    }
}

/// Builds the `GetMap` URL for `tile`
pub fn build_get_map_url(options: &WmsOptions, tile: TileCoord, grid: &TileGrid) -> Result<String> {
    let mut url =
        Url::parse(&options.url).map_err(|e| MapError::InvalidUrl(format!("{}: {e}", options.url)))?;

    let tile_size = grid.tile_size().to_string();
    let mut resolved: HashMap<String, String> = [
        ("service", "WMS"),
        ("request", "GetMap"),
        ("version", "1.1.1"),
        ("styles", ""),
        ("format", "image/jpeg"),
        ("transparent", "false"),
        ("width", tile_size.as_str()),
        ("height", tile_size.as_str()),
        ("srs", grid.crs().name()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let mut extra_keys: Vec<String> = Vec::new();
    let embedded: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.into_owned()))
        .collect();
    for (key, value) in embedded.into_iter().chain(options.caller_params()) {
        if key == "bbox" {
            continue;
        }
        if !ORDERED_PARAMS.contains(&key.as_str()) && !extra_keys.contains(&key) {
            extra_keys.push(key.clone());
        }
        resolved.insert(key, value);
    }

    match resolved.get("layers") {
        Some(layers) if !layers.trim().is_empty() => {}
        _ => return Err(MapError::MissingWmsLayers),
    }

    // Lower-left / upper-right, while tile corners are top-left / bottom-right
    let (top_left, bottom_right) = grid.tile_crs_bounds(tile);
    let bbox = format!(
        "{},{},{},{}",
        top_left.x, bottom_right.y, bottom_right.x, top_left.y
    );

    url.set_query(None);
    {
        let mut query = url.query_pairs_mut();
        for key in ORDERED_PARAMS.iter().copied().chain(extra_keys.iter().map(String::as_str)) {
            if let Some(value) = resolved.get(key) {
                query.append_pair(&key.to_ascii_uppercase(), value);
            }
        }
        query.append_pair("BBOX", &bbox);
    }
    Ok(url.into())
}
