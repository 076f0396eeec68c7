use crate::{
    core::{geo::TileCoord, grid::TileGrid},
    tiles::{
        cache::{MemoryTileCache, TileCache, TileKey},
        loader::{sniff_image_format, HttpTransport, Transport},
        wms::{build_get_map_url, WmsOptions},
    },
    Result,
};

/// Anything that can resolve a tile address to image bytes.
pub trait TileSource {
    /// Name used for cache keys and logging
    fn name(&self) -> &str;

    /// URL of `tile`, whose `x` is already wrapped into range. An error
    /// here means the source is misconfigured and aborts the render.
    fn make_url(&self, tile: TileCoord, grid: &TileGrid) -> Result<String>;

    /// Encoded image bytes, or `None` when the tile cannot be had.
    /// Fetch failures are never errors: the caller paints the cell blank.
    fn fetch_tile(&self, tile: TileCoord, grid: &TileGrid) -> Option<Vec<u8>>;
}

/// How a [`TileService`] turns a tile into a URL
#[derive(Debug, Clone, PartialEq)]
pub enum UrlStrategy {
    /// `{x}`, `{y}` and `{z}` placeholders
    Template(String),
    Wms(WmsOptions),
}

/// A cache-first tile source over a [`Transport`]
pub struct TileService {
    name: String,
    strategy: UrlStrategy,
    cache: Box<dyn TileCache>,
    transport: Box<dyn Transport>,
}

impl TileService {
    pub fn new(
        name: impl Into<String>,
        strategy: UrlStrategy,
        cache: Box<dyn TileCache>,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            name: name.into(),
            strategy,
            cache,
            transport,
        }
    }

    /// URL template source with an in-memory cache over HTTP
    pub fn template(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(
            name,
            UrlStrategy::Template(url.into()),
            Box::new(MemoryTileCache::default()),
            Box::new(HttpTransport::new()),
        )
    }

    /// WMS source with an in-memory cache over HTTP
    pub fn wms(name: impl Into<String>, options: WmsOptions) -> Self {
        Self::new(
            name,
            UrlStrategy::Wms(options),
            Box::new(MemoryTileCache::default()),
            Box::new(HttpTransport::new()),
        )
    }

    /// OpenStreetMap standard tiles
    pub fn openstreetmap() -> Self {
        Self::template("osm", "https://tile.openstreetmap.org/{z}/{x}/{y}.png")
    }

    pub fn with_cache(mut self, cache: Box<dyn TileCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn strategy(&self) -> &UrlStrategy {
        &self.strategy
    }

    /// Cache file extension: the URL path's extension for templates, the
    /// `format` subtype for WMS
    fn file_extension(&self, url: &str) -> String {
        match &self.strategy {
            UrlStrategy::Template(_) => url_path_extension(url),
            UrlStrategy::Wms(options) => options.file_extension(),
        }
    }
}

impl std::fmt::Debug for TileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileService")
            .field("name", &self.name)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

impl TileSource for TileService {
    fn name(&self) -> &str {
        &self.name
    }

    fn make_url(&self, tile: TileCoord, grid: &TileGrid) -> Result<String> {
        match &self.strategy {
            UrlStrategy::Template(template) => Ok(template
                .replace("{x}", &tile.x.to_string())
                .replace("{y}", &tile.y.to_string())
                .replace("{z}", &tile.z.to_string())),
            UrlStrategy::Wms(options) => build_get_map_url(options, tile, grid),
        }
    }

    fn fetch_tile(&self, tile: TileCoord, grid: &TileGrid) -> Option<Vec<u8>> {
        let url = match self.make_url(tile, grid) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("{}: cannot build URL for tile {}: {}", self.name, tile, e);
                return None;
            }
        };
        let key = TileKey::new(self.name.clone(), tile, self.file_extension(&url));

        if let Some(data) = self.cache.load(&key) {
            log::debug!("{}: tile {} from cache", self.name, tile);
            return Some(data);
        }

        log::debug!("{}: fetch tile {} from {}", self.name, tile, url);
        let response = match self.transport.get(&url) {
            Ok(response) => response,
            Err(e) => {
                log::warn!("{}: tile {} download failed: {}", self.name, tile, e);
                return None;
            }
        };
        if !response.is_success() {
            log::warn!("{}: tile {} returned HTTP {}", self.name, tile, response.status);
            return None;
        }
        if sniff_image_format(&response.body).is_none() {
            log::warn!(
                "{}: tile {} is not a recognised image ({} bytes)",
                self.name,
                tile,
                response.body.len()
            );
            return None;
        }

        log::info!("{}: downloaded tile {} ({} bytes)", self.name, tile, response.body.len());
        if let Err(e) = self.cache.save(&key, &response.body) {
            log::warn!("{}: could not cache tile {}: {}", self.name, tile, e);
        }
        Some(response.body)
    }
}

/// Lower-cased extension of the URL's path, ignoring query and fragment
fn url_path_extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => String::new(),
    }
}
