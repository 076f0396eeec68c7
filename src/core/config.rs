//! Renderer configuration
//!
//! Everything a caller can tune lives in plain serde structs so a render
//! job can be described in JSON. Every field has a default, so an empty
//! object is a valid configuration.

use crate::{
    core::{
        constants::{DEFAULT_BACKGROUND, DEFAULT_USER_AGENT, MAX_ZOOM, TILE_SIZE},
        crs::Crs,
        grid::TileGrid,
    },
    rendering::style::Color,
    tiles::{
        cache::{FileTileCache, MemoryTileCache, NoCache, TileCache},
        loader::{HttpTransport, Transport},
    },
    MapError, Result,
};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// How tiles are fetched and kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLoadingConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Tiles held in memory; 0 disables caching unless `cache_dir` is set
    pub memory_cache_capacity: usize,
    /// When set, tiles are stored on disk under this directory instead of
    /// in memory
    pub cache_dir: Option<PathBuf>,
}

impl Default for TileLoadingConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            memory_cache_capacity: 1024,
            cache_dir: None,
        }
    }
}

impl TileLoadingConfig {
    /// A small in-memory cache and no disk footprint
    pub fn offline() -> Self {
        Self {
            memory_cache_capacity: 64,
            cache_dir: None,
            ..Self::default()
        }
    }

    pub fn build_cache(&self) -> Box<dyn TileCache> {
        match (&self.cache_dir, self.memory_cache_capacity) {
            (Some(dir), _) => Box::new(FileTileCache::new(dir.clone())),
            (None, 0) => Box::new(NoCache),
            (None, capacity) => Box::new(MemoryTileCache::new(capacity)),
        }
    }

    pub fn build_transport(&self) -> Result<Box<dyn Transport>> {
        Ok(Box::new(HttpTransport::with_user_agent(
            &self.user_agent,
            Duration::from_secs(self.timeout_secs),
        )?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub tile_size: u32,
    /// CRS name, e.g. `EPSG:3857`
    pub crs: String,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Canvas fill before any layer is drawn
    pub background: String,
    pub tile_loading: TileLoadingConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            crs: Crs::Epsg3857.to_string(),
            min_zoom: 0.0,
            max_zoom: MAX_ZOOM as f64,
            background: DEFAULT_BACKGROUND.to_string(),
            tile_loading: TileLoadingConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Parses and validates a configuration; the document must be an object
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(MapError::Config(
                "configuration must be a JSON object".to_string(),
            ));
        }
        let config: RenderConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(MapError::Config("tile_size must be positive".to_string()));
        }
        if !(0.0..=MAX_ZOOM as f64).contains(&self.min_zoom)
            || !(0.0..=MAX_ZOOM as f64).contains(&self.max_zoom)
            || self.min_zoom > self.max_zoom
        {
            return Err(MapError::Config(format!(
                "zoom range [{}, {}] must lie within [0, {}]",
                self.min_zoom, self.max_zoom, MAX_ZOOM
            )));
        }
        self.crs()?;
        self.background_color()?;
        Ok(())
    }

    pub fn crs(&self) -> Result<Crs> {
        Crs::from_name(&self.crs)
    }

    pub fn background_color(&self) -> Result<Color> {
        Color::parse(&self.background)
    }

    pub fn grid(&self) -> Result<TileGrid> {
        Ok(TileGrid::with_tile_size(self.crs()?, self.tile_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_the_default() {
        let config = RenderConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RenderConfig::default());
        assert_eq!(config.crs().unwrap(), Crs::Epsg3857);
        assert_eq!(config.background_color().unwrap(), Color::rgb(0x7f, 0x7f, 0x7f));
        assert_eq!(config.tile_loading.timeout_secs, 30);
    }

    #[test]
    fn test_partial_override() {
        let config = RenderConfig::from_json_str(
            r#"{"crs": "EPSG:4326", "max_zoom": 12, "tile_loading": {"cache_dir": "/tmp/tiles"}}"#,
        )
        .unwrap();
        assert_eq!(config.grid().unwrap().crs(), Crs::Epsg4326);
        assert_eq!(config.max_zoom, 12.0);
        assert_eq!(config.tile_loading.memory_cache_capacity, 1024);
        assert_eq!(config.tile_loading.cache_dir, Some(PathBuf::from("/tmp/tiles")));
    }

    #[test]
    fn test_validation() {
        assert!(RenderConfig::from_json_str(r#"{"tile_size": 0}"#).is_err());
        assert!(RenderConfig::from_json_str(r#"{"min_zoom": 5, "max_zoom": 2}"#).is_err());
        assert!(RenderConfig::from_json_str(r#"{"max_zoom": 31}"#).is_err());
        assert!(RenderConfig::from_json_str(r#"{"crs": "EPSG:27700"}"#).is_err());
        assert!(RenderConfig::from_json_str(r#"{"background": "mauve-ish"}"#).is_err());
        assert!(matches!(RenderConfig::from_json_str("[]"), Err(MapError::Config(_))));
        assert!(matches!(RenderConfig::from_json_str("[256]"), Err(MapError::Config(_))));
        assert!(RenderConfig::from_json_str("null").is_err());
    }

    #[test]
    fn test_cache_selection() {
        let offline = TileLoadingConfig::offline();
        assert!(offline.cache_dir.is_none());
        assert!(offline.memory_cache_capacity < TileLoadingConfig::default().memory_cache_capacity);

        let dir = tempfile::tempdir().unwrap();
        let on_disk = TileLoadingConfig {
            cache_dir: Some(dir.path().to_path_buf()),
            ..TileLoadingConfig::default()
        };
        let cache = on_disk.build_cache();
        let key = crate::tiles::cache::TileKey::new(
            "osm",
            crate::core::geo::TileCoord::new(1, 2, 3),
            "png",
        );
        cache.save(&key, b"tile").unwrap();
        assert!(dir.path().join("osm/3/1/2.png").exists());
    }
}
