use crate::{core::geo::TileCoord, Result};
use lru::LruCache;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Identifies a cached tile: `{name}/{z}/{x}/{y}.{format}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub name: String,
    pub tile: TileCoord,
    /// File extension without the dot, empty for none
    pub format: String,
}

impl TileKey {
    pub fn new(name: impl Into<String>, tile: TileCoord, format: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tile,
            format: format.into(),
        }
    }

    /// Relative path of the tile inside a cache directory
    pub fn relative_path(&self) -> String {
        let base = format!(
            "{}/{}/{}/{}",
            self.name, self.tile.z, self.tile.x, self.tile.y
        );
        if self.format.is_empty() {
            base
        } else {
            format!("{base}.{}", self.format)
        }
    }
}

/// Storage for fetched tile bytes
pub trait TileCache: Send + Sync {
    fn load(&self, key: &TileKey) -> Option<Vec<u8>>;

    fn save(&self, key: &TileKey, data: &[u8]) -> Result<()>;

    fn contains(&self, key: &TileKey) -> bool {
        self.load(key).is_some()
    }
}

/// Cache that never stores anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl TileCache for NoCache {
    fn load(&self, _key: &TileKey) -> Option<Vec<u8>> {
        None
    }

    fn save(&self, _key: &TileKey, _data: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// In-memory tile cache using LRU eviction
#[derive(Debug)]
pub struct MemoryTileCache {
    cache: Arc<Mutex<LruCache<String, Arc<Vec<u8>>>>>,
}

impl MemoryTileCache {
    /// Create a new tile cache with the given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Get the current number of cached tiles
    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all tiles from the cache
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}

impl Clone for MemoryTileCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl Default for MemoryTileCache {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl TileCache for MemoryTileCache {
    fn load(&self, key: &TileKey) -> Option<Vec<u8>> {
        let mut cache = self.cache.lock().ok()?;
        cache.get(&key.relative_path()).map(|data| data.as_ref().clone())
    }

    fn save(&self, key: &TileKey, data: &[u8]) -> Result<()> {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key.relative_path(), Arc::new(data.to_vec()));
        }
        Ok(())
    }

    fn contains(&self, key: &TileKey) -> bool {
        self.cache
            .lock()
            .map(|cache| cache.contains(&key.relative_path()))
            .unwrap_or(false)
    }
}

/// On-disk tile cache rooted at a directory
#[derive(Debug, Clone)]
pub struct FileTileCache {
    root: PathBuf,
}

impl FileTileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &TileKey) -> PathBuf {
        self.root.join(key.relative_path())
    }
}

impl TileCache for FileTileCache {
    fn load(&self, key: &TileKey) -> Option<Vec<u8>> {
        fs::read(self.path_for(key)).ok()
    }

    fn save(&self, key: &TileKey, data: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }

    fn contains(&self, key: &TileKey) -> bool {
        self.path_for(key).is_file()
    }
}
