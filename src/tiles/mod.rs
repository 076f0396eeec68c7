pub mod cache;
pub mod loader;
pub mod source;
pub mod wms;

pub use cache::{FileTileCache, MemoryTileCache, NoCache, TileCache, TileKey};
pub use loader::{HttpTransport, Transport, TransportResponse};
pub use source::{TileService, TileSource, UrlStrategy};
pub use wms::WmsOptions;
