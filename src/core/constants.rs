//! Engine-wide constants: Earth radii, projection limits, tile grid limits and
//! the default drawing state. Keeping them in a single place makes the magic
//! numbers easy to audit.

/// Equatorial Earth radius in metres (WGS84 semi-major axis).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Polar Earth radius in metres, used by the ellipsoidal Mercator.
pub const EARTH_RADIUS_MINOR: f64 = 6_356_752.3142;

/// Mean Earth radius used by the haversine distance.
pub const EARTH_MEAN_RADIUS: f64 = 6_371_009.0;

/// Latitude limit of spherical Web Mercator (EPSG:3857).
pub const MAX_LATITUDE_SPHERICAL: f64 = 85.051_128_779_8;

/// Latitude limit of ellipsoidal World Mercator (EPSG:3395).
pub const MAX_LATITUDE_ELLIPSOIDAL: f64 = 89.5;

/// Iteration budget for ellipsoidal unprojection.
pub const UNPROJECT_MAX_ITERATIONS: usize = 15;

/// Convergence tolerance (radians) for ellipsoidal unprojection.
pub const UNPROJECT_TOLERANCE: f64 = 1e-8;

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Highest integer zoom the tile grid can address.
pub const MAX_ZOOM: u8 = 30;

/// Default background of a rendered map.
pub const DEFAULT_BACKGROUND: &str = "#7f7f7f";

/// Default stroke color of a fresh canvas.
pub const DEFAULT_STROKE_COLOR: &str = "#3388ff";

/// Default fill color of a fresh canvas.
pub const DEFAULT_FILL_COLOR: &str = "#3388ff3f";

/// Stroke width of a fresh canvas.
pub const DEFAULT_STROKE_WIDTH: f64 = 4.0;

/// Miter limit of a fresh canvas.
pub const DEFAULT_MITER_LIMIT: f64 = 10.0;

/// Radius used when drawing GeoJSON points.
pub const DEFAULT_POINT_RADIUS: f64 = 1.0;

/// Procedural marker size (width, height) in pixels.
pub const MARKER_SIZE: (f64, f64) = (25.0, 41.0);

/// User agent sent with tile requests.
pub const DEFAULT_USER_AGENT: &str = concat!("mapforge/", env!("CARGO_PKG_VERSION"));
