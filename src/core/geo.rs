use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

/// A geographic coordinate in degrees.
///
/// Latitude is clamped to `[-90, 90]` on construction. Longitude is kept as
/// given: values outside `[-180, 180]` express continuity across the
/// antimeridian (e.g. `181.8` is just east of `180`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    /// Creates a new coordinate, clamping the latitude
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat: Self::clamp_latitude(lat),
            lon,
        }
    }

    /// Clamps latitude to `[-90, 90]`
    pub fn clamp_latitude(lat: f64) -> f64 {
        lat.clamp(-90.0, 90.0)
    }

    /// Wraps a longitude in `[-360, 360]` into `[-180, 180]`
    pub fn wrap_longitude(lon: f64) -> Result<f64> {
        if !(-360.0..=360.0).contains(&lon) {
            return Err(MapError::Config(format!(
                "longitude {lon} outside [-360, 360] cannot be wrapped"
            )));
        }
        Ok(if lon > 180.0 {
            lon - 360.0
        } else if lon < -180.0 {
            lon + 360.0
        } else {
            lon
        })
    }

    /// Returns a copy with the longitude wrapped into `[-180, 180]`
    pub fn wrapped(&self) -> Result<LatLon> {
        Ok(LatLon::new(self.lat, Self::wrap_longitude(self.lon)?))
    }
}

impl Default for LatLon {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl std::fmt::Display for LatLon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// A point in a planar coordinate space.
///
/// The same type serves three spaces: projected CRS units, map pixels at some
/// zoom, and local drawing units. Every function taking or returning a
/// `Point` states which one it means.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// A geographic bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLonBounds {
    pub south_west: LatLon,
    pub north_east: LatLon,
}

impl LatLonBounds {
    pub fn new(south_west: LatLon, north_east: LatLon) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Bounds covering a single coordinate
    pub fn from_point(point: LatLon) -> Self {
        Self::new(point, point)
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &LatLon) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lon >= self.south_west.lon
            && point.lon <= self.north_east.lon
    }

    /// Extends the bounds to include a point
    pub fn extend(&mut self, point: &LatLon) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lon = self.south_west.lon.min(point.lon);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lon = self.north_east.lon.max(point.lon);
    }

    /// North-west corner, the top-left of a north-up map
    pub fn north_west(&self) -> LatLon {
        LatLon::new(self.north_east.lat, self.south_west.lon)
    }

    /// South-east corner, the bottom-right of a north-up map
    pub fn south_east(&self) -> LatLon {
        LatLon::new(self.south_west.lat, self.north_east.lon)
    }
}

/// A tile address in the quad-tree grid.
///
/// `x` and `y` are signed: addressing a viewport that crosses the
/// antimeridian or the poles yields indices outside `[0, 2^z)`. Only `x` is
/// ever wrapped back into range (see [`crate::TileGrid::wrap_tile_x`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i64,
    pub y: i64,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: i64, y: i64, z: u8) -> Self {
        Self { x, y, z }
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latitude_is_clamped() {
        assert_eq!(LatLon::new(95.0, 10.0).lat, 90.0);
        assert_eq!(LatLon::new(-120.0, 10.0).lat, -90.0);
    }

    #[test]
    fn test_longitude_is_not_normalized() {
        let coord = LatLon::new(-17.0, 181.86);
        assert_eq!(coord.lon, 181.86);
    }

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(LatLon::wrap_longitude(190.0).unwrap(), -170.0);
        assert_eq!(LatLon::wrap_longitude(-190.0).unwrap(), 170.0);
        assert_eq!(LatLon::wrap_longitude(45.0).unwrap(), 45.0);
        assert!(LatLon::wrap_longitude(400.0).is_err());
    }

    #[test]
    fn test_bounds_extend_and_corners() {
        let mut bounds = LatLonBounds::from_point(LatLon::new(10.0, 20.0));
        bounds.extend(&LatLon::new(-5.0, 30.0));

        assert!(bounds.contains(&LatLon::new(0.0, 25.0)));
        assert!(!bounds.contains(&LatLon::new(11.0, 25.0)));
        assert_eq!(bounds.north_west(), LatLon::new(10.0, 20.0));
        assert_eq!(bounds.south_east(), LatLon::new(-5.0, 30.0));
    }
}
