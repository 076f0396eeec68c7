//! Coordinate reference systems.
//!
//! Each CRS is a stateless strategy implementing [`Projection`]. The closed
//! set the renderer supports is [`Crs`]; adding a projection means adding a
//! variant and a unit struct.

use crate::{
    core::{
        constants::{
            EARTH_MEAN_RADIUS, EARTH_RADIUS, EARTH_RADIUS_MINOR, MAX_LATITUDE_ELLIPSOIDAL,
            MAX_LATITUDE_SPHERICAL, UNPROJECT_MAX_ITERATIONS, UNPROJECT_TOLERANCE,
        },
        geo::{LatLon, Point},
        matrix::Matrix,
    },
    MapError, Result,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Forward/inverse mapping between geographic coordinates and a planar CRS.
pub trait Projection {
    /// Identifier such as `"EPSG:3857"`, also used as the WMS `srs`.
    fn name(&self) -> &'static str;

    /// Geographic coordinate to projected CRS units.
    fn project(&self, latlon: LatLon) -> Point;

    /// Projected CRS units back to a geographic coordinate.
    fn unproject(&self, point: Point) -> LatLon;

    /// Ratio between projected and true distance at `lat`.
    ///
    /// Fails for `lat <= -90 || lat >= 90`.
    fn scalefactor(&self, lat: f64) -> Result<f64>;

    /// Projected CRS units to map pixels `[0, mapsize)`.
    fn crs_to_map_transform(&self, mapsize: f64) -> Matrix;

    /// Map pixels back to projected CRS units.
    fn map_to_crs_transform(&self, mapsize: f64) -> Matrix;
}

fn check_scalefactor_domain(lat: f64) -> Result<()> {
    if lat <= -90.0 || lat >= 90.0 || lat.is_nan() {
        return Err(MapError::LatitudeOutOfDomain(lat));
    }
    Ok(())
}

/// Mercator pixel transform shared by both Mercator variants: scale by
/// `mapsize / 2πR`, flip y, move the origin to the map center.
fn mercator_to_map(mapsize: f64) -> Matrix {
    let scale = mapsize * 0.5 / (PI * EARTH_RADIUS);
    Matrix::new(scale, 0.0, 0.5 * mapsize, 0.0, -scale, 0.5 * mapsize)
}

fn mercator_from_map(mapsize: f64) -> Matrix {
    let scale = 2.0 * PI * EARTH_RADIUS / mapsize;
    Matrix::mul(
        &Matrix::scale(scale, -scale),
        &Matrix::translation(-0.5 * mapsize, -0.5 * mapsize),
    )
}

/// Spherical Web Mercator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Epsg3857;

impl Projection for Epsg3857 {
    fn name(&self) -> &'static str {
        "EPSG:3857"
    }

    fn project(&self, latlon: LatLon) -> Point {
        let lat = latlon
            .lat
            .clamp(-MAX_LATITUDE_SPHERICAL, MAX_LATITUDE_SPHERICAL)
            .to_radians();
        Point::new(
            latlon.lon.to_radians() * EARTH_RADIUS,
            (FRAC_PI_4 + lat / 2.0).tan().ln() * EARTH_RADIUS,
        )
    }

    fn unproject(&self, point: Point) -> LatLon {
        let lat = 2.0 * (point.y / EARTH_RADIUS).exp().atan() - FRAC_PI_2;
        LatLon::new(lat.to_degrees(), (point.x / EARTH_RADIUS).to_degrees())
    }

    fn scalefactor(&self, lat: f64) -> Result<f64> {
        check_scalefactor_domain(lat)?;
        Ok(1.0 / lat.to_radians().cos())
    }

    fn crs_to_map_transform(&self, mapsize: f64) -> Matrix {
        mercator_to_map(mapsize)
    }

    fn map_to_crs_transform(&self, mapsize: f64) -> Matrix {
        mercator_from_map(mapsize)
    }
}

/// Ellipsoidal World Mercator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Epsg3395;

impl Epsg3395 {
    fn eccentricity() -> f64 {
        let ratio = EARTH_RADIUS_MINOR / EARTH_RADIUS;
        (1.0 - ratio * ratio).sqrt()
    }

    /// `((1 - e·sinφ) / (1 + e·sinφ))^(e/2)`
    fn conformal_factor(phi: f64) -> f64 {
        let e = Self::eccentricity();
        let con = e * phi.sin();
        ((1.0 - con) / (1.0 + con)).powf(e / 2.0)
    }
}

impl Projection for Epsg3395 {
    fn name(&self) -> &'static str {
        "EPSG:3395"
    }

    fn project(&self, latlon: LatLon) -> Point {
        let phi = latlon
            .lat
            .clamp(-MAX_LATITUDE_ELLIPSOIDAL, MAX_LATITUDE_ELLIPSOIDAL)
            .to_radians();
        let ts = (0.5 * (FRAC_PI_2 - phi)).tan() / Self::conformal_factor(phi);
        Point::new(
            latlon.lon.to_radians() * EARTH_RADIUS,
            -EARTH_RADIUS * ts.max(1e-10).ln(),
        )
    }

    fn unproject(&self, point: Point) -> LatLon {
        let ts = (-point.y / EARTH_RADIUS).exp();
        let mut phi = FRAC_PI_2 - 2.0 * ts.atan();
        for _ in 0..UNPROJECT_MAX_ITERATIONS {
            let dphi = FRAC_PI_2 - 2.0 * (ts * Self::conformal_factor(phi)).atan() - phi;
            phi += dphi;
            if dphi.abs() <= UNPROJECT_TOLERANCE {
                break;
            }
        }
        // Non-convergence keeps the last estimate.
        LatLon::new(phi.to_degrees(), (point.x / EARTH_RADIUS).to_degrees())
    }

    fn scalefactor(&self, lat: f64) -> Result<f64> {
        check_scalefactor_domain(lat)?;
        let phi = lat.to_radians();
        let con = Self::eccentricity() * phi.sin();
        Ok((1.0 / phi.cos()) * (1.0 - con * con).sqrt())
    }

    fn crs_to_map_transform(&self, mapsize: f64) -> Matrix {
        mercator_to_map(mapsize)
    }

    fn map_to_crs_transform(&self, mapsize: f64) -> Matrix {
        mercator_from_map(mapsize)
    }
}

/// Equirectangular (plate carrée): projected units are degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Epsg4326;

impl Projection for Epsg4326 {
    fn name(&self) -> &'static str {
        "EPSG:4326"
    }

    fn project(&self, latlon: LatLon) -> Point {
        Point::new(latlon.lon, latlon.lat)
    }

    fn unproject(&self, point: Point) -> LatLon {
        LatLon::new(point.y, point.x)
    }

    fn scalefactor(&self, lat: f64) -> Result<f64> {
        check_scalefactor_domain(lat)?;
        Ok(1.0)
    }

    fn crs_to_map_transform(&self, mapsize: f64) -> Matrix {
        let scale = mapsize * 0.5 / 180.0;
        Matrix::new(scale, 0.0, 0.5 * mapsize, 0.0, -scale, 0.5 * mapsize)
    }

    fn map_to_crs_transform(&self, mapsize: f64) -> Matrix {
        let scale = 360.0 / mapsize;
        Matrix::mul(
            &Matrix::scale(scale, -scale),
            &Matrix::translation(-0.5 * mapsize, -0.5 * mapsize),
        )
    }
}

/// The supported coordinate reference systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Crs {
    #[default]
    #[serde(rename = "EPSG:3857")]
    Epsg3857,
    #[serde(rename = "EPSG:3395")]
    Epsg3395,
    #[serde(rename = "EPSG:4326")]
    Epsg4326,
}

impl Crs {
    /// Parses an `EPSG:xxxx` identifier, case-insensitively
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "EPSG:3857" | "EPSG:900913" => Ok(Crs::Epsg3857),
            "EPSG:3395" => Ok(Crs::Epsg3395),
            "EPSG:4326" => Ok(Crs::Epsg4326),
            other => Err(MapError::Config(format!("unsupported CRS '{other}'"))),
        }
    }

    fn projection(&self) -> &'static dyn Projection {
        match self {
            Crs::Epsg3857 => &Epsg3857,
            Crs::Epsg3395 => &Epsg3395,
            Crs::Epsg4326 => &Epsg4326,
        }
    }
}

impl Projection for Crs {
    fn name(&self) -> &'static str {
        self.projection().name()
    }

    fn project(&self, latlon: LatLon) -> Point {
        self.projection().project(latlon)
    }

    fn unproject(&self, point: Point) -> LatLon {
        self.projection().unproject(point)
    }

    fn scalefactor(&self, lat: f64) -> Result<f64> {
        self.projection().scalefactor(lat)
    }

    fn crs_to_map_transform(&self, mapsize: f64) -> Matrix {
        self.projection().crs_to_map_transform(mapsize)
    }

    fn map_to_crs_transform(&self, mapsize: f64) -> Matrix {
        self.projection().map_to_crs_transform(mapsize)
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Great-circle distance in metres (haversine, mean Earth radius)
pub fn distance(from: LatLon, to: LatLon) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_MEAN_RADIUS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Crs; 3] = [Crs::Epsg3857, Crs::Epsg3395, Crs::Epsg4326];

    #[test]
    fn test_web_mercator_literals() {
        let origin = Epsg3857.project(LatLon::new(0.0, 0.0));
        assert!(origin.x.abs() < 1e-9 && origin.y.abs() < 1e-9);

        let p = Epsg3857.project(LatLon::new(60.0, 20.0));
        assert!((p.x - 2_226_389.8).abs() < 0.1, "{}", p.x);
        assert!((p.y - 8_399_737.9).abs() < 0.1, "{}", p.y);
    }

    #[test]
    fn test_projection_round_trip() {
        for crs in [Crs::Epsg3857, Crs::Epsg3395] {
            let mut lat = -85.0;
            while lat < 85.0 {
                let mut lon = -179.5;
                while lon < 180.0 {
                    let back = crs.unproject(crs.project(LatLon::new(lat, lon)));
                    assert!((back.lat - lat).abs() < 1e-5, "{crs} lat {lat} -> {}", back.lat);
                    assert!((back.lon - lon).abs() < 1e-5, "{crs} lon {lon} -> {}", back.lon);
                    lon += 29.5;
                }
                lat += 8.5;
            }
        }
    }

    #[test]
    fn test_projection_clamps_latitude() {
        let pole = Epsg3857.project(LatLon::new(90.0, 0.0));
        assert!(pole.y.is_finite());
        let limit = Epsg3857.project(LatLon::new(MAX_LATITUDE_SPHERICAL, 0.0));
        assert_eq!(pole.y, limit.y);

        let pole = Epsg3395.project(LatLon::new(-90.0, 0.0));
        assert!(pole.y.is_finite());
    }

    #[test]
    fn test_ellipsoidal_unproject_at_extreme_y() {
        // the clamped pole comes back as the clamp latitude
        for (lat, sign) in [(90.0, 1.0), (-90.0, -1.0)] {
            let edge = Epsg3395.project(LatLon::new(lat, 10.0));
            let back = Epsg3395.unproject(edge);
            assert!(back.lat.is_finite());
            assert!((back.lat - sign * MAX_LATITUDE_ELLIPSOIDAL).abs() < 1e-5, "{}", back.lat);
            assert!((back.lon - 10.0).abs() < 1e-9);

            // far outside the projected domain the estimate stays finite and polar
            let beyond = Epsg3395.unproject(Point::new(0.0, edge.y * 50.0));
            assert!(beyond.lat.is_finite());
            assert!(beyond.lat * sign >= MAX_LATITUDE_ELLIPSOIDAL && beyond.lat * sign <= 90.0);
        }
    }

    #[test]
    fn test_ellipsoidal_is_south_of_spherical() {
        let spherical = Epsg3857.project(LatLon::new(45.0, 0.0));
        let ellipsoidal = Epsg3395.project(LatLon::new(45.0, 0.0));
        assert!(ellipsoidal.y < spherical.y);
    }

    #[test]
    fn test_scalefactor() {
        assert!((Epsg3857.scalefactor(60.0).unwrap() - 2.0).abs() < 1e-12);
        assert!(Epsg3395.scalefactor(60.0).unwrap() < 2.0);
        assert_eq!(Epsg4326.scalefactor(45.0).unwrap(), 1.0);

        for crs in ALL {
            assert!(matches!(
                crs.scalefactor(90.0),
                Err(MapError::LatitudeOutOfDomain(_))
            ));
            assert!(crs.scalefactor(-90.0).is_err());
            assert!(crs.scalefactor(-91.0).is_err());
        }
    }

    #[test]
    fn test_map_transforms_are_inverse() {
        for crs in ALL {
            let mapsize = 1024.0;
            let product = Matrix::mul(
                &crs.crs_to_map_transform(mapsize),
                &crs.map_to_crs_transform(mapsize),
            );
            assert!(product.approx_eq(&Matrix::identity(), 1e-8), "{crs}: {product:?}");
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Crs::from_name("epsg:4326").unwrap(), Crs::Epsg4326);
        assert_eq!(Crs::from_name("EPSG:3395").unwrap().name(), "EPSG:3395");
        assert!(Crs::from_name("EPSG:27700").is_err());
    }

    #[test]
    fn test_distance() {
        let nyc = LatLon::new(40.7128, -74.0060);
        let la = LatLon::new(34.0522, -118.2437);
        // approximately 3936 km on the mean sphere
        assert!((distance(nyc, la) - 3_936_000.0).abs() < 10_000.0);
        assert_eq!(distance(nyc, nyc), 0.0);
    }
}
