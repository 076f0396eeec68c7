//! Tissot's indicatrix: equal-sized ground circles drawn through a
//! projection, showing how it inflates area away from the equator.

use crate::{
    core::{
        constants::EARTH_RADIUS,
        crs::{Crs, Projection},
        geo::{LatLon, Point},
    },
    data::geojson::{GeoJson, GeoJsonFeature, Geometry},
    Result,
};
use serde_json::json;
use std::f64::consts::PI;

/// One polygon per `(lat, lon)` pair plus an equator line.
///
/// Each circle has ground radius `radius_m` metres, traced with `segments`
/// segments in projected space and scaled by the CRS scale factor at its
/// latitude. Fails if any latitude is at a pole.
pub fn tissot_indicatrix(
    crs: Crs,
    lats: &[f64],
    lons: &[f64],
    radius_m: f64,
    segments: usize,
) -> Result<GeoJson> {
    let segments = segments.max(3);
    // plate carrée measures in degrees of arc
    let units_per_metre = match crs {
        Crs::Epsg4326 => 180.0 / (PI * EARTH_RADIUS),
        _ => 1.0,
    };

    let mut doc = GeoJson::default();
    for &lat in lats {
        let k = crs.scalefactor(lat)?;
        let r = radius_m * units_per_metre * k;
        for &lon in lons {
            let center = crs.project(LatLon::new(lat, lon));
            let contour = (0..=segments)
                .map(|i| {
                    let theta = i as f64 * 2.0 * PI / segments as f64;
                    let p = crs.unproject(Point::new(
                        center.x + r * theta.cos(),
                        center.y + r * theta.sin(),
                    ));
                    [p.lon, p.lat]
                })
                .collect();

            let mut feature = GeoJsonFeature::new(Geometry::Polygon(vec![contour]));
            feature.properties.insert("lat".to_string(), json!(lat));
            feature.properties.insert("k".to_string(), json!(k));
            doc.push(feature);
        }
    }

    let mut equator =
        GeoJsonFeature::new(Geometry::LineString(vec![[-180.0, 0.0], [180.0, 0.0]]));
    equator.properties.insert("lat".to_string(), json!(0));
    equator.properties.insert("k".to_string(), json!(1));
    equator.properties.insert("equator".to_string(), json!(true));
    doc.push(equator);

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crs::distance;

    #[test]
    fn test_circle_count_and_closure() {
        let doc = tissot_indicatrix(Crs::Epsg3857, &[-60.0, 0.0, 60.0], &[0.0, 90.0], 200_000.0, 20)
            .unwrap();
        assert_eq!(doc.features().len(), 3 * 2 + 1);

        match &doc.features()[0].geometry {
            Some(Geometry::Polygon(rings)) => {
                assert_eq!(rings[0].len(), 21);
                let (first, last) = (rings[0][0], rings[0][20]);
                assert!((first[0] - last[0]).abs() < 1e-9 && (first[1] - last[1]).abs() < 1e-9);
            }
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn test_circles_have_similar_ground_radius() {
        let doc = tissot_indicatrix(Crs::Epsg3857, &[0.0, 60.0], &[10.0], 200_000.0, 16).unwrap();
        for (feature, lat) in doc.features().iter().zip([0.0, 60.0]) {
            let Some(Geometry::Polygon(rings)) = &feature.geometry else {
                panic!("expected polygon");
            };
            // east-most vertex of the contour
            let east = LatLon::new(rings[0][0][1], rings[0][0][0]);
            let ground = distance(LatLon::new(lat, 10.0), east);
            assert!((ground - 200_000.0).abs() < 5_000.0, "{lat}: {ground}");
        }
    }

    #[test]
    fn test_pole_is_rejected() {
        assert!(tissot_indicatrix(Crs::Epsg3857, &[90.0], &[0.0], 1000.0, 8).is_err());
    }
}
