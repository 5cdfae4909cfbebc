//! Round-trip and distance checks for the UTM projector.

use projection::{CoordinateProjector, UtmProjector};
use test_utils::{assert_approx_eq, assert_coords_approx_eq, fixtures};

#[test]
fn test_roundtrip_across_delhi() {
    let bbox = fixtures::delhi_bbox();
    let proj = UtmProjector::for_region(&bbox).unwrap();

    for i in 0..=10 {
        for j in 0..=10 {
            let lon = bbox.lon_min + bbox.width() * i as f64 / 10.0;
            let lat = bbox.lat_min + bbox.height() * j as f64 / 10.0;
            let (x, y) = proj.to_planar(lon, lat).unwrap();
            let (lon2, lat2) = proj.to_geographic(x, y).unwrap();
            assert_coords_approx_eq!((lon2, lat2), (lon, lat), 1e-7);
        }
    }
}

#[test]
fn test_planar_roundtrip_is_sub_millimetre() {
    let proj = UtmProjector::new(43, false).unwrap();
    let (x, y) = (712_345.0, 3_170_000.0);
    let (lon, lat) = proj.to_geographic(x, y).unwrap();
    let (x2, y2) = proj.to_planar(lon, lat).unwrap();
    assert_approx_eq!(x2, x, 1e-3);
    assert_approx_eq!(y2, y, 1e-3);
}

#[test]
fn test_planar_distance_matches_ground_distance() {
    // One degree of latitude near 28.6N is about 110.85 km.
    let proj = UtmProjector::new(43, false).unwrap();
    let (x1, y1) = proj.to_planar(77.0, 28.1).unwrap();
    let (x2, y2) = proj.to_planar(77.0, 29.1).unwrap();
    let planar = ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt();
    // UTM scale is within 0.1% of unity this close to the central meridian.
    assert!((planar - 110_850.0).abs() < 200.0, "distance was {}", planar);
}

#[test]
fn test_batch_projection_matches_single() {
    let proj = UtmProjector::new(43, false).unwrap();
    let points = [(76.9, 28.5), (77.1, 28.6), (77.3, 28.8)];
    let planar = proj.to_planar_many(&points).unwrap();
    for (&(lon, lat), &(x, y)) in points.iter().zip(&planar) {
        let (sx, sy) = proj.to_planar(lon, lat).unwrap();
        assert_eq!((x, y), (sx, sy));
    }
    let back = proj.to_geographic_many(&planar).unwrap();
    for (&(lon, lat), &(lon2, lat2)) in points.iter().zip(&back) {
        assert_coords_approx_eq!((lon2, lat2), (lon, lat), 1e-7);
    }
}

#[test]
fn test_batch_projection_fails_on_bad_point() {
    let proj = UtmProjector::new(43, false).unwrap();
    let points = [(77.0, 28.5), (77.0, 95.0)];
    assert!(proj.to_planar_many(&points).is_err());
}

#[test]
fn test_northing_increases_with_latitude() {
    let proj = UtmProjector::new(43, false).unwrap();
    let (_, south) = proj.to_planar(77.0, 28.4).unwrap();
    let (_, north) = proj.to_planar(77.0, 28.9).unwrap();
    assert!(north > south);
}
