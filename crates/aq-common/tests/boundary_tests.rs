//! Tests for RegionBoundary construction, GeoJSON loading and containment.

use aq_common::{GeoPoint, RegionBoundary, SurfaceError};

fn ring(points: &[(f64, f64)]) -> Vec<GeoPoint> {
    points.iter().map(|&(lon, lat)| GeoPoint::new(lon, lat)).collect()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_too_few_vertices() {
    let err = RegionBoundary::from_ring(&ring(&[(0.0, 0.0), (1.0, 0.0)])).unwrap_err();
    assert!(matches!(err, SurfaceError::InvalidBoundary(_)));
}

#[test]
fn test_repeated_vertices_do_not_count() {
    let err =
        RegionBoundary::from_ring(&ring(&[(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]))
            .unwrap_err();
    assert!(matches!(err, SurfaceError::InvalidBoundary(_)));
}

#[test]
fn test_out_of_domain_vertex() {
    let err = RegionBoundary::from_ring(&ring(&[(0.0, 0.0), (181.0, 0.0), (0.0, 1.0)])).unwrap_err();
    assert!(matches!(err, SurfaceError::InvalidBoundary(_)));
}

#[test]
fn test_collinear_ring_rejected() {
    let err = RegionBoundary::from_ring(&ring(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)])).unwrap_err();
    assert!(matches!(err, SurfaceError::InvalidBoundary(_)));
}

#[test]
fn test_empty_parts_rejected() {
    let err = RegionBoundary::from_parts(Vec::new()).unwrap_err();
    assert!(matches!(err, SurfaceError::InvalidBoundary(_)));
}

#[test]
fn test_concave_ring_containment() {
    // An L-shape: the notch at the top right is outside.
    let boundary = RegionBoundary::from_ring(&ring(&[
        (0.0, 0.0),
        (2.0, 0.0),
        (2.0, 1.0),
        (1.0, 1.0),
        (1.0, 2.0),
        (0.0, 2.0),
    ]))
    .unwrap();
    assert!(boundary.contains(0.5, 1.5));
    assert!(boundary.contains(1.5, 0.5));
    assert!(!boundary.contains(1.5, 1.5));
}

#[test]
fn test_bounds() {
    let boundary =
        RegionBoundary::from_ring(&ring(&[(76.8, 28.4), (77.3, 28.4), (77.1, 28.9)])).unwrap();
    let bounds = boundary.bounds();
    assert_eq!(bounds.lon_min, 76.8);
    assert_eq!(bounds.lon_max, 77.3);
    assert_eq!(bounds.lat_min, 28.4);
    assert_eq!(bounds.lat_max, 28.9);
}

// ============================================================================
// GeoJSON
// ============================================================================

#[test]
fn test_geojson_polygon_with_hole() {
    let json = r#"{
        "type": "Polygon",
        "coordinates": [
            [[0, 0], [4, 0], [4, 4], [0, 4], [0, 0]],
            [[1, 1], [3, 1], [3, 3], [1, 3], [1, 1]]
        ]
    }"#;
    let boundary = RegionBoundary::from_geojson_str(json).unwrap();
    assert!(boundary.contains(0.5, 0.5));
    assert!(!boundary.contains(2.0, 2.0));
}

#[test]
fn test_geojson_feature_collection_multipolygon() {
    let json = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"name": "district-a"},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]]],
                        [[[5, 5], [6, 5], [6, 6], [5, 6], [5, 5]]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": {"name": "no-geometry"},
                "geometry": null
            }
        ]
    }"#;
    let boundary = RegionBoundary::from_geojson_str(json).unwrap();
    assert_eq!(boundary.part_count(), 2);
    assert!(boundary.contains(0.5, 0.5));
    assert!(boundary.contains(5.5, 5.5));
    assert!(!boundary.contains(3.0, 3.0));
}

#[test]
fn test_geojson_without_polygons() {
    let json = r#"{"type": "Point", "coordinates": [1, 2]}"#;
    let err = RegionBoundary::from_geojson_str(json).unwrap_err();
    assert!(matches!(err, SurfaceError::InvalidBoundary(_)));
}

#[test]
fn test_geojson_bad_position() {
    let json = r#"{"type": "Polygon", "coordinates": [[[0, 0], [1], [1, 1], [0, 0]]]}"#;
    let err = RegionBoundary::from_geojson_str(json).unwrap_err();
    assert!(matches!(err, SurfaceError::InvalidBoundary(_)));
}

#[test]
fn test_geojson_malformed_json() {
    let err = RegionBoundary::from_geojson_str("{not json").unwrap_err();
    assert!(matches!(err, SurfaceError::InvalidInput(_)));
}
