//! Comprehensive tests for BoundingBox construction and queries.

use aq_common::{BoundingBox, SurfaceError};

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(-90.0, 90.0, -180.0, 180.0).unwrap();
    assert_eq!(bbox.lat_min, -90.0);
    assert_eq!(bbox.lat_max, 90.0);
    assert_eq!(bbox.lon_min, -180.0);
    assert_eq!(bbox.lon_max, 180.0);
}

#[test]
fn test_bbox_copy() {
    let bbox1 = BoundingBox::new(0.0, 10.0, 0.0, 10.0).unwrap();
    let bbox2 = bbox1;
    assert_eq!(bbox1, bbox2);
}

#[test]
fn test_bbox_rejects_inverted_latitude() {
    let result = BoundingBox::new(10.0, 5.0, 0.0, 1.0);
    assert!(matches!(result, Err(SurfaceError::InvalidInput(_))));
}

#[test]
fn test_bbox_rejects_inverted_longitude() {
    let result = BoundingBox::new(0.0, 1.0, 10.0, 5.0);
    assert!(matches!(result, Err(SurfaceError::InvalidInput(_))));
}

#[test]
fn test_bbox_rejects_degenerate() {
    assert!(BoundingBox::new(1.0, 1.0, 0.0, 1.0).is_err());
    assert!(BoundingBox::new(0.0, 1.0, 2.0, 2.0).is_err());
}

#[test]
fn test_bbox_rejects_out_of_domain() {
    assert!(BoundingBox::new(-91.0, 0.0, 0.0, 1.0).is_err());
    assert!(BoundingBox::new(0.0, 1.0, 170.0, 181.0).is_err());
}

#[test]
fn test_bbox_rejects_nan() {
    assert!(BoundingBox::new(f64::NAN, 1.0, 0.0, 1.0).is_err());
    assert!(BoundingBox::new(0.0, 1.0, 0.0, f64::INFINITY).is_err());
}

// ============================================================================
// from_latlng_string tests
// ============================================================================

#[test]
fn test_parse_latlng_with_spaces() {
    let bbox = BoundingBox::from_latlng_string(" 28.4, 76.8 , 28.9,77.3 ").unwrap();
    assert_eq!(bbox.lat_min, 28.4);
    assert_eq!(bbox.lon_max, 77.3);
}

#[test]
fn test_parse_latlng_reversed_corners() {
    let bbox = BoundingBox::from_latlng_string("28.9,77.3,28.4,76.8").unwrap();
    assert_eq!(bbox.lat_min, 28.4);
    assert_eq!(bbox.lat_max, 28.9);
    assert_eq!(bbox.lon_min, 76.8);
    assert_eq!(bbox.lon_max, 77.3);
}

#[test]
fn test_parse_latlng_too_few_parts() {
    let result = BoundingBox::from_latlng_string("28.4,76.8,28.9");
    assert!(matches!(result, Err(SurfaceError::InvalidInput(_))));
}

#[test]
fn test_parse_latlng_not_a_number() {
    let result = BoundingBox::from_latlng_string("28.4,east,28.9,77.3");
    assert!(matches!(result, Err(SurfaceError::InvalidInput(_))));
}

// ============================================================================
// Query tests
// ============================================================================

#[test]
fn test_contains_is_edge_inclusive() {
    let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0).unwrap();
    assert!(bbox.contains(0.0, 0.0));
    assert!(bbox.contains(1.0, 1.0));
    assert!(bbox.contains(0.5, 0.5));
    assert!(!bbox.contains(1.0001, 0.5));
    assert!(!bbox.contains(0.5, -0.0001));
}

#[test]
fn test_expand_clamps_to_domain() {
    let bbox = BoundingBox::new(89.5, 90.0, 179.5, 180.0).unwrap();
    let grown = bbox.expand(1.0);
    assert_eq!(grown.lat_max, 90.0);
    assert_eq!(grown.lon_max, 180.0);
    assert_eq!(grown.lat_min, 88.5);
    assert_eq!(grown.lon_min, 178.5);
}
