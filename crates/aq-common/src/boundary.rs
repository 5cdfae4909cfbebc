//! Region boundary polygons used to mask grids and classify query points.
//!
//! A boundary is validated once on construction; containment checks after
//! that never fail. Containment is strict: a point lying exactly on an edge
//! is outside.

use geo::{
    Area, BoundingRect, Contains, Coord, CoordsIter, LineString, MultiPolygon, Point, Polygon, Rect,
    Validation,
};
use serde_json::Value;

use crate::bbox::BoundingBox;
use crate::error::{SurfaceError, SurfaceResult};
use crate::station::GeoPoint;

/// A closed region in WGS84 degrees, possibly made of several parts.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionBoundary {
    shape: MultiPolygon<f64>,
    extent: Rect<f64>,
}

impl RegionBoundary {
    /// Build from a single exterior ring. The ring is implicitly closed.
    pub fn from_ring(ring: &[GeoPoint]) -> SurfaceResult<Self> {
        Self::from_parts(vec![(ring.to_vec(), Vec::new())])
    }

    /// Build from several disjoint exterior rings (e.g. a city plus an exclave).
    pub fn from_rings(rings: &[Vec<GeoPoint>]) -> SurfaceResult<Self> {
        Self::from_parts(rings.iter().map(|r| (r.clone(), Vec::new())).collect())
    }

    /// Build from polygon parts, each an exterior ring plus optional holes.
    pub fn from_parts(parts: Vec<(Vec<GeoPoint>, Vec<Vec<GeoPoint>>)>) -> SurfaceResult<Self> {
        if parts.is_empty() {
            return Err(SurfaceError::invalid_boundary("no polygon parts supplied"));
        }

        let mut polygons = Vec::with_capacity(parts.len());
        for (idx, (exterior, holes)) in parts.into_iter().enumerate() {
            let exterior = validated_ring(&exterior)
                .map_err(|msg| SurfaceError::invalid_boundary(format!("part {}: {}", idx, msg)))?;
            let mut interiors = Vec::with_capacity(holes.len());
            for (h, hole) in holes.iter().enumerate() {
                let ring = validated_ring(hole).map_err(|msg| {
                    SurfaceError::invalid_boundary(format!("part {} hole {}: {}", idx, h, msg))
                })?;
                interiors.push(ring);
            }
            let polygon = Polygon::new(exterior, interiors);
            polygon.check_validation().map_err(|reason| {
                SurfaceError::invalid_boundary(format!("part {}: {}", idx, reason))
            })?;
            if polygon.unsigned_area() <= 0.0 {
                return Err(SurfaceError::invalid_boundary(format!(
                    "part {} encloses no area",
                    idx
                )));
            }
            polygons.push(polygon);
        }

        let shape = MultiPolygon::new(polygons);
        shape
            .check_validation()
            .map_err(|reason| SurfaceError::invalid_boundary(reason.to_string()))?;
        let extent = shape
            .bounding_rect()
            .ok_or_else(|| SurfaceError::invalid_boundary("boundary has no extent"))?;

        Ok(Self { shape, extent })
    }

    /// Parse a GeoJSON Polygon, MultiPolygon, Feature or FeatureCollection.
    ///
    /// Every polygonal geometry found becomes a part of the boundary.
    pub fn from_geojson_str(json: &str) -> SurfaceResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        let mut parts = Vec::new();
        collect_geojson_parts(&value, &mut parts)?;
        if parts.is_empty() {
            return Err(SurfaceError::invalid_boundary(
                "GeoJSON contains no Polygon or MultiPolygon geometry",
            ));
        }
        Self::from_parts(parts)
    }

    /// Strict point-in-polygon test.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        if !lon.is_finite() || !lat.is_finite() {
            return false;
        }
        if lon < self.extent.min().x
            || lon > self.extent.max().x
            || lat < self.extent.min().y
            || lat > self.extent.max().y
        {
            return false;
        }
        self.shape.contains(&Point::new(lon, lat))
    }

    /// Smallest bounding box around every part.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox {
            lat_min: self.extent.min().y,
            lat_max: self.extent.max().y,
            lon_min: self.extent.min().x,
            lon_max: self.extent.max().x,
        }
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    /// Every vertex of every ring, in storage order (rings are closed).
    pub fn vertices(&self) -> impl Iterator<Item = Coord<f64>> + '_ {
        self.shape.coords_iter()
    }

    pub fn part_count(&self) -> usize {
        self.shape.0.len()
    }
}

/// Drop the closing vertex and consecutive repeats, then check the ring.
fn validated_ring(points: &[GeoPoint]) -> Result<LineString<f64>, String> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(points.len());
    for p in points {
        if p.validate().is_err() {
            return Err(format!(
                "vertex ({}, {}) is outside the geographic domain",
                p.longitude, p.latitude
            ));
        }
        let c = Coord {
            x: p.longitude,
            y: p.latitude,
        };
        if coords.last() != Some(&c) {
            coords.push(c);
        }
    }
    while coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }

    if coords.len() < 3 {
        return Err(format!("ring has {} distinct vertices, at least 3 required", coords.len()));
    }

    Ok(LineString::new(coords))
}

type RingPart = (Vec<GeoPoint>, Vec<Vec<GeoPoint>>);

fn collect_geojson_parts(value: &Value, parts: &mut Vec<RingPart>) -> SurfaceResult<()> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| SurfaceError::invalid_boundary("GeoJSON object without a type"))?;

    match kind {
        "FeatureCollection" => {
            let features = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| SurfaceError::invalid_boundary("FeatureCollection without features"))?;
            for feature in features {
                collect_geojson_parts(feature, parts)?;
            }
        }
        "Feature" => {
            if let Some(geometry) = value.get("geometry").filter(|g| !g.is_null()) {
                collect_geojson_parts(geometry, parts)?;
            }
        }
        "GeometryCollection" => {
            if let Some(geometries) = value.get("geometries").and_then(Value::as_array) {
                for geometry in geometries {
                    collect_geojson_parts(geometry, parts)?;
                }
            }
        }
        "Polygon" => {
            let coords = value
                .get("coordinates")
                .ok_or_else(|| SurfaceError::invalid_boundary("Polygon without coordinates"))?;
            parts.push(parse_polygon(coords)?);
        }
        "MultiPolygon" => {
            let polygons = value
                .get("coordinates")
                .and_then(Value::as_array)
                .ok_or_else(|| SurfaceError::invalid_boundary("MultiPolygon without coordinates"))?;
            for polygon in polygons {
                parts.push(parse_polygon(polygon)?);
            }
        }
        // Points and lines carry no area; ignore them.
        _ => {}
    }
    Ok(())
}

fn parse_polygon(coords: &Value) -> SurfaceResult<RingPart> {
    let rings = coords
        .as_array()
        .ok_or_else(|| SurfaceError::invalid_boundary("polygon coordinates must be an array"))?;
    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings
        .next()
        .ok_or_else(|| SurfaceError::invalid_boundary("polygon without an exterior ring"))??;
    let holes = rings.collect::<SurfaceResult<Vec<_>>>()?;
    Ok((exterior, holes))
}

fn parse_ring(ring: &Value) -> SurfaceResult<Vec<GeoPoint>> {
    let positions = ring
        .as_array()
        .ok_or_else(|| SurfaceError::invalid_boundary("ring must be an array of positions"))?;
    positions
        .iter()
        .map(|pos| {
            let lon = pos.get(0).and_then(Value::as_f64);
            let lat = pos.get(1).and_then(Value::as_f64);
            match (lon, lat) {
                (Some(lon), Some(lat)) => Ok(GeoPoint::new(lon, lat)),
                _ => Err(SurfaceError::invalid_boundary(format!(
                    "position {} is not a [lon, lat] pair",
                    pos
                ))),
            }
        })
        .collect()
}
