//! Region masking of lattice predictions.

use aq_common::{RegionBoundary, SurfaceError, SurfaceResult};
use rayon::prelude::*;
use tracing::debug;

use crate::grid::PredictionLattice;
use crate::kriging::Prediction;
use crate::types::PredictionGrid;

/// `true` for every lattice site strictly inside the boundary.
pub fn inside_mask(lattice: &PredictionLattice, boundary: &RegionBoundary) -> Vec<bool> {
    lattice
        .lons()
        .par_iter()
        .zip(lattice.lats().par_iter())
        .map(|(&lon, &lat)| boundary.contains(lon, lat))
        .collect()
}

/// Combine lattice coordinates and predictions into a masked grid.
///
/// Sites outside the boundary (edges included) lose their value and variance.
pub fn apply_mask(
    lattice: &PredictionLattice,
    predictions: &[Prediction],
    boundary: &RegionBoundary,
) -> SurfaceResult<PredictionGrid> {
    if predictions.len() != lattice.len() {
        return Err(SurfaceError::Internal(format!(
            "{} predictions for {} lattice sites",
            predictions.len(),
            lattice.len()
        )));
    }

    let inside = inside_mask(lattice, boundary);
    let (values, variances): (Vec<_>, Vec<_>) = predictions
        .iter()
        .zip(&inside)
        .map(|(p, &keep)| {
            if keep {
                (Some(p.value), Some(p.variance))
            } else {
                (None, None)
            }
        })
        .unzip();

    let grid = PredictionGrid {
        resolution: lattice.resolution(),
        lons: lattice.lons().to_vec(),
        lats: lattice.lats().to_vec(),
        values,
        variances,
    };

    debug!(
        sites = grid.len(),
        inside = grid.valid_count(),
        "Applied region mask"
    );

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridBuilder;
    use aq_common::{BoundingBox, GeoPoint};
    use projection::UtmProjector;

    fn lattice(bbox: &BoundingBox, n: usize) -> PredictionLattice {
        let projector = UtmProjector::for_region(bbox).unwrap();
        GridBuilder::new(&projector).build(bbox, n).unwrap()
    }

    fn half_boundary() -> RegionBoundary {
        // Western half of the box
        RegionBoundary::from_ring(&[
            GeoPoint::new(74.70, 27.95),
            GeoPoint::new(75.00, 27.95),
            GeoPoint::new(75.00, 28.55),
            GeoPoint::new(74.70, 28.55),
        ])
        .unwrap()
    }

    #[test]
    fn test_mask_matches_containment() {
        let bbox = BoundingBox::new(28.0, 28.5, 74.75, 75.25).unwrap();
        let lattice = lattice(&bbox, 21);
        let boundary = half_boundary();
        let predictions = vec![
            Prediction {
                value: 100.0,
                variance: 5.0
            };
            lattice.len()
        ];

        let grid = apply_mask(&lattice, &predictions, &boundary).unwrap();
        for (idx, site) in grid.sites().enumerate() {
            let inside = boundary.contains(site.lon, site.lat);
            assert_eq!(site.value.is_some(), inside, "site {}", idx);
            assert_eq!(site.variance.is_some(), inside, "site {}", idx);
        }
        assert!(grid.valid_count() > 0);
        assert!(grid.valid_count() < grid.len());
    }

    #[test]
    fn test_disjoint_boundary_masks_everything() {
        let bbox = BoundingBox::new(28.0, 28.5, 74.75, 75.25).unwrap();
        let lattice = lattice(&bbox, 10);
        let far = RegionBoundary::from_ring(&[
            GeoPoint::new(10.0, 10.0),
            GeoPoint::new(11.0, 10.0),
            GeoPoint::new(11.0, 11.0),
        ])
        .unwrap();
        let predictions = vec![
            Prediction {
                value: 1.0,
                variance: 0.0
            };
            lattice.len()
        ];

        let grid = apply_mask(&lattice, &predictions, &far).unwrap();
        assert_eq!(grid.valid_count(), 0);
        assert_eq!(grid.value_range(), None);
    }

    #[test]
    fn test_length_mismatch_is_internal_error() {
        let bbox = BoundingBox::new(28.0, 28.5, 74.75, 75.25).unwrap();
        let lattice = lattice(&bbox, 4);
        let err = apply_mask(&lattice, &[], &half_boundary()).unwrap_err();
        assert!(matches!(err, SurfaceError::Internal(_)));
    }
}
