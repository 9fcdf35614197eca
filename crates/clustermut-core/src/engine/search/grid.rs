//! Bounding-box lattice scan over the unit centers of mass.
//!
//! Cost is O(points^3 * atoms^2): every lattice point farther than the
//! average spacing from the mover's old position gets a full collision test
//! of the whole geometry. This dominates the runtime of the strategy.

use super::{CandidatePoint, PlacementView};
use crate::core::models::geometry::Geometry;
use crate::core::utils::geometry::bounding_box;
use nalgebra::{Point3, Vector3};
use tracing::trace;

const SCALE_TOLERANCE: f64 = 1.0e-5;

/// Search box derived from the unit centers of mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
    /// Estimated average nearest-neighbour spacing of the centers.
    pub spacing: f64,
}

impl GridBox {
    /// Box around `coms`, padded outwards by `range_mod_factor * spacing` on
    /// every side when the factor is positive.
    ///
    /// Returns `None` for fewer than one center or a degenerate spacing.
    pub fn around(coms: &[Point3<f64>], range_mod_factor: f64) -> Option<Self> {
        let (mut min, mut max) = bounding_box(coms)?;
        let extent = max - min;
        let spacing = (extent.x + extent.y + extent.z) / (3.0 * (coms.len() as f64).cbrt());
        if !spacing.is_finite() || spacing <= 0.0 {
            return None;
        }
        if range_mod_factor > 0.0 {
            let pad = range_mod_factor * spacing;
            min -= Vector3::repeat(pad);
            max += Vector3::repeat(pad);
        }
        Some(Self { min, max, spacing })
    }

    /// Lattice coordinates along one axis: about `2 * extent / spacing`
    /// points starting at `begin`.
    fn axis(&self, begin: f64, end: f64) -> Vec<f64> {
        let extent = (end - begin).abs();
        let points = (extent / self.spacing * 2.0).round() as usize;
        if points == 0 {
            return Vec::new();
        }
        let increment = extent / points as f64;
        (0..points).map(|i| begin + i as f64 * increment).collect()
    }

    pub fn lattice(&self) -> impl Iterator<Item = Point3<f64>> {
        let xs = self.axis(self.min.x, self.max.x);
        let ys = self.axis(self.min.y, self.max.y);
        let zs = self.axis(self.min.z, self.max.z);
        itertools::iproduct!(xs, ys, zs).map(|(x, y, z)| Point3::new(x, y, z))
    }
}

/// Multiplies every center of mass by `factor`. Factors within `1e-5` of one
/// are ignored.
pub fn scale_coms(geometry: &mut Geometry, factor: f64) {
    if (factor - 1.0).abs() <= SCALE_TOLERANCE {
        return;
    }
    for index in 0..geometry.num_units() {
        if let Some(unit) = geometry.unit_mut(index) {
            let scaled = Point3::from(unit.com().coords * factor);
            unit.set_com(scaled);
        }
    }
}

pub(super) fn scan(view: &mut PlacementView<'_, '_>, range_mod_factor: f64) -> Vec<CandidatePoint> {
    let Some(grid) = GridBox::around(&view.geometry().coms(), range_mod_factor) else {
        return Vec::new();
    };
    let origin = view.origin();
    let exclusion_sq = grid.spacing * grid.spacing;

    let mut found = Vec::new();
    let mut near_origin = 0usize;
    for point in grid.lattice() {
        if (point - origin).norm_squared() <= exclusion_sq {
            near_origin += 1;
            continue;
        }
        let candidate = CandidatePoint::at(point);
        if view.try_place(&candidate) {
            found.push(candidate);
        }
    }
    trace!(
        spacing = grid.spacing,
        skipped_near_origin = near_origin,
        valid = found.len(),
        "Bounding-box grid scanned."
    );
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::unit::MolecularUnit;

    #[test]
    fn spacing_follows_the_cube_root_estimate() {
        let coms = [Point3::new(0.0, 0.0, 0.0), Point3::new(6.0, 3.0, 2.0)];
        let grid = GridBox::around(&coms, 0.0).unwrap();
        let expected = 11.0 / (3.0 * 2f64.cbrt());
        assert!((grid.spacing - expected).abs() < 1e-12);
        assert_eq!(grid.min, coms[0]);
        assert_eq!(grid.max, coms[1]);
    }

    #[test]
    fn lattice_starts_at_the_lower_corner() {
        let coms = [Point3::new(0.0, 0.0, 0.0), Point3::new(6.0, 3.0, 2.0)];
        let grid = GridBox::around(&coms, 0.0).unwrap();
        let points: Vec<_> = grid.lattice().collect();

        // 4 x 2 x 1 points with increments 1.5, 1.5 and 2.0.
        assert_eq!(points.len(), 8);
        assert_eq!(points[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(points[7], Point3::new(4.5, 1.5, 0.0));
    }

    #[test]
    fn padding_grows_the_box_on_every_side() {
        let coms = [Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 3.0, 3.0)];
        let plain = GridBox::around(&coms, 0.0).unwrap();
        let padded = GridBox::around(&coms, 0.5).unwrap();
        let pad = 0.5 * plain.spacing;
        assert!((padded.min.x + pad).abs() < 1e-12);
        assert!((padded.max.z - 3.0 - pad).abs() < 1e-12);
    }

    #[test]
    fn coincident_centers_give_no_grid() {
        let coms = [Point3::new(1.0, 1.0, 1.0); 3];
        assert_eq!(GridBox::around(&coms, 0.0), None);
        assert_eq!(GridBox::around(&[], 0.0), None);
    }

    #[test]
    fn planar_clusters_have_an_empty_lattice() {
        let coms = [Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 4.0, 0.0)];
        let grid = GridBox::around(&coms, 0.0).unwrap();
        assert_eq!(grid.lattice().count(), 0);
    }

    #[test]
    fn scaling_moves_every_center() {
        let units = vec![
            MolecularUnit::new(vec![Atom::new("Ne", Point3::new(1.0, 2.0, 3.0)).unwrap()]).unwrap(),
            MolecularUnit::new(vec![Atom::new("Ne", Point3::new(-1.0, 0.0, 0.5)).unwrap()]).unwrap(),
        ];
        let mut geometry = Geometry::unbonded(units).unwrap();

        scale_coms(&mut geometry, 1.000001);
        assert_eq!(geometry.unit(0).unwrap().com(), Point3::new(1.0, 2.0, 3.0));

        scale_coms(&mut geometry, 2.0);
        assert_eq!(geometry.unit(0).unwrap().com(), Point3::new(2.0, 4.0, 6.0));
        assert_eq!(geometry.unit(1).unwrap().com(), Point3::new(-2.0, 0.0, 1.0));
    }
}
