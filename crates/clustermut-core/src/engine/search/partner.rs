use super::{CandidatePoint, PlacementView};
use nalgebra::{Point3, Vector3};
use std::f64::consts::{FRAC_PI_2, PI};
use tracing::trace;

/// Regular Euler grid with `phi, psi` in `[-pi, pi)` and `omega` in `[-pi/2, pi/2)`.
fn euler_grid(increment: f64) -> Vec<Vector3<f64>> {
    let around = (2.0 * PI / increment).floor() as usize;
    let half = (PI / increment).floor() as usize;
    itertools::iproduct!(0..around, 0..half, 0..around)
        .map(|(i, j, k)| {
            Vector3::new(
                -PI + i as f64 * increment,
                -FRAC_PI_2 + j as f64 * increment,
                -PI + k as f64 * increment,
            )
        })
        .collect()
}

/// Cubic lattice of half-width `half_length` around the partner's center.
///
/// Single-atom movers are tried at each point with their current
/// orientation; larger movers are tried in every orientation of the Euler
/// grid. The partner's own center is skipped.
pub(super) fn scan(
    view: &mut PlacementView<'_, '_>,
    partner: usize,
    half_length: f64,
    increment: f64,
    euler_increment: f64,
) -> Vec<CandidatePoint> {
    let Some(center) = view.geometry().unit(partner).map(|u| u.com()) else {
        return Vec::new();
    };
    let orientations = if view.unit().len() > 1 {
        euler_grid(euler_increment)
    } else {
        Vec::new()
    };

    let points = (2.0 * half_length / increment).ceil() as usize;
    let offset = |i: usize| -half_length + i as f64 * increment;

    let mut found = Vec::new();
    for (x, y, z) in itertools::iproduct!(0..points, 0..points, 0..points) {
        let com = Point3::new(
            center.x + offset(x),
            center.y + offset(y),
            center.z + offset(z),
        );
        if (com - center).norm_squared() < f64::EPSILON {
            continue;
        }
        if orientations.is_empty() {
            let candidate = CandidatePoint::at(com);
            if view.try_place(&candidate) {
                found.push(candidate);
            }
            continue;
        }
        for orientation in &orientations {
            let candidate = CandidatePoint::oriented(com, *orientation);
            if view.try_place(&candidate) {
                found.push(candidate);
            }
        }
    }
    trace!(
        partner,
        points_per_axis = points,
        orientations = orientations.len().max(1),
        valid = found.len(),
        "Partner grid scanned."
    );
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collision::CollisionStrategy;
    use crate::core::models::atom::Atom;
    use crate::core::models::geometry::Geometry;
    use crate::core::models::unit::MolecularUnit;
    use crate::engine::metrics::MutationMetrics;
    use crate::engine::workspace::{MutationWorkspace, Validator};

    fn validator() -> Validator<'static> {
        Validator {
            strategy: CollisionStrategy::Pairwise,
            collision_blow_factor: 1.0,
            dissociation: None,
        }
    }

    #[test]
    fn euler_grid_covers_the_angle_ranges() {
        let grid = euler_grid(FRAC_PI_2);
        // 4 x 2 x 4 orientations.
        assert_eq!(grid.len(), 32);
        assert_eq!(grid[0], Vector3::new(-PI, -FRAC_PI_2, -PI));
        assert!(grid.iter().all(|e| e.y < FRAC_PI_2 && e.x < PI && e.z < PI));
    }

    #[test]
    fn single_atoms_get_a_com_only_lattice() {
        let units = vec![
            MolecularUnit::new(vec![Atom::new("He", Point3::new(0.0, 0.0, 0.0)).unwrap()]).unwrap(),
            MolecularUnit::new(vec![Atom::new("He", Point3::new(30.0, 0.0, 0.0)).unwrap()])
                .unwrap(),
        ];
        let mut geometry = Geometry::unbonded(units).unwrap();
        let mut ws = MutationWorkspace::new();
        let metrics = MutationMetrics::new();
        let mut view = PlacementView::new(&mut geometry, &mut ws, validator(), &metrics, 1).unwrap();

        let found = scan(&mut view, 0, 1.0, 1.0, FRAC_PI_2);
        view.restore();

        // 2 x 2 x 2 lattice from -1 to 0 on every axis; the partner's own center is skipped.
        assert_eq!(metrics.snapshot().candidates_generated, 7);
        assert!(found.iter().all(|c| c.orientation.is_none()));
        assert!(found.iter().all(|c| c.com.coords.norm() > 0.0));
    }

    #[test]
    fn molecules_are_tried_in_every_grid_orientation() {
        let units = vec![
            MolecularUnit::new(vec![Atom::new("He", Point3::new(0.0, 0.0, 0.0)).unwrap()]).unwrap(),
            MolecularUnit::new(vec![
                Atom::new("H", Point3::new(20.0, 0.0, 0.0)).unwrap(),
                Atom::new("H", Point3::new(20.74, 0.0, 0.0)).unwrap(),
            ])
            .unwrap(),
        ];
        let mut geometry = Geometry::unbonded(units).unwrap();
        let mut ws = MutationWorkspace::new();
        let metrics = MutationMetrics::new();
        let mut view = PlacementView::new(&mut geometry, &mut ws, validator(), &metrics, 1).unwrap();

        let found = scan(&mut view, 0, 4.0, 8.0, FRAC_PI_2);
        view.restore();

        // One lattice point at (-4, -4, -4), far from the partner.
        assert_eq!(found.len(), 32);
        assert!(found.iter().all(|c| c.orientation.is_some()));
    }
}
