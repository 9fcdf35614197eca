//! Overlap ("collision") detection between atoms of a cluster geometry.
//!
//! Two atoms `i` and `j` collide when they are not bonded and
//! `|x_i - x_j|^2 <= (blow * (r_i + r_j))^2`. Two interchangeable strategies
//! are provided: an exhaustive pairwise scan and a k-d tree radius search for
//! large atom counts. Both return the same verdict for the same input.

use crate::core::models::bonds::BondInfo;
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::Point3;
use serde::Deserialize;

/// Relative slack on the k-d tree query radius; the exact test is re-applied afterwards.
const SPATIAL_QUERY_SLACK: f64 = 1.0 + 1e-9;

/// Borrowed view of the atoms a collision test runs on.
#[derive(Debug, Clone, Copy)]
pub struct AtomCloud<'a> {
    pub positions: &'a [Point3<f64>],
    pub radii: &'a [f64],
    pub bonds: &'a BondInfo,
}

impl<'a> AtomCloud<'a> {
    pub fn new(positions: &'a [Point3<f64>], radii: &'a [f64], bonds: &'a BondInfo) -> Self {
        debug_assert_eq!(positions.len(), radii.len());
        debug_assert_eq!(positions.len(), bonds.len());
        Self {
            positions,
            radii,
            bonds,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    fn collides(&self, i: usize, j: usize, distance_sq: f64, blow_factor: f64) -> bool {
        if self.bonds.has_bond(i, j) {
            return false;
        }
        let limit = blow_factor * (self.radii[i] + self.radii[j]);
        distance_sq <= limit * limit
    }
}

/// Dense symmetric matrix of interatomic distances.
///
/// The backing storage only ever grows; [`DistanceMatrix::resize`] changes
/// the logical dimension without shrinking capacity.
#[derive(Debug, Clone, Default)]
pub struct DistanceMatrix {
    dim: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    pub fn new(dim: usize) -> Self {
        let mut matrix = Self::default();
        matrix.resize(dim);
        matrix
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Sets the logical dimension and zeroes the visible entries.
    pub fn resize(&mut self, dim: usize) {
        self.dim = dim;
        let needed = dim * dim;
        if self.data.len() < needed {
            self.data.resize(needed, 0.0);
        }
        self.data[..needed].fill(0.0);
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, distance: f64) {
        self.data[i * self.dim + j] = distance;
        self.data[j * self.dim + i] = distance;
    }

    /// Recomputes every entry from `positions`.
    pub fn fill_from(&mut self, positions: &[Point3<f64>]) {
        self.resize(positions.len());
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                self.set(i, j, (positions[i] - positions[j]).norm());
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    pub first: usize,
    pub second: usize,
    pub distance: f64,
}

/// Result of a full collision check: colliding pairs plus pairwise distances.
///
/// The object is scratch space. Every check clears the previous collision list
/// before running, so an instance sized once can be reused for any number of
/// geometries without leaking stale results.
#[derive(Debug, Clone, Default)]
pub struct CollisionInfo {
    collisions: Vec<Collision>,
    distances: DistanceMatrix,
    distances_complete: bool,
}

impl CollisionInfo {
    pub fn with_capacity(atoms: usize) -> Self {
        Self {
            collisions: Vec::new(),
            distances: DistanceMatrix::new(atoms),
            distances_complete: false,
        }
    }

    /// Clears collision state and resizes the distance matrix for `atoms` atoms.
    pub fn prepare(&mut self, atoms: usize) {
        self.collisions.clear();
        self.distances.resize(atoms);
        self.distances_complete = false;
    }

    pub fn has_collision(&self) -> bool {
        !self.collisions.is_empty()
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    /// Whether every entry of the distance matrix belongs to the last check.
    pub fn distances_complete(&self) -> bool {
        self.distances_complete
    }

    /// Fills the distance matrix if the last check left it incomplete.
    pub fn ensure_distances(&mut self, positions: &[Point3<f64>]) {
        if !self.distances_complete || self.distances.dim() != positions.len() {
            self.distances.fill_from(positions);
            self.distances_complete = true;
        }
    }

    fn report(&mut self, first: usize, second: usize, distance: f64) {
        self.collisions.push(Collision {
            first,
            second,
            distance,
        });
    }
}

/// Strategy used to find colliding atom pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionStrategy {
    /// Exhaustive scan over all atom pairs.
    #[default]
    Pairwise,
    /// k-d tree radius queries; identical verdicts, cheaper for large clusters.
    Spatial,
}

impl CollisionStrategy {
    /// Runs a full check, recording every colliding pair into `info`.
    ///
    /// The pairwise strategy also fills the full distance matrix. The spatial
    /// strategy leaves it incomplete; call [`CollisionInfo::ensure_distances`]
    /// before reading it.
    pub fn check(&self, cloud: &AtomCloud<'_>, blow_factor: f64, info: &mut CollisionInfo) {
        info.prepare(cloud.len());
        match self {
            CollisionStrategy::Pairwise => pairwise_check(cloud, blow_factor, info),
            CollisionStrategy::Spatial => spatial_check(cloud, blow_factor, info),
        }
    }

    /// Returns `true` as soon as any collision is found.
    pub fn check_only(&self, cloud: &AtomCloud<'_>, blow_factor: f64) -> bool {
        match self {
            CollisionStrategy::Pairwise => pairwise_any(cloud, blow_factor),
            CollisionStrategy::Spatial => spatial_any(cloud, blow_factor),
        }
    }
}

fn pairwise_check(cloud: &AtomCloud<'_>, blow_factor: f64, info: &mut CollisionInfo) {
    let n = cloud.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let distance_sq = (cloud.positions[i] - cloud.positions[j]).norm_squared();
            let distance = distance_sq.sqrt();
            info.distances.set(i, j, distance);
            if cloud.collides(i, j, distance_sq, blow_factor) {
                info.report(i, j, distance);
            }
        }
    }
    info.distances_complete = true;
}

fn pairwise_any(cloud: &AtomCloud<'_>, blow_factor: f64) -> bool {
    let n = cloud.len();
    (0..n).any(|i| {
        ((i + 1)..n).any(|j| {
            let distance_sq = (cloud.positions[i] - cloud.positions[j]).norm_squared();
            cloud.collides(i, j, distance_sq, blow_factor)
        })
    })
}

fn build_tree(cloud: &AtomCloud<'_>) -> KdTree<f64, 3> {
    let points: Vec<[f64; 3]> = cloud.positions.iter().map(|p| [p.x, p.y, p.z]).collect();
    (&points).into()
}

/// Calls `on_pair(i, j, distance_sq)` for every colliding pair with `i < j`
/// until it returns `false`.
fn spatial_scan(
    cloud: &AtomCloud<'_>,
    blow_factor: f64,
    mut on_pair: impl FnMut(usize, usize, f64) -> bool,
) {
    if cloud.len() < 2 {
        return;
    }
    let tree = build_tree(cloud);
    let max_radius = cloud.radii.iter().copied().fold(0.0, f64::max);

    for (i, p) in cloud.positions.iter().enumerate() {
        let reach = blow_factor * (cloud.radii[i] + max_radius) * SPATIAL_QUERY_SLACK;
        let mut neighbours: Vec<(usize, f64)> = tree
            .within_unsorted::<SquaredEuclidean>(&[p.x, p.y, p.z], reach * reach)
            .into_iter()
            .map(|n| (n.item as usize, n.distance))
            .filter(|&(j, _)| j > i)
            .collect();
        neighbours.sort_unstable_by_key(|&(j, _)| j);

        for (j, _) in neighbours {
            let distance_sq = (cloud.positions[i] - cloud.positions[j]).norm_squared();
            if cloud.collides(i, j, distance_sq, blow_factor) && !on_pair(i, j, distance_sq) {
                return;
            }
        }
    }
}

fn spatial_check(cloud: &AtomCloud<'_>, blow_factor: f64, info: &mut CollisionInfo) {
    spatial_scan(cloud, blow_factor, |i, j, distance_sq| {
        info.report(i, j, distance_sq.sqrt());
        true
    });
}

fn spatial_any(cloud: &AtomCloud<'_>, blow_factor: f64) -> bool {
    let mut found = false;
    spatial_scan(cloud, blow_factor, |_, _, _| {
        found = true;
        false
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::bonds::BondState;

    const STRATEGIES: [CollisionStrategy; 2] =
        [CollisionStrategy::Pairwise, CollisionStrategy::Spatial];

    fn line(spacings: &[f64]) -> Vec<Point3<f64>> {
        let mut x = 0.0;
        let mut points = vec![Point3::new(0.0, 0.0, 0.0)];
        for s in spacings {
            x += s;
            points.push(Point3::new(x, 0.0, 0.0));
        }
        points
    }

    #[test]
    fn two_atoms_closer_than_summed_radii_collide() {
        let radii = [1.0, 1.0];
        let bonds = BondInfo::new(2);
        for strategy in STRATEGIES {
            let close = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.5, 0.0, 0.0)];
            assert!(strategy.check_only(&AtomCloud::new(&close, &radii, &bonds), 1.0));

            let apart = [Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 0.0, 0.0)];
            assert!(!strategy.check_only(&AtomCloud::new(&apart, &radii, &bonds), 1.0));
        }
    }

    #[test]
    fn touching_atoms_count_as_colliding() {
        let radii = [1.0, 1.0];
        let bonds = BondInfo::new(2);
        let positions = [Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 2.0, 0.0)];
        for strategy in STRATEGIES {
            assert!(strategy.check_only(&AtomCloud::new(&positions, &radii, &bonds), 1.0));
        }
    }

    #[test]
    fn blow_factor_scales_the_threshold() {
        let radii = [1.0, 1.0];
        let bonds = BondInfo::new(2);
        let positions = [Point3::new(0.0, 0.0, 0.0), Point3::new(2.5, 0.0, 0.0)];
        let cloud = AtomCloud::new(&positions, &radii, &bonds);
        for strategy in STRATEGIES {
            assert!(!strategy.check_only(&cloud, 1.0));
            assert!(strategy.check_only(&cloud, 1.3));
        }
    }

    #[test]
    fn bonded_pairs_never_collide() {
        let radii = [1.0, 1.0, 1.0];
        let mut bonds = BondInfo::new(3);
        bonds.set(0, 1, BondState::Bonded);
        bonds.set(1, 2, BondState::Uncertain);
        let positions = [Point3::origin(); 3];
        let cloud = AtomCloud::new(&positions, &radii, &bonds);

        for strategy in STRATEGIES {
            let mut info = CollisionInfo::default();
            strategy.check(&cloud, 5.0, &mut info);
            let pairs: Vec<_> = info.collisions().iter().map(|c| (c.first, c.second)).collect();
            assert_eq!(pairs, vec![(0, 2)]);
        }
    }

    #[test]
    fn collision_verdict_is_symmetric_in_atom_order() {
        let positions = line(&[1.2, 2.5, 0.9, 3.1]);
        let radii = [0.7, 0.5, 1.1, 0.4, 0.9];
        let bonds = BondInfo::new(5);

        let mut reversed_positions = positions.clone();
        reversed_positions.reverse();
        let mut reversed_radii = radii;
        reversed_radii.reverse();

        for strategy in STRATEGIES {
            let mut forward = CollisionInfo::default();
            strategy.check(&AtomCloud::new(&positions, &radii, &bonds), 1.0, &mut forward);
            let mut backward = CollisionInfo::default();
            strategy.check(
                &AtomCloud::new(&reversed_positions, &reversed_radii, &bonds),
                1.0,
                &mut backward,
            );

            let mut mapped: Vec<(usize, usize)> = backward
                .collisions()
                .iter()
                .map(|c| {
                    let (a, b) = (4 - c.first, 4 - c.second);
                    (a.min(b), a.max(b))
                })
                .collect();
            mapped.sort_unstable();
            let direct: Vec<(usize, usize)> =
                forward.collisions().iter().map(|c| (c.first, c.second)).collect();
            assert_eq!(direct, mapped);
        }
    }

    #[test]
    fn strategies_agree_on_random_clouds() {
        use rand::{Rng, SeedableRng, rngs::StdRng};
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let n = rng.gen_range(2..40);
            let positions: Vec<Point3<f64>> = (0..n)
                .map(|_| {
                    Point3::new(
                        rng.gen_range(-5.0..5.0),
                        rng.gen_range(-5.0..5.0),
                        rng.gen_range(-5.0..5.0),
                    )
                })
                .collect();
            let radii: Vec<f64> = (0..n).map(|_| rng.gen_range(0.3..1.5)).collect();
            let mut bonds = BondInfo::new(n);
            bonds.set(0, 1, BondState::Bonded);

            let cloud = AtomCloud::new(&positions, &radii, &bonds);
            let mut pairwise = CollisionInfo::default();
            let mut spatial = CollisionInfo::default();
            CollisionStrategy::Pairwise.check(&cloud, 1.0, &mut pairwise);
            CollisionStrategy::Spatial.check(&cloud, 1.0, &mut spatial);

            let a: Vec<_> = pairwise.collisions().iter().map(|c| (c.first, c.second)).collect();
            let b: Vec<_> = spatial.collisions().iter().map(|c| (c.first, c.second)).collect();
            assert_eq!(a, b);
            assert_eq!(
                CollisionStrategy::Pairwise.check_only(&cloud, 1.0),
                CollisionStrategy::Spatial.check_only(&cloud, 1.0)
            );
        }
    }

    #[test]
    fn pairwise_check_fills_distance_matrix() {
        let positions = line(&[3.0, 4.0]);
        let radii = [0.5; 3];
        let bonds = BondInfo::new(3);
        let mut info = CollisionInfo::default();
        CollisionStrategy::Pairwise.check(&AtomCloud::new(&positions, &radii, &bonds), 1.0, &mut info);

        assert!(info.distances_complete());
        assert!(!info.has_collision());
        assert!((info.distances().get(0, 2) - 7.0).abs() < 1e-12);
        assert!((info.distances().get(2, 0) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn spatial_check_distances_are_filled_on_demand() {
        let positions = line(&[3.0, 4.0]);
        let radii = [0.5; 3];
        let bonds = BondInfo::new(3);
        let mut info = CollisionInfo::default();
        CollisionStrategy::Spatial.check(&AtomCloud::new(&positions, &radii, &bonds), 1.0, &mut info);

        assert!(!info.distances_complete());
        info.ensure_distances(&positions);
        assert!((info.distances().get(1, 2) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn reused_info_does_not_leak_previous_collisions() {
        let radii = [1.0; 4];
        let mut info = CollisionInfo::with_capacity(4);

        let crowded = [Point3::origin(); 4];
        let bonds4 = BondInfo::new(4);
        CollisionStrategy::Pairwise.check(&AtomCloud::new(&crowded, &radii, &bonds4), 1.0, &mut info);
        assert_eq!(info.collisions().len(), 6);

        let sparse = line(&[5.0]);
        let bonds2 = BondInfo::new(2);
        CollisionStrategy::Pairwise.check(
            &AtomCloud::new(&sparse, &radii[..2], &bonds2),
            1.0,
            &mut info,
        );
        assert!(!info.has_collision());
        assert_eq!(info.distances().dim(), 2);
        assert!((info.distances().get(0, 1) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn single_and_empty_clouds_never_collide() {
        let bonds0 = BondInfo::new(0);
        let bonds1 = BondInfo::new(1);
        for strategy in STRATEGIES {
            assert!(!strategy.check_only(&AtomCloud::new(&[], &[], &bonds0), 1.0));
            assert!(!strategy.check_only(
                &AtomCloud::new(&[Point3::origin()], &[1.0], &bonds1),
                1.0
            ));
        }
    }
}
