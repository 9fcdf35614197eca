//! Fragmentation ("dissociation") detection.
//!
//! A structure is dissociated when the graph whose edges join every atom pair
//! with `(r_i + r_j) * blow >= d_ij` is not connected.

use crate::core::collision::DistanceMatrix;

/// Decides whether a structure has split into disconnected fragments.
pub trait DissociationPredicate: Send + Sync {
    /// Returns `true` if the atoms described by `distances` are dissociated.
    ///
    /// `radii` and `atomic_numbers` are indexed like the distance matrix.
    fn is_dissociated(
        &self,
        distances: &DistanceMatrix,
        radii: &[f64],
        atomic_numbers: &[u8],
        blow_factor: f64,
    ) -> bool;
}

/// Connectivity check by depth-first traversal of the contact graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphDissociation;

impl DissociationPredicate for GraphDissociation {
    fn is_dissociated(
        &self,
        distances: &DistanceMatrix,
        radii: &[f64],
        _atomic_numbers: &[u8],
        blow_factor: f64,
    ) -> bool {
        let n = radii.len().min(distances.dim());
        if n < 2 {
            return false;
        }

        let mut visited = vec![false; n];
        let mut stack = vec![0usize];
        visited[0] = true;
        let mut reached = 1;

        while let Some(i) = stack.pop() {
            for j in 0..n {
                if visited[j] {
                    continue;
                }
                if (radii[i] + radii[j]) * blow_factor >= distances.get(i, j) {
                    visited[j] = true;
                    reached += 1;
                    stack.push(j);
                }
            }
        }

        reached != n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn matrix_for(points: &[Point3<f64>]) -> DistanceMatrix {
        let mut m = DistanceMatrix::default();
        m.fill_from(points);
        m
    }

    #[test]
    fn chain_within_reach_is_connected() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        ];
        let m = matrix_for(&points);
        assert!(!GraphDissociation.is_dissociated(&m, &[1.0; 3], &[18; 3], 1.0));
    }

    #[test]
    fn isolated_atom_is_dissociated() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
        ];
        let m = matrix_for(&points);
        assert!(GraphDissociation.is_dissociated(&m, &[1.0; 3], &[18; 3], 1.0));
        assert!(!GraphDissociation.is_dissociated(&m, &[1.0; 3], &[18; 3], 4.0));
    }

    #[test]
    fn connectivity_is_transitive() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(6.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
        ];
        let m = matrix_for(&points);
        assert!(!GraphDissociation.is_dissociated(&m, &[1.5; 3], &[6; 3], 1.0));
    }

    #[test]
    fn tiny_structures_are_never_dissociated() {
        let m = matrix_for(&[Point3::origin()]);
        assert!(!GraphDissociation.is_dissociated(&m, &[1.0], &[1], 1.0));
        let empty = DistanceMatrix::default();
        assert!(!GraphDissociation.is_dissociated(&empty, &[], &[], 1.0));
    }
}
