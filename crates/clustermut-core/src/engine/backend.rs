//! Narrow contracts for the collaborators the mutation engine calls out to.
//!
//! Energies come from a [`FitnessBackend`], relaxations from a
//! [`LocalOptimizer`], and surface classification from a [`SurfaceDetector`].
//! None of them are implemented here. Backend results pass through
//! [`EnergyEvaluation::sanitized`] so that numeric anomalies become poor
//! fitness instead of errors.

use super::error::EngineError;
use crate::core::models::geometry::Geometry;
use nalgebra::Point3;
use tracing::warn;

/// Energy reported for any evaluation that did not converge or was not physical.
pub const NON_CONVERGED_ENERGY: f64 = 1.0e10;

/// Energies below this value are treated as numerical breakdown.
pub const MIN_PHYSICAL_ENERGY: f64 = -1.0e8;

/// Whole-cluster energy with its per-unit decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyEvaluation {
    pub total: f64,
    pub unit_energies: Vec<f64>,
}

impl EnergyEvaluation {
    pub fn new(total: f64, unit_energies: Vec<f64>) -> Self {
        Self {
            total,
            unit_energies,
        }
    }

    pub fn non_converged(units: usize) -> Self {
        Self {
            total: NON_CONVERGED_ENERGY,
            unit_energies: vec![NON_CONVERGED_ENERGY; units],
        }
    }

    pub fn is_converged(&self) -> bool {
        self.total < NON_CONVERGED_ENERGY
    }

    /// Index of the unit with the largest energy contribution among `candidates`.
    ///
    /// Ties keep the earliest candidate.
    pub fn worst_unit(&self, candidates: impl IntoIterator<Item = usize>) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for unit in candidates {
            let Some(&energy) = self.unit_energies.get(unit) else {
                continue;
            };
            match best {
                Some((_, current)) if energy <= current => {}
                _ => best = Some((unit, energy)),
            }
        }
        best.map(|(unit, _)| unit)
    }

    /// Replaces non-finite or unphysically low energies with the sentinel.
    ///
    /// A decomposition whose length does not match `units` is replaced with
    /// sentinel parts while a valid total is kept.
    pub fn sanitized(mut self, units: usize) -> Self {
        if !self.total.is_finite() || self.total < MIN_PHYSICAL_ENERGY {
            warn!(
                total = self.total,
                "Energy backend returned an unphysical total; using the non-converged sentinel."
            );
            return Self::non_converged(units);
        }
        if self.unit_energies.len() != units {
            warn!(
                expected = units,
                got = self.unit_energies.len(),
                "Energy decomposition has the wrong length; parts replaced by the sentinel."
            );
            self.unit_energies = vec![NON_CONVERGED_ENERGY; units];
            return self;
        }
        for part in self.unit_energies.iter_mut() {
            if !part.is_finite() || *part < MIN_PHYSICAL_ENERGY {
                *part = NON_CONVERGED_ENERGY;
            }
        }
        self
    }
}

/// Computes the energy of a geometry.
///
/// `coordinates` holds the flattened Cartesian positions of every atom in
/// global atom order; atom data and bonds are available through `geometry`.
/// Implementations report failure by returning
/// [`EnergyEvaluation::non_converged`] rather than panicking. They are called
/// many times per mutation and must not keep per-call state.
pub trait FitnessBackend: Send + Sync {
    fn energy(&self, geometry: &Geometry, coordinates: &[Point3<f64>]) -> EnergyEvaluation;
}

/// Result of a whole-cluster local optimization.
#[derive(Debug, Clone)]
pub struct Relaxed {
    pub geometry: Geometry,
    pub energy: EnergyEvaluation,
}

pub trait LocalOptimizer: Send + Sync {
    fn optimize(&self, geometry: &Geometry) -> Result<Relaxed, EngineError>;
}

/// Classifies which units lie on the outer boundary of a cluster.
pub trait SurfaceDetector: Send + Sync {
    /// Returns the indices of the surface units of `geometry`.
    ///
    /// `excluded_unit` is the unit about to be relocated; detectors may ignore
    /// it when computing the surface.
    fn detect(&self, geometry: &Geometry, excluded_unit: Option<usize>) -> Vec<usize>;
}

pub(crate) fn evaluate(backend: &dyn FitnessBackend, geometry: &Geometry) -> EnergyEvaluation {
    let coordinates = geometry.cartesians();
    backend
        .energy(geometry, &coordinates)
        .sanitized(geometry.num_units())
}

/// Runs the optimizer and checks that the chemical identity survived.
pub(crate) fn relax(
    optimizer: &dyn LocalOptimizer,
    geometry: &Geometry,
) -> Result<Relaxed, EngineError> {
    let relaxed = optimizer.optimize(geometry)?;
    if !relaxed.geometry.same_composition(geometry) {
        return Err(EngineError::Optimization {
            reason: "optimizer changed the composition of the cluster".to_string(),
        });
    }
    let units = relaxed.geometry.num_units();
    Ok(Relaxed {
        energy: relaxed.energy.sanitized(units),
        geometry: relaxed.geometry,
    })
}

/// Surface units of `geometry`, with out-of-range and excluded indices dropped.
pub(crate) fn surface_units(
    detector: &dyn SurfaceDetector,
    geometry: &Geometry,
    excluded_unit: Option<usize>,
) -> Vec<usize> {
    let raw = detector.detect(geometry, excluded_unit);
    let n = geometry.num_units();
    let filtered: Vec<usize> = raw
        .iter()
        .copied()
        .filter(|&u| u < n && Some(u) != excluded_unit)
        .collect();
    if filtered.len() != raw.len() {
        warn!(
            reported = raw.len(),
            kept = filtered.len(),
            "Surface detector reported invalid or excluded units; they were dropped."
        );
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_and_infinite_totals_become_the_sentinel() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -1.0e9] {
            let e = EnergyEvaluation::new(bad, vec![0.0, 0.0]).sanitized(2);
            assert_eq!(e.total, NON_CONVERGED_ENERGY);
            assert_eq!(e.unit_energies, vec![NON_CONVERGED_ENERGY; 2]);
            assert!(!e.is_converged());
        }
    }

    #[test]
    fn valid_evaluations_pass_through_unchanged() {
        let e = EnergyEvaluation::new(-3.5, vec![-1.0, -2.5]);
        assert_eq!(e.clone().sanitized(2), e);
        assert!(e.is_converged());
    }

    #[test]
    fn bad_parts_are_replaced_individually() {
        let e = EnergyEvaluation::new(-1.0, vec![f64::NAN, -1.0]).sanitized(2);
        assert_eq!(e.total, -1.0);
        assert_eq!(e.unit_energies, vec![NON_CONVERGED_ENERGY, -1.0]);
    }

    #[test]
    fn mismatched_decomposition_keeps_the_total() {
        let e = EnergyEvaluation::new(-1.0, vec![-1.0]).sanitized(3);
        assert_eq!(e.total, -1.0);
        assert_eq!(e.unit_energies.len(), 3);
    }

    #[test]
    fn worst_unit_picks_the_first_maximum() {
        let e = EnergyEvaluation::new(0.0, vec![1.0, 3.0, 3.0, 2.0]);
        assert_eq!(e.worst_unit(0..4), Some(1));
        assert_eq!(e.worst_unit([0, 2, 3]), Some(2));
        assert_eq!(e.worst_unit(std::iter::empty()), None);
    }
}
