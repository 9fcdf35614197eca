//! Caller-owned scratch state for mutation and packing calls.
//!
//! A [`MutationWorkspace`] holds the flattened coordinates, radii and atomic
//! numbers of the atoms under test together with the collision scratch
//! buffers. It is sized by the largest geometry it has seen and reused across
//! calls; every validity check starts from a cleared collision report. One
//! workspace per worker, never shared between concurrent calls.

use super::metrics::MutationMetrics;
use crate::core::collision::{AtomCloud, CollisionInfo, CollisionStrategy};
use crate::core::dissociation::DissociationPredicate;
use crate::core::models::bonds::BondInfo;
use crate::core::models::geometry::Geometry;
use nalgebra::Point3;

/// Dissociation half of a validity test.
#[derive(Clone, Copy)]
pub struct DissociationCheck<'a> {
    pub predicate: &'a dyn DissociationPredicate,
    pub blow_factor: f64,
}

/// Acceptance rule for a trial placement: no collision and, optionally,
/// no dissociation.
#[derive(Clone, Copy)]
pub struct Validator<'a> {
    pub strategy: CollisionStrategy,
    pub collision_blow_factor: f64,
    pub dissociation: Option<DissociationCheck<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Collision,
    Dissociated,
}

#[derive(Debug, Default, Clone)]
pub struct MutationWorkspace {
    units: Vec<usize>,
    offsets: Vec<usize>,
    positions: Vec<Point3<f64>>,
    radii: Vec<f64>,
    atomic_numbers: Vec<u8>,
    collision: CollisionInfo,
}

impl MutationWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(atoms: usize) -> Self {
        Self {
            positions: Vec::with_capacity(atoms),
            radii: Vec::with_capacity(atoms),
            atomic_numbers: Vec::with_capacity(atoms),
            collision: CollisionInfo::with_capacity(atoms),
            ..Self::default()
        }
    }

    /// Loads every unit of `geometry`, in order.
    pub fn load(&mut self, geometry: &Geometry) {
        let all: Vec<usize> = (0..geometry.num_units()).collect();
        self.load_units(geometry, &all);
    }

    /// Loads only the listed units, in the listed order.
    ///
    /// # Panics
    ///
    /// Panics if any index in `units` is out of range for `geometry`.
    pub fn load_units(&mut self, geometry: &Geometry, units: &[usize]) {
        self.units.clear();
        self.units.extend_from_slice(units);
        self.offsets.clear();
        self.radii.clear();
        self.atomic_numbers.clear();

        let mut offset = 0;
        for &index in units {
            self.offsets.push(offset);
            let unit = &geometry.units()[index];
            for atom in unit.atoms() {
                self.radii.push(atom.radius);
                self.atomic_numbers.push(atom.atomic_number);
            }
            offset += unit.len();
        }
        self.offsets.push(offset);
        self.refresh_positions(geometry);
    }

    /// Recomputes the coordinates of every loaded unit from `geometry`.
    pub fn refresh_positions(&mut self, geometry: &Geometry) {
        self.positions.clear();
        for &index in &self.units {
            geometry.units()[index].extend_cartesians(&mut self.positions);
        }
    }

    /// Recomputes the coordinates of a single loaded unit. Does nothing if
    /// `unit` is not loaded.
    pub fn refresh_unit(&mut self, geometry: &Geometry, unit: usize) {
        if let Some(slot) = self.units.iter().position(|&u| u == unit) {
            let range = self.offsets[slot]..self.offsets[slot + 1];
            geometry.units()[unit].write_cartesians(&mut self.positions[range]);
        }
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    pub fn atomic_numbers(&self) -> &[u8] {
        &self.atomic_numbers
    }

    pub fn num_atoms(&self) -> usize {
        self.positions.len()
    }

    /// Whether the loaded atoms pass `validator`. `bonds` must cover exactly
    /// the loaded atoms.
    pub fn accepts(
        &mut self,
        bonds: &BondInfo,
        validator: &Validator<'_>,
        metrics: &MutationMetrics,
    ) -> bool {
        self.verdict(bonds, validator, metrics) == Verdict::Valid
    }

    /// Like [`accepts`](Self::accepts) but says which test failed.
    pub fn verdict(
        &mut self,
        bonds: &BondInfo,
        validator: &Validator<'_>,
        metrics: &MutationMetrics,
    ) -> Verdict {
        metrics.record_collision_check();
        let cloud = AtomCloud::new(&self.positions, &self.radii, bonds);
        let Some(dissociation) = validator.dissociation else {
            return if validator
                .strategy
                .check_only(&cloud, validator.collision_blow_factor)
            {
                Verdict::Collision
            } else {
                Verdict::Valid
            };
        };

        validator
            .strategy
            .check(&cloud, validator.collision_blow_factor, &mut self.collision);
        if self.collision.has_collision() {
            return Verdict::Collision;
        }
        self.collision.ensure_distances(&self.positions);
        if dissociation.predicate.is_dissociated(
            self.collision.distances(),
            &self.radii,
            &self.atomic_numbers,
            dissociation.blow_factor,
        ) {
            Verdict::Dissociated
        } else {
            Verdict::Valid
        }
    }

    /// Full collision report for the loaded atoms, with distances filled in.
    pub fn collision_report(
        &mut self,
        bonds: &BondInfo,
        strategy: CollisionStrategy,
        blow_factor: f64,
    ) -> &CollisionInfo {
        let cloud = AtomCloud::new(&self.positions, &self.radii, bonds);
        strategy.check(&cloud, blow_factor, &mut self.collision);
        self.collision.ensure_distances(&self.positions);
        &self.collision
    }

    /// Whether the loaded atoms are dissociated under `check`. Runs on the
    /// current coordinates.
    pub fn is_dissociated(&mut self, check: &DissociationCheck<'_>) -> bool {
        self.collision.prepare(self.positions.len());
        self.collision.ensure_distances(&self.positions);
        check.predicate.is_dissociated(
            self.collision.distances(),
            &self.radii,
            &self.atomic_numbers,
            check.blow_factor,
        )
    }
}
