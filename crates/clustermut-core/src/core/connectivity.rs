//! Geometric bond detection and the inter-unit contact ranking built on it.

use crate::core::models::bonds::{BondInfo, BondState};
use crate::core::models::geometry::Geometry;
use crate::core::models::unit::MolecularUnit;
use nalgebra::Point3;

/// Marks every atom pair with `d^2 <= (blow * (r_i + r_j))^2` as an uncertain bond.
pub fn detect_bonds(positions: &[Point3<f64>], radii: &[f64], blow_factor: f64) -> BondInfo {
    let n = positions.len();
    let mut bonds = BondInfo::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            let limit = blow_factor * (radii[i] + radii[j]);
            if (positions[i] - positions[j]).norm_squared() <= limit * limit {
                bonds.set(i, j, BondState::Uncertain);
            }
        }
    }
    bonds
}

/// Detects bonds over the current Cartesian coordinates of a geometry.
pub fn detect_geometry_bonds(geometry: &Geometry, blow_factor: f64) -> BondInfo {
    let radii: Vec<f64> = geometry.atoms().map(|a| a.radius).collect();
    detect_bonds(&geometry.cartesians(), &radii, blow_factor)
}

/// Bond table holding only bonds inside each unit, detected on the units'
/// reference frames and marked [`BondState::Bonded`].
///
/// This is the usual starting topology for rigid-unit clusters: atoms of one
/// molecule never collide with each other, atoms of different molecules always can.
pub fn intramolecular_bonds(units: &[MolecularUnit], blow_factor: f64) -> BondInfo {
    let total = units.iter().map(MolecularUnit::len).sum();
    let mut bonds = BondInfo::new(total);
    let mut offset = 0;
    for unit in units {
        let atoms = unit.atoms();
        for a in 0..atoms.len() {
            for b in (a + 1)..atoms.len() {
                let limit = blow_factor * (atoms[a].radius + atoms[b].radius);
                if (atoms[a].position - atoms[b].position).norm_squared() <= limit * limit {
                    bonds.set(offset + a, offset + b, BondState::Bonded);
                }
            }
        }
        offset += atoms.len();
    }
    bonds
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitContacts {
    pub unit: usize,
    /// Number of bonds from this unit's atoms to atoms of other units.
    pub contacts: usize,
}

/// Units ordered by their inter-unit contact count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityRanking {
    entries: Vec<UnitContacts>,
}

impl ConnectivityRanking {
    /// Builds an ascending ranking from per-unit counts; ties keep unit order.
    pub fn from_counts(counts: &[usize]) -> Self {
        let mut entries: Vec<UnitContacts> = counts
            .iter()
            .enumerate()
            .map(|(unit, &contacts)| UnitContacts { unit, contacts })
            .collect();
        entries.sort_by_key(|e| e.contacts);
        Self { entries }
    }

    pub fn entries(&self) -> &[UnitContacts] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Contact counts indexed by unit.
    pub fn counts_by_unit(&self) -> Vec<usize> {
        let mut counts = vec![0; self.entries.len()];
        for e in &self.entries {
            counts[e.unit] = e.contacts;
        }
        counts
    }

    pub fn total_contacts(&self) -> usize {
        self.entries.iter().map(|e| e.contacts).sum()
    }

    /// Least connected unit that is not in `excluded`.
    pub fn least_connected_excluding(&self, excluded: &[usize]) -> Option<usize> {
        self.entries
            .iter()
            .map(|e| e.unit)
            .find(|u| !excluded.contains(u))
    }

    /// Least connected unit regardless of any exclusion.
    pub fn least_connected(&self) -> Option<usize> {
        self.entries.first().map(|e| e.unit)
    }

    /// First unit in ranking order that differs from `mover`.
    pub fn move_partner(&self, mover: usize) -> Option<usize> {
        self.entries
            .iter()
            .map(|e| e.unit)
            .find(|&u| u != mover)
    }
}

/// Ranks the units of a geometry by how many bonds cross their boundary.
///
/// Bonds are detected geometrically with `bond_blow_factor`. Both ends of a
/// cross-unit bond count towards their own unit, so the total over all units
/// is always even.
pub fn rank(geometry: &Geometry, bond_blow_factor: f64) -> ConnectivityRanking {
    let bonds = detect_geometry_bonds(geometry, bond_blow_factor);
    let owners = geometry.atom_owners();
    let mut counts = vec![0usize; geometry.num_units()];
    for (i, j, _) in bonds.bonds() {
        if owners[i] != owners[j] {
            counts[owners[i]] += 1;
            counts[owners[j]] += 1;
        }
    }
    ConnectivityRanking::from_counts(&counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;

    fn single(symbol: &str, x: f64, y: f64) -> MolecularUnit {
        MolecularUnit::new(vec![Atom::new(symbol, Point3::new(x, y, 0.0)).unwrap()]).unwrap()
    }

    fn chain_of_three() -> Geometry {
        Geometry::unbonded(vec![
            single("C", 0.0, 0.0),
            single("C", 1.5, 0.0),
            single("C", 3.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn linear_chain_ranks_ends_first() {
        let ranking = rank(&chain_of_three(), 1.0);

        assert_eq!(ranking.counts_by_unit(), vec![1, 2, 1]);
        let order: Vec<usize> = ranking.entries().iter().map(|e| e.unit).collect();
        assert_eq!(order, vec![0, 2, 1]);
        assert_eq!(ranking.least_connected_excluding(&[]), Some(0));
    }

    #[test]
    fn first_unseen_policy_skips_excluded_units() {
        let ranking = rank(&chain_of_three(), 1.0);
        assert_eq!(ranking.least_connected_excluding(&[0]), Some(2));
        assert_eq!(ranking.least_connected_excluding(&[0, 2]), Some(1));
        assert_eq!(ranking.least_connected_excluding(&[0, 1, 2]), None);
        assert_eq!(ranking.least_connected(), Some(0));
    }

    #[test]
    fn move_partner_is_first_other_unit() {
        let ranking = rank(&chain_of_three(), 1.0);
        assert_eq!(ranking.move_partner(0), Some(2));
        assert_eq!(ranking.move_partner(2), Some(0));
    }

    #[test]
    fn ties_keep_unit_order() {
        let isolated = Geometry::unbonded(vec![
            single("Ar", 0.0, 0.0),
            single("Ar", 10.0, 0.0),
            single("Ar", 20.0, 0.0),
        ])
        .unwrap();
        let ranking = rank(&isolated, 1.0);
        let order: Vec<usize> = ranking.entries().iter().map(|e| e.unit).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(ranking.total_contacts(), 0);
    }

    #[test]
    fn total_contact_count_is_even() {
        let water_like = |x: f64| {
            MolecularUnit::new(vec![
                Atom::new("O", Point3::new(x, 0.0, 0.0)).unwrap(),
                Atom::new("H", Point3::new(x + 0.96, 0.0, 0.0)).unwrap(),
            ])
            .unwrap()
        };
        let geometry = Geometry::unbonded(vec![
            water_like(0.0),
            water_like(1.9),
            water_like(3.8),
            single("C", 1.0, 1.2),
        ])
        .unwrap();
        let ranking = rank(&geometry, 1.3);
        assert!(ranking.total_contacts() > 0);
        assert_eq!(ranking.total_contacts() % 2, 0);
    }

    #[test]
    fn intramolecular_bonds_ignore_other_units() {
        let diatomic = MolecularUnit::new(vec![
            Atom::new("C", Point3::new(0.0, 0.0, 0.0)).unwrap(),
            Atom::new("O", Point3::new(1.13, 0.0, 0.0)).unwrap(),
        ])
        .unwrap();
        let mut touching = single("C", 0.0, 0.0);
        touching.set_com(Point3::new(1.0, 0.0, 0.0));

        let bonds = intramolecular_bonds(&[diatomic, touching], 1.2);
        assert_eq!(bonds.state(0, 1), BondState::Bonded);
        assert!(!bonds.has_bond(0, 2));
        assert!(!bonds.has_bond(1, 2));
    }

    #[test]
    fn detected_bonds_are_uncertain() {
        let bonds = detect_bonds(
            &[Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
            &[0.6, 0.6],
            1.0,
        );
        assert_eq!(bonds.state(0, 1), BondState::Uncertain);
    }
}
