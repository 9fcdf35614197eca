use super::atom::Atom;
use super::bonds::BondInfo;
use super::error::ModelError;
use super::unit::MolecularUnit;
use nalgebra::Point3;
use std::ops::Range;
use std::sync::Arc;

/// An ordered collection of molecular units plus the bond information over
/// all of their atoms.
///
/// Atom indices are global: unit `k` owns the contiguous range
/// [`atom_range(k)`](Geometry::atom_range). The bond information is shared
/// behind an [`Arc`] and is never modified once the geometry exists, so
/// clones are cheap and every clone consults the same topology.
#[derive(Debug, Clone)]
pub struct Geometry {
    units: Vec<MolecularUnit>,
    bonds: Arc<BondInfo>,
    offsets: Vec<usize>,
}

impl Geometry {
    /// Creates a geometry from units and the bond information over all their atoms.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::BondSizeMismatch`] if the bond information does not
    /// cover exactly the atoms of `units`, and [`ModelError::NonFiniteCoordinate`]
    /// if any unit position or orientation is not finite.
    pub fn new(units: Vec<MolecularUnit>, bonds: BondInfo) -> Result<Self, ModelError> {
        Self::with_shared_bonds(units, Arc::new(bonds))
    }

    /// Like [`Geometry::new`] but reuses an already shared bond table.
    pub fn with_shared_bonds(
        units: Vec<MolecularUnit>,
        bonds: Arc<BondInfo>,
    ) -> Result<Self, ModelError> {
        let mut offsets = Vec::with_capacity(units.len() + 1);
        let mut total = 0;
        for (index, unit) in units.iter().enumerate() {
            let com = unit.com();
            let orientation = unit.orientation();
            if !(com.coords.iter().all(|c| c.is_finite())
                && orientation.iter().all(|c| c.is_finite()))
            {
                return Err(ModelError::NonFiniteCoordinate { unit: index });
            }
            offsets.push(total);
            total += unit.len();
        }
        offsets.push(total);

        if bonds.len() != total {
            return Err(ModelError::BondSizeMismatch {
                bond_atoms: bonds.len(),
                geometry_atoms: total,
            });
        }

        Ok(Self {
            units,
            bonds,
            offsets,
        })
    }

    /// Creates a geometry whose units carry no declared bonds at all.
    pub fn unbonded(units: Vec<MolecularUnit>) -> Result<Self, ModelError> {
        let atoms = units.iter().map(MolecularUnit::len).sum();
        Self::new(units, BondInfo::new(atoms))
    }

    pub fn num_units(&self) -> usize {
        self.units.len()
    }

    pub fn num_atoms(&self) -> usize {
        *self.offsets.last().unwrap_or(&0)
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[MolecularUnit] {
        &self.units
    }

    pub fn unit(&self, index: usize) -> Option<&MolecularUnit> {
        self.units.get(index)
    }

    /// Mutable access to a unit; only its position and orientation can change.
    pub fn unit_mut(&mut self, index: usize) -> Option<&mut MolecularUnit> {
        self.units.get_mut(index)
    }

    pub fn bonds(&self) -> &BondInfo {
        &self.bonds
    }

    pub fn shared_bonds(&self) -> Arc<BondInfo> {
        Arc::clone(&self.bonds)
    }

    /// Global atom index range owned by a unit.
    ///
    /// # Panics
    ///
    /// Panics if `unit` is out of range.
    pub fn atom_range(&self, unit: usize) -> Range<usize> {
        self.offsets[unit]..self.offsets[unit + 1]
    }

    /// Owning unit of every atom, indexed by global atom index.
    pub fn atom_owners(&self) -> Vec<usize> {
        let mut owners = Vec::with_capacity(self.num_atoms());
        for (unit, u) in self.units.iter().enumerate() {
            owners.extend(std::iter::repeat_n(unit, u.len()));
        }
        owners
    }

    pub fn atoms(&self) -> impl Iterator<Item = &Atom> + '_ {
        self.units.iter().flat_map(|u| u.atoms().iter())
    }

    pub fn coms(&self) -> Vec<Point3<f64>> {
        self.units.iter().map(MolecularUnit::com).collect()
    }

    /// Flattened Cartesian coordinates of all atoms, in global atom order.
    pub fn cartesians(&self) -> Vec<Point3<f64>> {
        let mut out = Vec::with_capacity(self.num_atoms());
        self.fill_cartesians(&mut out);
        out
    }

    /// Overwrites `out` with the flattened Cartesian coordinates.
    pub fn fill_cartesians(&self, out: &mut Vec<Point3<f64>>) {
        out.clear();
        for unit in &self.units {
            unit.extend_cartesians(out);
        }
    }

    /// Whether `other` has the same unit count and the same atom sequence in every unit.
    pub fn same_composition(&self, other: &Geometry) -> bool {
        self.units.len() == other.units.len()
            && self
                .units
                .iter()
                .zip(&other.units)
                .all(|(a, b)| a.same_identity(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::bonds::BondState;
    use nalgebra::Vector3;

    fn unit_at(symbols: &[&str], origin: Point3<f64>) -> MolecularUnit {
        let atoms = symbols
            .iter()
            .enumerate()
            .map(|(k, s)| Atom::new(s, origin + Vector3::new(k as f64, 0.0, 0.0)).unwrap())
            .collect();
        MolecularUnit::new(atoms).unwrap()
    }

    fn sample() -> Geometry {
        let units = vec![
            unit_at(&["O", "H", "H"], Point3::new(0.0, 0.0, 0.0)),
            unit_at(&["Ar"], Point3::new(5.0, 0.0, 0.0)),
            unit_at(&["C", "O"], Point3::new(0.0, 5.0, 0.0)),
        ];
        let mut bonds = BondInfo::new(6);
        bonds.set(0, 1, BondState::Bonded);
        bonds.set(0, 2, BondState::Bonded);
        bonds.set(4, 5, BondState::Bonded);
        Geometry::new(units, bonds).unwrap()
    }

    #[test]
    fn atom_ranges_are_contiguous() {
        let g = sample();
        assert_eq!(g.num_units(), 3);
        assert_eq!(g.num_atoms(), 6);
        assert_eq!(g.atom_range(0), 0..3);
        assert_eq!(g.atom_range(1), 3..4);
        assert_eq!(g.atom_range(2), 4..6);
        assert_eq!(g.atom_owners(), vec![0, 0, 0, 1, 2, 2]);
    }

    #[test]
    fn mismatched_bond_size_is_rejected() {
        let units = vec![unit_at(&["Ar"], Point3::origin())];
        let result = Geometry::new(units, BondInfo::new(3));
        assert!(matches!(
            result,
            Err(ModelError::BondSizeMismatch {
                bond_atoms: 3,
                geometry_atoms: 1
            })
        ));
    }

    #[test]
    fn non_finite_com_is_rejected() {
        let mut unit = unit_at(&["Ar"], Point3::origin());
        unit.set_com(Point3::new(f64::NAN, 0.0, 0.0));
        let result = Geometry::unbonded(vec![unit]);
        assert!(matches!(
            result,
            Err(ModelError::NonFiniteCoordinate { unit: 0 })
        ));
    }

    #[test]
    fn cartesians_follow_unit_order() {
        let g = sample();
        let coords = g.cartesians();
        assert_eq!(coords.len(), 6);
        assert!((coords[3] - Point3::new(5.0, 0.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn clones_share_bond_information() {
        let g = sample();
        let copy = g.clone();
        assert!(Arc::ptr_eq(&g.shared_bonds(), &copy.shared_bonds()));
        assert!(copy.bonds().has_bond(5, 4));
    }

    #[test]
    fn moving_a_unit_keeps_composition() {
        let g = sample();
        let mut moved = g.clone();
        moved
            .unit_mut(1)
            .unwrap()
            .set_com(Point3::new(-3.0, 2.0, 1.0));
        assert!(g.same_composition(&moved));
        assert_ne!(g.unit(1).unwrap().com(), moved.unit(1).unwrap().com());
    }

    #[test]
    fn different_unit_order_changes_composition() {
        let g = sample();
        let mut units = g.units().to_vec();
        units.swap(0, 2);
        let swapped = Geometry::unbonded(units).unwrap();
        assert!(!g.same_composition(&swapped));
    }
}
