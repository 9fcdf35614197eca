use super::atom::Atom;
use super::error::ModelError;
use crate::core::utils::geometry::{euler_rotation, mass_weighted_center};
use nalgebra::{Point3, Rotation3, Vector3};

/// A rigid, independently movable group of atoms within a cluster geometry.
///
/// The atoms (and therefore the unit's chemical identity) are fixed at
/// construction. Only the external center of mass and the orientation can be
/// changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MolecularUnit {
    atoms: Vec<Atom>,
    com: Point3<f64>,
    orientation: Vector3<f64>,
}

impl MolecularUnit {
    /// Creates a unit from atoms given in absolute coordinates.
    ///
    /// The reference frame is centered on the mass-weighted center of the
    /// atoms, which also becomes the unit's external center of mass. The
    /// orientation starts at zero, so the resulting Cartesian coordinates
    /// equal the input positions.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptyUnit`] for an empty atom list.
    pub fn new(atoms: Vec<Atom>) -> Result<Self, ModelError> {
        let com = Self::center_of(&atoms)?;
        let atoms = Self::recenter(atoms, &com);
        Ok(Self {
            atoms,
            com,
            orientation: Vector3::zeros(),
        })
    }

    /// Creates a unit from atoms in an arbitrary reference frame, placed at
    /// `com` with the given Euler `orientation`.
    ///
    /// The reference frame is re-centered on its center of mass first.
    pub fn placed(
        atoms: Vec<Atom>,
        com: Point3<f64>,
        orientation: Vector3<f64>,
    ) -> Result<Self, ModelError> {
        let center = Self::center_of(&atoms)?;
        let atoms = Self::recenter(atoms, &center);
        Ok(Self {
            atoms,
            com,
            orientation,
        })
    }

    fn center_of(atoms: &[Atom]) -> Result<Point3<f64>, ModelError> {
        if atoms.is_empty() {
            return Err(ModelError::EmptyUnit);
        }
        let positions: Vec<Point3<f64>> = atoms.iter().map(|a| a.position).collect();
        let masses: Vec<f64> = atoms.iter().map(|a| a.mass).collect();
        Ok(mass_weighted_center(&positions, &masses).unwrap_or(positions[0]))
    }

    fn recenter(mut atoms: Vec<Atom>, center: &Point3<f64>) -> Vec<Atom> {
        for atom in &mut atoms {
            atom.position = Point3::from(atom.position - center);
        }
        atoms
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// Always `false`: a unit holds at least one atom.
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn com(&self) -> Point3<f64> {
        self.com
    }

    pub fn orientation(&self) -> Vector3<f64> {
        self.orientation
    }

    pub fn set_com(&mut self, com: Point3<f64>) {
        self.com = com;
    }

    pub fn set_orientation(&mut self, orientation: Vector3<f64>) {
        self.orientation = orientation;
    }

    pub fn rotation(&self) -> Rotation3<f64> {
        euler_rotation(&self.orientation)
    }

    /// Appends the current (rotated and translated) Cartesian coordinates to `out`.
    pub fn extend_cartesians(&self, out: &mut Vec<Point3<f64>>) {
        let rotation = self.rotation();
        out.extend(
            self.atoms
                .iter()
                .map(|a| self.com + rotation * a.position.coords),
        );
    }

    /// Writes the current Cartesian coordinates into a slice of exactly `len()` points.
    pub fn write_cartesians(&self, out: &mut [Point3<f64>]) {
        debug_assert_eq!(out.len(), self.atoms.len());
        let rotation = self.rotation();
        for (slot, atom) in out.iter_mut().zip(&self.atoms) {
            *slot = self.com + rotation * atom.position.coords;
        }
    }

    pub fn cartesians(&self) -> Vec<Point3<f64>> {
        let mut out = Vec::with_capacity(self.atoms.len());
        self.extend_cartesians(&mut out);
        out
    }

    /// Twice the largest distance of any atom from the center of mass.
    pub fn diameter(&self) -> f64 {
        2.0 * self
            .atoms
            .iter()
            .map(|a| a.position.coords.norm())
            .fold(0.0, f64::max)
    }

    pub fn atomic_numbers(&self) -> impl Iterator<Item = u8> + '_ {
        self.atoms.iter().map(|a| a.atomic_number)
    }

    /// Whether two units carry the same atom sequence (same count and elements).
    pub fn same_identity(&self, other: &MolecularUnit) -> bool {
        self.atoms.len() == other.atoms.len()
            && self
                .atoms
                .iter()
                .zip(&other.atoms)
                .all(|(a, b)| a.atomic_number == b.atomic_number && a.symbol == b.symbol)
    }
}
