use super::error::ModelError;
use crate::core::elements;
use nalgebra::Point3;

/// Represents a single atom of a molecular unit.
///
/// The position is expressed in the owning unit's reference frame, that is
/// relative to the unit's center of mass and before the unit's orientation is
/// applied. Absolute Cartesian coordinates are only ever derived, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Canonical element symbol (e.g. "O", "Cl").
    pub symbol: String,
    /// Atomic number of the element.
    pub atomic_number: u8,
    /// Radius in Angstroms used by the collision, bond, and dissociation tests.
    pub radius: f64,
    /// Atomic mass in Daltons, used to locate the center of mass.
    pub mass: f64,
    /// Partial charge in elementary charge units.
    pub charge: f64,
    /// Spin multiplicity contribution of this atom.
    pub spin: i16,
    /// Position in the unit's reference frame, in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new `Atom` with tabulated radius and mass for its element.
    ///
    /// # Arguments
    ///
    /// * `symbol` - The element symbol, in any capitalisation.
    /// * `position` - The position of the atom in Angstroms.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownElement`] if the symbol is not in the element table.
    pub fn new(symbol: &str, position: Point3<f64>) -> Result<Self, ModelError> {
        let data =
            elements::lookup(symbol).ok_or_else(|| ModelError::UnknownElement(symbol.to_string()))?;
        let symbol = elements::canonical_symbol(symbol)
            .unwrap_or(symbol)
            .to_string();
        Ok(Self {
            symbol,
            atomic_number: data.atomic_number,
            radius: data.covalent_radius,
            mass: data.mass,
            charge: 0.0,
            spin: 0,
            position,
        })
    }

    /// Replaces the tabulated radius with a custom value.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRadius`] if the radius is not finite and positive.
    pub fn with_radius(mut self, radius: f64) -> Result<Self, ModelError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ModelError::InvalidRadius {
                symbol: self.symbol,
                radius,
            });
        }
        self.radius = radius;
        Ok(self)
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }

    pub fn with_spin(mut self, spin: i16) -> Self {
        self.spin = spin;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_uses_tabulated_element_data() {
        let atom = Atom::new("o", Point3::new(1.0, 2.0, 3.0)).unwrap();

        assert_eq!(atom.symbol, "O");
        assert_eq!(atom.atomic_number, 8);
        assert!((atom.radius - 0.66).abs() < 1e-12);
        assert!((atom.mass - 15.999).abs() < 1e-12);
        assert_eq!(atom.charge, 0.0);
        assert_eq!(atom.spin, 0);
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn unknown_element_is_rejected() {
        let result = Atom::new("Zz", Point3::origin());
        assert_eq!(result, Err(ModelError::UnknownElement("Zz".to_string())));
    }

    #[test]
    fn radius_override_must_be_positive() {
        let atom = Atom::new("Ar", Point3::origin()).unwrap();
        assert!(atom.clone().with_radius(1.0).is_ok());
        assert!(matches!(
            atom.clone().with_radius(0.0),
            Err(ModelError::InvalidRadius { .. })
        ));
        assert!(matches!(
            atom.with_radius(f64::NAN),
            Err(ModelError::InvalidRadius { .. })
        ));
    }

    #[test]
    fn builder_setters_apply_charge_and_spin() {
        let atom = Atom::new("Na", Point3::origin())
            .unwrap()
            .with_charge(1.0)
            .with_spin(2);
        assert_eq!(atom.charge, 1.0);
        assert_eq!(atom.spin, 2);
    }
}
