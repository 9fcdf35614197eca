use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Tri-state relation between two atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum BondState {
    #[default]
    None,
    Bonded,
    /// Detected geometrically rather than declared; treated as a bond everywhere.
    Uncertain,
}

impl BondState {
    #[inline]
    pub fn is_bond(self) -> bool {
        !matches!(self, BondState::None)
    }
}

#[derive(Debug, Error)]
#[error("Invalid bond state string")]
pub struct ParseBondStateError;

impl FromStr for BondState {
    type Err = ParseBondStateError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "no" | "0" => Ok(Self::None),
            "bonded" | "bond" | "1" => Ok(Self::Bonded),
            "uncertain" | "?" => Ok(Self::Uncertain),
            _ => Err(ParseBondStateError),
        }
    }
}

impl fmt::Display for BondState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::None => "none",
                Self::Bonded => "bonded",
                Self::Uncertain => "uncertain",
            }
        )
    }
}

/// Symmetric bond adjacency over all atoms of a geometry.
///
/// Only the strict upper triangle is stored. The diagonal is implicit: an atom
/// is reported as `Uncertain` with itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BondInfo {
    atoms: usize,
    states: Vec<BondState>,
}

impl BondInfo {
    /// Creates bond information for `atoms` atoms with no bonds.
    pub fn new(atoms: usize) -> Self {
        let pairs = atoms * atoms.saturating_sub(1) / 2;
        Self {
            atoms,
            states: vec![BondState::None; pairs],
        }
    }

    /// Number of atoms covered.
    pub fn len(&self) -> usize {
        self.atoms
    }

    pub fn is_empty(&self) -> bool {
        self.atoms == 0
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        lo * self.atoms - lo * (lo + 1) / 2 + (hi - lo - 1)
    }

    /// Returns the state between atoms `i` and `j`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[inline]
    pub fn state(&self, i: usize, j: usize) -> BondState {
        assert!(
            i < self.atoms && j < self.atoms,
            "atom index out of range for bond information"
        );
        if i == j {
            return BondState::Uncertain;
        }
        self.states[self.offset(i, j)]
    }

    /// Whether `i` and `j` are bonded (declared or uncertain).
    #[inline]
    pub fn has_bond(&self, i: usize, j: usize) -> bool {
        self.state(i, j).is_bond()
    }

    /// Sets the state between two distinct atoms. Self-bonds are ignored.
    pub fn set(&mut self, i: usize, j: usize, state: BondState) {
        assert!(
            i < self.atoms && j < self.atoms,
            "atom index out of range for bond information"
        );
        if i == j {
            return;
        }
        let offset = self.offset(i, j);
        self.states[offset] = state;
    }

    /// Iterates over all bonded pairs `(i, j, state)` with `i < j`.
    pub fn bonds(&self) -> impl Iterator<Item = (usize, usize, BondState)> + '_ {
        (0..self.atoms).flat_map(move |i| {
            ((i + 1)..self.atoms).filter_map(move |j| {
                let state = self.states[self.offset(i, j)];
                state.is_bond().then_some((i, j, state))
            })
        })
    }

    pub fn bond_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_bond()).count()
    }

    /// Builds the bond information of a sub-selection of atoms.
    ///
    /// The `k`-th atom of the result corresponds to `atoms[k]` of `self`.
    pub fn restricted_to(&self, atoms: &[usize]) -> BondInfo {
        let mut restricted = BondInfo::new(atoms.len());
        for (a, &i) in atoms.iter().enumerate() {
            for (b, &j) in atoms.iter().enumerate().skip(a + 1) {
                let state = self.state(i, j);
                if state.is_bond() {
                    restricted.set(a, b, state);
                }
            }
        }
        restricted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_bond_info_has_no_bonds() {
        let info = BondInfo::new(4);
        assert_eq!(info.len(), 4);
        assert_eq!(info.bond_count(), 0);
        for i in 0..4 {
            for j in 0..4 {
                if i != j {
                    assert!(!info.has_bond(i, j));
                }
            }
        }
    }

    #[test]
    fn set_is_symmetric() {
        let mut info = BondInfo::new(5);
        info.set(3, 1, BondState::Bonded);
        assert_eq!(info.state(1, 3), BondState::Bonded);
        assert_eq!(info.state(3, 1), BondState::Bonded);
        assert!(!info.has_bond(1, 2));
    }

    #[test]
    fn diagonal_is_reported_as_uncertain() {
        let mut info = BondInfo::new(2);
        info.set(0, 0, BondState::None);
        assert_eq!(info.state(0, 0), BondState::Uncertain);
        assert!(info.has_bond(1, 1));
    }

    #[test]
    fn uncertain_counts_as_bond() {
        let mut info = BondInfo::new(3);
        info.set(0, 2, BondState::Uncertain);
        assert!(info.has_bond(2, 0));
        assert_eq!(info.bond_count(), 1);
    }

    #[test]
    fn bonds_iterates_upper_triangle_in_order() {
        let mut info = BondInfo::new(4);
        info.set(2, 3, BondState::Bonded);
        info.set(1, 0, BondState::Uncertain);
        let bonds: Vec<_> = info.bonds().collect();
        assert_eq!(
            bonds,
            vec![(0, 1, BondState::Uncertain), (2, 3, BondState::Bonded)]
        );
    }

    #[test]
    fn restricted_to_remaps_indices() {
        let mut info = BondInfo::new(5);
        info.set(1, 4, BondState::Bonded);
        info.set(0, 2, BondState::Bonded);

        let sub = info.restricted_to(&[1, 3, 4]);
        assert_eq!(sub.len(), 3);
        assert!(sub.has_bond(0, 2));
        assert!(!sub.has_bond(0, 1));
        assert_eq!(sub.bond_count(), 1);
    }

    #[test]
    fn bond_state_parses_and_displays() {
        assert_eq!("Bonded".parse::<BondState>().unwrap(), BondState::Bonded);
        assert_eq!("?".parse::<BondState>().unwrap(), BondState::Uncertain);
        assert!("maybe".parse::<BondState>().is_err());
        assert_eq!(BondState::Uncertain.to_string(), "uncertain");
    }

    #[test]
    fn empty_and_single_atom_bond_info_is_valid() {
        assert!(BondInfo::new(0).is_empty());
        assert_eq!(BondInfo::new(1).bond_count(), 0);
    }
}
