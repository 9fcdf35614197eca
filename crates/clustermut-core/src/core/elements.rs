use phf::{Map, phf_map};

/// Tabulated per-element data used by the geometric predicates.
///
/// Radii are single-bond covalent radii in Angstroms; masses are standard
/// atomic weights in Daltons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementData {
    pub atomic_number: u8,
    pub covalent_radius: f64,
    pub mass: f64,
}

const fn element(atomic_number: u8, covalent_radius: f64, mass: f64) -> ElementData {
    ElementData {
        atomic_number,
        covalent_radius,
        mass,
    }
}

static ELEMENTS: Map<&'static str, ElementData> = phf_map! {
    "H" => element(1, 0.31, 1.008),
    "He" => element(2, 0.28, 4.0026),
    "Li" => element(3, 1.28, 6.94),
    "Be" => element(4, 0.96, 9.0122),
    "B" => element(5, 0.84, 10.81),
    "C" => element(6, 0.76, 12.011),
    "N" => element(7, 0.71, 14.007),
    "O" => element(8, 0.66, 15.999),
    "F" => element(9, 0.57, 18.998),
    "Ne" => element(10, 0.58, 20.180),
    "Na" => element(11, 1.66, 22.990),
    "Mg" => element(12, 1.41, 24.305),
    "Al" => element(13, 1.21, 26.982),
    "Si" => element(14, 1.11, 28.085),
    "P" => element(15, 1.07, 30.974),
    "S" => element(16, 1.05, 32.06),
    "Cl" => element(17, 1.02, 35.45),
    "Ar" => element(18, 1.06, 39.948),
    "K" => element(19, 2.03, 39.098),
    "Ca" => element(20, 1.76, 40.078),
    "Sc" => element(21, 1.70, 44.956),
    "Ti" => element(22, 1.60, 47.867),
    "V" => element(23, 1.53, 50.942),
    "Cr" => element(24, 1.39, 51.996),
    "Mn" => element(25, 1.39, 54.938),
    "Fe" => element(26, 1.32, 55.845),
    "Co" => element(27, 1.26, 58.933),
    "Ni" => element(28, 1.24, 58.693),
    "Cu" => element(29, 1.32, 63.546),
    "Zn" => element(30, 1.22, 65.38),
    "Ga" => element(31, 1.22, 69.723),
    "Ge" => element(32, 1.20, 72.630),
    "As" => element(33, 1.19, 74.922),
    "Se" => element(34, 1.20, 78.971),
    "Br" => element(35, 1.20, 79.904),
    "Kr" => element(36, 1.16, 83.798),
    "Ag" => element(47, 1.45, 107.87),
    "I" => element(53, 1.39, 126.90),
    "Xe" => element(54, 1.40, 131.29),
    "Cs" => element(55, 2.44, 132.91),
    "Pt" => element(78, 1.36, 195.08),
    "Au" => element(79, 1.36, 196.97),
};

/// Looks up an element by symbol, accepting any capitalisation (`"cl"`, `"CL"`).
pub fn lookup(symbol: &str) -> Option<&'static ElementData> {
    let trimmed = symbol.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    let canonical: String = first
        .to_uppercase()
        .chain(chars.flat_map(char::to_lowercase))
        .collect();
    ELEMENTS.get(canonical.as_str())
}

/// Returns the canonical spelling of a symbol if it is known.
pub fn canonical_symbol(symbol: &str) -> Option<&'static str> {
    let data = lookup(symbol)?;
    ELEMENTS
        .entries()
        .find(|(_, d)| d.atomic_number == data.atomic_number)
        .map(|(s, _)| *s)
}
