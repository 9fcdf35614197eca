use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unknown element symbol: '{0}'")]
    UnknownElement(String),

    #[error("Invalid radius {radius} for atom '{symbol}' (must be finite and positive)")]
    InvalidRadius { symbol: String, radius: f64 },

    #[error("A molecular unit must contain at least one atom")]
    EmptyUnit,

    #[error("Bond information covers {bond_atoms} atoms but the geometry has {geometry_atoms}")]
    BondSizeMismatch {
        bond_atoms: usize,
        geometry_atoms: usize,
    },

    #[error("Non-finite coordinate in unit {unit}")]
    NonFiniteCoordinate { unit: usize },
}
