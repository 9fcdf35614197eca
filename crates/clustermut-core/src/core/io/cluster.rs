//! TOML description of a cluster geometry.
//!
//! ```toml
//! title = "water dimer"
//! bond-blow-factor = 1.2          # detect bonds inside each unit
//!
//! [[units]]
//! com = [0.0, 0.0, 0.0]           # optional: atoms are then a reference frame
//! orientation = [0.0, 0.0, 0.0]   # optional Euler angles
//! atoms = [
//!     { symbol = "O", position = [0.0, 0.0, 0.1173] },
//!     { symbol = "H", position = [0.0, 0.7572, -0.4692] },
//! ]
//!
//! [[bonds]]                       # optional explicit bonds (global atom indices)
//! first = 0
//! second = 1
//! state = "bonded"
//! ```
//!
//! Units without `com` take their atom positions as absolute coordinates.

use super::traits::GeometryFile;
use crate::core::connectivity::intramolecular_bonds;
use crate::core::models::atom::Atom;
use crate::core::models::bonds::{BondInfo, BondState};
use crate::core::models::error::ModelError;
use crate::core::models::geometry::Geometry;
use crate::core::models::unit::MolecularUnit;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid unit {unit}: {source}")]
    Unit {
        unit: usize,
        #[source]
        source: ModelError,
    },
    #[error("Invalid geometry: {0}")]
    Geometry(#[from] ModelError),
    #[error("Bond ({first}, {second}) refers to an atom outside the geometry ({atoms} atoms)")]
    BondOutOfRange {
        first: usize,
        second: usize,
        atoms: usize,
    },
    #[error("Invalid bond state '{0}'")]
    BondState(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterMetadata {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileAtom {
    symbol: String,
    position: [f64; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    charge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    spin: Option<i16>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileUnit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    com: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    orientation: Option<[f64; 3]>,
    atoms: Vec<FileAtom>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileBond {
    first: usize,
    second: usize,
    #[serde(default = "default_bond_state")]
    state: String,
}

fn default_bond_state() -> String {
    BondState::Bonded.to_string()
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileCluster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bond_blow_factor: Option<f64>,
    units: Vec<FileUnit>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    bonds: Vec<FileBond>,
}

pub struct ClusterFile;

impl ClusterFile {
    pub fn parse(content: &str) -> Result<(Geometry, ClusterMetadata), ClusterFileError> {
        let file: FileCluster = toml::from_str(content)?;

        let mut units = Vec::with_capacity(file.units.len());
        for (index, unit) in file.units.into_iter().enumerate() {
            units.push(build_unit(unit).map_err(|source| ClusterFileError::Unit {
                unit: index,
                source,
            })?);
        }

        let mut bonds = match file.bond_blow_factor {
            Some(blow) => intramolecular_bonds(&units, blow),
            None => BondInfo::new(
                units.iter().map(MolecularUnit::len).sum(),
            ),
        };
        let atoms = bonds.len();
        for bond in file.bonds {
            if bond.first >= atoms || bond.second >= atoms {
                return Err(ClusterFileError::BondOutOfRange {
                    first: bond.first,
                    second: bond.second,
                    atoms,
                });
            }
            let state = bond
                .state
                .parse::<BondState>()
                .map_err(|_| ClusterFileError::BondState(bond.state.clone()))?;
            bonds.set(bond.first, bond.second, state);
        }

        let geometry = Geometry::new(units, bonds)?;
        Ok((geometry, ClusterMetadata { title: file.title }))
    }

    pub fn render(
        geometry: &Geometry,
        metadata: &ClusterMetadata,
    ) -> Result<String, ClusterFileError> {
        let units = geometry
            .units()
            .iter()
            .map(|unit| {
                let com = unit.com();
                let orientation = unit.orientation();
                FileUnit {
                    com: Some([com.x, com.y, com.z]),
                    orientation: Some([orientation.x, orientation.y, orientation.z]),
                    atoms: unit
                        .atoms()
                        .iter()
                        .map(|a| FileAtom {
                            symbol: a.symbol.clone(),
                            position: [a.position.x, a.position.y, a.position.z],
                            radius: Some(a.radius),
                            charge: (a.charge != 0.0).then_some(a.charge),
                            spin: (a.spin != 0).then_some(a.spin),
                        })
                        .collect(),
                }
            })
            .collect();

        let bonds = geometry
            .bonds()
            .bonds()
            .map(|(first, second, state)| FileBond {
                first,
                second,
                state: state.to_string(),
            })
            .collect();

        let file = FileCluster {
            title: metadata.title.clone(),
            bond_blow_factor: None,
            units,
            bonds,
        };
        Ok(toml::to_string(&file)?)
    }
}

fn build_unit(unit: FileUnit) -> Result<MolecularUnit, ModelError> {
    let atoms = unit
        .atoms
        .into_iter()
        .map(|a| {
            let [x, y, z] = a.position;
            let mut atom = Atom::new(&a.symbol, Point3::new(x, y, z))?;
            if let Some(radius) = a.radius {
                atom = atom.with_radius(radius)?;
            }
            if let Some(charge) = a.charge {
                atom = atom.with_charge(charge);
            }
            if let Some(spin) = a.spin {
                atom = atom.with_spin(spin);
            }
            Ok(atom)
        })
        .collect::<Result<Vec<_>, ModelError>>()?;

    let orientation = unit
        .orientation
        .map(|[a, b, c]| Vector3::new(a, b, c))
        .unwrap_or_else(Vector3::zeros);
    match unit.com {
        Some([x, y, z]) => MolecularUnit::placed(atoms, Point3::new(x, y, z), orientation),
        None => {
            let mut built = MolecularUnit::new(atoms)?;
            built.set_orientation(orientation);
            Ok(built)
        }
    }
}

impl GeometryFile for ClusterFile {
    type Metadata = ClusterMetadata;
    type Error = ClusterFileError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Geometry, Self::Metadata), Self::Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::parse(&content)
    }

    fn write_to(
        geometry: &Geometry,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        writer.write_all(Self::render(geometry, metadata)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const WATER_DIMER: &str = r#"
title = "water dimer"
bond-blow-factor = 1.2

[[units]]
atoms = [
    { symbol = "O", position = [0.0, 0.0, 0.1173] },
    { symbol = "H", position = [0.0, 0.7572, -0.4692] },
    { symbol = "H", position = [0.0, -0.7572, -0.4692] },
]

[[units]]
com = [3.0, 0.0, 0.0]
orientation = [0.0, 0.0, 1.5707963]
atoms = [
    { symbol = "O", position = [0.0, 0.0, 0.1173] },
    { symbol = "H", position = [0.0, 0.7572, -0.4692] },
    { symbol = "H", position = [0.0, -0.7572, -0.4692] },
]
"#;

    #[test]
    fn parses_units_and_detects_intramolecular_bonds() {
        let (geometry, meta) = ClusterFile::parse(WATER_DIMER).unwrap();
        assert_eq!(meta.title.as_deref(), Some("water dimer"));
        assert_eq!(geometry.num_units(), 2);
        assert_eq!(geometry.num_atoms(), 6);
        assert!(geometry.bonds().has_bond(0, 1));
        assert!(geometry.bonds().has_bond(3, 5));
        assert!(!geometry.bonds().has_bond(0, 3));
        assert!((geometry.unit(1).unwrap().com() - Point3::new(3.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn explicit_bonds_are_applied() {
        let content = r#"
[[units]]
atoms = [{ symbol = "Ar", position = [0.0, 0.0, 0.0] }]
[[units]]
atoms = [{ symbol = "Ar", position = [1.0, 0.0, 0.0] }]
[[bonds]]
first = 0
second = 1
state = "uncertain"
"#;
        let (geometry, _) = ClusterFile::parse(content).unwrap();
        assert_eq!(geometry.bonds().state(0, 1), BondState::Uncertain);
    }

    #[test]
    fn out_of_range_bond_is_rejected() {
        let content = r#"
[[units]]
atoms = [{ symbol = "Ar", position = [0.0, 0.0, 0.0] }]
[[bonds]]
first = 0
second = 4
"#;
        assert!(matches!(
            ClusterFile::parse(content),
            Err(ClusterFileError::BondOutOfRange { second: 4, .. })
        ));
    }

    #[test]
    fn unknown_element_reports_the_unit() {
        let content = r#"
[[units]]
atoms = [{ symbol = "Ar", position = [0.0, 0.0, 0.0] }]
[[units]]
atoms = [{ symbol = "Qq", position = [0.0, 0.0, 0.0] }]
"#;
        assert!(matches!(
            ClusterFile::parse(content),
            Err(ClusterFileError::Unit { unit: 1, .. })
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let content = r#"
[[units]]
atoms = [{ symbol = "Ar", position = [0.0, 0.0, 0.0], colour = "red" }]
"#;
        assert!(matches!(
            ClusterFile::parse(content),
            Err(ClusterFileError::Toml(_))
        ));
    }

    #[test]
    fn written_file_reads_back_to_the_same_coordinates() {
        let (geometry, meta) = ClusterFile::parse(WATER_DIMER).unwrap();
        let mut buffer = Vec::new();
        ClusterFile::write_to(&geometry, &meta, &mut buffer).unwrap();

        let mut reader = Cursor::new(buffer);
        let (reread, reread_meta) = ClusterFile::read_from(&mut reader).unwrap();
        assert_eq!(reread_meta, meta);
        assert!(geometry.same_composition(&reread));
        assert_eq!(reread.bonds(), geometry.bonds());
        for (a, b) in geometry.cartesians().iter().zip(reread.cartesians().iter()) {
            assert!((a - b).norm() < 1e-9);
        }
    }

    #[test]
    fn path_helpers_round_trip_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cluster.toml");
        let (geometry, _) = ClusterFile::parse(WATER_DIMER).unwrap();

        ClusterFile::write_geometry_to_path(&geometry, &path).unwrap();
        let (reread, meta) = ClusterFile::read_from_path(&path).unwrap();
        assert_eq!(meta.title, None);
        assert_eq!(reread.num_atoms(), 6);
    }
}
