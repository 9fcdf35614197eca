use super::traits::GeometryFile;
use crate::core::models::atom::Atom;
use crate::core::models::error::ModelError;
use crate::core::models::geometry::Geometry;
use crate::core::models::unit::MolecularUnit;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Invalid geometry: {0}")]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XyzMetadata {
    pub comment: String,
}

/// Plain XYZ coordinates.
///
/// Reading treats every atom as its own single-atom unit, which is the natural
/// reading for atomic clusters. Writing flattens any geometry to its current
/// Cartesian coordinates.
pub struct XyzFile;

fn parse_error(line: usize, message: impl Into<String>) -> XyzError {
    XyzError::Parse {
        line,
        message: message.into(),
    }
}

impl GeometryFile for XyzFile {
    type Metadata = XyzMetadata;
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Geometry, Self::Metadata), Self::Error> {
        let mut lines = reader.lines();

        let count_line = lines
            .next()
            .ok_or_else(|| parse_error(1, "missing atom count"))??;
        let count: usize = count_line
            .trim()
            .parse()
            .map_err(|_| parse_error(1, format!("invalid atom count '{}'", count_line.trim())))?;
        let comment = lines.next().transpose()?.unwrap_or_default();

        let mut units = Vec::with_capacity(count);
        for k in 0..count {
            let line_no = k + 3;
            let line = lines
                .next()
                .ok_or_else(|| parse_error(line_no, "unexpected end of file"))??;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return Err(parse_error(line_no, "expected 'symbol x y z'"));
            }
            let mut coords = [0.0; 3];
            for (slot, field) in coords.iter_mut().zip(&fields[1..4]) {
                *slot = field
                    .parse()
                    .map_err(|_| parse_error(line_no, format!("invalid coordinate '{}'", field)))?;
            }
            let atom = Atom::new(fields[0], Point3::new(coords[0], coords[1], coords[2]))?;
            units.push(MolecularUnit::new(vec![atom])?);
        }

        let geometry = Geometry::unbonded(units)?;
        Ok((
            geometry,
            XyzMetadata {
                comment: comment.trim().to_string(),
            },
        ))
    }

    fn write_to(
        geometry: &Geometry,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        writeln!(writer, "{}", geometry.num_atoms())?;
        writeln!(writer, "{}", metadata.comment.replace('\n', " "))?;
        for (atom, p) in geometry.atoms().zip(geometry.cartesians()) {
            writeln!(
                writer,
                "{:<3} {:>14.8} {:>14.8} {:>14.8}",
                atom.symbol, p.x, p.y, p.z
            )?;
        }
        Ok(())
    }
}
