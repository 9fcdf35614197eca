use crate::core::models::geometry::Geometry;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Cursor, Write};
use std::path::Path;

/// A file format that stores one cluster geometry.
///
/// Implementors provide the reader and writer; everything path- or
/// string-based is derived from those two.
pub trait GeometryFile {
    /// Format-specific header data, such as a title or comment line.
    type Metadata: Default;

    type Error: Error + From<io::Error>;

    fn read_from(reader: &mut impl BufRead) -> Result<(Geometry, Self::Metadata), Self::Error>;

    fn write_to(
        geometry: &Geometry,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Writes `geometry` with empty metadata.
    fn write_geometry_to(geometry: &Geometry, writer: &mut impl Write) -> Result<(), Self::Error> {
        Self::write_to(geometry, &Self::Metadata::default(), writer)
    }

    fn read_str(content: &str) -> Result<(Geometry, Self::Metadata), Self::Error> {
        Self::read_from(&mut Cursor::new(content))
    }

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<(Geometry, Self::Metadata), Self::Error> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader)
    }

    /// Creates or truncates the file at `path`. The buffer is flushed before
    /// returning so that write errors are not lost on drop.
    fn write_to_path<P: AsRef<Path>>(
        geometry: &Geometry,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let mut writer = BufWriter::new(File::create(path)?);
        Self::write_to(geometry, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn write_geometry_to_path<P: AsRef<Path>>(
        geometry: &Geometry,
        path: P,
    ) -> Result<(), Self::Error> {
        Self::write_to_path(geometry, &Self::Metadata::default(), path)
    }
}
