use crate::cli::OutputFormat;
use crate::error::{CliError, Result};
use clustermut::core::io::cluster::{ClusterFile, ClusterMetadata};
use clustermut::core::io::traits::GeometryFile;
use clustermut::core::io::xyz::{XyzFile, XyzMetadata};
use clustermut::core::models::geometry::Geometry;
use std::path::{Path, PathBuf};
use tracing::debug;

fn is_xyz(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xyz"))
}

/// Reads a cluster from `.xyz` coordinates or, for any other extension, a
/// cluster TOML file.
pub fn read_geometry(path: &Path) -> Result<Geometry> {
    debug!("Reading cluster geometry from {:?}", path);
    let geometry = if is_xyz(path) {
        XyzFile::read_from_path(path).map(|(g, _)| g).map_err(anyhow::Error::from)
    } else {
        ClusterFile::read_from_path(path).map(|(g, _)| g).map_err(anyhow::Error::from)
    };
    geometry.map_err(|source| CliError::FileParsing {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_geometry(
    geometry: &Geometry,
    format: OutputFormat,
    title: &str,
    path: &Path,
) -> Result<()> {
    debug!("Writing {:?} geometry to {:?}", format, path);
    let written = match format {
        OutputFormat::Toml => {
            let metadata = ClusterMetadata {
                title: Some(title.to_string()),
            };
            ClusterFile::write_to_path(geometry, &metadata, path).map_err(anyhow::Error::from)
        }
        OutputFormat::Xyz => {
            let metadata = XyzMetadata {
                comment: title.to_string(),
            };
            XyzFile::write_to_path(geometry, &metadata, path).map_err(anyhow::Error::from)
        }
    };
    written.map_err(|source| CliError::FileWriting {
        path: path.to_path_buf(),
        source,
    })
}

/// Output path for structure `index` (1-based) of `total`. A single structure
/// is written to `template` itself; otherwise the index is appended to the stem.
pub fn generate_output_path(template: &Path, index: usize, total: usize) -> PathBuf {
    if total <= 1 {
        return template.to_path_buf();
    }
    let width = total.to_string().len();
    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cluster".to_string());
    let name = match template.extension() {
        Some(ext) => format!("{}_{:0width$}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_{:0width$}", stem, index),
    };
    template.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clustermut::core::models::atom::Atom;
    use clustermut::core::models::unit::MolecularUnit;
    use nalgebra::Point3;
    use tempfile::tempdir;

    fn neon_pair() -> Geometry {
        let units = [Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)]
            .into_iter()
            .map(|p| MolecularUnit::new(vec![Atom::new("Ne", p).unwrap()]).unwrap())
            .collect();
        Geometry::unbonded(units).unwrap()
    }

    #[test]
    fn output_paths_are_numbered_only_for_several_structures() {
        let template = Path::new("runs/cluster.xyz");
        assert_eq!(generate_output_path(template, 1, 1), PathBuf::from("runs/cluster.xyz"));
        assert_eq!(
            generate_output_path(template, 3, 12),
            PathBuf::from("runs/cluster_03.xyz")
        );
        assert_eq!(
            generate_output_path(Path::new("out"), 2, 2),
            PathBuf::from("out_2")
        );
    }

    #[test]
    fn geometries_survive_both_formats() {
        let dir = tempdir().unwrap();
        let geometry = neon_pair();

        for (format, name) in [(OutputFormat::Toml, "pair.toml"), (OutputFormat::Xyz, "pair.xyz")] {
            let path = dir.path().join(name);
            write_geometry(&geometry, format, "neon pair", &path).unwrap();
            let read = read_geometry(&path).unwrap();
            assert_eq!(read.num_units(), 2);
            assert!(read.same_composition(&geometry));
            assert!((read.coms()[1] - geometry.coms()[1]).norm() < 1e-6);
        }
    }

    #[test]
    fn unreadable_input_is_a_parsing_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "units = 3").unwrap();
        assert!(matches!(read_geometry(&path), Err(CliError::FileParsing { .. })));
        assert!(matches!(
            read_geometry(&dir.path().join("missing.xyz")),
            Err(CliError::FileParsing { .. })
        ));
    }
}
