//! Reading and writing cluster geometries.
//!
//! [`cluster`] is the native TOML description with units, orientations, and
//! bonds; [`xyz`] exchanges plain Cartesian coordinates with other tools. Both
//! implement the [`traits::GeometryFile`] interface.

pub mod cluster;
pub mod traits;
pub mod xyz;
