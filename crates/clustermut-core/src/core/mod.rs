//! # Core Module
//!
//! Stateless building blocks of the mutation engine: the cluster data model,
//! the element table, and the geometric predicates every mutation operator is
//! validated against.
//!
//! ## Architecture
//!
//! - **Data model** ([`models`]) - Atoms, rigid molecular units, bond tables, and geometries
//! - **Element data** ([`elements`]) - Atomic numbers, covalent radii, and masses
//! - **Overlap test** ([`collision`]) - Bond-aware collision detection with a tunable blow factor
//! - **Fragmentation test** ([`dissociation`]) - Connectivity of the atomic contact graph
//! - **Contact graph** ([`connectivity`]) - Geometric bond detection and unit rankings
//! - **File I/O** ([`io`]) - Cluster TOML and XYZ formats
//!
//! Nothing in this module holds mutable global state. Radii and bond tables are
//! only read, so they can be shared between concurrently running operators.

pub mod collision;
pub mod connectivity;
pub mod dissociation;
pub mod elements;
pub mod io;
pub mod models;
pub mod utils;
