//! # Core Models Module
//!
//! Data structures describing a cluster geometry: atoms, rigid molecular
//! units, the bond table over all atoms, and the geometry that ties them
//! together.
//!
//! ## Key Components
//!
//! - [`atom`] - Element identity, radius, mass, charge, and reference-frame position
//! - [`unit`] - A rigid molecular unit with center of mass and Euler orientation
//! - [`bonds`] - Tri-state symmetric bond adjacency over global atom indices
//! - [`geometry`] - The ordered unit collection with shared, immutable bonds
//! - [`error`] - Construction errors for the models above
//!
//! ## Invariants
//!
//! A unit's atom list never changes after construction, and the bond table of a
//! geometry is shared read-only. Mutation operators therefore can only move and
//! rotate units, which keeps atom count, unit count, and atom-type order intact.

pub mod atom;
pub mod bonds;
pub mod error;
pub mod geometry;
pub mod unit;
