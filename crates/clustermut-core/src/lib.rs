//! # clustermut Core Library
//!
//! Structural variation operators for global optimization of atomic and
//! molecular clusters.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Geometry`, `MolecularUnit`),
//!   the element table, the collision and dissociation predicates, and file I/O.
//!
//! - **[`engine`]: The Logic Core.** Unit selection, candidate placement search,
//!   energy scoring against pluggable backends, and the incremental packer. Scratch
//!   buffers live in a caller-owned `MutationWorkspace`.
//!
//! - **[`workflows`]: The Public API.** The `GeometryMutation` operators a search
//!   driver calls: `DirectedMutation` and `PackingMutation`.

pub mod core;
pub mod engine;
pub mod workflows;
