//! # Workflows Module
//!
//! Top-level mutation operators for cluster structure searches.
//!
//! ## Overview
//!
//! A search driver holds a population of cluster geometries and repeatedly
//! asks an operator for a variation of one of them. Operators in this module
//! implement [`mutate::GeometryMutation`], take the geometry by reference, and
//! return a new one, so the driver decides what happens to the input.
//!
//! - **Directed mutation** ([`mutate`]) - Relocates poorly placed units to the
//!   best valid vacancy found by a configurable search
//! - **Packing** ([`pack`]) - Rebuilds a geometry from scratch by incremental
//!   2-D packing, optionally fitted against an external environment
//!
//! Each call receives its own [`MutationWorkspace`](crate::engine::workspace::MutationWorkspace)
//! and random number generator, so one operator value can be shared by any
//! number of worker threads.

pub mod mutate;
pub mod pack;
