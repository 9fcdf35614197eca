//! # Engine Module
//!
//! The mutation machinery: everything needed to pick a unit, enumerate valid
//! new placements for it, score them, and commit the winner, plus the
//! incremental packer used to assemble clusters from scratch.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Mutation and packing knobs with validating builders
//! - **Collaborators** ([`backend`]) - Fitness backend, local optimizer, and surface detector seams
//! - **Call context** ([`context`]) - Borrowed collaborators, metrics, and progress sink for one call
//! - **Scratch state** ([`workspace`]) - Caller-owned buffers reused across calls
//! - **Unit selection** ([`selection`]) - Least-connected and highest-energy heuristics
//! - **Placement search** ([`search`]) - Grid, surface, and partner-grid candidate generators
//! - **Scoring** ([`scoring`]) - Lowest-energy candidate with first-wins tie breaking
//! - **Packing** ([`packing`]) - 2-D random packing with box inflation and resets
//! - **Monitoring** ([`metrics`], [`progress`]) - Counters and progress events
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! Operators never own mutable state. A geometry handed to the engine is
//! cloned before it is modified, so callers can keep using their input.

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod packing;
pub mod progress;
pub mod scoring;
pub mod search;
pub mod selection;
pub mod workspace;
