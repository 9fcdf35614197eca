//! Incremental 2-D random packing.
//!
//! Units are dropped one at a time into the `z = 0` plane inside a square
//! box centered on the origin. Each new unit gets random positions and
//! orientations until the growing assembly is free of collisions and still
//! connected. Consecutive collisions inflate the box; too many failures of
//! either kind trigger a reset of the box to the extent of the units already
//! placed. A unit that exhausts its resets is left at its last trial
//! placement and packing moves on.

use super::config::{PackingConfig, PackingOrder};
use super::context::MutationContext;
use super::error::EngineError;
use super::progress::Progress;
use super::search::CandidatePoint;
use super::workspace::{DissociationCheck, MutationWorkspace, Validator, Verdict};
use crate::core::models::geometry::Geometry;
use crate::core::utils::geometry::random_euler;
use nalgebra::Point3;
use rand::{Rng, RngCore};
use rand::seq::SliceRandom;
use std::cmp::Reverse;
use tracing::{debug, info, instrument, warn};

/// Bookkeeping of one packing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackingReport {
    pub inflations: usize,
    pub resets: usize,
    /// Units that ran out of resets, in placement order.
    pub exhausted_units: Vec<usize>,
    pub environment_attempts: usize,
}

impl PackingReport {
    /// `true` when every unit found a valid placement.
    pub fn is_complete(&self) -> bool {
        self.exhausted_units.is_empty()
    }
}

/// Order in which units are placed.
pub fn packing_order<R: Rng + ?Sized>(
    order: PackingOrder,
    geometry: &Geometry,
    rng: &mut R,
) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..geometry.num_units()).collect();
    match order {
        PackingOrder::Ascending => {}
        PackingOrder::Random => indices.shuffle(rng),
        PackingOrder::BySize => indices.sort_by_key(|&i| Reverse(geometry.units()[i].len())),
    }
    indices
}

fn signed_uniform<R: Rng + ?Sized>(rng: &mut R, extent: f64) -> f64 {
    let magnitude = rng.r#gen::<f64>() * extent;
    if rng.r#gen::<bool>() { -magnitude } else { magnitude }
}

pub struct Packer<'a> {
    config: &'a PackingConfig,
    context: MutationContext<'a>,
}

impl<'a> Packer<'a> {
    pub fn new(config: &'a PackingConfig, context: MutationContext<'a>) -> Self {
        Self { config, context }
    }

    /// Half-widths of the box: the largest `|x|` and `|y|` over `points`,
    /// each grown by a random amount up to the box increment.
    fn box_around(&self, points: &[Point3<f64>], rng: &mut dyn RngCore) -> [f64; 2] {
        let mut cell = points.iter().fold([0.0f64; 2], |acc, p| {
            [acc[0].max(p.x.abs()), acc[1].max(p.y.abs())]
        });
        for extent in cell.iter_mut() {
            *extent += rng.r#gen::<f64>() * self.config.box_increment;
        }
        cell
    }

    /// Assembles a new geometry from the units of `geometry`.
    ///
    /// Input positions are discarded. The returned geometry has the same
    /// units in the same order. It may be invalid if the report lists
    /// exhausted units.
    #[instrument(skip_all, name = "incremental_packing")]
    pub fn pack(
        &self,
        geometry: &Geometry,
        workspace: &mut MutationWorkspace,
        rng: &mut dyn RngCore,
    ) -> Result<(Geometry, PackingReport), EngineError> {
        if geometry.is_empty() {
            return Err(EngineError::EmptyGeometry);
        }
        let order = packing_order(self.config.order, geometry, rng);
        let mut packed = geometry.clone();
        let mut report = PackingReport::default();

        let first = order[0];
        let seed = CandidatePoint::oriented(Point3::origin(), random_euler(rng));
        if let Some(unit) = packed.unit_mut(first) {
            seed.apply_to(unit);
        }
        let mut placed = vec![first];
        workspace.load_units(&packed, &placed);
        let mut cell = self.box_around(workspace.positions(), rng);
        debug!(first, cell = ?cell, "Seeded packing at the origin.");

        let reporter = self.context.reporter;
        reporter.report(Progress::TaskStart {
            total_steps: order.len().saturating_sub(1) as u64,
        });
        for &unit in &order[1..] {
            let slot = placed.partition_point(|&u| u < unit);
            placed.insert(slot, unit);
            if !self.place_unit(&mut packed, unit, &placed, &mut cell, workspace, rng, &mut report)
            {
                report.exhausted_units.push(unit);
            }
            reporter.report(Progress::TaskIncrement);
        }
        reporter.report(Progress::TaskFinish);

        info!(
            units = order.len(),
            inflations = report.inflations,
            resets = report.resets,
            exhausted = report.exhausted_units.len(),
            "Incremental packing finished."
        );
        Ok((packed, report))
    }

    #[allow(clippy::too_many_arguments)]
    fn place_unit(
        &self,
        packed: &mut Geometry,
        unit: usize,
        placed: &[usize],
        cell: &mut [f64; 2],
        workspace: &mut MutationWorkspace,
        rng: &mut dyn RngCore,
        report: &mut PackingReport,
    ) -> bool {
        let config = self.config;
        let atoms: Vec<usize> = placed.iter().flat_map(|&u| packed.atom_range(u)).collect();
        let bonds = packed.bonds().restricted_to(&atoms);
        workspace.load_units(packed, placed);
        let validator = Validator {
            strategy: config.collision_detection,
            collision_blow_factor: config.collision_blow_factor,
            dissociation: Some(DissociationCheck {
                predicate: self.context.dissociation,
                blow_factor: config.dissociation_blow_factor,
            }),
        };

        let mut failed = 0usize;
        let mut total = 0usize;
        let mut resets = 0usize;
        loop {
            if total >= config.tries_before_reset {
                if resets >= config.max_resets {
                    warn!(
                        unit,
                        resets, "Box resets exhausted; leaving unit at its last trial placement."
                    );
                    return false;
                }
                resets += 1;
                report.resets += 1;
                let others: Vec<Point3<f64>> = placed
                    .iter()
                    .filter(|&&u| u != unit)
                    .flat_map(|&u| packed.units()[u].cartesians())
                    .collect();
                *cell = self.box_around(&others, rng);
                debug!(unit, reset = resets, cell = ?cell, "Reset packing box.");
                failed = 0;
                total = 0;
            }

            let com = Point3::new(
                signed_uniform(rng, cell[0]),
                signed_uniform(rng, cell[1]),
                0.0,
            );
            let candidate = CandidatePoint::oriented(com, random_euler(rng));
            if let Some(u) = packed.unit_mut(unit) {
                candidate.apply_to(u);
            }
            workspace.refresh_unit(packed, unit);

            match workspace.verdict(&bonds, &validator, self.context.metrics) {
                Verdict::Valid => return true,
                Verdict::Dissociated => total += 1,
                Verdict::Collision => {
                    failed += 1;
                    total += 1;
                }
            }

            if failed >= config.attempts_before_inflation {
                for extent in cell.iter_mut() {
                    *extent += rng.r#gen::<f64>() * config.box_increment;
                }
                report.inflations += 1;
                failed = 0;
            }
        }
    }
}
