//! Energy scoring of surviving candidates.

use super::backend::{self, EnergyEvaluation, FitnessBackend, LocalOptimizer};
use super::config::PointScoring;
use super::error::EngineError;
use super::metrics::MutationMetrics;
use super::progress::{Progress, ProgressReporter};
use super::search::CandidatePoint;
use crate::core::models::geometry::Geometry;
use tracing::trace;

/// Keeps the first entry with the lowest energy seen so far.
///
/// The first offer is always taken; later ones replace it only with a
/// strictly lower energy, so the first of several equal minima wins.
#[derive(Debug)]
struct Best<T> {
    entry: Option<(f64, T)>,
}

impl<T> Best<T> {
    fn new() -> Self {
        Self { entry: None }
    }

    fn offer(&mut self, energy: f64, item: T) {
        match &self.entry {
            Some((current, _)) if energy >= *current || energy.is_nan() => {}
            _ => self.entry = Some((energy, item)),
        }
    }

    fn into_inner(self) -> Option<(f64, T)> {
        self.entry
    }
}

/// Winning candidate of a scoring pass.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub candidate: CandidatePoint,
    pub energy: EnergyEvaluation,
    /// Relaxed geometry, when candidates were locally optimized.
    pub relaxed: Option<Geometry>,
}

pub(crate) struct Scorer<'a> {
    pub scoring: PointScoring,
    pub backend: &'a dyn FitnessBackend,
    pub optimizer: Option<&'a dyn LocalOptimizer>,
    pub metrics: &'a MutationMetrics,
    pub reporter: &'a ProgressReporter<'a>,
}

impl Scorer<'_> {
    /// Scores every candidate for `mover` and returns the best one.
    ///
    /// `geometry` is left with the mover back at its starting placement.
    pub fn best_of(
        &self,
        geometry: &mut Geometry,
        mover: usize,
        candidates: &[CandidatePoint],
    ) -> Result<Option<ScoredPoint>, EngineError> {
        let len = geometry.num_units();
        let start = geometry
            .unit(mover)
            .map(|u| CandidatePoint::oriented(u.com(), u.orientation()))
            .ok_or(EngineError::UnitOutOfRange { index: mover, len })?;

        self.reporter.report(Progress::TaskStart {
            total_steps: candidates.len() as u64,
        });
        let mut best = Best::new();
        let mut outcome = Ok(());
        for candidate in candidates {
            if let Some(unit) = geometry.unit_mut(mover) {
                candidate.apply_to(unit);
            }
            match self.score(geometry) {
                Ok((energy, relaxed)) => {
                    trace!(total = energy.total, com = ?candidate.com, "Scored candidate.");
                    best.offer(
                        energy.total,
                        ScoredPoint {
                            candidate: *candidate,
                            energy,
                            relaxed,
                        },
                    );
                }
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
            self.reporter.report(Progress::TaskIncrement);
        }
        self.reporter.report(Progress::TaskFinish);

        if let Some(unit) = geometry.unit_mut(mover) {
            start.apply_to(unit);
        }
        outcome?;
        Ok(best.into_inner().map(|(_, point)| point))
    }

    fn score(&self, geometry: &Geometry) -> Result<(EnergyEvaluation, Option<Geometry>), EngineError> {
        match self.scoring {
            PointScoring::EnergyOnly => {
                self.metrics.record_energy_evaluation();
                Ok((backend::evaluate(self.backend, geometry), None))
            }
            PointScoring::LocallyOptimized => {
                let optimizer = self
                    .optimizer
                    .ok_or(EngineError::MissingCollaborator("local optimizer"))?;
                self.metrics.record_local_optimization();
                let relaxed = backend::relax(optimizer, geometry)?;
                Ok((relaxed.energy, Some(relaxed.geometry)))
            }
        }
    }
}
