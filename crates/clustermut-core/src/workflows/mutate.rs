use crate::core::models::geometry::Geometry;
use crate::engine::backend::{self, EnergyEvaluation, LocalOptimizer};
use crate::engine::config::{InitialCollisionPolicy, MutationConfig, SearchStrategy};
use crate::engine::context::MutationContext;
use crate::engine::error::EngineError;
use crate::engine::scoring::Scorer;
use crate::engine::search;
use crate::engine::selection;
use crate::engine::workspace::{DissociationCheck, MutationWorkspace, Validator};
use rand::RngCore;
use tracing::{debug, info, instrument, warn};

/// Result of one mutation call.
#[derive(Debug, Clone)]
pub enum MutationOutcome {
    /// At least one relocation was committed.
    Mutated(Geometry),
    /// No valid candidate was found; this is a copy of the input.
    Unchanged(Geometry),
    /// The input was rejected by the initial collision check.
    Discarded,
}

impl MutationOutcome {
    pub fn into_geometry(self) -> Option<Geometry> {
        match self {
            MutationOutcome::Mutated(g) | MutationOutcome::Unchanged(g) => Some(g),
            MutationOutcome::Discarded => None,
        }
    }

    pub fn is_mutated(&self) -> bool {
        matches!(self, MutationOutcome::Mutated(_))
    }
}

/// A structural variation operator over cluster geometries.
///
/// Operators hold only their configuration. All scratch state lives in the
/// caller's [`MutationWorkspace`], and randomness comes from the caller's
/// generator, so one operator may serve any number of workers as long as
/// each has its own workspace and generator.
pub trait GeometryMutation: Send + Sync {
    fn description(&self) -> String;

    fn mutate(
        &self,
        geometry: &Geometry,
        context: &MutationContext<'_>,
        workspace: &mut MutationWorkspace,
        rng: &mut dyn RngCore,
    ) -> Result<MutationOutcome, EngineError>;
}

/// Relocates poorly placed units to the best valid vacancy.
#[derive(Debug, Clone)]
pub struct DirectedMutation {
    config: MutationConfig,
}

impl DirectedMutation {
    pub fn new(config: MutationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MutationConfig {
        &self.config
    }

    fn validator<'a>(&self, context: &MutationContext<'a>) -> Validator<'a> {
        Validator {
            strategy: self.config.collision_detection,
            collision_blow_factor: self.config.collision_blow_factor,
            dissociation: self.config.check_dissociation.then_some(DissociationCheck {
                predicate: context.dissociation,
                blow_factor: self.config.dissociation_blow_factor,
            }),
        }
    }

    fn relax(
        &self,
        optimizer: Option<&dyn LocalOptimizer>,
        geometry: &Geometry,
        context: &MutationContext<'_>,
    ) -> Result<(Geometry, EnergyEvaluation), EngineError> {
        let optimizer = optimizer.ok_or(EngineError::MissingCollaborator("local optimizer"))?;
        context.metrics.record_local_optimization();
        let relaxed = backend::relax(optimizer, geometry)?;
        Ok((relaxed.geometry, relaxed.energy))
    }
}

impl GeometryMutation for DirectedMutation {
    fn description(&self) -> String {
        self.config.to_string()
    }

    #[instrument(skip_all, name = "directed_mutation")]
    fn mutate(
        &self,
        geometry: &Geometry,
        context: &MutationContext<'_>,
        workspace: &mut MutationWorkspace,
        _rng: &mut dyn RngCore,
    ) -> Result<MutationOutcome, EngineError> {
        let config = &self.config;
        let metrics = context.metrics;

        // === Phase 0: Preconditions ===
        if geometry.is_empty() {
            return Err(EngineError::EmptyGeometry);
        }
        let fitness = context.require_backend()?;
        let optimizer = if config.needs_optimizer() {
            Some(context.require_optimizer()?)
        } else {
            None
        };
        if config.search.needs_surface() {
            context.require_surface()?;
        }
        if geometry.num_units() < 2 {
            debug!("A single unit cannot be relocated relative to the cluster.");
            metrics.record_fallback();
            return Ok(MutationOutcome::Unchanged(geometry.clone()));
        }

        if config.collision_check_first {
            workspace.load(geometry);
            let plain = Validator {
                dissociation: None,
                ..self.validator(context)
            };
            if !workspace.accepts(geometry.bonds(), &plain, metrics) {
                match config.on_initial_collision {
                    InitialCollisionPolicy::Discard => {
                        info!("Input geometry already collides; discarding it.");
                        metrics.record_discard();
                        return Ok(MutationOutcome::Discarded);
                    }
                    InitialCollisionPolicy::Proceed => {
                        warn!("Input geometry already collides; mutating it anyway.");
                    }
                }
            }
        }

        let phase = context.reporter.phase("Directed mutation");

        // === Phase 1: Starting geometry and energy ===
        let mut work = geometry.clone();
        if let SearchStrategy::BoundingBoxGrid { scale_factor, .. } = config.search {
            search::scale_coms(&mut work, scale_factor);
        }
        let mut energy = if config.relax_first {
            let (relaxed, energy) = self.relax(optimizer, &work, context)?;
            work = relaxed;
            energy
        } else {
            metrics.record_energy_evaluation();
            backend::evaluate(fitness, &work)
        };
        let initial_energy = energy.total;
        debug!(energy = initial_energy, "Evaluated starting geometry.");

        // === Phase 2: Select, search, score, commit ===
        let scorer = Scorer {
            scoring: config.scoring,
            backend: fitness,
            optimizer,
            metrics,
            reporter: context.reporter,
        };
        let validator = self.validator(context);
        let mut visited: Vec<usize> = Vec::with_capacity(config.units_to_move);
        let mut commits = 0usize;

        for step in 0..config.units_to_move {
            let excluded: &[usize] = if config.mark_moved_unmovable {
                &visited
            } else {
                &[]
            };
            let Some(selected) = selection::select(
                config.selection,
                &work,
                config.bond_blow_factor,
                &energy,
                excluded,
            ) else {
                debug!(step, "Every unit has been moved already.");
                break;
            };
            visited.push(selected.mover);

            let candidates = search::generate(
                &config.search,
                &mut work,
                &selected,
                context.surface,
                workspace,
                validator,
                metrics,
            )?;
            if candidates.is_empty() {
                debug!(step, mover = selected.mover, "No valid candidate position.");
                continue;
            }

            let Some(best) = scorer.best_of(&mut work, selected.mover, &candidates)? else {
                continue;
            };
            debug!(
                step,
                mover = selected.mover,
                candidates = candidates.len(),
                energy = best.energy.total,
                "Committing best candidate."
            );
            match best.relaxed {
                Some(relaxed) => work = relaxed,
                None => {
                    if let Some(unit) = work.unit_mut(selected.mover) {
                        best.candidate.apply_to(unit);
                    }
                }
            }
            energy = best.energy;
            commits += 1;

            if config.fully_relaxed {
                let (relaxed, relaxed_energy) = self.relax(optimizer, &work, context)?;
                work = relaxed;
                energy = relaxed_energy;
            }
        }
        drop(phase);

        // === Phase 3: Commit or fall back ===
        if commits == 0 {
            info!("No valid relocation found; returning the input geometry unchanged.");
            metrics.record_fallback();
            return Ok(MutationOutcome::Unchanged(geometry.clone()));
        }
        metrics.record_commit();
        if energy.total >= initial_energy {
            info!(
                before = initial_energy,
                after = energy.total,
                "Tried hard but could not find a better position."
            );
        } else {
            let improvement = (initial_energy - energy.total) / initial_energy.abs().max(f64::EPSILON);
            info!(
                before = initial_energy,
                after = energy.total,
                improvement_percent = improvement * 100.0,
                relocations = commits,
                "Directed mutation improved the geometry."
            );
        }
        Ok(MutationOutcome::Mutated(work))
    }
}
