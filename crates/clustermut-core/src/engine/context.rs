use super::backend::{FitnessBackend, LocalOptimizer, SurfaceDetector};
use super::error::EngineError;
use super::metrics::MutationMetrics;
use super::progress::ProgressReporter;
use crate::core::dissociation::{DissociationPredicate, GraphDissociation};

static DEFAULT_DISSOCIATION: GraphDissociation = GraphDissociation;
static SILENT_REPORTER: ProgressReporter<'static> = ProgressReporter::silent();

/// Collaborators and shared services handed to every operator call.
///
/// The context only borrows; operators hold no state of their own, so the
/// same context may be used by many sequential calls. Collaborators that a
/// given configuration needs but the context lacks are reported as
/// [`EngineError::MissingCollaborator`] before any work is done.
#[derive(Clone, Copy)]
pub struct MutationContext<'a> {
    pub backend: Option<&'a dyn FitnessBackend>,
    pub optimizer: Option<&'a dyn LocalOptimizer>,
    pub surface: Option<&'a dyn SurfaceDetector>,
    pub dissociation: &'a dyn DissociationPredicate,
    pub metrics: &'a MutationMetrics,
    pub reporter: &'a ProgressReporter<'a>,
}

impl<'a> MutationContext<'a> {
    pub fn new(metrics: &'a MutationMetrics) -> Self {
        Self {
            backend: None,
            optimizer: None,
            surface: None,
            dissociation: &DEFAULT_DISSOCIATION,
            metrics,
            reporter: &SILENT_REPORTER,
        }
    }

    pub fn with_backend(mut self, backend: &'a dyn FitnessBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_optimizer(mut self, optimizer: &'a dyn LocalOptimizer) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    pub fn with_surface_detector(mut self, surface: &'a dyn SurfaceDetector) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_dissociation(mut self, predicate: &'a dyn DissociationPredicate) -> Self {
        self.dissociation = predicate;
        self
    }

    pub fn with_reporter(mut self, reporter: &'a ProgressReporter<'a>) -> Self {
        self.reporter = reporter;
        self
    }

    pub(crate) fn require_backend(&self) -> Result<&'a dyn FitnessBackend, EngineError> {
        self.backend
            .ok_or(EngineError::MissingCollaborator("fitness backend"))
    }

    pub(crate) fn require_optimizer(&self) -> Result<&'a dyn LocalOptimizer, EngineError> {
        self.optimizer
            .ok_or(EngineError::MissingCollaborator("local optimizer"))
    }

    pub(crate) fn require_surface(&self) -> Result<&'a dyn SurfaceDetector, EngineError> {
        self.surface
            .ok_or(EngineError::MissingCollaborator("surface detector"))
    }
}
