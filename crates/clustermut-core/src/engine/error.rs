use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::error::ModelError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid geometry: {0}")]
    Model(#[from] ModelError),

    #[error("Cannot mutate an empty geometry")]
    EmptyGeometry,

    #[error("Unit index {index} is out of range for a geometry with {len} units")]
    UnitOutOfRange { index: usize, len: usize },

    #[error("Required collaborator is missing: {0}")]
    MissingCollaborator(&'static str),

    #[error("Local optimization failed: {reason}")]
    Optimization { reason: String },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
