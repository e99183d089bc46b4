use thiserror::Error;

use super::config::ConfigError;
use crate::core::alignment::aligner::AlignmentError;
use crate::core::forcefield::forcefield::ForceFieldError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No molecule has been set")]
    NoMolecule,

    #[error("Unknown force field: '{0}'")]
    UnknownForceField(String),

    #[error("Optimizer is not set up")]
    NotReady,

    #[error("Atom selection '{0}' matched no atom pairs")]
    EmptySelection(String),

    #[error("Force field error: {source}")]
    ForceField {
        #[from]
        source: ForceFieldError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Alignment failed: {source}")]
    Alignment {
        #[from]
        source: AlignmentError,
    },

    #[error("Optimization was cancelled")]
    Cancelled,

    #[error("Background optimization task ended without reporting a result")]
    WorkerLost,

    #[error("Shared molecule lock was poisoned")]
    LockPoisoned,
}
