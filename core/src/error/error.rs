use thiserror::Error;

use super::query::QueryError;
use crate::state::CallbackPhase;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),
    #[error("{0}")]
    Query(#[from] QueryError),
    #[error("{0}")]
    State(#[from] StateError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Errors raised while building, driving or managing media states.
#[derive(Error, Debug)]
pub enum StateError {
    /// A `once` validator vetoed the configuration. The entity itself fails
    /// silently (`is_valid() == false`); only the manager reports this.
    #[error("state '{state_id}' rejected by construction-time validation")]
    ConstructionRejected { state_id: String },

    #[error("{phase} callback #{index} of state '{state_id}' failed: {source}")]
    Callback {
        state_id: String,
        phase: CallbackPhase,
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Duplicate state ID: {0}")]
    DuplicateId(String),

    #[error("State not found: {0}")]
    NotFound(String),
}

impl StateError {
    /// ID of the state the error belongs to.
    pub fn state_id(&self) -> &str {
        match self {
            Self::ConstructionRejected { state_id } | Self::Callback { state_id, .. } => state_id,
            Self::DuplicateId(id) | Self::NotFound(id) => id,
        }
    }

    pub fn is_callback_fault(&self) -> bool {
        matches!(self, Self::Callback { .. })
    }
}
