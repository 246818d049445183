//! Error taxonomy.
//!
//! Two distinct types on purpose: [`ErrorCode`] is the public, wire-stable
//! return value of every `Orchestrator` method (it crosses into the `api`
//! crate as-is and maps 1:1 to an HTTP status there); [`EngineError`] is the
//! richer internal error used while building the types `ErrorCode` collapses
//! down from (factory parsing, workflow construction).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Return code shared by every `Orchestrator` public method.
///
/// Step-level node failures are *not* represented here — they surface as a
/// task state transition and a parked worker, never as a return code (see
/// the task module).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Ok,
    Cancelled,
    CouldNotFindConfiguration,
    CouldNotParseConfiguration,
    DatabaseConnectionRefused,
    ContentNotFound,
    ContinueTaskFailed,
    RestartNodeFailed,
}

/// Internal errors raised while constructing domain objects — workflow
/// validation, config-blob parsing, node/workflow factory failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("workflow '{0}' must have at least 2 steps")]
    WorkflowTooShort(String),

    #[error("workflow '{workflow}' references unknown node id '{node_id}'")]
    UnknownNodeReference { workflow: String, node_id: String },

    #[error("unsupported node_type '{0}'")]
    UnsupportedNodeType(String),

    #[error("malformed configuration: {0}")]
    ConfigMalformed(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] db::DbError),
}

impl From<&EngineError> for ErrorCode {
    fn from(err: &EngineError) -> Self {
        match err {
            EngineError::ConfigMalformed(_)
            | EngineError::WorkflowTooShort(_)
            | EngineError::UnknownNodeReference { .. }
            | EngineError::UnsupportedNodeType(_) => ErrorCode::CouldNotParseConfiguration,
            EngineError::Database(_) => ErrorCode::DatabaseConnectionRefused,
        }
    }
}
