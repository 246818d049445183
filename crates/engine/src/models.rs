//! Core domain models: `Workflow`, `ArgSchema`.
//!
//! These are the source of truth for what a workflow looks like in memory.
//! A `Workflow` is immutable once built — reconfiguration replaces the whole
//! orchestrator registry rather than mutating one in place.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::EngineError;

// ---------------------------------------------------------------------------
// ArgSchema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    Integer,
    Float,
    String,
    Boolean,
    Array,
}

/// One argument's declared type and constraints. Validated against at the
/// HTTP boundary, not here — the engine assumes pre-validated args once a
/// task has been submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgSchema {
    pub kind: ArgKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Immutable ordered plan: which nodes to visit, in what order, with what
/// declared argument schema. Constructed once by the workflow factory at
/// config load and shared (via `Arc`) by every task that runs it.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub id: i64,
    pub name: String,
    pub steps: Vec<Arc<Node>>,
    pub args_schema: Option<HashMap<String, ArgSchema>>,
}

impl Workflow {
    /// Rejects step counts below 2, per spec.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        steps: Vec<Arc<Node>>,
        args_schema: Option<HashMap<String, ArgSchema>>,
    ) -> Result<Self, EngineError> {
        let name = name.into();
        if steps.len() < 2 {
            return Err(EngineError::WorkflowTooShort(name));
        }
        Ok(Self { id, name, steps, args_schema })
    }

    pub fn source(&self) -> &Arc<Node> {
        &self.steps[0]
    }

    pub fn destination(&self) -> &Arc<Node> {
        self.steps.last().expect("workflow always has >= 2 steps")
    }
}
