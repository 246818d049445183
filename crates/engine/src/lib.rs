//! `engine` crate — the concurrent execution engine: the `Node` gate, the
//! `Workflow`/`Task` domain model, the `Orchestrator`, and the error
//! taxonomy they share.

pub mod error;
pub mod models;
pub mod node;
pub mod orchestrator;
pub mod task;

pub use error::{EngineError, ErrorCode};
pub use models::{ArgKind, ArgSchema, Workflow};
pub use node::{Node, NodeSnapshot, NodeState};
pub use orchestrator::{JsonNodeFactory, JsonWorkflowFactory, NodeFactory, Orchestrator, OrchestratorState, WorkflowFactory};
pub use task::{Task, TaskSnapshot, TaskState, TaskStatus};

#[cfg(test)]
mod engine_tests;
