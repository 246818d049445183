//! The `NodeAction` trait — the contract every instrument driver must fulfil.
//!
//! The engine dispatches through this trait object rather than a concrete
//! type hierarchy: a node kind (a real instrument driver, or the built-in
//! [`crate::mock::MockAction`] test double) only has to override the hook
//! points it cares about.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

/// Identity of a neighbouring step, handed to `action` so instruments that
/// move a payload between two physical locations know where it came from
/// and where it's headed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub id: String,
    pub name: String,
}

/// The three-way outcome of a node's `action`.
///
/// `status == 0` is success; any other value is an operator-visible failure.
/// `message` and `endpoint` are free-form context persisted alongside the
/// call record — a driver is free to leave either as `None`.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub status: i32,
    pub message: Option<String>,
    pub endpoint: Option<String>,
}

impl ActionOutcome {
    pub fn ok() -> Self {
        Self { status: 0, message: None, endpoint: None }
    }

    pub fn failure(status: i32, message: impl Into<String>) -> Self {
        Self { status, message: Some(message.into()), endpoint: None }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

/// Whether the task runner should repeat the failed step or advance past it
/// once an operator has cleared the error.
///
/// The numeric values are load-bearing: they're used as integer offsets
/// added to the current step index when the task resumes after `continue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum NextNodePolicy {
    /// Re-run this same step — the node's own recovery means "redo me".
    SelfRepeat = 0,
    /// Advance to the following step — the operator is expected to have
    /// placed the payload at this step's destination by hand.
    Next = 1,
}

impl Default for NextNodePolicy {
    fn default() -> Self {
        NextNodePolicy::Next
    }
}

/// The core node trait.
///
/// All built-in nodes and future hardware drivers implement this; the
/// engine crate wraps an `Arc<dyn NodeAction>` in [`engine::Node`] to add the
/// gate, state machine, and persistence bookkeeping described in spec §4.1.
#[async_trait]
pub trait NodeAction: Send + Sync {
    /// Run the instrument. `src`/`dst` are the previous/next workflow step
    /// (`None` at the first/last step respectively); `args` is the task's
    /// declared arguments, already validated at the HTTP boundary.
    async fn action(
        &self,
        src: Option<&NodeIdentity>,
        dst: Option<&NodeIdentity>,
        task_id: Uuid,
        args: Option<&Value>,
    ) -> ActionOutcome;

    /// Attempt to recover the node from `ERROR`/`RECOVERY`. Returns `true` on
    /// success, in which case the caller transitions the node to
    /// `AVAILABLE`; on `false` the node's state is left untouched.
    async fn restart(&self) -> bool {
        true
    }

    /// Tear the instrument down. Always followed by an unconditional
    /// transition to `OFFLINE`, regardless of the return value.
    async fn shutdown(&self) {}

    /// Whether the underlying instrument can currently be reached at all,
    /// independent of its logical `ERROR` state. Defaults to always
    /// reachable, matching simulation-mode nodes that have no real link to
    /// check.
    async fn is_reachable(&self) -> bool {
        true
    }

    /// Runs immediately before `action`, while still holding the gate.
    async fn pre_execution(&self, _task_id: Uuid) {}

    /// Runs immediately after a *successful* `action`, while still holding
    /// the gate.
    async fn post_execution(&self, _task_id: Uuid, _outcome: &ActionOutcome) {}

    /// Resume policy applied after an operator clears this node's error.
    fn next_node_policy(&self) -> NextNodePolicy {
        NextNodePolicy::default()
    }
}
