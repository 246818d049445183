//! `Node` — the shared, mutually-exclusive instrument wrapper.
//!
//! Wraps an `Arc<dyn NodeAction>` (the user-supplied driver) with the gate,
//! the state machine, and the persistence bookkeeping described in spec
//! §4.1. The gate is held for the entire `action()` call so two tasks can
//! never drive the same physical instrument concurrently.

use std::sync::Mutex as StdMutex;

use chrono::Utc;
use nodes::{ActionOutcome, NodeAction, NodeIdentity};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use db::DbPool;

/// In-memory node state. Numeric mapping to `db::models::NodeStateId` is
/// handled by `as_state_id`/`from_state_id` — the ids are load-bearing
/// (persisted verbatim).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeState {
    Available,
    InUse,
    Recovery,
    Offline,
    Error,
    Restarting,
}

impl NodeState {
    pub fn as_state_id(self) -> i32 {
        match self {
            NodeState::Available => 1,
            NodeState::InUse => 2,
            NodeState::Recovery => 3,
            NodeState::Offline => 4,
            NodeState::Error => 5,
            NodeState::Restarting => 6,
        }
    }
}

/// Snapshot returned by `Node::serialize`, per spec §4.1.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub name: String,
    pub status: NodeState,
    pub online: bool,
    pub task_id: Option<Uuid>,
}

pub struct Node {
    pub id: String,
    pub name: String,
    action: std::sync::Arc<dyn NodeAction>,
    /// Held across the entire `action()` call — the single-tenant guarantee.
    gate: tokio::sync::Mutex<()>,
    state: StdMutex<NodeState>,
    current_task_id: StdMutex<Option<Uuid>>,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, action: std::sync::Arc<dyn NodeAction>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            action,
            gate: tokio::sync::Mutex::new(()),
            state: StdMutex::new(NodeState::Available),
            current_task_id: StdMutex::new(None),
        }
    }

    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity { id: self.id.clone(), name: self.name.clone() }
    }

    pub fn state(&self) -> NodeState {
        *self.state.lock().unwrap()
    }

    async fn set_state(&self, pool: &DbPool, state: NodeState) {
        *self.state.lock().unwrap() = state;
        if let Err(e) = db::repository::nodes::set_state(pool, &self.id, state.as_state_id()).await {
            error!("failed to persist node '{}' state: {}", self.id, e);
        }
    }

    /// `is_usable() == reachable() AND state != ERROR` (spec §4.1).
    pub async fn is_usable(&self) -> bool {
        self.action.is_reachable().await && self.state() != NodeState::Error
    }

    pub async fn serialize(&self) -> NodeSnapshot {
        NodeSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            status: self.state(),
            online: self.action.is_reachable().await,
            task_id: *self.current_task_id.lock().unwrap(),
        }
    }

    pub fn next_node_policy(&self) -> nodes::NextNodePolicy {
        self.action.next_node_policy()
    }

    /// Execute protocol, exact order per spec §4.1.
    #[instrument(skip(self, pool, args), fields(node_id = %self.id))]
    #[allow(clippy::too_many_arguments)]
    pub async fn execute(
        &self,
        pool: &DbPool,
        task_id: Uuid,
        workflow_id: i64,
        src: Option<&NodeIdentity>,
        dst: Option<&NodeIdentity>,
        args: Option<&Value>,
    ) -> ActionOutcome {
        // 1. Record wall-clock acquisition start.
        let t_acq_start = Utc::now();

        // 2. Acquire the gate (blocking); record the wait window.
        let _guard = self.gate.lock().await;
        let t_acq_end = Utc::now();
        if let Err(e) =
            db::repository::execution_logs::insert(pool, task_id, workflow_id, "w. acc.", t_acq_start, t_acq_end).await
        {
            error!("failed to persist gate-wait record for node '{}': {}", self.id, e);
        }

        // 3. current_task_id + AVAILABLE -> IN_USE.
        *self.current_task_id.lock().unwrap() = Some(task_id);
        self.set_state(pool, NodeState::InUse).await;

        // 4. Pre-execution hook.
        self.action.pre_execution(task_id).await;

        // 5. User action.
        let t_run_start = Utc::now();
        let outcome = self.action.action(src, dst, task_id, args).await;

        if !outcome.is_success() {
            // 6. Failure path.
            self.set_state(pool, NodeState::Error).await;
            let duration = (Utc::now() - t_run_start).num_milliseconds() as f64 / 1000.0;
            if let Err(e) = db::repository::node_call_records::insert(
                pool,
                &self.id,
                outcome.endpoint.as_deref(),
                outcome.message.as_deref(),
                duration,
                "error",
            )
            .await
            {
                error!("failed to persist call record for node '{}': {}", self.id, e);
            }
            warn!(status = outcome.status, "node '{}' action failed", self.id);
            *self.current_task_id.lock().unwrap() = None;
            // gate released implicitly when `_guard` drops at end of scope
            return outcome;
        }

        // 7. Success path.
        self.action.post_execution(task_id, &outcome).await;
        let duration = (Utc::now() - t_run_start).num_milliseconds() as f64 / 1000.0;
        if let Err(e) = db::repository::node_call_records::insert(
            pool,
            &self.id,
            outcome.endpoint.as_deref(),
            outcome.message.as_deref(),
            duration,
            "success",
        )
        .await
        {
            error!("failed to persist call record for node '{}': {}", self.id, e);
        }
        if let Err(e) = db::repository::execution_logs::insert(pool, task_id, workflow_id, &self.id, t_run_start, Utc::now()).await
        {
            error!("failed to persist execution record for node '{}': {}", self.id, e);
        }
        self.set_state(pool, NodeState::Available).await;
        *self.current_task_id.lock().unwrap() = None;
        info!("node '{}' succeeded", self.id);
        outcome
    }

    /// Attempt recovery from ERROR/RECOVERY. On success transitions to
    /// AVAILABLE; on failure leaves state untouched.
    pub async fn restart(&self, pool: &DbPool) -> bool {
        let ok = self.action.restart().await;
        if ok {
            self.set_state(pool, NodeState::Available).await;
            info!("node '{}' restarted", self.id);
        } else {
            warn!("node '{}' restart failed", self.id);
        }
        ok
    }

    /// Unconditionally transitions to OFFLINE regardless of the hook's own
    /// outcome.
    pub async fn shutdown(&self, pool: &DbPool) {
        self.action.shutdown().await;
        self.set_state(pool, NodeState::Offline).await;
        info!("node '{}' shut down", self.id);
    }
}
