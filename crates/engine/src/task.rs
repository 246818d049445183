//! `Task` — per-job worker that walks a workflow's steps.
//!
//! One `Task` is spawned as one dedicated `tokio::task` per submission (spec
//! §5: "no pooling"). It owns its step index and flags exclusively; the only
//! external entry points are [`Task::stop`], [`Task::pause_execution`], and
//! [`Task::continue_execution`].

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tracing::{error, info, warn};
use uuid::Uuid;

use db::DbPool;

use crate::models::Workflow;

/// Persisted task state — mirrors `db::models::TaskStateId`. `PAUSED` is
/// deliberately not a variant here: pausing is represented by the
/// `ParkLatch` being set while the task is `Active` (see `TaskStatus`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Active,
    Finished,
    Error,
}

impl TaskState {
    pub fn as_state_id(self) -> i32 {
        match self {
            TaskState::Pending => 1,
            TaskState::Active => 2,
            TaskState::Finished => 3,
            TaskState::Error => 4,
        }
    }
}

/// The publicly-observable status, exposed through `Task::serialize`.
/// `Paused` is computed, not stored: `Active` plus a set park latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Active,
    Paused,
    Finished,
    Error,
}

/// Latch + condition pair used to park a worker between steps, per spec
/// §9 ("do not model this with language-specific async primitives" —
/// this is the Rust-idiomatic rendition of a latch/condvar: a bool guarded
/// by a mutex, with `Notify` standing in for the condition variable).
#[derive(Default)]
pub struct ParkLatch {
    set: AsyncMutex<bool>,
    notify: Notify,
}

impl ParkLatch {
    pub fn new() -> Self {
        Self { set: AsyncMutex::new(false), notify: Notify::new() }
    }

    pub async fn set(&self) {
        *self.set.lock().await = true;
    }

    pub async fn is_set(&self) -> bool {
        *self.set.lock().await
    }

    pub async fn clear_and_notify(&self) {
        *self.set.lock().await = false;
        self.notify.notify_waiters();
    }

    /// Blocks until the latch is cleared. Registers for notification before
    /// checking the flag so a `clear_and_notify` racing with this call is
    /// never missed.
    pub async fn park(&self) {
        loop {
            let notified = self.notify.notified();
            if !*self.set.lock().await {
                return;
            }
            notified.await;
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    pub id: Uuid,
    pub workflow_id: i64,
    pub state: TaskStatus,
    pub current_step_index: i64,
    pub args: Option<Value>,
    pub start_time: DateTime<Utc>,
}

pub struct Task {
    pub id: Uuid,
    pub workflow: Arc<Workflow>,
    pub args: Option<Value>,
    state: StdMutex<TaskState>,
    current_step_index: AtomicI64,
    stop_flag: AtomicBool,
    latch: ParkLatch,
    start_time: DateTime<Utc>,
}

impl Task {
    pub fn new(workflow: Arc<Workflow>, args: Option<Value>) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            workflow,
            args,
            state: StdMutex::new(TaskState::Pending),
            current_step_index: AtomicI64::new(-1),
            stop_flag: AtomicBool::new(false),
            latch: ParkLatch::new(),
            start_time: Utc::now(),
        })
    }

    pub fn state(&self) -> TaskState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: TaskState) {
        *self.state.lock().unwrap() = state;
    }

    pub async fn status(&self) -> TaskStatus {
        let s = self.state();
        if s == TaskState::Active && self.latch.is_set().await {
            return TaskStatus::Paused;
        }
        match s {
            TaskState::Pending => TaskStatus::Pending,
            TaskState::Active => TaskStatus::Active,
            TaskState::Finished => TaskStatus::Finished,
            TaskState::Error => TaskStatus::Error,
        }
    }

    pub async fn serialize(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id,
            workflow_id: self.workflow.id,
            state: self.status().await,
            current_step_index: self.current_step_index.load(Ordering::SeqCst),
            args: self.args.clone(),
            start_time: self.start_time,
        }
    }

    /// §4.3.1 Cancellation: sets `stop_flag` and clears the latch so any
    /// parked worker wakes and exits. Observed only at the next pre-step
    /// check or on wake from park — an in-flight `execute()` is not
    /// interrupted.
    pub async fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        self.latch.clear_and_notify().await;
    }

    /// §4.3.2 Pause: the worker observes the latch only after completing
    /// the current step, so a running instrument is never interrupted.
    pub async fn pause_execution(&self) {
        self.latch.set().await;
    }

    /// §4.3.3 Continue: restarts every ERROR/RECOVERY node along the
    /// workflow; if any restart fails the whole operation fails without
    /// resuming the task.
    pub async fn continue_execution(&self, pool: &DbPool) -> bool {
        for node in &self.workflow.steps {
            let needs_restart = matches!(
                node.state(),
                crate::node::NodeState::Error | crate::node::NodeState::Recovery
            );
            if needs_restart && !node.restart(pool).await {
                warn!("continue_execution: restart failed for node '{}'", node.id);
                return false;
            }
        }
        self.set_state(TaskState::Active);
        if let Err(e) = db::repository::tasks::set_active(pool, self.id).await {
            error!("failed to persist task '{}' as active on continue: {}", self.id, e);
        }
        self.latch.clear_and_notify().await;
        true
    }

    /// The worker loop. Consumes `self` via `Arc` so the orchestrator can
    /// reap the entry once this future resolves.
    pub async fn run(self: Arc<Self>, pool: DbPool) {
        self.set_state(TaskState::Active);
        if let Err(e) = db::repository::tasks::set_active(&pool, self.id).await {
            error!("failed to persist task '{}' as active: {}", self.id, e);
        }

        let steps = &self.workflow.steps;
        let mut i: i64 = 0;

        loop {
            // --- preconditions -------------------------------------------------
            if self.stop_flag.load(Ordering::SeqCst) {
                info!("task '{}' interrupted at step {}", self.id, i);
                self.finish(&pool, TaskState::Error).await;
                return;
            }

            let mut unreachable: Vec<&str> = Vec::new();
            for step in &steps[i as usize..] {
                if !step.is_usable().await {
                    unreachable.push(step.id.as_str());
                }
            }
            if !unreachable.is_empty() {
                warn!("task '{}' has unreachable downstream nodes: {:?}", self.id, unreachable);
                self.finish(&pool, TaskState::Error).await;
                return;
            }

            // --- run the step ----------------------------------------------------
            self.current_step_index.store(i, Ordering::SeqCst);
            let idx = i as usize;
            if let Err(e) = db::repository::tasks::update_active_step(&pool, self.id, Some(&steps[idx].id)).await {
                error!("failed to persist active_step for task '{}': {}", self.id, e);
            }

            let src = if idx > 0 { Some(steps[idx - 1].identity()) } else { None };
            let dst = if idx + 1 < steps.len() { Some(steps[idx + 1].identity()) } else { None };

            let outcome = steps[idx]
                .execute(&pool, self.id, self.workflow.id, src.as_ref(), dst.as_ref(), self.args.as_ref())
                .await;

            if !outcome.is_success() {
                // §4.3 step 5: a failed step parks the task in ERROR, not
                // PAUSED — PAUSED is reserved for an operator-initiated
                // `pause_execution` (§4.3.2). `active_step` is left intact
                // so the operator can see where the task is stuck.
                self.set_state(TaskState::Error);
                if let Err(e) = db::repository::tasks::set_error_parked(&pool, self.id).await {
                    error!("failed to persist task '{}' as errored: {}", self.id, e);
                }
                self.latch.set().await;
            }

            // --- park point: observed after every step, success or failure -----
            if self.latch.is_set().await {
                self.latch.park().await;
                if self.stop_flag.load(Ordering::SeqCst) {
                    info!("task '{}' stopped while parked at step {}", self.id, i);
                    self.finish(&pool, TaskState::Error).await;
                    return;
                }
            }

            if outcome.is_success() {
                i += 1;
            } else {
                let advance = steps[idx].next_node_policy() as i64;
                i += advance;
            }

            if i as usize >= steps.len() {
                self.finish(&pool, TaskState::Finished).await;
                return;
            }
        }
    }

    async fn finish(&self, pool: &DbPool, state: TaskState) {
        self.set_state(state);
        let result = match state {
            TaskState::Finished => db::repository::tasks::set_finished(pool, self.id).await,
            TaskState::Error => db::repository::tasks::set_error(pool, self.id).await,
            _ => Ok(()),
        };
        if let Err(e) = result {
            error!("failed to persist terminal state for task '{}': {}", self.id, e);
        }
        info!("task '{}' finished with state {:?}", self.id, state);
    }
}
