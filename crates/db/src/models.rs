//! Row structs that map 1-to-1 onto database tables.
//!
//! These are *persistence* models — they carry no domain behaviour. Domain
//! types (`Node`, `Workflow`, `Task`) live in the `engine` crate; repository
//! functions translate between the two at the persistence boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// node_states / task_states lookup tables
// ---------------------------------------------------------------------------

/// Mirrors the `node_states` lookup table. The numeric ids are load-bearing
/// — they are what's actually stored in `nodes.node_state_id` (spec §6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum NodeStateId {
    Available = 1,
    InUse = 2,
    Recovery = 3,
    Offline = 4,
    Error = 5,
    Restarting = 6,
}

impl NodeStateId {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Mirrors the `task_states` lookup table and `tasks.task_state_id`.
///
/// `PAUSED` is intentionally absent: spec §9 notes some source variants
/// persisted a `"PAUSED"` task state, but the canonical enum table only ever
/// enumerated these four. This implementation follows that — pause is an
/// in-memory-only state (see `engine::task::TaskState`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum TaskStateId {
    Pending = 1,
    Active = 2,
    Finished = 3,
    Error = 4,
}

impl TaskStateId {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

// ---------------------------------------------------------------------------
// nodes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NodeRow {
    pub id: String,
    pub name: String,
    pub node_state_id: i32,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// node_properties
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NodePropertyRow {
    pub id: i64,
    pub node_id: String,
    pub name: String,
    pub value: String,
}

// ---------------------------------------------------------------------------
// node_call_records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NodeCallRecordRow {
    pub id: i64,
    pub node_id: String,
    pub endpoint: Option<String>,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub duration: f64,
    pub outcome: String,
}

// ---------------------------------------------------------------------------
// workflows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkflowRow {
    pub id: i64,
    pub name: String,
    pub source_node_id: String,
    pub destination_node_id: String,
    /// Declared argument schema, serialised from `engine::ArgSchema`.
    pub args: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StepRow {
    pub id: i64,
    pub node_id: String,
    pub workflow_id: i64,
    pub position: i32,
}

// ---------------------------------------------------------------------------
// tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub workflow_id: i64,
    pub active_step: Option<String>,
    pub task_state_id: i32,
    pub args: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// workflow_usage_records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkflowUsageRecordRow {
    pub id: i64,
    pub workflow_id: i64,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// execution_logs (the ExecutionRecord of spec §3)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExecutionLogRow {
    pub id: i64,
    pub task_id: Uuid,
    pub workflow_id: i64,
    /// Either a node id, or the synthetic label `"w. acc."` for a gate-wait
    /// window (spec §3).
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// logs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LogRow {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub logger_name: String,
    pub log_level: String,
    pub module: String,
    pub caller: String,
    pub line: i32,
    pub message: String,
}

// ---------------------------------------------------------------------------
// access_logs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessLogRow {
    pub host: String,
    pub authorized: bool,
    pub identifier: Option<String>,
    pub path: String,
    pub method: String,
}
