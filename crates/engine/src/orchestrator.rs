//! `Orchestrator` — lifecycle manager, node/workflow registry, task
//! spawner, config reloader (spec §4.4).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use db::DbPool;
use nodes::NodeAction;

use crate::models::{ArgSchema, Workflow};
use crate::node::Node;
use crate::task::Task;
use crate::{EngineError, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Stopped,
    Running,
    Error,
}

// ---------------------------------------------------------------------------
// Node / workflow factories
// ---------------------------------------------------------------------------

/// Opaque constructor, keyed by a configuration blob, for the node fleet.
/// Concrete lab-hardware drivers are supplied externally — this repository
/// only ships [`JsonNodeFactory`], which knows how to build the `"mock"`
/// node type.
#[async_trait]
pub trait NodeFactory: Send + Sync {
    async fn build(&self, blob: &[u8]) -> Result<Vec<Arc<Node>>, EngineError>;
}

/// Opaque constructor for the workflow list. Receives the already-built node
/// map so it can resolve each workflow's step list by node id.
#[async_trait]
pub trait WorkflowFactory: Send + Sync {
    async fn build(
        &self,
        blob: &[u8],
        nodes: &HashMap<String, Arc<Node>>,
    ) -> Result<Vec<Arc<Workflow>>, EngineError>;
}

#[derive(Deserialize)]
struct NodeConfig {
    id: String,
    name: String,
    node_type: String,
}

/// Default node factory. The only `node_type` it knows how to build is
/// `"mock"` (`nodes::mock::MockAction`); anything else is a configuration
/// error, matching this repository's stance that real instrument drivers are
/// supplied by the deployment, not by this crate.
pub struct JsonNodeFactory;

#[async_trait]
impl NodeFactory for JsonNodeFactory {
    async fn build(&self, blob: &[u8]) -> Result<Vec<Arc<Node>>, EngineError> {
        let configs: Vec<NodeConfig> = serde_json::from_slice(blob)?;
        let mut built = Vec::with_capacity(configs.len());
        for c in configs {
            let action: Arc<dyn NodeAction> = match c.node_type.as_str() {
                "mock" => Arc::new(nodes::mock::MockAction::succeeding(c.name.clone())),
                other => return Err(EngineError::UnsupportedNodeType(other.to_string())),
            };
            built.push(Arc::new(Node::new(c.id, c.name, action)));
        }
        Ok(built)
    }
}

#[derive(Deserialize)]
struct WorkflowConfig {
    id: i64,
    name: String,
    steps: Vec<String>,
    #[serde(default)]
    args_schema: Option<HashMap<String, ArgSchema>>,
}

pub struct JsonWorkflowFactory;

#[async_trait]
impl WorkflowFactory for JsonWorkflowFactory {
    async fn build(
        &self,
        blob: &[u8],
        nodes: &HashMap<String, Arc<Node>>,
    ) -> Result<Vec<Arc<Workflow>>, EngineError> {
        let configs: Vec<WorkflowConfig> = serde_json::from_slice(blob)?;
        let mut built = Vec::with_capacity(configs.len());
        for c in configs {
            let mut steps = Vec::with_capacity(c.steps.len());
            for node_id in &c.steps {
                let node = nodes.get(node_id).cloned().ok_or_else(|| EngineError::UnknownNodeReference {
                    workflow: c.name.clone(),
                    node_id: node_id.clone(),
                })?;
                steps.push(node);
            }
            built.push(Arc::new(Workflow::new(c.id, c.name, steps, c.args_schema)?));
        }
        Ok(built)
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

type TaskRegistry = Arc<Mutex<HashMap<Uuid, (Arc<Task>, JoinHandle<()>)>>>;

/// A registered start/stop hook — invoked with no arguments, matching the
/// original orchestrator's `Callable[[], None]` callbacks.
type LifecycleCallback = Arc<dyn Fn() + Send + Sync>;

pub struct Orchestrator {
    pool: DbPool,
    node_factory: Arc<dyn NodeFactory>,
    workflow_factory: Arc<dyn WorkflowFactory>,
    state: Mutex<OrchestratorState>,
    nodes: Mutex<HashMap<String, Arc<Node>>>,
    workflows: Mutex<HashMap<i64, Arc<Workflow>>>,
    running_tasks: TaskRegistry,
    start_callback: Mutex<Option<LifecycleCallback>>,
    stop_callback: Mutex<Option<LifecycleCallback>>,
}

impl Orchestrator {
    pub fn new(pool: DbPool, node_factory: Arc<dyn NodeFactory>, workflow_factory: Arc<dyn WorkflowFactory>) -> Self {
        Self {
            pool,
            node_factory,
            workflow_factory,
            state: Mutex::new(OrchestratorState::Stopped),
            nodes: Mutex::new(HashMap::new()),
            workflows: Mutex::new(HashMap::new()),
            running_tasks: Arc::new(Mutex::new(HashMap::new())),
            start_callback: Mutex::new(None),
            stop_callback: Mutex::new(None),
        }
    }

    pub async fn state(&self) -> OrchestratorState {
        *self.state.lock().await
    }

    pub async fn is_running(&self) -> bool {
        *self.state.lock().await == OrchestratorState::Running
    }

    /// Registers a hook invoked once `start()` has transitioned to
    /// `RUNNING` (spec §4.4 "invoke the start callback"). Replaces any
    /// previously registered start callback.
    pub async fn register_start_callback(&self, callback: impl Fn() + Send + Sync + 'static) {
        *self.start_callback.lock().await = Some(Arc::new(callback));
    }

    /// Registers a hook invoked at the very beginning of `stop()`, before any
    /// teardown (spec §4.4 "invoke the stop callback"). Replaces any
    /// previously registered stop callback.
    pub async fn register_stop_callback(&self, callback: impl Fn() + Send + Sync + 'static) {
        *self.stop_callback.lock().await = Some(Arc::new(callback));
    }

    /// §4.4 `start`: idempotent (returns `CANCELLED` if already running),
    /// otherwise verifies DB connectivity, loads config, transitions to
    /// `RUNNING`, and invokes the start callback.
    pub async fn start(&self, nodes_blob: &[u8], workflows_blob: &[u8]) -> ErrorCode {
        if *self.state.lock().await == OrchestratorState::Running {
            return ErrorCode::Cancelled;
        }

        if !db::pool::is_connected(&self.pool).await {
            *self.state.lock().await = OrchestratorState::Error;
            return ErrorCode::DatabaseConnectionRefused;
        }

        let code = self.load_config(nodes_blob, workflows_blob).await;
        if code != ErrorCode::Ok {
            *self.state.lock().await = OrchestratorState::Error;
            return code;
        }

        *self.state.lock().await = OrchestratorState::Running;
        info!("orchestrator started");

        if let Some(callback) = self.start_callback.lock().await.clone() {
            callback();
        }

        ErrorCode::Ok
    }

    /// §4.4 `stop`: idempotent, invokes the stop callback, joins every
    /// running worker, shuts down every node, and clears the registries.
    pub async fn stop(&self) -> ErrorCode {
        if *self.state.lock().await == OrchestratorState::Stopped {
            return ErrorCode::Cancelled;
        }

        if let Some(callback) = self.stop_callback.lock().await.clone() {
            callback();
        }

        let entries: Vec<(Arc<Task>, JoinHandle<()>)> = {
            let mut running = self.running_tasks.lock().await;
            running.drain().map(|(_, v)| v).collect()
        };
        for (task, _) in &entries {
            task.stop().await;
        }
        for (_, handle) in entries {
            let _ = handle.await;
        }

        let nodes: Vec<Arc<Node>> = self.nodes.lock().await.values().cloned().collect();
        for node in &nodes {
            node.shutdown(&self.pool).await;
        }

        self.nodes.lock().await.clear();
        self.workflows.lock().await.clear();

        *self.state.lock().await = OrchestratorState::Stopped;
        info!("orchestrator stopped");
        ErrorCode::Ok
    }

    /// §4.4 `load_config`. Callers are responsible for not invoking this
    /// while tasks are active — that check lives at the HTTP boundary
    /// (428), not here.
    pub async fn load_config(&self, nodes_blob: &[u8], workflows_blob: &[u8]) -> ErrorCode {
        if nodes_blob.is_empty() || workflows_blob.is_empty() {
            return ErrorCode::CouldNotFindConfiguration;
        }

        let new_nodes = match self.node_factory.build(nodes_blob).await {
            Ok(n) => n,
            Err(e) => {
                error!("load_config: node factory failed: {}", e);
                return ErrorCode::from(&e);
            }
        };
        let node_map: HashMap<String, Arc<Node>> =
            new_nodes.iter().map(|n| (n.id.clone(), n.clone())).collect();

        let new_workflows = match self.workflow_factory.build(workflows_blob, &node_map).await {
            Ok(w) => w,
            Err(e) => {
                error!("load_config: workflow factory failed: {}", e);
                return ErrorCode::from(&e);
            }
        };

        for node in &new_nodes {
            if let Err(e) =
                db::repository::nodes::upsert(&self.pool, &node.id, &node.name, node.state().as_state_id()).await
            {
                error!("failed to persist node '{}': {}", node.id, e);
            }
        }

        for wf in &new_workflows {
            let args_json = wf.args_schema.as_ref().and_then(|s| serde_json::to_value(s).ok());
            if let Err(e) = db::repository::workflows::upsert(
                &self.pool,
                wf.id,
                &wf.name,
                &wf.source().id,
                &wf.destination().id,
                args_json,
            )
            .await
            {
                error!("failed to persist workflow '{}': {}", wf.name, e);
                continue;
            }
            for (pos, step) in wf.steps.iter().enumerate() {
                if let Err(e) = db::repository::steps::insert(&self.pool, wf.id, &step.id, pos as i32).await {
                    error!("failed to persist step '{}' of workflow '{}': {}", step.id, wf.name, e);
                }
            }
        }

        let node_count = new_nodes.len();
        let workflow_count = new_workflows.len();

        *self.nodes.lock().await = node_map;
        *self.workflows.lock().await = new_workflows.into_iter().map(|w| (w.id, w)).collect();

        info!("config loaded: {} nodes, {} workflows", node_count, workflow_count);
        ErrorCode::Ok
    }

    /// §4.4 `add_task`. Creates a `Task`, persists its `tasks` and
    /// `workflow_usage_records` rows, spawns its worker, and registers it.
    pub async fn add_task(&self, workflow_id: i64, args: Option<Value>) -> Result<Arc<Task>, ErrorCode> {
        let workflow = {
            let workflows = self.workflows.lock().await;
            workflows.get(&workflow_id).cloned()
        }
        .ok_or(ErrorCode::ContentNotFound)?;

        let task = Task::new(workflow.clone(), args.clone());

        if let Err(e) = db::repository::tasks::insert(&self.pool, task.id, workflow.id, args).await {
            error!("failed to persist task '{}': {}", task.id, e);
        }
        if let Err(e) = db::repository::workflow_usage_records::insert(&self.pool, workflow.id).await {
            error!("failed to persist workflow usage record for '{}': {}", workflow.id, e);
        }

        let pool = self.pool.clone();
        let worker_task = task.clone();
        let registry = self.running_tasks.clone();
        let task_id = task.id;

        // Hold the registry lock across spawn + insert: otherwise a worker
        // that finishes fast enough could run its removal callback before
        // this entry is even inserted, leaking a stuck registry slot.
        let mut running = self.running_tasks.lock().await;
        let handle = tokio::spawn(async move {
            worker_task.run(pool).await;
            registry.lock().await.remove(&task_id);
        });
        running.insert(task.id, (task.clone(), handle));
        drop(running);

        Ok(task)
    }

    pub async fn running_tasks(&self) -> Vec<Arc<Task>> {
        self.running_tasks.lock().await.values().map(|(t, _)| t.clone()).collect()
    }

    pub async fn get_node(&self, id: &str) -> Option<Arc<Node>> {
        self.nodes.lock().await.get(id).cloned()
    }

    pub async fn list_workflows(&self) -> Vec<Arc<Workflow>> {
        self.workflows.lock().await.values().cloned().collect()
    }

    pub async fn get_workflow(&self, id: i64) -> Option<Arc<Workflow>> {
        self.workflows.lock().await.get(&id).cloned()
    }

    pub async fn list_nodes(&self) -> Vec<Arc<Node>> {
        self.nodes.lock().await.values().cloned().collect()
    }

    /// Thin dispatcher — `CONTENT_NOT_FOUND` if the task isn't currently
    /// running.
    pub async fn pause_task(&self, id: Uuid) -> ErrorCode {
        let task = self.running_tasks.lock().await.get(&id).map(|(t, _)| t.clone());
        match task {
            Some(t) => {
                t.pause_execution().await;
                ErrorCode::Ok
            }
            None => ErrorCode::ContentNotFound,
        }
    }

    /// Thin dispatcher — `CONTENT_NOT_FOUND` if unknown, `CONTINUE_TASK_FAILED`
    /// if a node restart along the way fails.
    pub async fn continue_task(&self, id: Uuid) -> ErrorCode {
        let task = self.running_tasks.lock().await.get(&id).map(|(t, _)| t.clone());
        match task {
            Some(t) => {
                if t.continue_execution(&self.pool).await {
                    ErrorCode::Ok
                } else {
                    warn!("continue_task: restart failed for task '{}'", id);
                    ErrorCode::ContinueTaskFailed
                }
            }
            None => ErrorCode::ContentNotFound,
        }
    }

    /// Thin dispatcher — `CONTENT_NOT_FOUND` if unknown, `RESTART_NODE_FAILED`
    /// if the driver's restart hook reports failure.
    pub async fn restart_node(&self, id: &str) -> ErrorCode {
        let node = self.nodes.lock().await.get(id).cloned();
        match node {
            Some(n) => {
                if n.restart(&self.pool).await {
                    ErrorCode::Ok
                } else {
                    ErrorCode::RestartNodeFailed
                }
            }
            None => ErrorCode::ContentNotFound,
        }
    }
}
