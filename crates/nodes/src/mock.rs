//! `MockAction` — a test double for [`NodeAction`].
//!
//! Used by the engine crate's unit and integration tests, and by the
//! `"mock"` node type the default JSON node factory knows how to build —
//! the only node kind this repository ships a real driver for (spec §1: the
//! engine consumes node drivers as opaque, externally supplied
//! constructors).

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::traits::{ActionOutcome, NextNodePolicy, NodeIdentity};
use crate::NodeAction;

/// What `action()` does when called.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    /// Always succeed, echoing `status = 0`.
    Succeed,
    /// Always fail with the given status/message/endpoint.
    Fail { status: i32, message: String, endpoint: Option<String> },
}

/// A configurable node driver used throughout the test suite.
///
/// Records every call it receives (task id, in call order) and exposes
/// `set_reachable`/`set_restart_result` so a test can simulate a node going
/// offline mid-workflow or a failed recovery attempt.
pub struct MockAction {
    pub name: String,
    behaviour: Mutex<MockBehaviour>,
    pub calls: Arc<Mutex<Vec<Uuid>>>,
    reachable: AtomicBool,
    restart_result: AtomicBool,
    policy: Mutex<NextNodePolicy>,
}

impl MockAction {
    pub fn succeeding(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behaviour: Mutex::new(MockBehaviour::Succeed),
            calls: Arc::new(Mutex::new(Vec::new())),
            reachable: AtomicBool::new(true),
            restart_result: AtomicBool::new(true),
            policy: Mutex::new(NextNodePolicy::Next),
        }
    }

    pub fn failing(name: impl Into<String>, status: i32, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behaviour: Mutex::new(MockBehaviour::Fail {
                status,
                message: message.into(),
                endpoint: None,
            }),
            calls: Arc::new(Mutex::new(Vec::new())),
            reachable: AtomicBool::new(true),
            restart_result: AtomicBool::new(true),
            policy: Mutex::new(NextNodePolicy::Next),
        }
    }

    pub fn with_endpoint(self, endpoint: impl Into<String>) -> Self {
        if let MockBehaviour::Fail { endpoint: ep, .. } = &mut *self.behaviour.lock().unwrap() {
            *ep = Some(endpoint.into());
        }
        self
    }

    pub fn with_policy(self, policy: NextNodePolicy) -> Self {
        *self.policy.lock().unwrap() = policy;
        self
    }

    /// Make the node succeed on subsequent `action()` calls (used after a
    /// test drives a failure and wants to verify `continue` behaviour).
    pub fn set_succeeding(&self) {
        *self.behaviour.lock().unwrap() = MockBehaviour::Succeed;
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_restart_result(&self, ok: bool) {
        self.restart_result.store(ok, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl NodeAction for MockAction {
    async fn action(
        &self,
        _src: Option<&NodeIdentity>,
        _dst: Option<&NodeIdentity>,
        task_id: Uuid,
        _args: Option<&Value>,
    ) -> ActionOutcome {
        self.calls.lock().unwrap().push(task_id);

        match &*self.behaviour.lock().unwrap() {
            MockBehaviour::Succeed => ActionOutcome::ok(),
            MockBehaviour::Fail { status, message, endpoint } => ActionOutcome {
                status: *status,
                message: Some(message.clone()),
                endpoint: endpoint.clone(),
            },
        }
    }

    async fn restart(&self) -> bool {
        self.restart_result.load(Ordering::SeqCst)
    }

    async fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    fn next_node_policy(&self) -> NextNodePolicy {
        *self.policy.lock().unwrap()
    }
}
