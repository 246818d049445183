//! Integration tests covering the concrete scenarios described for the task
//! runner and node gate. Each test gets its own ephemeral, migrated
//! Postgres database via `#[sqlx::test]`.

use std::sync::Arc;
use std::time::Duration;

use nodes::mock::MockAction;
use nodes::{NextNodePolicy, NodeAction};
use sqlx::PgPool;

use crate::node::{Node, NodeState};
use crate::task::{Task, TaskState};
use crate::Workflow;

fn node_from(name: &str, action: Arc<MockAction>) -> Arc<Node> {
    let driver: Arc<dyn NodeAction> = action;
    Arc::new(Node::new(name, name, driver))
}

/// Inserts the FK rows a task/node exercise needs (`nodes`, `workflows`,
/// `steps`) and returns an in-memory `Workflow` wired to the same ids.
async fn seed_workflow(pool: &PgPool, workflow_id: i64, node_names: &[&str]) -> (Arc<Workflow>, Vec<Arc<MockAction>>) {
    let mut steps = Vec::new();
    let mut actions = Vec::new();

    for name in node_names {
        let name = *name;
        let action = Arc::new(MockAction::succeeding(name));
        db::repository::nodes::upsert(pool, name, name, NodeState::Available.as_state_id())
            .await
            .expect("seed node");
        steps.push(node_from(name, action.clone()));
        actions.push(action);
    }

    db::repository::workflows::upsert(
        pool,
        workflow_id,
        &format!("wf-{workflow_id}"),
        &steps[0].id,
        &steps.last().unwrap().id,
        None,
    )
    .await
    .expect("seed workflow");
    for (pos, step) in steps.iter().enumerate() {
        db::repository::steps::insert(pool, workflow_id, &step.id, pos as i32).await.ok();
    }

    let workflow = Workflow::new(workflow_id, format!("wf-{workflow_id}"), steps, None).expect("valid workflow");

    (Arc::new(workflow), actions)
}

#[sqlx::test(migrator = "db::pool::MIGRATOR")]
async fn happy_path_three_nodes_finish(pool: PgPool) {
    let (workflow, actions) = seed_workflow(&pool, 1, &["a", "b", "c"]).await;

    let task = Task::new(workflow.clone(), None);
    db::repository::tasks::insert(&pool, task.id, workflow.id, None).await.unwrap();

    task.clone().run(pool.clone()).await;

    assert_eq!(task.state(), TaskState::Finished);
    for action in &actions {
        assert_eq!(action.call_count(), 1);
    }

    let row = db::repository::tasks::get(&pool, task.id).await.unwrap().unwrap();
    assert_eq!(row.task_state_id, TaskState::Finished.as_state_id());

    let records = db::repository::node_call_records::get_for_node(&pool, "a").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, "success");
}

#[sqlx::test(migrator = "db::pool::MIGRATOR")]
async fn mid_step_failure_then_continue_resumes_at_next(pool: PgPool) {
    let (seed, _seed_actions) = seed_workflow(&pool, 2, &["a", "b", "c"]).await;

    // 'b' fails once with a jam; default NextNodePolicy::Next means continue
    // resumes at 'c', not a re-run of 'b'.
    let b_action = Arc::new(MockAction::failing("b", 42, "jam").with_endpoint("/grip"));
    let steps = vec![seed.steps[0].clone(), node_from("b", b_action.clone()), seed.steps[2].clone()];
    let workflow = Arc::new(Workflow::new(2, "wf-2", steps, None).unwrap());

    let task = Task::new(workflow.clone(), None);
    db::repository::tasks::insert(&pool, task.id, workflow.id, None).await.unwrap();

    let worker = task.clone();
    let pool_clone = pool.clone();
    let handle = tokio::spawn(async move { worker.run(pool_clone).await });

    // Give the worker time to hit the failure and park. A step failure parks
    // the task in ERROR, not PAUSED — PAUSED is reserved for an operator-
    // initiated `pause_execution` (spec §4.3 step 5, §8 scenario 2).
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(task.status().await, crate::task::TaskStatus::Error);

    b_action.set_succeeding();
    let continued = task.continue_execution(&pool).await;
    assert!(continued);

    handle.await.unwrap();
    assert_eq!(task.state(), TaskState::Finished);

    let records = db::repository::node_call_records::get_for_node(&pool, "b").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, "error");
}

#[sqlx::test(migrator = "db::pool::MIGRATOR")]
async fn unreachable_downstream_node_aborts_before_first_step(pool: PgPool) {
    let (workflow, actions) = seed_workflow(&pool, 3, &["a", "b", "c"]).await;
    actions[2].set_reachable(false);

    let task = Task::new(workflow.clone(), None);
    db::repository::tasks::insert(&pool, task.id, workflow.id, None).await.unwrap();

    task.clone().run(pool.clone()).await;

    assert_eq!(task.state(), TaskState::Error);
    assert_eq!(actions[0].call_count(), 0, "no step should have executed");

    let row = db::repository::tasks::get(&pool, task.id).await.unwrap().unwrap();
    assert!(row.active_step.is_none());
}

#[sqlx::test(migrator = "db::pool::MIGRATOR")]
async fn stop_while_parked_terminates_with_error_and_joins(pool: PgPool) {
    let a_action = Arc::new(MockAction::succeeding("a"));
    let b_action = Arc::new(MockAction::failing("b", 7, "stuck"));
    let c_action = Arc::new(MockAction::succeeding("c"));
    for name in ["a", "b", "c"] {
        db::repository::nodes::upsert(&pool, name, name, NodeState::Available.as_state_id()).await.unwrap();
    }
    let steps = vec![
        node_from("a", a_action),
        node_from("b", b_action),
        node_from("c", c_action),
    ];
    let workflow = Arc::new(Workflow::new(4, "wf-4", steps, None).unwrap());
    db::repository::workflows::upsert(&pool, 4, "wf-4", "a", "c", None).await.unwrap();

    let task = Task::new(workflow.clone(), None);
    db::repository::tasks::insert(&pool, task.id, workflow.id, None).await.unwrap();

    let worker = task.clone();
    let pool_clone = pool.clone();
    let handle = tokio::spawn(async move { worker.run(pool_clone).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    task.stop().await;
    handle.await.unwrap();

    assert_eq!(task.state(), TaskState::Error);
}

#[test]
fn next_node_policy_offsets_are_load_bearing() {
    assert_eq!(NextNodePolicy::SelfRepeat as i64, 0);
    assert_eq!(NextNodePolicy::Next as i64, 1);
}

#[test]
fn workflow_rejects_fewer_than_two_steps() {
    let node = node_from("solo", Arc::new(MockAction::succeeding("solo")));
    let result = Workflow::new(1, "too-short", vec![node], None);
    assert!(result.is_err());
}

#[tokio::test]
async fn park_latch_wakes_on_clear_and_notify() {
    let latch = Arc::new(crate::task::ParkLatch::new());
    latch.set().await;

    let waiter = latch.clone();
    let handle = tokio::spawn(async move {
        waiter.park().await;
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    latch.clear_and_notify().await;

    tokio::time::timeout(Duration::from_millis(200), handle)
        .await
        .expect("park should have returned after clear_and_notify")
        .unwrap();
}
