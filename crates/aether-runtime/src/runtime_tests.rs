use super::*;
use aether_workqueue::TaskStatus;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

fn test_config(dir: &TempDir) -> Config {
    let mut config = Config {
        data_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    config.runner.poll_interval_ms = 20;
    config.runner.workers = 2;
    config
}

async fn wait_for_status(runtime: &AetherRuntime, id: &str, status: TaskStatus) -> Task {
    for _ in 0..250 {
        let task = runtime.get_task(id).await.unwrap().unwrap();
        if task.status == status {
            return task;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("task {id} never reached {status}");
}

#[tokio::test]
async fn test_new_creates_data_dir_layout() {
    let dir = TempDir::new().unwrap();
    let runtime = AetherRuntime::new(test_config(&dir)).await.unwrap();

    assert!(dir.path().join("aether_tasks.db").exists());
    assert!(dir.path().join("workspace").is_dir());
    assert!(!runtime.is_started());
    assert!(runtime.router().names().contains(&"task".to_string()));
}

#[tokio::test]
async fn test_start_twice_fails() {
    let dir = TempDir::new().unwrap();
    let runtime = AetherRuntime::new(test_config(&dir)).await.unwrap();

    runtime.start().unwrap();
    assert_eq!(runtime.worker_ids().len(), 2);
    assert!(matches!(runtime.start(), Err(RuntimeError::AlreadyStarted)));

    runtime.shutdown().await;
    assert!(!runtime.is_started());
}

#[tokio::test]
async fn test_runs_write_text_task() {
    let dir = TempDir::new().unwrap();
    let runtime = AetherRuntime::new(test_config(&dir)).await.unwrap();
    runtime.start().unwrap();

    let id = runtime
        .enqueue(EnqueueRequest::new(
            "files.write_text",
            json!({"path": "out/a.txt", "text": "hi"}),
        ))
        .await
        .unwrap();
    let task = wait_for_status(&runtime, &id, TaskStatus::Success).await;
    runtime.shutdown().await;

    assert_eq!(task.result.unwrap()["bytes_written"], 2);
    let written = std::fs::read_to_string(dir.path().join("workspace/out/a.txt")).unwrap();
    assert_eq!(written, "hi");
}

#[tokio::test]
async fn test_shell_policy_failure_is_terminal() {
    let dir = TempDir::new().unwrap();
    let runtime = AetherRuntime::new(test_config(&dir)).await.unwrap();
    runtime.start().unwrap();

    let id = runtime
        .enqueue(EnqueueRequest::new("shell.exec", json!({"cmd": ["rm", "-rf", "/"]})))
        .await
        .unwrap();
    let task = wait_for_status(&runtime, &id, TaskStatus::Failed).await;
    runtime.shutdown().await;

    assert_eq!(task.attempt, 1);
    assert_eq!(task.error.unwrap()["type"], "policy_error");
}

#[tokio::test]
async fn test_heartbeat_writes_dashboard_and_notifies() {
    let dir = TempDir::new().unwrap();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    let runtime = AetherRuntime::with_observer(
        test_config(&dir),
        Arc::new(move |_: &OrchestratorStatus| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    )
    .await
    .unwrap();

    runtime.set_gates(GatesConfig {
        safe_mode: true,
        ..Default::default()
    });
    runtime.start().unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    runtime.shutdown().await;

    assert!(seen.load(Ordering::SeqCst) >= 1);
    let status = runtime.orchestrator_status().unwrap();
    assert_eq!(status.status, aether_daemon::RunState::Paused);

    let content = std::fs::read_to_string(dir.path().join("aether_dashboard.json")).unwrap();
    let doc: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(doc["orchestrator"]["status"], "PAUSED");
}

#[tokio::test]
async fn test_disabled_orchestrator_does_not_tick() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.orchestrator.enabled = false;
    let runtime = AetherRuntime::new(config).await.unwrap();

    runtime.start().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    runtime.shutdown().await;

    assert!(runtime.orchestrator_status().is_none());
    assert!(!dir.path().join("aether_dashboard.json").exists());
}

#[tokio::test]
async fn test_state_snapshot_seeded_from_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("aether_state.json"), r#"{"status": "FROZEN"}"#).unwrap();
    let runtime = AetherRuntime::new(test_config(&dir)).await.unwrap();

    assert!(runtime.services().orchestrator.is_paused());
    runtime.set_state(json!({}));
    assert!(!runtime.services().orchestrator.is_paused());
}

#[tokio::test]
async fn test_route_command() {
    let dir = TempDir::new().unwrap();
    let runtime = AetherRuntime::new(test_config(&dir)).await.unwrap();

    let outcome = runtime.route_command("help").await.unwrap();
    assert!(outcome.ok);
    assert!(outcome.message.contains("task write"));

    let outcome = runtime.route_command("task write hello.txt hi").await.unwrap();
    assert_eq!(outcome.command, "task");

    assert!(runtime.route_command("make me a sandwich").await.is_none());
}
