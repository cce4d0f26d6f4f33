use super::*;
use serde_json::json;
use tempfile::TempDir;

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn setup(allowed: &[&str]) -> (TempDir, ShellPolicy, Sandbox) {
    let dir = TempDir::new().unwrap();
    let sandbox = Sandbox::new(dir.path()).unwrap();
    let policy = ShellPolicy::new(argv(allowed), 20_000);
    (dir, policy, sandbox)
}

#[test]
fn test_tail_chars() {
    assert_eq!(tail_chars("hello", 10), "hello");
    assert_eq!(tail_chars("hello", 3), "llo");
    assert_eq!(tail_chars("héllo", 4), "éllo");
    assert_eq!(tail_chars("", 3), "");
}

#[tokio::test]
async fn test_disallowed_program_not_spawned() {
    let (_dir, policy, sandbox) = setup(&["python", "pip"]);
    let err = shell(&policy, &sandbox, &argv(&["rm", "-rf", "/"]), 5, "")
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::Policy(ref m) if m.contains("rm")));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_empty_argv_rejected() {
    let (_dir, policy, sandbox) = setup(&["echo"]);
    let err = shell(&policy, &sandbox, &[], 5, "").await.unwrap_err();
    assert!(matches!(err, ActionError::Policy(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_runs_allowed_program() {
    let (_dir, policy, sandbox) = setup(&["echo"]);
    let result = shell(&policy, &sandbox, &argv(&["echo", "hello", "$HOME"]), 5, "")
        .await
        .unwrap();
    assert!(result.ok);
    assert_eq!(result.exit_code, Some(0));
    // No shell expansion.
    assert_eq!(result.stdout_tail, "hello $HOME\n");
    assert_eq!(result.argv, argv(&["echo", "hello", "$HOME"]));
}

#[cfg(unix)]
#[tokio::test]
async fn test_nonzero_exit_is_data() {
    let (_dir, policy, sandbox) = setup(&["false"]);
    let result = shell(&policy, &sandbox, &argv(&["false"]), 5, "").await.unwrap();
    assert!(!result.ok);
    assert_eq!(result.exit_code, Some(1));
}

#[cfg(unix)]
#[tokio::test]
async fn test_runs_in_sandbox_cwd() {
    let (dir, policy, sandbox) = setup(&["pwd"]);
    std::fs::create_dir(dir.path().join("sub")).unwrap();

    let result = shell(&policy, &sandbox, &argv(&["pwd"]), 5, "sub").await.unwrap();
    assert!(result.stdout_tail.trim_end().ends_with("sub"));

    let err = shell(&policy, &sandbox, &argv(&["pwd"]), 5, "../..").await.unwrap_err();
    assert!(matches!(err, ActionError::Policy(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_timeout_kills_process() {
    let (_dir, policy, sandbox) = setup(&["sleep"]);
    let started = std::time::Instant::now();
    let err = shell(&policy, &sandbox, &argv(&["sleep", "30"]), 1, "")
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::Timeout(1)));
    assert!(err.is_retryable());
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_read_tail_keeps_last_bytes() {
    let data: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
    let tail = read_tail(Some(&data[..]), 100).await.unwrap();
    assert_eq!(tail.len(), 100);
    assert_eq!(&tail[..], &data[data.len() - 100..]);

    let short = read_tail(Some(&b"abc"[..]), 100).await.unwrap();
    assert_eq!(short, b"abc");
    assert!(read_tail(None::<&[u8]>, 10).await.unwrap().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_large_multibyte_output_keeps_whole_chars() {
    let (dir, _, sandbox) = setup(&[]);
    let policy = ShellPolicy::new(argv(&["cat"]), 5);
    std::fs::write(dir.path().join("big.txt"), "é".repeat(100_000)).unwrap();

    let result = shell(&policy, &sandbox, &argv(&["cat", "big.txt"]), 5, "")
        .await
        .unwrap();
    assert_eq!(result.stdout_tail, "ééééé");
}

#[cfg(unix)]
#[tokio::test]
async fn test_output_tail_bounded() {
    let (dir, _, sandbox) = setup(&[]);
    let policy = ShellPolicy::new(argv(&["cat"]), 8);
    std::fs::write(dir.path().join("big.txt"), "0123456789abcdef").unwrap();

    let result = shell(&policy, &sandbox, &argv(&["cat", "big.txt"]), 5, "")
        .await
        .unwrap();
    assert_eq!(result.stdout_tail, "89abcdef");
}

#[cfg(unix)]
#[tokio::test]
async fn test_handler() {
    let (_dir, policy, sandbox) = setup(&["echo"]);
    let handler = ShellExecHandler::new(Arc::new(policy), Arc::new(sandbox));
    assert_eq!(handler.task_type(), "shell.exec");

    let value = handler
        .handle(json!({"cmd": ["echo", "ok"]}), HandlerContext::new("task-1", 1, 5))
        .await
        .unwrap();
    assert_eq!(value["ok"], true);
    assert_eq!(value["stdout_tail"], "ok\n");
}

#[tokio::test]
async fn test_handler_invalid_payload() {
    let (_dir, policy, sandbox) = setup(&["echo"]);
    let handler = ShellExecHandler::new(Arc::new(policy), Arc::new(sandbox));
    let err = handler
        .handle(json!({"cmd": "echo ok"}), HandlerContext::new("task-1", 1, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::InvalidPayload(_)));
}
