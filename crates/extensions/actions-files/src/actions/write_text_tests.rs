use super::*;
use serde_json::json;
use tempfile::TempDir;

fn sandbox(dir: &TempDir) -> Arc<Sandbox> {
    Arc::new(Sandbox::new(dir.path().join("work")).unwrap())
}

#[tokio::test]
async fn test_write_creates_parents() {
    let dir = TempDir::new().unwrap();
    let sandbox = sandbox(&dir);

    let result = write_text(&sandbox, "test/hello.txt", "ok\n").await.unwrap();
    assert_eq!(result.bytes_written, 3);

    let written = std::fs::read_to_string(sandbox.base().join("test/hello.txt")).unwrap();
    assert_eq!(written, "ok\n");
}

#[tokio::test]
async fn test_bytes_written_counts_utf8() {
    let dir = TempDir::new().unwrap();
    let sandbox = sandbox(&dir);
    let result = write_text(&sandbox, "u.txt", "héllo").await.unwrap();
    assert_eq!(result.bytes_written, 6);
}

#[tokio::test]
async fn test_traversal_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let sandbox = sandbox(&dir);

    let err = write_text(&sandbox, "../escaped.txt", "x").await.unwrap_err();
    assert!(matches!(err, ActionError::Policy(_)));
    assert!(!dir.path().join("escaped.txt").exists());

    let err = write_text(&sandbox, "../../etc/passwd", "x").await.unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_handler() {
    let dir = TempDir::new().unwrap();
    let handler = WriteTextHandler::new(sandbox(&dir));
    assert_eq!(handler.task_type(), "files.write_text");

    let value = handler
        .handle(
            json!({"path": "notes/a.txt", "text": "abc"}),
            HandlerContext::new("task-1", 1, 30),
        )
        .await
        .unwrap();
    assert_eq!(value["bytes_written"], 3);
    assert!(value["path"].as_str().unwrap().ends_with("notes/a.txt"));
}

#[tokio::test]
async fn test_handler_missing_field() {
    let dir = TempDir::new().unwrap();
    let handler = WriteTextHandler::new(sandbox(&dir));
    let err = handler
        .handle(json!({"path": "a.txt"}), HandlerContext::new("task-1", 1, 30))
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::InvalidPayload(_)));
}
