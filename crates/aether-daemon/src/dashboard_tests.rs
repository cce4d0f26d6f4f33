use super::*;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_merge_creates_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("aether_dashboard.json");
    let writer = DashboardWriter::new(&path, dir.path());

    assert!(writer.merge("orchestrator", json!({"status": "RUNNING"})).unwrap());

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["orchestrator"]["status"], "RUNNING");
}

#[test]
fn test_merge_preserves_other_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("aether_dashboard.json");
    std::fs::write(&path, r#"{"evolution": {"generation": 4}, "orchestrator": {"status": "PAUSED"}}"#)
        .unwrap();
    let writer = DashboardWriter::new(&path, dir.path());

    writer.merge("orchestrator", json!({"status": "RUNNING"})).unwrap();

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["evolution"]["generation"], 4);
    assert_eq!(doc["orchestrator"]["status"], "RUNNING");
}

#[test]
fn test_merge_replaces_invalid_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("aether_dashboard.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();
    let writer = DashboardWriter::new(&path, dir.path());

    writer.merge("orchestrator", json!({"queue_length": 0})).unwrap();

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc, json!({"orchestrator": {"queue_length": 0}}));
}

#[test]
fn test_merge_creates_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/deeper/dashboard.json");
    let writer = DashboardWriter::new(&path, dir.path());

    assert!(writer.merge("orchestrator", json!({})).unwrap());
    assert!(path.exists());
}

#[test]
fn test_outside_prefix_is_skipped() {
    let data = TempDir::new().unwrap();
    let other = TempDir::new().unwrap();
    let path = other.path().join("dashboard.json");
    let writer = DashboardWriter::new(&path, data.path());

    assert!(!writer.is_allowed());
    assert!(!writer.merge("orchestrator", json!({})).unwrap());
    assert!(!path.exists());
}

#[test]
fn test_parent_traversal_is_skipped() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    let path = data.join("../escape.json");
    let writer = DashboardWriter::new(&path, &data);

    assert!(!writer.merge("orchestrator", json!({})).unwrap());
    assert!(!dir.path().join("escape.json").exists());
}

#[test]
fn test_no_temp_files_left_behind() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("aether_dashboard.json");
    let writer = DashboardWriter::new(&path, dir.path());

    for i in 0..5 {
        writer.merge("orchestrator", json!({"n": i})).unwrap();
    }

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
