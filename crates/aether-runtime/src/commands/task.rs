//! `task ...`: enqueue file actions and inspect the queue.

use std::sync::Arc;

use aether_protocols::{Command, CommandError, CommandOutcome};
use aether_workqueue::QueueError;
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::RuntimeError;
use crate::services::{EnqueueRequest, Services};

const USAGE: &str =
    "task write <path> <text> | task read <path> | task ls [path] | task get <id> | task list [n] | task cancel <id>";
const DEFAULT_LIST: usize = 10;
const MAX_LIST: usize = 100;

pub struct TaskCommand {
    services: Arc<Services>,
}

fn queue_err(e: RuntimeError) -> CommandError {
    CommandError::Queue(e.to_string())
}

impl TaskCommand {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    async fn enqueue(&self, task_type: &str, payload: Value) -> Result<CommandOutcome, CommandError> {
        let id = self
            .services
            .enqueue(EnqueueRequest::new(task_type, payload))
            .await
            .map_err(queue_err)?;
        Ok(CommandOutcome::ok("task", format!("Enqueued {task_type} as {id}"))
            .with_data(json!({ "task_id": id, "task_type": task_type })))
    }

    async fn get(&self, id: &str) -> Result<CommandOutcome, CommandError> {
        let task = self
            .services
            .get_task(id)
            .await
            .map_err(queue_err)?
            .ok_or_else(|| CommandError::NotFound(id.to_string()))?;
        Ok(
            CommandOutcome::ok("task", format!("{} is {}", task.id, task.status))
                .with_data(json!({ "task": task })),
        )
    }

    async fn list(&self, arg: Option<&str>) -> Result<CommandOutcome, CommandError> {
        let limit = match arg {
            None => DEFAULT_LIST,
            Some(n) => n
                .parse::<usize>()
                .map_err(|_| CommandError::Usage("task list [n]".to_string()))?
                .clamp(1, MAX_LIST),
        };
        let tasks = self.services.list_recent(limit).await.map_err(queue_err)?;
        Ok(CommandOutcome::ok("task", format!("{} recent task(s)", tasks.len()))
            .with_data(json!({ "tasks": tasks })))
    }

    async fn cancel(&self, id: &str) -> Result<CommandOutcome, CommandError> {
        let canceled = match self.services.cancel_task(id).await {
            Ok(canceled) => canceled,
            Err(RuntimeError::Queue(QueueError::TaskNotFound(id))) => {
                return Err(CommandError::NotFound(id));
            }
            Err(e) => return Err(queue_err(e)),
        };
        if canceled {
            Ok(CommandOutcome::ok("task", format!("Canceled {id}")))
        } else {
            Err(CommandError::Failed(format!(
                "{id} is not waiting to run and cannot be canceled"
            )))
        }
    }
}

/// Split off the next whitespace-delimited word, keeping the remainder intact.
fn next_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

#[async_trait]
impl Command for TaskCommand {
    fn name(&self) -> &str {
        "task"
    }

    fn usage(&self) -> &str {
        USAGE
    }

    fn can_handle(&self, input: &str) -> bool {
        let lower = input.trim().to_lowercase();
        lower == "task" || lower.starts_with("task ")
    }

    async fn run(&self, input: &str) -> Result<CommandOutcome, CommandError> {
        let (_, rest) = next_word(input);
        let (sub, rest) = next_word(rest);

        match sub.to_lowercase().as_str() {
            "write" => {
                let (path, text) = next_word(rest);
                if path.is_empty() {
                    return Err(CommandError::Usage("task write <path> <text>".to_string()));
                }
                self.enqueue("files.write_text", json!({ "path": path, "text": text }))
                    .await
            }
            "read" => {
                let (path, _) = next_word(rest);
                if path.is_empty() {
                    return Err(CommandError::Usage("task read <path>".to_string()));
                }
                self.enqueue("files.read_text", json!({ "path": path })).await
            }
            "ls" => {
                let (path, _) = next_word(rest);
                let path = if path.is_empty() { "." } else { path };
                self.enqueue("files.list_dir", json!({ "path": path })).await
            }
            "get" => match next_word(rest) {
                ("", _) => Err(CommandError::Usage("task get <id>".to_string())),
                (id, _) => self.get(id).await,
            },
            "list" => {
                let (n, _) = next_word(rest);
                self.list((!n.is_empty()).then_some(n)).await
            }
            "cancel" => match next_word(rest) {
                ("", _) => Err(CommandError::Usage("task cancel <id>".to_string())),
                (id, _) => self.cancel(id).await,
            },
            _ => Err(CommandError::Usage(USAGE.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;
    use aether_workqueue::TaskStatus;

    #[test]
    fn test_next_word() {
        assert_eq!(next_word("write a/b.txt hello  world"), ("write", "a/b.txt hello  world"));
        assert_eq!(next_word("  get"), ("get", ""));
        assert_eq!(next_word(""), ("", ""));
    }

    #[tokio::test]
    async fn test_write_enqueues_with_text_intact() {
        let (_dir, _runtime, services) = test_support::services().await;
        let command = TaskCommand::new(services.clone());

        let outcome = command.run("task write notes/a.txt Hello  World").await.unwrap();
        assert!(outcome.ok);
        let id = outcome.data["task_id"].as_str().unwrap();
        assert!(id.starts_with("task-"));

        let task = services.get_task(id).await.unwrap().unwrap();
        assert_eq!(task.task_type, "files.write_text");
        assert_eq!(task.payload["path"], "notes/a.txt");
        assert_eq!(task.payload["text"], "Hello  World");
        assert_eq!(task.status, TaskStatus::Queued);
    }

    #[tokio::test]
    async fn test_ls_defaults_to_sandbox_root() {
        let (_dir, _runtime, services) = test_support::services().await;
        let outcome = TaskCommand::new(services.clone()).run("task ls").await.unwrap();
        let id = outcome.data["task_id"].as_str().unwrap();
        let task = services.get_task(id).await.unwrap().unwrap();
        assert_eq!(task.payload["path"], ".");
    }

    #[tokio::test]
    async fn test_get_list_cancel() {
        let (_dir, _runtime, services) = test_support::services().await;
        let command = TaskCommand::new(services.clone());
        let id = services
            .enqueue(EnqueueRequest::new("files.read_text", json!({"path": "x"})))
            .await
            .unwrap();

        let outcome = command.run(&format!("task get {id}")).await.unwrap();
        assert_eq!(outcome.data["task"]["status"], "queued");

        let outcome = command.run("task list 5").await.unwrap();
        assert_eq!(outcome.data["tasks"].as_array().unwrap().len(), 1);

        let outcome = command.run(&format!("task cancel {id}")).await.unwrap();
        assert!(outcome.ok);
        assert!(matches!(
            command.run(&format!("task cancel {id}")).await,
            Err(CommandError::Failed(_))
        ));
    }

    #[tokio::test]
    async fn test_errors() {
        let (_dir, _runtime, services) = test_support::services().await;
        let command = TaskCommand::new(services);

        assert!(matches!(
            command.run("task get task-missing").await,
            Err(CommandError::NotFound(_))
        ));
        assert!(matches!(
            command.run("task cancel task-missing").await,
            Err(CommandError::NotFound(_))
        ));
        assert!(matches!(command.run("task write").await, Err(CommandError::Usage(_))));
        assert!(matches!(command.run("task list x").await, Err(CommandError::Usage(_))));
        assert!(matches!(command.run("task frobnicate").await, Err(CommandError::Usage(_))));
        assert!(!command.can_handle("tasks"));
    }
}
