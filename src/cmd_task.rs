//! One-shot queue commands: `enqueue`, `task ...`, `command ...`.

use aether_config::Config;
use aether_runtime::{AetherRuntime, EnqueueRequest};
use serde_json::{Value, json};

use crate::cli::TaskAction;

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) async fn enqueue(
    config: Config,
    task_type: String,
    payload: &str,
    priority: Option<i64>,
    max_attempts: Option<u32>,
    timeout_s: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let payload: Value = serde_json::from_str(payload)?;
    let runtime = AetherRuntime::new(config).await?;

    let mut request = EnqueueRequest::new(task_type, payload);
    request.priority = priority;
    request.max_attempts = max_attempts;
    request.timeout_s = timeout_s;

    let task_id = runtime.enqueue(request).await?;
    print_json(&json!({ "ok": true, "task_id": task_id }))
}

pub(crate) async fn task(config: Config, action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = AetherRuntime::new(config).await?;

    match action {
        TaskAction::Get { id } => match runtime.get_task(&id).await? {
            Some(task) => print_json(&json!({ "ok": true, "task": task })),
            None => Err(format!("Task not found: {id}").into()),
        },
        TaskAction::List { limit } => {
            let tasks = runtime.list_recent(limit).await?;
            print_json(&json!({ "ok": true, "tasks": tasks }))
        }
        TaskAction::Cancel { id } => {
            if runtime.cancel_task(&id).await? {
                print_json(&json!({ "ok": true, "task_id": id }))
            } else {
                Err(format!("Task {id} is not waiting to run").into())
            }
        }
    }
}

pub(crate) async fn command(config: Config, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = AetherRuntime::new(config).await?;
    match runtime.route_command(text).await {
        Some(outcome) => print_json(&serde_json::to_value(outcome)?),
        None => Err(format!("No command handles: {text}").into()),
    }
}
