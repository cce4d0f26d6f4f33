//! CLI definitions for Aether.

use std::path::PathBuf;

use aether_config::DEFAULT_CONFIG_PATH;
use clap::{Parser, Subcommand};

/// Aether CLI.
#[derive(Parser)]
#[command(name = "aether")]
#[command(about = "Durable single-node task queue with sandboxed actions")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (missing file means defaults)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// Override the data directory
    #[arg(long, global = true, env = "AETHER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run runners, heartbeat and API in the foreground (default)
    Run {
        /// Number of runner loops
        #[arg(long)]
        workers: Option<usize>,

        /// API host
        #[arg(long)]
        host: Option<String>,

        /// API port
        #[arg(long)]
        port: Option<u16>,

        /// Do not start the HTTP API
        #[arg(long)]
        no_api: bool,
    },

    /// Enqueue a task
    Enqueue {
        /// Task type, e.g. files.write_text
        task_type: String,

        /// JSON object payload
        #[arg(long, default_value = "{}")]
        payload: String,

        #[arg(long)]
        priority: Option<i64>,

        #[arg(long)]
        max_attempts: Option<u32>,

        /// Advisory execution budget in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Inspect and manage tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Route a command line through the command router
    Command {
        /// Command text, e.g. "task list 5"
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Validate the configuration and print the effective values
    Check,
}

#[derive(Subcommand)]
pub(crate) enum TaskAction {
    /// Show one task
    Get {
        id: String,
    },

    /// List the most recently created tasks
    List {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Cancel a task that is still waiting to run
    Cancel {
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enqueue() {
        let cli = Cli::try_parse_from([
            "aether",
            "enqueue",
            "files.write_text",
            "--payload",
            r#"{"path": "a.txt", "text": "x"}"#,
            "--priority",
            "10",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Enqueue {
                task_type,
                priority,
                max_attempts,
                ..
            }) => {
                assert_eq!(task_type, "files.write_text");
                assert_eq!(priority, Some(10));
                assert_eq!(max_attempts, None);
            }
            _ => panic!("expected enqueue"),
        }
    }

    #[test]
    fn test_parse_command_joins_words() {
        let cli = Cli::try_parse_from(["aether", "command", "task", "list", "5"]).unwrap();
        match cli.command {
            Some(Commands::Command { text }) => assert_eq!(text.join(" "), "task list 5"),
            _ => panic!("expected command"),
        }
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["aether", "check"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(matches!(cli.command, Some(Commands::Check)));
    }

    #[test]
    fn test_task_subcommands() {
        let cli = Cli::try_parse_from(["aether", "task", "list", "--limit", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Task {
                action: TaskAction::List { limit: 3 }
            })
        ));
    }
}
