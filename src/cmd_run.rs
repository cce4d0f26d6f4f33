//! `aether run` and `aether check`.

use std::sync::Arc;

use aether_api::ApiServer;
use aether_config::{Config, ConfigValidator, ValidationResult};
use aether_runtime::AetherRuntime;
use tracing::{error, info, warn};

fn report(result: &ValidationResult) {
    for warning in &result.warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }
    for err in &result.errors {
        error!(path = %err.path, "{}", err.message);
    }
}

/// Run the service until SIGTERM or SIGINT.
pub(crate) async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let validation = ConfigValidator::validate(&config);
    report(&validation);
    if !validation.is_valid() {
        return Err(format!("invalid configuration ({} error(s))", validation.errors.len()).into());
    }

    let runtime = Arc::new(AetherRuntime::new(config).await?);
    let signal = runtime.signal().clone();
    signal.setup_os_signals()?;

    runtime.start()?;

    let server = if runtime.config().server.enabled {
        let server = ApiServer::from_runtime(runtime.clone());
        let shutdown = signal.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = server
                .run(async move { shutdown.wait_for_shutdown().await })
                .await
            {
                error!(error = %e, "API server failed");
            }
        }))
    } else {
        None
    };

    info!("Aether running, press Ctrl+C to stop");
    signal.wait_for_shutdown().await;

    info!("Shutting down");
    runtime.shutdown().await;
    if let Some(server) = server {
        let _ = server.await;
    }
    Ok(())
}

/// Print validation findings and the effective configuration.
pub(crate) fn check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let validation = ConfigValidator::validate(config);
    for warning in &validation.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for err in &validation.errors {
        println!("error: {}: {}", err.path, err.message);
    }
    println!("{}", toml::to_string_pretty(config)?);

    if validation.is_valid() {
        Ok(())
    } else {
        Err(format!("invalid configuration ({} error(s))", validation.errors.len()).into())
    }
}
