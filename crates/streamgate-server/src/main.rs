//! STREAMGATE Server — Application entry point.

use std::env;

use streamgate_db::{DbConfig, DbManager};
use streamgate_orchestrator::OrchestratorConfig;
use tracing_subscriber::EnvFilter;

fn orchestrator_config_from_env() -> OrchestratorConfig {
    let defaults = OrchestratorConfig::default();
    OrchestratorConfig {
        default_application_quota: env::var("STREAMGATE_DEFAULT_APPLICATION_QUOTA")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.default_application_quota),
        rotation_cooldown_secs: env::var("STREAMGATE_ROTATION_COOLDOWN_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rotation_cooldown_secs),
        workflow_trigger_timeout_secs: env::var("STREAMGATE_WORKFLOW_TRIGGER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.workflow_trigger_timeout_secs),
        task_queue: env::var("STREAMGATE_TASK_QUEUE").unwrap_or(defaults.task_queue),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("streamgate=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting STREAMGATE server...");

    let db_config = DbConfig::from_env();
    let orchestrator_config = orchestrator_config_from_env();
    tracing::info!(
        task_queue = %orchestrator_config.task_queue,
        default_application_quota = orchestrator_config.default_application_quota,
        "Configuration loaded"
    );

    let manager = match DbManager::connect(&db_config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = manager.migrate().await {
        tracing::error!(error = %e, "Failed to run migrations");
        std::process::exit(1);
    }

    if let Err(e) = manager.health_check().await {
        tracing::error!(error = %e, "Database health check failed");
        std::process::exit(1);
    }

    // TODO: Initialize workflow engine client
    // TODO: Start REST API server
    // TODO: Start gRPC server

    tracing::info!("STREAMGATE server stopped.");
}
