//! Bounded workflow trigger helper.
//!
//! Every synchronous workflow trigger goes through [`start_bounded`]:
//! the call is wrapped in a timeout, a timeout counts as a trigger
//! failure, and "already running" is surfaced as success so retries
//! collapse onto the engine's deduplication.

use std::time::Duration;

use streamgate_core::error::{StreamgateError, StreamgateResult};
use streamgate_core::workflow::{StartWorkflow, WorkflowEngine, WorkflowStart};
use tracing::debug;

pub async fn start_bounded<E: WorkflowEngine>(
    engine: &E,
    request: StartWorkflow,
    timeout_secs: u64,
    operation: &str,
) -> StreamgateResult<WorkflowStart> {
    let workflow_id = request.workflow_id.clone();
    let result = tokio::time::timeout(Duration::from_secs(timeout_secs), engine.start(request))
        .await
        .map_err(|_| StreamgateError::SyncFailure {
            operation: operation.to_string(),
            detail: format!("workflow trigger timed out after {timeout_secs}s"),
        })?;

    match result {
        Ok(start) => {
            if let WorkflowStart::AlreadyRunning { run_id } = &start {
                debug!(workflow_id, run_id, "workflow already running, treating as started");
            }
            Ok(start)
        }
        Err(e) => Err(StreamgateError::SyncFailure {
            operation: operation.to_string(),
            detail: e.to_string(),
        }),
    }
}
