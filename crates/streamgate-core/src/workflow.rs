//! Workflow engine trigger contract and deterministic workflow IDs.
//!
//! Triggers are fire-and-forget from the control plane's perspective,
//! but every trigger uses a deterministic, entity-derived workflow ID
//! so that duplicate or retried triggers are deduplicated by the
//! engine itself. "Already started" is a success signal, not an error.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const WORKFLOW_VIRTUAL_CLUSTER_PROVISION: &str = "virtual-cluster-provision";
pub const WORKFLOW_CREDENTIAL_UPSERT: &str = "credential-upsert";
pub const WORKFLOW_CREDENTIAL_REVOKE: &str = "credential-revoke";
pub const WORKFLOW_TOPIC_SHARE_ACL_SYNC: &str = "topic-share-acl-sync";
pub const WORKFLOW_TOPIC_SHARE_ACL_REMOVE: &str = "topic-share-acl-remove";

/// Trigger request handed to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartWorkflow {
    pub workflow_type: String,
    pub task_queue: String,
    /// Deterministic, entity-derived ID (see the `*_workflow_id`
    /// helpers).
    pub workflow_id: String,
    pub input: serde_json::Value,
}

/// Successful trigger outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowStart {
    Started { run_id: String },
    /// A run with this workflow ID already exists. Treated as success
    /// by every caller.
    AlreadyRunning { run_id: String },
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("workflow trigger timed out")]
    Timeout,
    #[error("workflow trigger failed: {0}")]
    Trigger(String),
}

/// External workflow engine. Only the trigger/idempotency contract is
/// part of this control plane; execution is opaque.
pub trait WorkflowEngine: Send + Sync {
    fn start(
        &self,
        request: StartWorkflow,
    ) -> impl Future<Output = Result<WorkflowStart, WorkflowError>> + Send;
}

pub fn provisioning_workflow_id(application_id: Uuid) -> String {
    format!("{WORKFLOW_VIRTUAL_CLUSTER_PROVISION}-{application_id}")
}

pub fn credential_upsert_workflow_id(service_account_id: Uuid) -> String {
    format!("{WORKFLOW_CREDENTIAL_UPSERT}-{service_account_id}")
}

pub fn credential_revoke_workflow_id(service_account_id: Uuid) -> String {
    format!("{WORKFLOW_CREDENTIAL_REVOKE}-{service_account_id}")
}

pub fn acl_sync_workflow_id(share_id: Uuid) -> String {
    format!("{WORKFLOW_TOPIC_SHARE_ACL_SYNC}-{share_id}")
}

pub fn acl_remove_workflow_id(share_id: Uuid) -> String {
    format!("{WORKFLOW_TOPIC_SHARE_ACL_REMOVE}-{share_id}")
}
