//! Application domain model and provisioning state machine types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::virtual_cluster::Environment;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApplicationStatus {
    Active,
    Decommissioning,
    Deleted,
}

/// Provisioning state machine:
/// `Pending -> InProgress -> {Completed | Partial | Failed}`.
///
/// `Partial` means at least one environment succeeded and at least one
/// failed or was skipped; `Failed` means none succeeded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProvisioningStatus {
    Pending,
    InProgress,
    Completed,
    Partial,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Failed,
    Skipped,
}

/// Per-environment provisioning outcome recorded by the workflow's
/// callback path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentOutcome {
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub type ProvisioningDetails = BTreeMap<Environment, EnvironmentOutcome>;

/// An application owns up to one virtual cluster per environment and
/// counts against its workspace's quota unless `status = Deleted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    /// Unique among non-deleted applications within the workspace.
    pub slug: String,
    pub description: Option<String>,
    pub status: ApplicationStatus,
    pub provisioning_status: ProvisioningStatus,
    pub provisioning_details: ProvisioningDetails,
    pub provisioning_workflow_id: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplication {
    pub workspace_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_by: String,
}

/// Inbound per-environment result from the provisioning workflow.
/// Carries the cluster's coordinates alongside the outcome so the
/// virtual-cluster record can be activated in the same update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentProvisioningResult {
    pub outcome: EnvironmentOutcome,
    pub bootstrap_servers: Option<String>,
}
