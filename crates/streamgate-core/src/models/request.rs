//! Application request domain model — the dual-tier approval state
//! machine that gates application creation once a workspace's quota is
//! exhausted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `PendingWorkspace -> PendingPlatform -> {Approved | Rejected}`,
/// with `Rejected` reachable from either pending state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestStatus {
    PendingWorkspace,
    PendingPlatform,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            RequestStatus::PendingWorkspace | RequestStatus::PendingPlatform
        )
    }
}

/// How the platform tier resolved an approval: a one-off exception, or
/// a durable quota increase for the workspace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlatformAction {
    ApprovedSingle,
    IncreasedQuota,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RejectionTier {
    Workspace,
    Platform,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRequest {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub requested_by: Uuid,
    /// Requested application fields, applied verbatim on approval.
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub status: RequestStatus,
    pub workspace_actor: Option<Uuid>,
    pub workspace_acted_at: Option<DateTime<Utc>>,
    pub platform_actor: Option<Uuid>,
    pub platform_acted_at: Option<DateTime<Utc>>,
    pub platform_action: Option<PlatformAction>,
    pub rejected_tier: Option<RejectionTier>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplicationRequest {
    pub workspace_id: Uuid,
    pub requested_by: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}
