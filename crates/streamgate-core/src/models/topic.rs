//! Topic and topic-share domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discoverability of a topic outside its owning application.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TopicVisibility {
    /// Owning application only.
    Private,
    /// Visible within the owning workspace.
    Workspace,
    /// Listed in the cross-workspace catalog; access by request.
    Discoverable,
    /// Usable by any application.
    Public,
}

impl TopicVisibility {
    /// Whether other workspaces may request a share of this topic.
    pub fn is_shareable(&self) -> bool {
        matches!(self, TopicVisibility::Discoverable | TopicVisibility::Public)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccessLevel {
    Read,
    Write,
    ReadWrite,
}

/// Policy that short-circuits the pending step for matching share
/// requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AutoApprovePolicy {
    /// Access levels that may be granted without human review.
    pub access_levels: Vec<AccessLevel>,
    /// Workspaces allowed to auto-approve; `None` means any workspace.
    pub requesting_workspaces: Option<Vec<Uuid>>,
}

impl AutoApprovePolicy {
    pub fn allows(&self, access_level: AccessLevel, requesting_workspace: Uuid) -> bool {
        if !self.access_levels.contains(&access_level) {
            return false;
        }
        match &self.requesting_workspaces {
            Some(allowed) => allowed.contains(&requesting_workspace),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: Uuid,
    pub virtual_cluster_id: Uuid,
    /// Denormalized owning workspace for share decisions.
    pub workspace_id: Uuid,
    pub name: String,
    pub visibility: TopicVisibility,
    pub partitions: u32,
    pub retention_ms: Option<i64>,
    pub auto_approve: Option<AutoApprovePolicy>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTopic {
    pub virtual_cluster_id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub visibility: TopicVisibility,
    pub partitions: u32,
    pub retention_ms: Option<i64>,
    pub auto_approve: Option<AutoApprovePolicy>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ShareStatus {
    Pending,
    Approved,
    Rejected,
    Revoked,
}

/// Cross-workspace grant request for a discoverable or public topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicShare {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub owning_workspace_id: Uuid,
    pub requesting_workspace_id: Uuid,
    pub access_level: AccessLevel,
    pub reason: String,
    pub status: ShareStatus,
    pub expires_at: Option<DateTime<Utc>>,
    /// Audit attribution for the approve/reject/revoke decision.
    pub decided_by: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTopicShare {
    pub topic_id: Uuid,
    pub owning_workspace_id: Uuid,
    pub requesting_workspace_id: Uuid,
    pub access_level: AccessLevel,
    pub reason: String,
}
