//! Workspace domain model.
//!
//! Workspaces are the tenant boundary: every application, virtual
//! cluster, credential, and request is scoped to exactly one
//! workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actor::{MemberStatus, WorkspaceRole};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// URL-safe unique identifier (e.g. `payments-team`). Also the
    /// first segment of virtual-cluster namespace prefixes.
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkspace {
    pub name: String,
    pub slug: String,
}

/// Membership of a user in a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceMember {
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub role: WorkspaceRole,
    pub status: MemberStatus,
    pub created_at: DateTime<Utc>,
}

/// Per-workspace exception to the system-wide application limit.
/// At most one exists per workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaOverride {
    pub workspace_id: Uuid,
    pub application_quota: u32,
    /// Audit attribution for the last change.
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Current usage against the effective limit, for display and for
/// `QuotaExceeded` errors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuotaInfo {
    pub used: u64,
    pub limit: u64,
}
