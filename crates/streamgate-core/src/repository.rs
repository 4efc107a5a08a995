//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async and request-scoped; no
//! long-lived state is held between calls.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::actor::{MemberStatus, WorkspaceRole};
use crate::error::StreamgateResult;
use crate::models::{
    application::{
        Application, ApplicationStatus, CreateApplication, ProvisioningDetails,
        ProvisioningStatus,
    },
    audit::{AuditLogEntry, CreateAuditLogEntry},
    request::{
        ApplicationRequest, CreateApplicationRequest, PlatformAction, RejectionTier,
    },
    service_account::{CreateServiceAccount, ServiceAccount, ServiceAccountStatus},
    topic::{CreateTopic, CreateTopicShare, ShareStatus, Topic, TopicShare},
    virtual_cluster::{CreateVirtualCluster, VirtualCluster, VirtualClusterStatus},
    workspace::{CreateWorkspace, QuotaOverride, Workspace, WorkspaceMember},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Workspace, membership, quota override
// ---------------------------------------------------------------------------

pub trait WorkspaceRepository: Send + Sync {
    fn create(
        &self,
        input: CreateWorkspace,
    ) -> impl Future<Output = StreamgateResult<Workspace>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = StreamgateResult<Workspace>> + Send;
    fn get_by_slug(&self, slug: &str)
    -> impl Future<Output = StreamgateResult<Workspace>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = StreamgateResult<PaginatedResult<Workspace>>> + Send;

    fn add_member(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
        status: MemberStatus,
    ) -> impl Future<Output = StreamgateResult<WorkspaceMember>> + Send;

    /// `NotFound` if the user is not a member of the workspace.
    fn get_member(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = StreamgateResult<WorkspaceMember>> + Send;

    /// Active owners and admins, for approval notifications.
    fn list_admins(
        &self,
        workspace_id: Uuid,
    ) -> impl Future<Output = StreamgateResult<Vec<WorkspaceMember>>> + Send;
}

pub trait QuotaOverrideRepository: Send + Sync {
    /// `None` when the workspace has no override and the system
    /// default applies.
    fn get(
        &self,
        workspace_id: Uuid,
    ) -> impl Future<Output = StreamgateResult<Option<QuotaOverride>>> + Send;

    /// Create or replace the workspace's override, attributing the
    /// actor.
    fn upsert(
        &self,
        workspace_id: Uuid,
        application_quota: u32,
        updated_by: &str,
    ) -> impl Future<Output = StreamgateResult<QuotaOverride>> + Send;
}

// ---------------------------------------------------------------------------
// Applications & virtual clusters
// ---------------------------------------------------------------------------

pub trait ApplicationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateApplication,
    ) -> impl Future<Output = StreamgateResult<Application>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = StreamgateResult<Application>> + Send;

    /// Count applications that consume quota (`status != Deleted`).
    fn count_non_deleted(
        &self,
        workspace_id: Uuid,
    ) -> impl Future<Output = StreamgateResult<u64>> + Send;

    /// True if a non-deleted application in the workspace already uses
    /// the slug.
    fn slug_in_use(
        &self,
        workspace_id: Uuid,
        slug: &str,
    ) -> impl Future<Output = StreamgateResult<bool>> + Send;

    fn set_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> impl Future<Output = StreamgateResult<()>> + Send;

    /// Records a successful workflow trigger: sets `InProgress`,
    /// stores the workflow ID, and clears any previous per-environment
    /// outcomes.
    fn set_provisioning_started(
        &self,
        id: Uuid,
        workflow_id: &str,
    ) -> impl Future<Output = StreamgateResult<()>> + Send;

    /// Records the workflow's terminal outcome and the per-environment
    /// details.
    fn set_provisioning_outcome(
        &self,
        id: Uuid,
        status: ProvisioningStatus,
        details: &ProvisioningDetails,
    ) -> impl Future<Output = StreamgateResult<()>> + Send;

    fn list_by_workspace(
        &self,
        workspace_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = StreamgateResult<PaginatedResult<Application>>> + Send;
}

pub trait VirtualClusterRepository: Send + Sync {
    fn create(
        &self,
        input: CreateVirtualCluster,
    ) -> impl Future<Output = StreamgateResult<VirtualCluster>> + Send;
    fn get_by_id(&self, id: Uuid)
    -> impl Future<Output = StreamgateResult<VirtualCluster>> + Send;
    fn list_by_application(
        &self,
        application_id: Uuid,
    ) -> impl Future<Output = StreamgateResult<Vec<VirtualCluster>>> + Send;
    fn set_status(
        &self,
        id: Uuid,
        status: VirtualClusterStatus,
    ) -> impl Future<Output = StreamgateResult<()>> + Send;
    /// Flip to `Active` and record the cluster's coordinates.
    fn mark_active(
        &self,
        id: Uuid,
        bootstrap_servers: &str,
    ) -> impl Future<Output = StreamgateResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Service accounts
// ---------------------------------------------------------------------------

pub trait ServiceAccountRepository: Send + Sync {
    fn create(
        &self,
        input: CreateServiceAccount,
    ) -> impl Future<Output = StreamgateResult<ServiceAccount>> + Send;
    fn get_by_id(&self, id: Uuid)
    -> impl Future<Output = StreamgateResult<ServiceAccount>> + Send;
    fn username_in_use(
        &self,
        username: &str,
    ) -> impl Future<Output = StreamgateResult<bool>> + Send;

    /// Overwrite hash and rotation timestamp. Also the rollback path:
    /// restoring a captured prior hash + timestamp goes through here.
    fn update_credentials(
        &self,
        id: Uuid,
        password_hash: &str,
        last_rotated_at: DateTime<Utc>,
    ) -> impl Future<Output = StreamgateResult<()>> + Send;

    fn set_status(
        &self,
        id: Uuid,
        status: ServiceAccountStatus,
    ) -> impl Future<Output = StreamgateResult<()>> + Send;

    /// Hard delete; used to roll back a create whose sync trigger
    /// failed.
    fn delete(&self, id: Uuid) -> impl Future<Output = StreamgateResult<()>> + Send;

    fn list_by_virtual_cluster(
        &self,
        virtual_cluster_id: Uuid,
    ) -> impl Future<Output = StreamgateResult<Vec<ServiceAccount>>> + Send;
}

// ---------------------------------------------------------------------------
// Application requests (dual-tier approval)
// ---------------------------------------------------------------------------

pub trait ApplicationRequestRepository: Send + Sync {
    fn create(
        &self,
        input: CreateApplicationRequest,
    ) -> impl Future<Output = StreamgateResult<ApplicationRequest>> + Send;
    fn get_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = StreamgateResult<ApplicationRequest>> + Send;

    fn set_workspace_approved(
        &self,
        id: Uuid,
        actor_id: Uuid,
    ) -> impl Future<Output = StreamgateResult<ApplicationRequest>> + Send;

    fn set_platform_approved(
        &self,
        id: Uuid,
        actor_id: Uuid,
        action: PlatformAction,
    ) -> impl Future<Output = StreamgateResult<ApplicationRequest>> + Send;

    fn set_rejected(
        &self,
        id: Uuid,
        tier: RejectionTier,
        actor_id: Uuid,
        reason: Option<String>,
    ) -> impl Future<Output = StreamgateResult<ApplicationRequest>> + Send;

    /// Requester cancellation while still pending.
    fn delete(&self, id: Uuid) -> impl Future<Output = StreamgateResult<()>> + Send;

    fn list_by_workspace(
        &self,
        workspace_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = StreamgateResult<PaginatedResult<ApplicationRequest>>> + Send;
}

// ---------------------------------------------------------------------------
// Topics & shares
// ---------------------------------------------------------------------------

pub trait TopicRepository: Send + Sync {
    fn create(&self, input: CreateTopic) -> impl Future<Output = StreamgateResult<Topic>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = StreamgateResult<Topic>> + Send;
    fn list_by_virtual_cluster(
        &self,
        virtual_cluster_id: Uuid,
    ) -> impl Future<Output = StreamgateResult<Vec<Topic>>> + Send;

    /// Discoverable and public topics across all workspaces,
    /// optionally filtered by a name substring.
    fn search_catalog(
        &self,
        query: Option<&str>,
        pagination: Pagination,
    ) -> impl Future<Output = StreamgateResult<PaginatedResult<Topic>>> + Send;
}

pub trait TopicShareRepository: Send + Sync {
    fn create(
        &self,
        input: CreateTopicShare,
    ) -> impl Future<Output = StreamgateResult<TopicShare>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = StreamgateResult<TopicShare>> + Send;

    /// An existing pending or approved share for the pair, if any;
    /// used to reject duplicate requests.
    fn find_active(
        &self,
        topic_id: Uuid,
        requesting_workspace_id: Uuid,
    ) -> impl Future<Output = StreamgateResult<Option<TopicShare>>> + Send;

    fn set_status(
        &self,
        id: Uuid,
        status: ShareStatus,
        decided_by: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> impl Future<Output = StreamgateResult<TopicShare>> + Send;

    fn list_by_topic(
        &self,
        topic_id: Uuid,
    ) -> impl Future<Output = StreamgateResult<Vec<TopicShare>>> + Send;
    fn list_by_requesting_workspace(
        &self,
        workspace_id: Uuid,
    ) -> impl Future<Output = StreamgateResult<Vec<TopicShare>>> + Send;
}

// ---------------------------------------------------------------------------
// Audit (append-only)
// ---------------------------------------------------------------------------

pub trait AuditLogRepository: Send + Sync {
    /// Append a new audit log entry. No update or delete operations
    /// exist.
    fn append(
        &self,
        input: CreateAuditLogEntry,
    ) -> impl Future<Output = StreamgateResult<AuditLogEntry>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = StreamgateResult<PaginatedResult<AuditLogEntry>>> + Send;
}
