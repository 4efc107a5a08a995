//! Dual-tier application request approval.
//!
//! Requests pass a workspace tier and then a platform tier. Once the
//! platform decision is persisted it is final: the follow-on side
//! effects (quota increase, application creation, notification) are
//! attempted in order and logged on failure, never rolled back. A
//! platform admin who hits a side-effect failure resolves it
//! operationally, not by re-running the approval.

use streamgate_core::actor::Actor;
use streamgate_core::error::{StreamgateError, StreamgateResult};
use streamgate_core::models::request::{
    ApplicationRequest, CreateApplicationRequest, PlatformAction, RejectionTier, RequestStatus,
};
use streamgate_core::notify::{
    Notification, NotificationRecipient, NotificationSink, NotificationTemplate,
};
use streamgate_core::repository::{
    ApplicationRepository, ApplicationRequestRepository, AuditLogRepository, PaginatedResult,
    Pagination, QuotaOverrideRepository, VirtualClusterRepository, WorkspaceRepository,
};
use streamgate_core::workflow::WorkflowEngine;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::{ApplicationService, NewApplication};
use crate::authz;

/// Principal name used for audit attribution when the approval flow
/// creates the application.
const APPROVAL_PRINCIPAL: &str = "approval-workflow";

/// Input for submitting an application request.
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub workspace_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

pub struct ApprovalService<R, N, A, V, W, Q, L, E>
where
    R: ApplicationRequestRepository,
    N: NotificationSink,
    A: ApplicationRepository,
    V: VirtualClusterRepository,
    W: WorkspaceRepository,
    Q: QuotaOverrideRepository,
    L: AuditLogRepository,
    E: WorkflowEngine,
{
    request_repo: R,
    ws_repo: W,
    sink: N,
    app_service: ApplicationService<A, V, W, Q, L, E>,
}

impl<R, N, A, V, W, Q, L, E> ApprovalService<R, N, A, V, W, Q, L, E>
where
    R: ApplicationRequestRepository,
    N: NotificationSink,
    A: ApplicationRepository,
    V: VirtualClusterRepository,
    W: WorkspaceRepository,
    Q: QuotaOverrideRepository,
    L: AuditLogRepository,
    E: WorkflowEngine,
{
    pub fn new(
        request_repo: R,
        ws_repo: W,
        sink: N,
        app_service: ApplicationService<A, V, W, Q, L, E>,
    ) -> Self {
        Self {
            request_repo,
            ws_repo,
            sink,
            app_service,
        }
    }

    /// Submit a new application request and notify the workspace's
    /// admins.
    pub async fn submit(
        &self,
        actor: &Actor,
        input: NewRequest,
    ) -> StreamgateResult<ApplicationRequest> {
        let membership = authz::membership_of(&self.ws_repo, input.workspace_id, actor).await?;
        authz::ensure_active_member(actor, membership.as_ref())?;

        let requested_by = actor.user_id().ok_or_else(|| StreamgateError::Validation {
            message: "requests must be submitted by a user".into(),
        })?;

        let request = self
            .request_repo
            .create(CreateApplicationRequest {
                workspace_id: input.workspace_id,
                requested_by,
                name: input.name,
                slug: input.slug,
                description: input.description,
            })
            .await?;

        self.notify(Notification {
            template: NotificationTemplate::ApprovalNeeded,
            recipient: NotificationRecipient::WorkspaceAdmins(request.workspace_id),
            context: serde_json::json!({
                "request_id": request.id,
                "slug": request.slug,
            }),
        })
        .await;

        info!(request_id = %request.id, "application request submitted");
        Ok(request)
    }

    /// Workspace-tier approval escalates the request to the platform
    /// tier.
    pub async fn approve_workspace_tier(
        &self,
        actor: &Actor,
        request_id: Uuid,
    ) -> StreamgateResult<ApplicationRequest> {
        let request = self.request_repo.get_by_id(request_id).await?;
        if request.status != RequestStatus::PendingWorkspace {
            return Err(StreamgateError::Validation {
                message: format!("request is not pending workspace approval: {:?}", request.status),
            });
        }

        let membership = authz::membership_of(&self.ws_repo, request.workspace_id, actor).await?;
        authz::ensure_workspace_admin(actor, membership.as_ref())?;
        let actor_id = actor.user_id().ok_or_else(|| StreamgateError::Validation {
            message: "approvals must be made by a user".into(),
        })?;

        let updated = self
            .request_repo
            .set_workspace_approved(request.id, actor_id)
            .await?;

        self.notify(Notification {
            template: NotificationTemplate::ApprovalNeeded,
            recipient: NotificationRecipient::PlatformAdmins,
            context: serde_json::json!({
                "request_id": updated.id,
                "workspace_id": updated.workspace_id,
            }),
        })
        .await;

        info!(request_id = %updated.id, "request escalated to platform tier");
        Ok(updated)
    }

    /// Platform-tier approval finalizes the request, then performs the
    /// side effects: optional quota increase, application creation
    /// under the trusted approval principal, requester notification.
    pub async fn approve_platform_tier(
        &self,
        actor: &Actor,
        request_id: Uuid,
        action: PlatformAction,
    ) -> StreamgateResult<ApplicationRequest> {
        authz::ensure_platform_admin(actor)?;
        let actor_id = actor.user_id().ok_or_else(|| StreamgateError::Validation {
            message: "approvals must be made by a user".into(),
        })?;

        let request = self.request_repo.get_by_id(request_id).await?;
        if request.status != RequestStatus::PendingPlatform {
            return Err(StreamgateError::Validation {
                message: format!("request is not pending platform approval: {:?}", request.status),
            });
        }

        // The decision is persisted before any side effect so that a
        // side-effect failure can never un-approve the request.
        let approved = self
            .request_repo
            .set_platform_approved(request.id, actor_id, action)
            .await?;

        if action == PlatformAction::IncreasedQuota {
            if let Err(e) = self
                .app_service
                .quota()
                .grant_increase(approved.workspace_id, actor)
                .await
            {
                warn!(request_id = %approved.id, %e, "quota increase after approval failed");
            }
        }

        let create_result = self
            .app_service
            .create(
                &Actor::trusted(APPROVAL_PRINCIPAL),
                NewApplication {
                    workspace_id: approved.workspace_id,
                    name: approved.name.clone(),
                    slug: approved.slug.clone(),
                    description: approved.description.clone(),
                    on_behalf_of: Some(approved.requested_by),
                },
            )
            .await;
        if let Err(e) = create_result {
            warn!(request_id = %approved.id, %e, "application creation after approval failed");
        }

        self.notify(Notification {
            template: NotificationTemplate::RequestApproved,
            recipient: NotificationRecipient::User(approved.requested_by),
            context: serde_json::json!({
                "request_id": approved.id,
                "slug": approved.slug,
            }),
        })
        .await;

        info!(request_id = %approved.id, ?action, "request approved");
        Ok(approved)
    }

    /// Reject a pending request at whichever tier it is waiting on.
    pub async fn reject(
        &self,
        actor: &Actor,
        request_id: Uuid,
        reason: Option<String>,
    ) -> StreamgateResult<ApplicationRequest> {
        let request = self.request_repo.get_by_id(request_id).await?;

        let tier = match request.status {
            RequestStatus::PendingWorkspace => {
                let membership =
                    authz::membership_of(&self.ws_repo, request.workspace_id, actor).await?;
                authz::ensure_workspace_admin(actor, membership.as_ref())?;
                RejectionTier::Workspace
            }
            RequestStatus::PendingPlatform => {
                authz::ensure_platform_admin(actor)?;
                RejectionTier::Platform
            }
            other => {
                return Err(StreamgateError::Validation {
                    message: format!("request is not pending: {other:?}"),
                });
            }
        };
        let actor_id = actor.user_id().ok_or_else(|| StreamgateError::Validation {
            message: "rejections must be made by a user".into(),
        })?;

        let rejected = self
            .request_repo
            .set_rejected(request.id, tier, actor_id, reason)
            .await?;

        self.notify(Notification {
            template: NotificationTemplate::RequestRejected,
            recipient: NotificationRecipient::User(rejected.requested_by),
            context: serde_json::json!({
                "request_id": rejected.id,
                "tier": format!("{tier:?}"),
            }),
        })
        .await;

        info!(request_id = %rejected.id, ?tier, "request rejected");
        Ok(rejected)
    }

    /// The requester may withdraw their own request while it is still
    /// pending.
    pub async fn cancel(&self, actor: &Actor, request_id: Uuid) -> StreamgateResult<()> {
        let request = self.request_repo.get_by_id(request_id).await?;
        if !request.status.is_pending() {
            return Err(StreamgateError::Validation {
                message: format!("request is not pending: {:?}", request.status),
            });
        }
        if actor.user_id() != Some(request.requested_by) {
            return Err(StreamgateError::Unauthorized {
                reason: "only the requester may cancel a request".into(),
            });
        }

        self.request_repo.delete(request.id).await?;
        info!(request_id = %request.id, "request cancelled");
        Ok(())
    }

    pub async fn list(
        &self,
        actor: &Actor,
        workspace_id: Uuid,
        pagination: Pagination,
    ) -> StreamgateResult<PaginatedResult<ApplicationRequest>> {
        let membership = authz::membership_of(&self.ws_repo, workspace_id, actor).await?;
        authz::ensure_active_member(actor, membership.as_ref())?;
        self.request_repo
            .list_by_workspace(workspace_id, pagination)
            .await
    }

    /// Notification failures never block the triggering operation.
    async fn notify(&self, notification: Notification) {
        let template = notification.template;
        if let Err(e) = self.sink.send(notification).await {
            warn!(template = template.as_str(), %e, "notification delivery failed");
        }
    }
}
