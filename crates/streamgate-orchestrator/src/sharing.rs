//! Cross-workspace topic sharing and the discovery catalog.
//!
//! Grants fail closed: an approval whose ACL-sync trigger fails is
//! reverted to pending, so access is never recorded as granted without
//! the data plane knowing about it. Revocations fail open for the same
//! reason credentials do — removal of access must not depend on the
//! sync path being up.

use chrono::{DateTime, Utc};
use streamgate_core::actor::Actor;
use streamgate_core::error::{StreamgateError, StreamgateResult};
use streamgate_core::models::topic::{
    AccessLevel, CreateTopicShare, ShareStatus, Topic, TopicShare,
};
use streamgate_core::repository::{
    PaginatedResult, Pagination, TopicRepository, TopicShareRepository, WorkspaceRepository,
};
use streamgate_core::workflow::{
    StartWorkflow, WORKFLOW_TOPIC_SHARE_ACL_REMOVE, WORKFLOW_TOPIC_SHARE_ACL_SYNC, WorkflowEngine,
    acl_remove_workflow_id, acl_sync_workflow_id,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::authz;
use crate::config::OrchestratorConfig;
use crate::trigger;

/// Input for requesting access to another workspace's topic.
#[derive(Debug, Clone)]
pub struct NewShareRequest {
    pub topic_id: Uuid,
    pub requesting_workspace_id: Uuid,
    pub access_level: AccessLevel,
    pub reason: String,
}

pub struct SharingService<T, S, W, E>
where
    T: TopicRepository,
    S: TopicShareRepository,
    W: WorkspaceRepository,
    E: WorkflowEngine,
{
    topic_repo: T,
    share_repo: S,
    ws_repo: W,
    engine: E,
    config: OrchestratorConfig,
}

impl<T, S, W, E> SharingService<T, S, W, E>
where
    T: TopicRepository,
    S: TopicShareRepository,
    W: WorkspaceRepository,
    E: WorkflowEngine,
{
    pub fn new(topic_repo: T, share_repo: S, ws_repo: W, engine: E, config: OrchestratorConfig) -> Self {
        Self {
            topic_repo,
            share_repo,
            ws_repo,
            engine,
            config,
        }
    }

    /// Discoverable and public topics across all workspaces.
    pub async fn search_catalog(
        &self,
        query: Option<&str>,
        pagination: Pagination,
    ) -> StreamgateResult<PaginatedResult<Topic>> {
        self.topic_repo.search_catalog(query, pagination).await
    }

    /// Request access to a shareable topic. A matching auto-approve
    /// policy short-circuits straight to approval and ACL sync.
    pub async fn request_share(
        &self,
        actor: &Actor,
        input: NewShareRequest,
    ) -> StreamgateResult<TopicShare> {
        let topic = self.topic_repo.get_by_id(input.topic_id).await?;
        if !topic.visibility.is_shareable() {
            return Err(StreamgateError::Validation {
                message: "topic is not discoverable or public".into(),
            });
        }
        if topic.workspace_id == input.requesting_workspace_id {
            return Err(StreamgateError::Validation {
                message: "topic already belongs to the requesting workspace".into(),
            });
        }

        let membership =
            authz::membership_of(&self.ws_repo, input.requesting_workspace_id, actor).await?;
        authz::ensure_active_member(actor, membership.as_ref())?;

        if self
            .share_repo
            .find_active(topic.id, input.requesting_workspace_id)
            .await?
            .is_some()
        {
            return Err(StreamgateError::Validation {
                message: "a pending or approved share already exists for this topic".into(),
            });
        }

        let share = self
            .share_repo
            .create(CreateTopicShare {
                topic_id: topic.id,
                owning_workspace_id: topic.workspace_id,
                requesting_workspace_id: input.requesting_workspace_id,
                access_level: input.access_level,
                reason: input.reason,
            })
            .await?;

        let auto = topic
            .auto_approve
            .as_ref()
            .is_some_and(|p| p.allows(input.access_level, input.requesting_workspace_id));
        if auto {
            let share_id = share.id;
            info!(share_id = %share_id, "share auto-approved by topic policy");
            return match self.finalize_approval(share, "auto-approve", None).await {
                Ok(approved) => Ok(approved),
                // The request itself succeeded; the share waits for a
                // manual approval once the sync path recovers.
                Err(StreamgateError::SyncFailure { .. }) => {
                    warn!(share_id = %share_id, "auto-approve ACL sync failed, share left pending");
                    self.share_repo.get_by_id(share_id).await
                }
                Err(e) => Err(e),
            };
        }

        info!(share_id = %share.id, "share requested");
        Ok(share)
    }

    /// Approve a pending share. The grant fails closed: if the
    /// ACL-sync trigger fails, the share returns to pending.
    pub async fn approve(
        &self,
        actor: &Actor,
        share_id: Uuid,
        expires_at: Option<DateTime<Utc>>,
    ) -> StreamgateResult<TopicShare> {
        let share = self.fetch_pending(share_id).await?;
        self.ensure_owning_admin(actor, &share).await?;
        self.finalize_approval(share, &actor.audit_id(), expires_at)
            .await
    }

    /// Reject a pending share.
    pub async fn reject(
        &self,
        actor: &Actor,
        share_id: Uuid,
        reason: Option<String>,
    ) -> StreamgateResult<TopicShare> {
        let share = self.fetch_pending(share_id).await?;
        self.ensure_owning_admin(actor, &share).await?;

        let rejected = self
            .share_repo
            .set_status(share.id, ShareStatus::Rejected, Some(&actor.audit_id()), None)
            .await?;
        info!(share_id = %rejected.id, reason = reason.as_deref(), "share rejected");
        Ok(rejected)
    }

    /// Revoke an approved share. The local mark always lands; a failed
    /// ACL-removal trigger is logged and the revocation still
    /// succeeds.
    pub async fn revoke(&self, actor: &Actor, share_id: Uuid) -> StreamgateResult<TopicShare> {
        let share = self.share_repo.get_by_id(share_id).await?;
        if share.status != ShareStatus::Approved {
            return Err(StreamgateError::Validation {
                message: format!("share is not approved: {:?}", share.status),
            });
        }
        self.ensure_owning_admin(actor, &share).await?;

        let revoked = self
            .share_repo
            .set_status(share.id, ShareStatus::Revoked, Some(&actor.audit_id()), None)
            .await?;

        let result = trigger::start_bounded(
            &self.engine,
            StartWorkflow {
                workflow_type: WORKFLOW_TOPIC_SHARE_ACL_REMOVE.into(),
                task_queue: self.config.task_queue.clone(),
                workflow_id: acl_remove_workflow_id(share.id),
                input: serde_json::json!({ "share_id": share.id }),
            },
            self.config.workflow_trigger_timeout_secs,
            "topic-share-acl-remove",
        )
        .await;
        if let Err(e) = result {
            warn!(share_id = %share.id, %e, "ACL removal sync failed, revocation recorded locally");
        }

        info!(share_id = %revoked.id, "share revoked");
        Ok(revoked)
    }

    /// Shares on topics the workspace owns or has requested.
    pub async fn list_for_topic(
        &self,
        actor: &Actor,
        topic_id: Uuid,
    ) -> StreamgateResult<Vec<TopicShare>> {
        let topic = self.topic_repo.get_by_id(topic_id).await?;
        let membership = authz::membership_of(&self.ws_repo, topic.workspace_id, actor).await?;
        authz::ensure_active_member(actor, membership.as_ref())?;
        self.share_repo.list_by_topic(topic.id).await
    }

    pub async fn list_for_requesting_workspace(
        &self,
        actor: &Actor,
        workspace_id: Uuid,
    ) -> StreamgateResult<Vec<TopicShare>> {
        let membership = authz::membership_of(&self.ws_repo, workspace_id, actor).await?;
        authz::ensure_active_member(actor, membership.as_ref())?;
        self.share_repo.list_by_requesting_workspace(workspace_id).await
    }

    async fn fetch_pending(&self, share_id: Uuid) -> StreamgateResult<TopicShare> {
        let share = self.share_repo.get_by_id(share_id).await?;
        if share.status != ShareStatus::Pending {
            return Err(StreamgateError::Validation {
                message: format!("share is not pending: {:?}", share.status),
            });
        }
        Ok(share)
    }

    async fn ensure_owning_admin(&self, actor: &Actor, share: &TopicShare) -> StreamgateResult<()> {
        let membership =
            authz::membership_of(&self.ws_repo, share.owning_workspace_id, actor).await?;
        authz::ensure_workspace_admin(actor, membership.as_ref())
    }

    /// Persist the approval, then trigger ACL sync; revert to pending
    /// if the trigger fails.
    async fn finalize_approval(
        &self,
        share: TopicShare,
        decided_by: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> StreamgateResult<TopicShare> {
        let approved = self
            .share_repo
            .set_status(share.id, ShareStatus::Approved, Some(decided_by), expires_at)
            .await?;

        let result = trigger::start_bounded(
            &self.engine,
            StartWorkflow {
                workflow_type: WORKFLOW_TOPIC_SHARE_ACL_SYNC.into(),
                task_queue: self.config.task_queue.clone(),
                workflow_id: acl_sync_workflow_id(share.id),
                input: serde_json::json!({
                    "share_id": share.id,
                    "topic_id": share.topic_id,
                }),
            },
            self.config.workflow_trigger_timeout_secs,
            "topic-share-acl-sync",
        )
        .await;

        if let Err(sync_err) = result {
            // Fail closed: the grant must not stand without the data
            // plane knowing about it.
            if let Err(revert_err) = self
                .share_repo
                .set_status(share.id, ShareStatus::Pending, None, None)
                .await
            {
                error!(
                    share_id = %share.id,
                    %revert_err,
                    "share revert failed, local and remote state diverged"
                );
                return Err(StreamgateError::CriticalInconsistency {
                    detail: format!(
                        "ACL sync failed and revert failed for share {}: {revert_err}",
                        share.id,
                    ),
                });
            }
            warn!(share_id = %share.id, "ACL sync failed, share reverted to pending");
            return Err(sync_err);
        }

        info!(share_id = %approved.id, "share approved");
        Ok(approved)
    }
}
