//! Per-workspace application quota evaluation.
//!
//! The effective limit is the workspace's override if one exists,
//! otherwise the system default. Nothing is cached; the count is
//! re-read at every check. The check-then-create window between
//! concurrent creates is accepted and documented rather than locked.

use streamgate_core::actor::Actor;
use streamgate_core::error::StreamgateResult;
use streamgate_core::models::audit::{ActorKind, CreateAuditLogEntry};
use streamgate_core::models::workspace::{QuotaInfo, QuotaOverride};
use streamgate_core::repository::{
    ApplicationRepository, AuditLogRepository, QuotaOverrideRepository,
};
use tracing::info;
use uuid::Uuid;

pub struct QuotaEvaluator<A, Q, L>
where
    A: ApplicationRepository,
    Q: QuotaOverrideRepository,
    L: AuditLogRepository,
{
    app_repo: A,
    quota_repo: Q,
    audit_repo: L,
    default_quota: u32,
}

impl<A, Q, L> QuotaEvaluator<A, Q, L>
where
    A: ApplicationRepository,
    Q: QuotaOverrideRepository,
    L: AuditLogRepository,
{
    pub fn new(app_repo: A, quota_repo: Q, audit_repo: L, default_quota: u32) -> Self {
        Self {
            app_repo,
            quota_repo,
            audit_repo,
            default_quota,
        }
    }

    /// Current usage against the effective limit.
    pub async fn quota_info(&self, workspace_id: Uuid) -> StreamgateResult<QuotaInfo> {
        let used = self.app_repo.count_non_deleted(workspace_id).await?;
        let limit = match self.quota_repo.get(workspace_id).await? {
            Some(o) => u64::from(o.application_quota),
            None => u64::from(self.default_quota),
        };
        Ok(QuotaInfo { used, limit })
    }

    pub async fn can_create_application(&self, workspace_id: Uuid) -> StreamgateResult<bool> {
        let info = self.quota_info(workspace_id).await?;
        Ok(info.used < info.limit)
    }

    /// Raise the workspace's limit by one, creating an override at
    /// `default + 1` if none exists. Attributes the actor and leaves
    /// an audit entry.
    pub async fn grant_increase(
        &self,
        workspace_id: Uuid,
        actor: &Actor,
    ) -> StreamgateResult<QuotaOverride> {
        let new_quota = match self.quota_repo.get(workspace_id).await? {
            Some(existing) => existing.application_quota + 1,
            None => self.default_quota + 1,
        };

        let updated = self
            .quota_repo
            .upsert(workspace_id, new_quota, &actor.audit_id())
            .await?;

        let actor_kind = if actor.is_trusted_service() {
            ActorKind::TrustedService
        } else {
            ActorKind::User
        };
        self.audit_repo
            .append(CreateAuditLogEntry {
                actor: actor.audit_id(),
                actor_kind,
                action: "quota.increase".into(),
                resource: Some(format!("workspace:{workspace_id}")),
                metadata: serde_json::json!({ "application_quota": new_quota }),
            })
            .await?;

        info!(%workspace_id, new_quota, "application quota raised");
        Ok(updated)
    }
}
