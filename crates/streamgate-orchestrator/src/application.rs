//! Application lifecycle orchestration.
//!
//! Creating an application persists the local records first (the
//! application plus one virtual-cluster row per environment), then
//! triggers the provisioning workflow. A failed trigger leaves the
//! application `Pending` and retryable; the deterministic workflow ID
//! guarantees a retry lands on the same logical run.

use std::collections::BTreeMap;

use streamgate_core::actor::Actor;
use streamgate_core::error::{StreamgateError, StreamgateResult};
use streamgate_core::models::application::{
    Application, ApplicationStatus, CreateApplication, EnvironmentProvisioningResult,
    OutcomeStatus, ProvisioningDetails, ProvisioningStatus,
};
use streamgate_core::models::virtual_cluster::{
    CreateVirtualCluster, Environment, VirtualCluster, VirtualClusterStatus,
};
use streamgate_core::models::audit::{ActorKind, CreateAuditLogEntry};
use streamgate_core::models::reference::EntityRef;
use streamgate_core::models::workspace::Workspace;
use streamgate_core::repository::{
    ApplicationRepository, AuditLogRepository, PaginatedResult, Pagination,
    QuotaOverrideRepository, VirtualClusterRepository, WorkspaceRepository,
};
use streamgate_core::workflow::{
    StartWorkflow, WORKFLOW_VIRTUAL_CLUSTER_PROVISION, WorkflowEngine, provisioning_workflow_id,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::authz;
use crate::config::OrchestratorConfig;
use crate::quota::QuotaEvaluator;
use crate::trigger;

/// Input for creating an application directly or on behalf of an
/// approved request.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub workspace_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// Overrides attribution when a trusted principal acts on behalf
    /// of a requester.
    pub on_behalf_of: Option<Uuid>,
}

/// An application with its clusters and a reference to the owning
/// workspace, expanded only when the caller asked for it.
#[derive(Debug, Clone)]
pub struct ApplicationDetail {
    pub application: Application,
    pub workspace: EntityRef<Workspace>,
    pub virtual_clusters: Vec<VirtualCluster>,
}

fn valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 63
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
}

pub struct ApplicationService<A, V, W, Q, L, E>
where
    A: ApplicationRepository,
    V: VirtualClusterRepository,
    W: WorkspaceRepository,
    Q: QuotaOverrideRepository,
    L: AuditLogRepository,
    E: WorkflowEngine,
{
    app_repo: A,
    vc_repo: V,
    ws_repo: W,
    audit_repo: L,
    quota: QuotaEvaluator<A, Q, L>,
    engine: E,
    config: OrchestratorConfig,
}

impl<A, V, W, Q, L, E> ApplicationService<A, V, W, Q, L, E>
where
    A: ApplicationRepository,
    V: VirtualClusterRepository,
    W: WorkspaceRepository,
    Q: QuotaOverrideRepository,
    L: AuditLogRepository,
    E: WorkflowEngine,
{
    pub fn new(
        app_repo: A,
        vc_repo: V,
        ws_repo: W,
        audit_repo: L,
        quota: QuotaEvaluator<A, Q, L>,
        engine: E,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            app_repo,
            vc_repo,
            ws_repo,
            audit_repo,
            quota,
            engine,
            config,
        }
    }

    pub fn quota(&self) -> &QuotaEvaluator<A, Q, L> {
        &self.quota
    }

    /// Create an application with one virtual cluster per environment
    /// and trigger provisioning.
    pub async fn create(
        &self,
        actor: &Actor,
        input: NewApplication,
    ) -> StreamgateResult<Application> {
        let workspace = self.ws_repo.get_by_id(input.workspace_id).await?;
        let membership = authz::membership_of(&self.ws_repo, workspace.id, actor).await?;
        authz::ensure_active_member(actor, membership.as_ref())?;

        if !valid_slug(&input.slug) {
            return Err(StreamgateError::Validation {
                message: format!("invalid application slug: {:?}", input.slug),
            });
        }
        if self.app_repo.slug_in_use(workspace.id, &input.slug).await? {
            return Err(StreamgateError::Validation {
                message: format!("application slug already in use: {}", input.slug),
            });
        }

        // Trusted principals (the approval workflow) have already been
        // through human review; their bypass is audited instead.
        if actor.is_trusted_service() {
            self.audit_repo
                .append(CreateAuditLogEntry {
                    actor: actor.audit_id(),
                    actor_kind: ActorKind::TrustedService,
                    action: "application.create".into(),
                    resource: Some(format!("workspace:{}", workspace.id)),
                    metadata: serde_json::json!({
                        "slug": input.slug,
                        "bypassed_quota": true,
                    }),
                })
                .await?;
        } else {
            let info = self.quota.quota_info(workspace.id).await?;
            if info.used >= info.limit {
                return Err(StreamgateError::QuotaExceeded {
                    used: info.used,
                    limit: info.limit,
                });
            }
        }

        let created_by = input
            .on_behalf_of
            .map(|u| u.to_string())
            .unwrap_or_else(|| actor.audit_id());

        let app = self
            .app_repo
            .create(CreateApplication {
                workspace_id: workspace.id,
                name: input.name,
                slug: input.slug,
                description: input.description,
                created_by,
            })
            .await?;

        for environment in Environment::all() {
            self.vc_repo
                .create(CreateVirtualCluster {
                    application_id: app.id,
                    workspace_id: workspace.id,
                    environment,
                    prefix: format!("{}-{}-{}", workspace.slug, app.slug, environment),
                })
                .await?;
        }

        info!(application_id = %app.id, slug = app.slug, "application created");

        self.trigger_provisioning(&app).await?;
        self.app_repo.get_by_id(app.id).await
    }

    /// Re-trigger provisioning for an application whose workflow never
    /// started or partially failed.
    pub async fn retry_virtual_cluster_provisioning(
        &self,
        actor: &Actor,
        application_id: Uuid,
    ) -> StreamgateResult<Application> {
        let app = self.app_repo.get_by_id(application_id).await?;
        let membership = authz::membership_of(&self.ws_repo, app.workspace_id, actor).await?;
        authz::ensure_workspace_admin(actor, membership.as_ref())?;

        match app.provisioning_status {
            ProvisioningStatus::Pending
            | ProvisioningStatus::Failed
            | ProvisioningStatus::Partial => {}
            other => {
                return Err(StreamgateError::Validation {
                    message: format!("provisioning cannot be retried from {other:?}"),
                });
            }
        }

        self.trigger_provisioning(&app).await?;
        self.app_repo.get_by_id(app.id).await
    }

    async fn trigger_provisioning(&self, app: &Application) -> StreamgateResult<()> {
        let workflow_id = provisioning_workflow_id(app.id);
        trigger::start_bounded(
            &self.engine,
            StartWorkflow {
                workflow_type: WORKFLOW_VIRTUAL_CLUSTER_PROVISION.into(),
                task_queue: self.config.task_queue.clone(),
                workflow_id: workflow_id.clone(),
                input: serde_json::json!({
                    "application_id": app.id,
                    "workspace_id": app.workspace_id,
                }),
            },
            self.config.workflow_trigger_timeout_secs,
            "virtual-cluster-provision",
        )
        .await?;

        self.app_repo
            .set_provisioning_started(app.id, &workflow_id)
            .await
    }

    /// Inbound callback path for the provisioning workflow: record
    /// per-environment outcomes, derive the terminal status, and
    /// activate the clusters that came up.
    pub async fn update_provisioning_outcome(
        &self,
        application_id: Uuid,
        results: BTreeMap<Environment, EnvironmentProvisioningResult>,
    ) -> StreamgateResult<Application> {
        let app = self.app_repo.get_by_id(application_id).await?;

        let succeeded = results
            .values()
            .filter(|r| r.outcome.status == OutcomeStatus::Success)
            .count();
        let status = if succeeded == results.len() && !results.is_empty() {
            ProvisioningStatus::Completed
        } else if succeeded > 0 {
            ProvisioningStatus::Partial
        } else {
            ProvisioningStatus::Failed
        };

        let details: ProvisioningDetails = results
            .iter()
            .map(|(env, r)| (*env, r.outcome.clone()))
            .collect();
        self.app_repo
            .set_provisioning_outcome(app.id, status, &details)
            .await?;

        let clusters = self.vc_repo.list_by_application(app.id).await?;
        for cluster in &clusters {
            let Some(result) = results.get(&cluster.environment) else {
                continue;
            };
            if result.outcome.status != OutcomeStatus::Success {
                continue;
            }
            match &result.bootstrap_servers {
                Some(servers) => self.vc_repo.mark_active(cluster.id, servers).await?,
                None => {
                    warn!(
                        virtual_cluster_id = %cluster.id,
                        "provisioning succeeded without bootstrap servers, cluster left provisioning"
                    );
                }
            }
        }

        info!(%application_id, ?status, "provisioning outcome recorded");
        self.app_repo.get_by_id(application_id).await
    }

    /// Begin tearing an application down: the application enters
    /// `Decommissioning` and its clusters flip to `Deleting`.
    pub async fn decommission(
        &self,
        actor: &Actor,
        application_id: Uuid,
    ) -> StreamgateResult<()> {
        let app = self.app_repo.get_by_id(application_id).await?;
        let membership = authz::membership_of(&self.ws_repo, app.workspace_id, actor).await?;
        authz::ensure_workspace_admin(actor, membership.as_ref())?;

        if app.status != ApplicationStatus::Active {
            return Err(StreamgateError::Validation {
                message: format!("application cannot be decommissioned from {:?}", app.status),
            });
        }

        self.app_repo
            .set_status(app.id, ApplicationStatus::Decommissioning)
            .await?;
        for cluster in self.vc_repo.list_by_application(app.id).await? {
            self.vc_repo
                .set_status(cluster.id, VirtualClusterStatus::Deleting)
                .await?;
        }

        info!(%application_id, "application decommissioning");
        Ok(())
    }

    pub async fn get(&self, actor: &Actor, application_id: Uuid) -> StreamgateResult<Application> {
        let app = self.app_repo.get_by_id(application_id).await?;
        let membership = authz::membership_of(&self.ws_repo, app.workspace_id, actor).await?;
        authz::ensure_active_member(actor, membership.as_ref())?;
        Ok(app)
    }

    /// Application, clusters, and the owning workspace reference.
    pub async fn detail(
        &self,
        actor: &Actor,
        application_id: Uuid,
        expand_workspace: bool,
    ) -> StreamgateResult<ApplicationDetail> {
        let app = self.app_repo.get_by_id(application_id).await?;
        let membership = authz::membership_of(&self.ws_repo, app.workspace_id, actor).await?;
        authz::ensure_active_member(actor, membership.as_ref())?;

        let workspace = if expand_workspace {
            let ws = self.ws_repo.get_by_id(app.workspace_id).await?;
            EntityRef::expanded(ws.id, ws)
        } else {
            EntityRef::id_only(app.workspace_id)
        };
        let virtual_clusters = self.vc_repo.list_by_application(app.id).await?;

        Ok(ApplicationDetail {
            application: app,
            workspace,
            virtual_clusters,
        })
    }

    pub async fn list(
        &self,
        actor: &Actor,
        workspace_id: Uuid,
        pagination: Pagination,
    ) -> StreamgateResult<PaginatedResult<Application>> {
        let membership = authz::membership_of(&self.ws_repo, workspace_id, actor).await?;
        authz::ensure_active_member(actor, membership.as_ref())?;
        self.app_repo.list_by_workspace(workspace_id, pagination).await
    }

    pub async fn virtual_clusters(
        &self,
        actor: &Actor,
        application_id: Uuid,
    ) -> StreamgateResult<Vec<VirtualCluster>> {
        let app = self.app_repo.get_by_id(application_id).await?;
        let membership = authz::membership_of(&self.ws_repo, app.workspace_id, actor).await?;
        authz::ensure_active_member(actor, membership.as_ref())?;
        self.vc_repo.list_by_application(app.id).await
    }
}
