//! Service-account credential lifecycle.
//!
//! Creation and rotation write locally first, then synchronously
//! trigger the credential-upsert workflow. A failed trigger rolls the
//! local write back (delete on create, restore on rotate); a failed
//! rollback is a critical inconsistency that must be reconciled by
//! hand. Revocation is the opposite: the local mark always lands and a
//! failed removal trigger only warns, because denying access must not
//! depend on the data plane being reachable.

use chrono::Utc;
use streamgate_core::actor::Actor;
use streamgate_core::error::{StreamgateError, StreamgateResult};
use streamgate_core::models::service_account::{
    CreateServiceAccount, PermissionTemplate, ServiceAccount, ServiceAccountStatus,
    ServiceAccountView,
};
use streamgate_core::models::virtual_cluster::{VirtualCluster, VirtualClusterStatus};
use streamgate_core::repository::{
    ServiceAccountRepository, VirtualClusterRepository, WorkspaceRepository,
};
use streamgate_core::workflow::{
    StartWorkflow, WORKFLOW_CREDENTIAL_REVOKE, WORKFLOW_CREDENTIAL_UPSERT, WorkflowEngine,
    credential_revoke_workflow_id, credential_upsert_workflow_id,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::authz;
use crate::config::OrchestratorConfig;
use crate::password;
use crate::trigger;

/// Input for creating a credential.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub virtual_cluster_id: Uuid,
    pub name: String,
    pub permission_template: PermissionTemplate,
    pub custom_permissions: Vec<String>,
}

/// Credential material returned exactly once; the plaintext password
/// is never stored or logged.
#[derive(Debug)]
pub struct IssuedCredential {
    pub account: ServiceAccountView,
    pub password: String,
}

fn valid_account_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-')
}

fn ensure_cluster_active(cluster: &VirtualCluster) -> StreamgateResult<()> {
    let state = match cluster.status {
        VirtualClusterStatus::Active => return Ok(()),
        VirtualClusterStatus::Provisioning => "still provisioning",
        VirtualClusterStatus::ReadOnly => "read-only",
        VirtualClusterStatus::Deleting => "being deleted",
        VirtualClusterStatus::Deleted => "deleted",
    };
    Err(StreamgateError::ResourceNotReady {
        resource: format!("virtual cluster {}", cluster.prefix),
        state: state.into(),
    })
}

pub struct CredentialService<S, V, W, E>
where
    S: ServiceAccountRepository,
    V: VirtualClusterRepository,
    W: WorkspaceRepository,
    E: WorkflowEngine,
{
    sa_repo: S,
    vc_repo: V,
    ws_repo: W,
    engine: E,
    config: OrchestratorConfig,
}

impl<S, V, W, E> CredentialService<S, V, W, E>
where
    S: ServiceAccountRepository,
    V: VirtualClusterRepository,
    W: WorkspaceRepository,
    E: WorkflowEngine,
{
    pub fn new(sa_repo: S, vc_repo: V, ws_repo: W, engine: E, config: OrchestratorConfig) -> Self {
        Self {
            sa_repo,
            vc_repo,
            ws_repo,
            engine,
            config,
        }
    }

    /// Create a service account and push its credential to the data
    /// plane. Returns the plaintext password exactly once.
    pub async fn create(
        &self,
        actor: &Actor,
        input: NewCredential,
    ) -> StreamgateResult<IssuedCredential> {
        let cluster = self.vc_repo.get_by_id(input.virtual_cluster_id).await?;
        ensure_cluster_active(&cluster)?;

        let membership = authz::membership_of(&self.ws_repo, cluster.workspace_id, actor).await?;
        authz::ensure_workspace_admin(actor, membership.as_ref())?;

        if !valid_account_name(&input.name) {
            return Err(StreamgateError::Validation {
                message: format!("invalid service account name: {:?}", input.name),
            });
        }

        let username = format!("{}-{}", cluster.prefix, input.name);
        if self.sa_repo.username_in_use(&username).await? {
            return Err(StreamgateError::Validation {
                message: format!("username already in use: {username}"),
            });
        }

        let plaintext = password::generate_password();
        let password_hash = password::hash_password(&plaintext)?;

        let account = self
            .sa_repo
            .create(CreateServiceAccount {
                virtual_cluster_id: cluster.id,
                workspace_id: cluster.workspace_id,
                name: input.name,
                username,
                password_hash,
                permission_template: input.permission_template,
                custom_permissions: input.custom_permissions,
            })
            .await?;

        if let Err(sync_err) = self.trigger_upsert(&account).await {
            // Roll the local record back so a retry starts clean.
            if let Err(delete_err) = self.sa_repo.delete(account.id).await {
                error!(
                    service_account_id = %account.id,
                    %delete_err,
                    "credential rollback failed, local and remote state diverged"
                );
                return Err(StreamgateError::CriticalInconsistency {
                    detail: format!(
                        "credential sync failed and rollback delete failed for {}: {delete_err}",
                        account.username,
                    ),
                });
            }
            return Err(sync_err);
        }

        info!(service_account_id = %account.id, username = account.username, "credential issued");
        Ok(IssuedCredential {
            account: account.into(),
            password: plaintext,
        })
    }

    /// Rotate a credential's password. Rate limited per account; a
    /// failed sync restores the previous hash and rotation timestamp.
    pub async fn rotate(&self, actor: &Actor, sa_id: Uuid) -> StreamgateResult<IssuedCredential> {
        let account = self.sa_repo.get_by_id(sa_id).await?;
        if account.status == ServiceAccountStatus::Revoked {
            return Err(StreamgateError::Validation {
                message: "cannot rotate a revoked credential".into(),
            });
        }

        let membership = authz::membership_of(&self.ws_repo, account.workspace_id, actor).await?;
        authz::ensure_workspace_admin(actor, membership.as_ref())?;

        let cooldown = self.config.rotation_cooldown_secs as i64;
        let elapsed = (Utc::now() - account.last_rotated_at).num_seconds();
        if elapsed < cooldown {
            return Err(StreamgateError::RateLimited {
                remaining_seconds: (cooldown - elapsed).max(1) as u64,
            });
        }

        let plaintext = password::generate_password();
        let new_hash = password::hash_password(&plaintext)?;
        self.sa_repo
            .update_credentials(account.id, &new_hash, Utc::now())
            .await?;

        if let Err(sync_err) = self.trigger_upsert(&account).await {
            // Restore the previous credential so the account keeps
            // working with what the data plane already has.
            if let Err(restore_err) = self
                .sa_repo
                .update_credentials(account.id, &account.password_hash, account.last_rotated_at)
                .await
            {
                error!(
                    service_account_id = %account.id,
                    %restore_err,
                    "rotation rollback failed, local and remote state diverged"
                );
                return Err(StreamgateError::CriticalInconsistency {
                    detail: format!(
                        "rotation sync failed and restore failed for {}: {restore_err}",
                        account.username,
                    ),
                });
            }
            return Err(sync_err);
        }

        let refreshed = self.sa_repo.get_by_id(account.id).await?;
        info!(service_account_id = %account.id, "credential rotated");
        Ok(IssuedCredential {
            account: refreshed.into(),
            password: plaintext,
        })
    }

    /// Revoke a credential. The local mark always lands; a failed
    /// removal trigger is logged and the revocation still succeeds.
    pub async fn revoke(&self, actor: &Actor, sa_id: Uuid) -> StreamgateResult<()> {
        let account = self.sa_repo.get_by_id(sa_id).await?;
        if account.status == ServiceAccountStatus::Revoked {
            return Err(StreamgateError::Validation {
                message: "already revoked".into(),
            });
        }

        let membership = authz::membership_of(&self.ws_repo, account.workspace_id, actor).await?;
        authz::ensure_workspace_admin(actor, membership.as_ref())?;

        self.sa_repo
            .set_status(account.id, ServiceAccountStatus::Revoked)
            .await?;

        let workflow_id = credential_revoke_workflow_id(account.id);
        let result = trigger::start_bounded(
            &self.engine,
            StartWorkflow {
                workflow_type: WORKFLOW_CREDENTIAL_REVOKE.into(),
                task_queue: self.config.task_queue.clone(),
                workflow_id,
                input: serde_json::json!({
                    "service_account_id": account.id,
                    "username": account.username,
                }),
            },
            self.config.workflow_trigger_timeout_secs,
            "credential-revoke",
        )
        .await;

        if let Err(e) = result {
            warn!(
                service_account_id = %account.id,
                %e,
                "credential revoke sync failed, revocation recorded locally"
            );
        }

        info!(service_account_id = %account.id, "credential revoked");
        Ok(())
    }

    /// Credentials on a cluster, without password hashes.
    pub async fn list(
        &self,
        actor: &Actor,
        virtual_cluster_id: Uuid,
    ) -> StreamgateResult<Vec<ServiceAccountView>> {
        let cluster = self.vc_repo.get_by_id(virtual_cluster_id).await?;
        let membership = authz::membership_of(&self.ws_repo, cluster.workspace_id, actor).await?;
        authz::ensure_active_member(actor, membership.as_ref())?;

        let accounts = self.sa_repo.list_by_virtual_cluster(cluster.id).await?;
        Ok(accounts.into_iter().map(ServiceAccountView::from).collect())
    }

    async fn trigger_upsert(&self, account: &ServiceAccount) -> StreamgateResult<()> {
        trigger::start_bounded(
            &self.engine,
            StartWorkflow {
                workflow_type: WORKFLOW_CREDENTIAL_UPSERT.into(),
                task_queue: self.config.task_queue.clone(),
                workflow_id: credential_upsert_workflow_id(account.id),
                input: serde_json::json!({
                    "service_account_id": account.id,
                    "virtual_cluster_id": account.virtual_cluster_id,
                    "username": account.username,
                }),
            },
            self.config.workflow_trigger_timeout_secs,
            "credential-upsert",
        )
        .await
        .map(|_| ())
    }
}
