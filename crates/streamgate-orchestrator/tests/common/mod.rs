//! Shared test fixtures: in-memory database setup and recording fakes
//! for the external collaborators.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use streamgate_core::actor::{MemberStatus, WorkspaceRole};
use streamgate_core::error::{StreamgateError, StreamgateResult};
use streamgate_core::gateway::{
    AdminGateway, ConsumerGroupDetail, ConsumerGroupSummary, GatewayError, OffsetResetType,
    PartitionOffset, VirtualClusterGatewayConfig,
};
use streamgate_core::models::service_account::{
    CreateServiceAccount, ServiceAccount, ServiceAccountStatus,
};
use streamgate_core::models::topic::{CreateTopicShare, ShareStatus, TopicShare};
use streamgate_core::models::workspace::{CreateWorkspace, Workspace};
use streamgate_core::notify::{Notification, NotificationError, NotificationSink};
use streamgate_core::repository::{
    ServiceAccountRepository, TopicShareRepository, WorkspaceRepository,
};
use streamgate_core::workflow::{StartWorkflow, WorkflowEngine, WorkflowError, WorkflowStart};
use streamgate_db::repository::{
    SurrealServiceAccountRepository, SurrealTopicShareRepository, SurrealWorkspaceRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

pub async fn setup_db() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    streamgate_db::run_migrations(&db).await.unwrap();
    db
}

/// Create a workspace with one active admin member; returns the
/// workspace and the admin's user ID.
pub async fn setup_workspace(db: &Surreal<Db>, slug: &str) -> (Workspace, Uuid) {
    let repo = SurrealWorkspaceRepository::new(db.clone());
    let ws = repo
        .create(CreateWorkspace {
            name: slug.replace('-', " "),
            slug: slug.into(),
        })
        .await
        .unwrap();
    let admin = Uuid::new_v4();
    repo.add_member(ws.id, admin, WorkspaceRole::Admin, MemberStatus::Active)
        .await
        .unwrap();
    (ws, admin)
}

// ---------------------------------------------------------------------------
// Workflow engine fake
// ---------------------------------------------------------------------------

#[derive(Default)]
struct EngineState {
    started: Vec<StartWorkflow>,
    seen_ids: HashSet<String>,
    failing: bool,
}

/// Recording workflow engine. Deduplicates by workflow ID like the
/// real engine: a repeated ID yields `AlreadyRunning`.
#[derive(Clone, Default)]
pub struct FakeWorkflowEngine {
    state: Arc<Mutex<EngineState>>,
}

impl FakeWorkflowEngine {
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    /// All trigger requests received, including deduplicated ones.
    pub fn started(&self) -> Vec<StartWorkflow> {
        self.state.lock().unwrap().started.clone()
    }

    /// Number of distinct logical runs.
    pub fn distinct_runs(&self) -> usize {
        self.state.lock().unwrap().seen_ids.len()
    }
}

impl WorkflowEngine for FakeWorkflowEngine {
    async fn start(&self, request: StartWorkflow) -> Result<WorkflowStart, WorkflowError> {
        let mut state = self.state.lock().unwrap();
        if state.failing {
            return Err(WorkflowError::Trigger("engine offline".into()));
        }
        let run_id = format!("run-{}", request.workflow_id);
        let duplicate = !state.seen_ids.insert(request.workflow_id.clone());
        state.started.push(request);
        if duplicate {
            Ok(WorkflowStart::AlreadyRunning { run_id })
        } else {
            Ok(WorkflowStart::Started { run_id })
        }
    }
}

// ---------------------------------------------------------------------------
// Notification sink fake
// ---------------------------------------------------------------------------

#[derive(Default)]
struct SinkState {
    sent: Vec<Notification>,
    failing: bool,
}

#[derive(Clone, Default)]
pub struct FakeNotificationSink {
    state: Arc<Mutex<SinkState>>,
}

impl FakeNotificationSink {
    #[allow(dead_code)]
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.state.lock().unwrap().sent.clone()
    }
}

impl NotificationSink for FakeNotificationSink {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        let mut state = self.state.lock().unwrap();
        if state.failing {
            return Err(NotificationError("sink offline".into()));
        }
        state.sent.push(notification);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Admin gateway fake
// ---------------------------------------------------------------------------

#[derive(Default)]
struct GatewayState {
    configs: Vec<VirtualClusterGatewayConfig>,
    groups: Vec<ConsumerGroupSummary>,
    sync_failing: bool,
    ops_failing: bool,
}

#[derive(Clone, Default)]
pub struct FakeAdminGateway {
    state: Arc<Mutex<GatewayState>>,
}

#[allow(dead_code)]
impl FakeAdminGateway {
    pub fn set_sync_failing(&self, failing: bool) {
        self.state.lock().unwrap().sync_failing = failing;
    }

    pub fn set_ops_failing(&self, failing: bool) {
        self.state.lock().unwrap().ops_failing = failing;
    }

    pub fn add_group(&self, group_id: &str, members: u32) {
        self.state.lock().unwrap().groups.push(ConsumerGroupSummary {
            group_id: group_id.into(),
            state: if members > 0 { "Stable" } else { "Empty" }.into(),
            members,
        });
    }

    /// Configurations pushed so far, in order.
    pub fn pushed_configs(&self) -> Vec<VirtualClusterGatewayConfig> {
        self.state.lock().unwrap().configs.clone()
    }
}

impl AdminGateway for FakeAdminGateway {
    async fn upsert_virtual_cluster(
        &self,
        config: VirtualClusterGatewayConfig,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        if state.sync_failing {
            return Err(GatewayError::Unavailable("gateway offline".into()));
        }
        state.configs.push(config);
        Ok(())
    }

    async fn list_consumer_groups(
        &self,
        _virtual_cluster_id: Uuid,
    ) -> Result<Vec<ConsumerGroupSummary>, GatewayError> {
        let state = self.state.lock().unwrap();
        if state.ops_failing {
            return Err(GatewayError::Rejected("admin op rejected".into()));
        }
        Ok(state.groups.clone())
    }

    async fn describe_consumer_group(
        &self,
        _virtual_cluster_id: Uuid,
        group_id: &str,
    ) -> Result<ConsumerGroupDetail, GatewayError> {
        let state = self.state.lock().unwrap();
        if state.ops_failing {
            return Err(GatewayError::Rejected("admin op rejected".into()));
        }
        let summary = state
            .groups
            .iter()
            .find(|g| g.group_id == group_id)
            .cloned()
            .ok_or_else(|| GatewayError::GroupNotFound(group_id.into()))?;
        Ok(ConsumerGroupDetail {
            summary,
            offsets: vec![],
        })
    }

    async fn reset_consumer_group_offsets(
        &self,
        _virtual_cluster_id: Uuid,
        group_id: &str,
        topic: &str,
        _reset_type: OffsetResetType,
        _timestamp: Option<DateTime<Utc>>,
    ) -> Result<Vec<PartitionOffset>, GatewayError> {
        let state = self.state.lock().unwrap();
        let group = state
            .groups
            .iter()
            .find(|g| g.group_id == group_id)
            .ok_or_else(|| GatewayError::GroupNotFound(group_id.into()))?;
        if group.members > 0 {
            return Err(GatewayError::GroupNotEmpty {
                members: group.members,
            });
        }
        Ok(vec![PartitionOffset {
            topic: topic.into(),
            partition: 0,
            offset: 0,
            lag: Some(0),
        }])
    }
}

// ---------------------------------------------------------------------------
// Failure-injecting repository wrappers
// ---------------------------------------------------------------------------

fn injected_write_failure() -> StreamgateError {
    StreamgateError::Database("connection reset".into())
}

#[derive(Default)]
struct AccountFaults {
    deletes_failing: bool,
    credential_updates_allowed: Option<u32>,
}

/// Service-account repository that delegates to the real one but fails
/// specific writes on demand, for exercising rollback failures.
#[derive(Clone)]
pub struct FlakyServiceAccountRepository {
    inner: SurrealServiceAccountRepository<Db>,
    faults: Arc<Mutex<AccountFaults>>,
}

#[allow(dead_code)]
impl FlakyServiceAccountRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            inner: SurrealServiceAccountRepository::new(db),
            faults: Arc::default(),
        }
    }

    pub fn fail_deletes(&self) {
        self.faults.lock().unwrap().deletes_failing = true;
    }

    /// Allow `n` further `update_credentials` calls, then fail.
    pub fn allow_credential_updates(&self, n: u32) {
        self.faults.lock().unwrap().credential_updates_allowed = Some(n);
    }
}

impl ServiceAccountRepository for FlakyServiceAccountRepository {
    async fn create(&self, input: CreateServiceAccount) -> StreamgateResult<ServiceAccount> {
        self.inner.create(input).await
    }

    async fn get_by_id(&self, id: Uuid) -> StreamgateResult<ServiceAccount> {
        self.inner.get_by_id(id).await
    }

    async fn username_in_use(&self, username: &str) -> StreamgateResult<bool> {
        self.inner.username_in_use(username).await
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        password_hash: &str,
        last_rotated_at: DateTime<Utc>,
    ) -> StreamgateResult<()> {
        {
            let mut faults = self.faults.lock().unwrap();
            if let Some(allowed) = faults.credential_updates_allowed.as_mut() {
                if *allowed == 0 {
                    return Err(injected_write_failure());
                }
                *allowed -= 1;
            }
        }
        self.inner
            .update_credentials(id, password_hash, last_rotated_at)
            .await
    }

    async fn set_status(&self, id: Uuid, status: ServiceAccountStatus) -> StreamgateResult<()> {
        self.inner.set_status(id, status).await
    }

    async fn delete(&self, id: Uuid) -> StreamgateResult<()> {
        if self.faults.lock().unwrap().deletes_failing {
            return Err(injected_write_failure());
        }
        self.inner.delete(id).await
    }

    async fn list_by_virtual_cluster(
        &self,
        virtual_cluster_id: Uuid,
    ) -> StreamgateResult<Vec<ServiceAccount>> {
        self.inner.list_by_virtual_cluster(virtual_cluster_id).await
    }
}

#[derive(Default)]
struct ShareFaults {
    status_updates_allowed: Option<u32>,
}

/// Topic-share repository wrapper in the same style, for failing the
/// revert write behind a fail-closed grant.
#[derive(Clone)]
pub struct FlakyTopicShareRepository {
    inner: SurrealTopicShareRepository<Db>,
    faults: Arc<Mutex<ShareFaults>>,
}

#[allow(dead_code)]
impl FlakyTopicShareRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            inner: SurrealTopicShareRepository::new(db),
            faults: Arc::default(),
        }
    }

    /// Allow `n` further `set_status` calls, then fail.
    pub fn allow_status_updates(&self, n: u32) {
        self.faults.lock().unwrap().status_updates_allowed = Some(n);
    }
}

impl TopicShareRepository for FlakyTopicShareRepository {
    async fn create(&self, input: CreateTopicShare) -> StreamgateResult<TopicShare> {
        self.inner.create(input).await
    }

    async fn get_by_id(&self, id: Uuid) -> StreamgateResult<TopicShare> {
        self.inner.get_by_id(id).await
    }

    async fn find_active(
        &self,
        topic_id: Uuid,
        requesting_workspace_id: Uuid,
    ) -> StreamgateResult<Option<TopicShare>> {
        self.inner.find_active(topic_id, requesting_workspace_id).await
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ShareStatus,
        decided_by: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> StreamgateResult<TopicShare> {
        {
            let mut faults = self.faults.lock().unwrap();
            if let Some(allowed) = faults.status_updates_allowed.as_mut() {
                if *allowed == 0 {
                    return Err(injected_write_failure());
                }
                *allowed -= 1;
            }
        }
        self.inner.set_status(id, status, decided_by, expires_at).await
    }

    async fn list_by_topic(&self, topic_id: Uuid) -> StreamgateResult<Vec<TopicShare>> {
        self.inner.list_by_topic(topic_id).await
    }

    async fn list_by_requesting_workspace(
        &self,
        workspace_id: Uuid,
    ) -> StreamgateResult<Vec<TopicShare>> {
        self.inner.list_by_requesting_workspace(workspace_id).await
    }
}
