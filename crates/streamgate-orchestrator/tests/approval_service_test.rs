//! Dual-tier approval workflow tests, including the quota-exhaustion
//! path that motivates the request in the first place.

mod common;

use streamgate_core::actor::{Actor, MemberStatus, WorkspaceRole};
use streamgate_core::error::StreamgateError;
use streamgate_core::models::request::{PlatformAction, RejectionTier, RequestStatus};
use streamgate_core::notify::{NotificationRecipient, NotificationTemplate};
use streamgate_core::repository::{Pagination, QuotaOverrideRepository, WorkspaceRepository};
use streamgate_db::repository::{
    SurrealApplicationRepository, SurrealApplicationRequestRepository, SurrealAuditLogRepository,
    SurrealQuotaOverrideRepository, SurrealVirtualClusterRepository, SurrealWorkspaceRepository,
};
use streamgate_orchestrator::OrchestratorConfig;
use streamgate_orchestrator::application::{ApplicationService, NewApplication};
use streamgate_orchestrator::approval::{ApprovalService, NewRequest};
use streamgate_orchestrator::quota::QuotaEvaluator;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use uuid::Uuid;

use common::{FakeNotificationSink, FakeWorkflowEngine, setup_db, setup_workspace};

type DbApprovalService = ApprovalService<
    SurrealApplicationRequestRepository<Db>,
    FakeNotificationSink,
    SurrealApplicationRepository<Db>,
    SurrealVirtualClusterRepository<Db>,
    SurrealWorkspaceRepository<Db>,
    SurrealQuotaOverrideRepository<Db>,
    SurrealAuditLogRepository<Db>,
    FakeWorkflowEngine,
>;

fn service(
    db: &Surreal<Db>,
    sink: FakeNotificationSink,
    engine: FakeWorkflowEngine,
    config: OrchestratorConfig,
) -> DbApprovalService {
    let app_repo = SurrealApplicationRepository::new(db.clone());
    let quota = QuotaEvaluator::new(
        app_repo.clone(),
        SurrealQuotaOverrideRepository::new(db.clone()),
        SurrealAuditLogRepository::new(db.clone()),
        config.default_application_quota,
    );
    let app_service = ApplicationService::new(
        app_repo,
        SurrealVirtualClusterRepository::new(db.clone()),
        SurrealWorkspaceRepository::new(db.clone()),
        SurrealAuditLogRepository::new(db.clone()),
        quota,
        engine,
        config,
    );
    ApprovalService::new(
        SurrealApplicationRequestRepository::new(db.clone()),
        SurrealWorkspaceRepository::new(db.clone()),
        sink,
        app_service,
    )
}

fn new_request(workspace_id: Uuid, slug: &str) -> NewRequest {
    NewRequest {
        workspace_id,
        name: slug.replace('-', " "),
        slug: slug.into(),
        description: None,
    }
}

#[tokio::test]
async fn submit_notifies_workspace_admins() {
    let db = setup_db().await;
    let (ws, admin) = setup_workspace(&db, "payments").await;
    let sink = FakeNotificationSink::default();
    let svc = service(&db, sink.clone(), FakeWorkflowEngine::default(), OrchestratorConfig::default());
    let actor = Actor::user(admin);

    let request = svc.submit(&actor, new_request(ws.id, "sixth-app")).await.unwrap();
    assert_eq!(request.status, RequestStatus::PendingWorkspace);
    assert_eq!(request.requested_by, admin);

    let sent = sink.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].template, NotificationTemplate::ApprovalNeeded);
    assert_eq!(
        sent[0].recipient,
        NotificationRecipient::WorkspaceAdmins(ws.id)
    );
}

#[tokio::test]
async fn full_approval_creates_application_under_the_trusted_principal() {
    let db = setup_db().await;
    let (ws, admin) = setup_workspace(&db, "growth").await;
    let sink = FakeNotificationSink::default();
    let engine = FakeWorkflowEngine::default();
    let svc = service(&db, sink.clone(), engine.clone(), OrchestratorConfig::default());

    // A plain member submits; the workspace admin and a platform admin
    // carry the two tiers.
    let member = Uuid::new_v4();
    let ws_repo = SurrealWorkspaceRepository::new(db.clone());
    ws_repo
        .add_member(ws.id, member, WorkspaceRole::Member, MemberStatus::Active)
        .await
        .unwrap();
    let requester = Actor::user(member);
    let ws_admin = Actor::user(admin);
    let platform_admin = Actor::platform_admin(Uuid::new_v4());

    let request = svc
        .submit(&requester, new_request(ws.id, "reporting"))
        .await
        .unwrap();

    let escalated = svc
        .approve_workspace_tier(&ws_admin, request.id)
        .await
        .unwrap();
    assert_eq!(escalated.status, RequestStatus::PendingPlatform);
    assert_eq!(escalated.workspace_actor, Some(admin));

    let approved = svc
        .approve_platform_tier(&platform_admin, request.id, PlatformAction::ApprovedSingle)
        .await
        .unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.platform_action, Some(PlatformAction::ApprovedSingle));

    // The application exists, attributed to the requester, and the
    // provisioning workflow was triggered.
    let requests = svc
        .list(&ws_admin, ws.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(requests.items.len(), 1);
    assert_eq!(engine.started().len(), 1);
    assert_eq!(engine.started()[0].workflow_type, "virtual-cluster-provision");

    // Workspace admins, platform admins, then the requester.
    let sent = sink.sent();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[2].template, NotificationTemplate::RequestApproved);
    assert_eq!(sent[2].recipient, NotificationRecipient::User(member));
}

#[tokio::test]
async fn quota_exhaustion_resolved_by_increased_quota_approval() {
    let db = setup_db().await;
    let (ws, admin) = setup_workspace(&db, "busy-team").await;
    let config = OrchestratorConfig {
        default_application_quota: 2,
        ..OrchestratorConfig::default()
    };
    let sink = FakeNotificationSink::default();
    let engine = FakeWorkflowEngine::default();
    let svc = service(&db, sink.clone(), engine.clone(), config.clone());
    let actor = Actor::user(admin);
    let platform_admin = Actor::platform_admin(Uuid::new_v4());

    // Fill the quota directly.
    let app_repo = SurrealApplicationRepository::new(db.clone());
    let quota = QuotaEvaluator::new(
        app_repo.clone(),
        SurrealQuotaOverrideRepository::new(db.clone()),
        SurrealAuditLogRepository::new(db.clone()),
        config.default_application_quota,
    );
    let direct = ApplicationService::new(
        app_repo,
        SurrealVirtualClusterRepository::new(db.clone()),
        SurrealWorkspaceRepository::new(db.clone()),
        SurrealAuditLogRepository::new(db.clone()),
        quota,
        engine.clone(),
        config,
    );
    for slug in ["one", "two"] {
        direct
            .create(
                &actor,
                NewApplication {
                    workspace_id: ws.id,
                    name: slug.into(),
                    slug: slug.into(),
                    description: None,
                    on_behalf_of: None,
                },
            )
            .await
            .unwrap();
    }
    let err = direct
        .create(
            &actor,
            NewApplication {
                workspace_id: ws.id,
                name: "three".into(),
                slug: "three".into(),
                description: None,
                on_behalf_of: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StreamgateError::QuotaExceeded { .. }));

    // The request path grants one more slot and creates the app.
    let request = svc.submit(&actor, new_request(ws.id, "three")).await.unwrap();
    svc.approve_workspace_tier(&actor, request.id).await.unwrap();
    let approved = svc
        .approve_platform_tier(&platform_admin, request.id, PlatformAction::IncreasedQuota)
        .await
        .unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);

    let override_row = SurrealQuotaOverrideRepository::new(db.clone())
        .get(ws.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(override_row.application_quota, 3);

    // All three applications now exist.
    let apps = direct
        .list(&actor, ws.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(apps.total, 3);
    assert!(apps.items.iter().any(|a| a.slug == "three"));
}

#[tokio::test]
async fn rejections_are_attributed_to_their_tier() {
    let db = setup_db().await;
    let (ws, admin) = setup_workspace(&db, "reject-team").await;
    let sink = FakeNotificationSink::default();
    let svc = service(&db, sink.clone(), FakeWorkflowEngine::default(), OrchestratorConfig::default());
    let actor = Actor::user(admin);
    let platform_admin = Actor::platform_admin(Uuid::new_v4());

    // Workspace-tier rejection.
    let first = svc.submit(&actor, new_request(ws.id, "first")).await.unwrap();
    let rejected = svc
        .reject(&actor, first.id, Some("not needed".into()))
        .await
        .unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.rejected_tier, Some(RejectionTier::Workspace));
    assert_eq!(rejected.rejection_reason.as_deref(), Some("not needed"));

    // Platform-tier rejection.
    let second = svc.submit(&actor, new_request(ws.id, "second")).await.unwrap();
    svc.approve_workspace_tier(&actor, second.id).await.unwrap();
    let rejected = svc.reject(&platform_admin, second.id, None).await.unwrap();
    assert_eq!(rejected.rejected_tier, Some(RejectionTier::Platform));
    assert_eq!(rejected.platform_actor, platform_admin.user_id());

    // A rejected request cannot be approved.
    let err = svc
        .approve_platform_tier(&platform_admin, second.id, PlatformAction::ApprovedSingle)
        .await
        .unwrap_err();
    assert!(matches!(err, StreamgateError::Validation { .. }));
}

#[tokio::test]
async fn plain_members_cannot_approve() {
    let db = setup_db().await;
    let (ws, _) = setup_workspace(&db, "strict-team").await;
    let svc = service(
        &db,
        FakeNotificationSink::default(),
        FakeWorkflowEngine::default(),
        OrchestratorConfig::default(),
    );

    let member = Uuid::new_v4();
    SurrealWorkspaceRepository::new(db.clone())
        .add_member(ws.id, member, WorkspaceRole::Member, MemberStatus::Active)
        .await
        .unwrap();
    let requester = Actor::user(member);

    let request = svc.submit(&requester, new_request(ws.id, "app")).await.unwrap();

    let err = svc
        .approve_workspace_tier(&requester, request.id)
        .await
        .unwrap_err();
    assert!(matches!(err, StreamgateError::Unauthorized { .. }));

    // A workspace admin is not enough for the platform tier.
    let (other_ws, other_admin) = setup_workspace(&db, "other-team").await;
    let _ = other_ws;
    let err = svc
        .approve_platform_tier(
            &Actor::user(other_admin),
            request.id,
            PlatformAction::ApprovedSingle,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StreamgateError::Unauthorized { .. }));
}

#[tokio::test]
async fn only_the_requester_cancels_and_only_while_pending() {
    let db = setup_db().await;
    let (ws, admin) = setup_workspace(&db, "cancel-team").await;
    let sink = FakeNotificationSink::default();
    let svc = service(&db, sink, FakeWorkflowEngine::default(), OrchestratorConfig::default());

    let member = Uuid::new_v4();
    SurrealWorkspaceRepository::new(db.clone())
        .add_member(ws.id, member, WorkspaceRole::Member, MemberStatus::Active)
        .await
        .unwrap();
    let requester = Actor::user(member);
    let ws_admin = Actor::user(admin);

    let request = svc.submit(&requester, new_request(ws.id, "mine")).await.unwrap();

    // Even an admin cannot cancel on the requester's behalf.
    let err = svc.cancel(&ws_admin, request.id).await.unwrap_err();
    assert!(matches!(err, StreamgateError::Unauthorized { .. }));

    svc.cancel(&requester, request.id).await.unwrap();
    let remaining = svc
        .list(&ws_admin, ws.id, Pagination::default())
        .await
        .unwrap();
    assert!(remaining.items.is_empty());

    // Approved requests can no longer be cancelled.
    let request = svc.submit(&requester, new_request(ws.id, "kept")).await.unwrap();
    svc.approve_workspace_tier(&ws_admin, request.id).await.unwrap();
    svc.approve_platform_tier(
        &Actor::platform_admin(Uuid::new_v4()),
        request.id,
        PlatformAction::ApprovedSingle,
    )
    .await
    .unwrap();
    let err = svc.cancel(&requester, request.id).await.unwrap_err();
    assert!(matches!(err, StreamgateError::Validation { .. }));
}

#[tokio::test]
async fn notification_failures_do_not_block_the_workflow() {
    let db = setup_db().await;
    let (ws, admin) = setup_workspace(&db, "quiet-team").await;
    let sink = FakeNotificationSink::default();
    sink.set_failing(true);
    let svc = service(&db, sink.clone(), FakeWorkflowEngine::default(), OrchestratorConfig::default());
    let actor = Actor::user(admin);

    let request = svc.submit(&actor, new_request(ws.id, "silent")).await.unwrap();
    assert_eq!(request.status, RequestStatus::PendingWorkspace);
    assert!(sink.sent().is_empty());
}
