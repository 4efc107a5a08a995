//! Topic sharing tests: catalog discovery, auto-approval, fail-closed
//! grants and fail-open revocations.

mod common;

use streamgate_core::actor::Actor;
use streamgate_core::error::StreamgateError;
use streamgate_core::models::topic::{
    AccessLevel, AutoApprovePolicy, CreateTopic, ShareStatus, Topic, TopicVisibility,
};
use streamgate_core::repository::{Pagination, TopicRepository, TopicShareRepository};
use streamgate_db::repository::{
    SurrealTopicRepository, SurrealTopicShareRepository, SurrealWorkspaceRepository,
};
use streamgate_orchestrator::OrchestratorConfig;
use streamgate_orchestrator::sharing::{NewShareRequest, SharingService};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use uuid::Uuid;

use common::{FakeWorkflowEngine, FlakyTopicShareRepository, setup_db, setup_workspace};

type DbSharingService = SharingService<
    SurrealTopicRepository<Db>,
    SurrealTopicShareRepository<Db>,
    SurrealWorkspaceRepository<Db>,
    FakeWorkflowEngine,
>;

fn service(db: &Surreal<Db>, engine: FakeWorkflowEngine) -> DbSharingService {
    SharingService::new(
        SurrealTopicRepository::new(db.clone()),
        SurrealTopicShareRepository::new(db.clone()),
        SurrealWorkspaceRepository::new(db.clone()),
        engine,
        OrchestratorConfig::default(),
    )
}

async fn create_topic(
    db: &Surreal<Db>,
    workspace_id: Uuid,
    name: &str,
    visibility: TopicVisibility,
    auto_approve: Option<AutoApprovePolicy>,
) -> Topic {
    SurrealTopicRepository::new(db.clone())
        .create(CreateTopic {
            virtual_cluster_id: Uuid::new_v4(),
            workspace_id,
            name: name.into(),
            visibility,
            partitions: 6,
            retention_ms: None,
            auto_approve,
        })
        .await
        .unwrap()
}

fn share_request(topic: &Topic, requesting_workspace_id: Uuid) -> NewShareRequest {
    NewShareRequest {
        topic_id: topic.id,
        requesting_workspace_id,
        access_level: AccessLevel::Read,
        reason: "downstream analytics".into(),
    }
}

#[tokio::test]
async fn catalog_lists_only_shareable_topics() {
    let db = setup_db().await;
    let (ws, _) = setup_workspace(&db, "owners").await;
    create_topic(&db, ws.id, "orders.events", TopicVisibility::Discoverable, None).await;
    create_topic(&db, ws.id, "orders.audit", TopicVisibility::Private, None).await;
    create_topic(&db, ws.id, "prices.feed", TopicVisibility::Public, None).await;

    let svc = service(&db, FakeWorkflowEngine::default());

    let all = svc.search_catalog(None, Pagination::default()).await.unwrap();
    assert_eq!(all.total, 2);

    let filtered = svc
        .search_catalog(Some("orders"), Pagination::default())
        .await
        .unwrap();
    assert_eq!(filtered.items.len(), 1);
    assert_eq!(filtered.items[0].name, "orders.events");
}

#[tokio::test]
async fn share_requests_are_validated() {
    let db = setup_db().await;
    let (owners, _) = setup_workspace(&db, "owners").await;
    let (consumers, member) = setup_workspace(&db, "consumers").await;
    let svc = service(&db, FakeWorkflowEngine::default());
    let actor = Actor::user(member);

    // Private topics cannot be requested.
    let private = create_topic(&db, owners.id, "internal", TopicVisibility::Private, None).await;
    let err = svc
        .request_share(&actor, share_request(&private, consumers.id))
        .await
        .unwrap_err();
    assert!(matches!(err, StreamgateError::Validation { .. }));

    // The owning workspace cannot request its own topic.
    let topic = create_topic(&db, owners.id, "events", TopicVisibility::Discoverable, None).await;
    let err = svc
        .request_share(&actor, share_request(&topic, owners.id))
        .await
        .unwrap_err();
    assert!(matches!(err, StreamgateError::Validation { .. }));

    // Duplicate active requests are rejected.
    svc.request_share(&actor, share_request(&topic, consumers.id))
        .await
        .unwrap();
    let err = svc
        .request_share(&actor, share_request(&topic, consumers.id))
        .await
        .unwrap_err();
    assert!(matches!(err, StreamgateError::Validation { .. }));
}

#[tokio::test]
async fn approval_triggers_acl_sync() {
    let db = setup_db().await;
    let (owners, owner_admin) = setup_workspace(&db, "owners").await;
    let (consumers, member) = setup_workspace(&db, "consumers").await;
    let engine = FakeWorkflowEngine::default();
    let svc = service(&db, engine.clone());

    let topic = create_topic(&db, owners.id, "events", TopicVisibility::Discoverable, None).await;
    let share = svc
        .request_share(&Actor::user(member), share_request(&topic, consumers.id))
        .await
        .unwrap();
    assert_eq!(share.status, ShareStatus::Pending);
    assert!(engine.started().is_empty());

    let approved = svc
        .approve(&Actor::user(owner_admin), share.id, None)
        .await
        .unwrap();
    assert_eq!(approved.status, ShareStatus::Approved);
    assert_eq!(approved.decided_by.as_deref(), Some(owner_admin.to_string().as_str()));

    let started = engine.started();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].workflow_type, "topic-share-acl-sync");
    assert_eq!(
        started[0].workflow_id,
        format!("topic-share-acl-sync-{}", share.id)
    );
}

#[tokio::test]
async fn failed_acl_sync_reverts_the_grant() {
    let db = setup_db().await;
    let (owners, owner_admin) = setup_workspace(&db, "owners").await;
    let (consumers, member) = setup_workspace(&db, "consumers").await;
    let engine = FakeWorkflowEngine::default();
    let svc = service(&db, engine.clone());

    let topic = create_topic(&db, owners.id, "events", TopicVisibility::Discoverable, None).await;
    let share = svc
        .request_share(&Actor::user(member), share_request(&topic, consumers.id))
        .await
        .unwrap();

    engine.set_failing(true);
    let err = svc
        .approve(&Actor::user(owner_admin), share.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StreamgateError::SyncFailure { .. }));

    // The share is pending again and can be approved once the sync
    // path recovers.
    let shares = svc
        .list_for_topic(&Actor::user(owner_admin), topic.id)
        .await
        .unwrap();
    assert_eq!(shares.len(), 1);
    assert_eq!(shares[0].status, ShareStatus::Pending);
    assert!(shares[0].decided_by.is_none());

    engine.set_failing(false);
    let approved = svc
        .approve(&Actor::user(owner_admin), share.id, None)
        .await
        .unwrap();
    assert_eq!(approved.status, ShareStatus::Approved);
}

#[tokio::test]
async fn failed_grant_revert_is_a_critical_inconsistency() {
    let db = setup_db().await;
    let (owners, owner_admin) = setup_workspace(&db, "owners").await;
    let (consumers, member) = setup_workspace(&db, "consumers").await;
    let engine = FakeWorkflowEngine::default();
    let share_repo = FlakyTopicShareRepository::new(db.clone());
    let svc = SharingService::new(
        SurrealTopicRepository::new(db.clone()),
        share_repo.clone(),
        SurrealWorkspaceRepository::new(db.clone()),
        engine.clone(),
        OrchestratorConfig::default(),
    );

    let topic = create_topic(&db, owners.id, "events", TopicVisibility::Discoverable, None).await;
    let share = svc
        .request_share(&Actor::user(member), share_request(&topic, consumers.id))
        .await
        .unwrap();

    // The approval write lands, the ACL sync fails, and the revert
    // write fails too.
    engine.set_failing(true);
    share_repo.allow_status_updates(1);
    let err = svc
        .approve(&Actor::user(owner_admin), share.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StreamgateError::CriticalInconsistency { .. }));

    // The share is stuck approved locally while the data plane never
    // heard about the grant.
    let stuck = SurrealTopicShareRepository::new(db.clone())
        .get_by_id(share.id)
        .await
        .unwrap();
    assert_eq!(stuck.status, ShareStatus::Approved);
}

#[tokio::test]
async fn matching_auto_approve_policy_skips_the_pending_step() {
    let db = setup_db().await;
    let (owners, _) = setup_workspace(&db, "owners").await;
    let (consumers, member) = setup_workspace(&db, "consumers").await;
    let engine = FakeWorkflowEngine::default();
    let svc = service(&db, engine.clone());

    let policy = AutoApprovePolicy {
        access_levels: vec![AccessLevel::Read],
        requesting_workspaces: None,
    };
    let topic = create_topic(
        &db,
        owners.id,
        "prices.feed",
        TopicVisibility::Public,
        Some(policy),
    )
    .await;

    let share = svc
        .request_share(&Actor::user(member), share_request(&topic, consumers.id))
        .await
        .unwrap();
    assert_eq!(share.status, ShareStatus::Approved);
    assert_eq!(share.decided_by.as_deref(), Some("auto-approve"));
    assert_eq!(engine.started().len(), 1);

    // Write access is outside the policy and stays pending.
    let (other, other_member) = setup_workspace(&db, "writers").await;
    let pending = svc
        .request_share(
            &Actor::user(other_member),
            NewShareRequest {
                topic_id: topic.id,
                requesting_workspace_id: other.id,
                access_level: AccessLevel::Write,
                reason: "publishing".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(pending.status, ShareStatus::Pending);
    assert_eq!(engine.started().len(), 1);
}

#[tokio::test]
async fn auto_approve_sync_failure_leaves_the_share_pending() {
    let db = setup_db().await;
    let (owners, _) = setup_workspace(&db, "owners").await;
    let (consumers, member) = setup_workspace(&db, "consumers").await;
    let engine = FakeWorkflowEngine::default();
    let svc = service(&db, engine.clone());

    let policy = AutoApprovePolicy {
        access_levels: vec![AccessLevel::Read],
        requesting_workspaces: None,
    };
    let topic = create_topic(
        &db,
        owners.id,
        "prices.feed",
        TopicVisibility::Public,
        Some(policy),
    )
    .await;

    engine.set_failing(true);
    let share = svc
        .request_share(&Actor::user(member), share_request(&topic, consumers.id))
        .await
        .unwrap();
    assert_eq!(share.status, ShareStatus::Pending);
    assert!(share.decided_by.is_none());
}

#[tokio::test]
async fn revocation_fails_open() {
    let db = setup_db().await;
    let (owners, owner_admin) = setup_workspace(&db, "owners").await;
    let (consumers, member) = setup_workspace(&db, "consumers").await;
    let engine = FakeWorkflowEngine::default();
    let svc = service(&db, engine.clone());
    let owner = Actor::user(owner_admin);

    let topic = create_topic(&db, owners.id, "events", TopicVisibility::Discoverable, None).await;
    let share = svc
        .request_share(&Actor::user(member), share_request(&topic, consumers.id))
        .await
        .unwrap();
    svc.approve(&owner, share.id, None).await.unwrap();

    // The ACL-removal trigger fails, the revocation still lands.
    engine.set_failing(true);
    let revoked = svc.revoke(&owner, share.id).await.unwrap();
    assert_eq!(revoked.status, ShareStatus::Revoked);

    // Only approved shares can be revoked.
    let err = svc.revoke(&owner, share.id).await.unwrap_err();
    assert!(matches!(err, StreamgateError::Validation { .. }));
}

#[tokio::test]
async fn only_owning_workspace_admins_decide() {
    let db = setup_db().await;
    let (owners, _) = setup_workspace(&db, "owners").await;
    let (consumers, member) = setup_workspace(&db, "consumers").await;
    let svc = service(&db, FakeWorkflowEngine::default());
    let requester = Actor::user(member);

    let topic = create_topic(&db, owners.id, "events", TopicVisibility::Discoverable, None).await;
    let share = svc
        .request_share(&requester, share_request(&topic, consumers.id))
        .await
        .unwrap();

    // The requesting workspace's admin has no say on the owning side.
    let err = svc.approve(&requester, share.id, None).await.unwrap_err();
    assert!(matches!(err, StreamgateError::Unauthorized { .. }));

    // Requesting-side members can still see their own shares.
    let listed = svc
        .list_for_requesting_workspace(&requester, consumers.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, ShareStatus::Pending);
}
