//! Gateway resync tests: configuration is re-pushed before every admin
//! operation because the gateway holds it in memory only.

mod common;

use chrono::Utc;
use streamgate_core::error::StreamgateError;
use streamgate_core::gateway::OffsetResetType;
use streamgate_core::models::virtual_cluster::{
    CreateVirtualCluster, Environment, VirtualCluster, VirtualClusterStatus,
};
use streamgate_core::repository::VirtualClusterRepository;
use streamgate_db::repository::SurrealVirtualClusterRepository;
use streamgate_orchestrator::gateway_sync::GatewaySyncService;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use uuid::Uuid;

use common::{FakeAdminGateway, setup_db};

type DbGatewaySyncService = GatewaySyncService<SurrealVirtualClusterRepository<Db>, FakeAdminGateway>;

fn service(db: &Surreal<Db>, gateway: FakeAdminGateway) -> DbGatewaySyncService {
    GatewaySyncService::new(SurrealVirtualClusterRepository::new(db.clone()), gateway)
}

async fn create_cluster(db: &Surreal<Db>, prefix: &str) -> VirtualCluster {
    SurrealVirtualClusterRepository::new(db.clone())
        .create(CreateVirtualCluster {
            application_id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            environment: Environment::Dev,
            prefix: prefix.into(),
        })
        .await
        .unwrap()
}

async fn create_active_cluster(db: &Surreal<Db>, prefix: &str) -> VirtualCluster {
    let repo = SurrealVirtualClusterRepository::new(db.clone());
    let vc = create_cluster(db, prefix).await;
    repo.mark_active(vc.id, "kafka-dev:9092").await.unwrap();
    repo.get_by_id(vc.id).await.unwrap()
}

#[tokio::test]
async fn configuration_is_pushed_before_every_operation() {
    let db = setup_db().await;
    let vc = create_active_cluster(&db, "team-app-dev").await;
    let gateway = FakeAdminGateway::default();
    gateway.add_group("team-app-dev.consumers", 2);
    let svc = service(&db, gateway.clone());

    let groups = svc.list_consumer_groups(vc.id).await.unwrap();
    assert_eq!(groups.len(), 1);

    svc.describe_consumer_group(vc.id, "team-app-dev.consumers")
        .await
        .unwrap();

    let pushed = gateway.pushed_configs();
    assert_eq!(pushed.len(), 2);
    for config in &pushed {
        assert_eq!(config.virtual_cluster_id, vc.id);
        assert_eq!(config.prefix, "team-app-dev");
        assert_eq!(config.bootstrap_servers, "kafka-dev:9092");
        assert!(!config.read_only);
    }
}

#[tokio::test]
async fn read_only_clusters_sync_with_the_read_only_flag() {
    let db = setup_db().await;
    let repo = SurrealVirtualClusterRepository::new(db.clone());
    let vc = create_active_cluster(&db, "frozen-app-dev").await;
    repo.set_status(vc.id, VirtualClusterStatus::ReadOnly)
        .await
        .unwrap();

    let gateway = FakeAdminGateway::default();
    let svc = service(&db, gateway.clone());

    svc.list_consumer_groups(vc.id).await.unwrap();

    let pushed = gateway.pushed_configs();
    assert_eq!(pushed.len(), 1);
    assert!(pushed[0].read_only);
}

#[tokio::test]
async fn unprovisioned_clusters_are_not_synced() {
    let db = setup_db().await;
    let vc = create_cluster(&db, "early-app-dev").await;
    let gateway = FakeAdminGateway::default();
    let svc = service(&db, gateway.clone());

    let err = svc.list_consumer_groups(vc.id).await.unwrap_err();
    assert!(matches!(err, StreamgateError::ResourceNotReady { .. }));
    assert!(gateway.pushed_configs().is_empty());
}

#[tokio::test]
async fn sync_failures_and_operation_failures_are_distinct() {
    let db = setup_db().await;
    let vc = create_active_cluster(&db, "team-app-dev").await;
    let gateway = FakeAdminGateway::default();
    let svc = service(&db, gateway.clone());

    gateway.set_sync_failing(true);
    let err = svc.list_consumer_groups(vc.id).await.unwrap_err();
    match err {
        StreamgateError::SyncFailure { operation, .. } => {
            assert_eq!(operation, "gateway-config-sync");
        }
        other => panic!("expected SyncFailure, got {other:?}"),
    }

    gateway.set_sync_failing(false);
    gateway.set_ops_failing(true);
    let err = svc.list_consumer_groups(vc.id).await.unwrap_err();
    match err {
        StreamgateError::Gateway { operation, .. } => {
            assert_eq!(operation, "list-consumer-groups");
        }
        other => panic!("expected Gateway, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_groups_surface_through_the_gateway_variant() {
    let db = setup_db().await;
    let vc = create_active_cluster(&db, "team-app-dev").await;
    let svc = service(&db, FakeAdminGateway::default());

    let err = svc
        .describe_consumer_group(vc.id, "ghost-group")
        .await
        .unwrap_err();
    match err {
        StreamgateError::Gateway { operation, detail } => {
            assert_eq!(operation, "describe-consumer-group");
            assert!(detail.contains("ghost-group"));
        }
        other => panic!("expected Gateway, got {other:?}"),
    }
}

#[tokio::test]
async fn offset_reset_requires_an_empty_group() {
    let db = setup_db().await;
    let vc = create_active_cluster(&db, "team-app-dev").await;
    let gateway = FakeAdminGateway::default();
    gateway.add_group("busy-group", 3);
    gateway.add_group("idle-group", 0);
    let svc = service(&db, gateway.clone());

    let err = svc
        .reset_consumer_group_offsets(
            vc.id,
            "busy-group",
            "team-app-dev.orders",
            OffsetResetType::Earliest,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StreamgateError::Gateway { .. }));

    let offsets = svc
        .reset_consumer_group_offsets(
            vc.id,
            "idle-group",
            "team-app-dev.orders",
            OffsetResetType::Earliest,
            None,
        )
        .await
        .unwrap();
    assert_eq!(offsets.len(), 1);
    assert_eq!(offsets[0].topic, "team-app-dev.orders");
}

#[tokio::test]
async fn timestamp_reset_requires_a_timestamp() {
    let db = setup_db().await;
    let vc = create_active_cluster(&db, "team-app-dev").await;
    let gateway = FakeAdminGateway::default();
    gateway.add_group("idle-group", 0);
    let svc = service(&db, gateway.clone());

    let err = svc
        .reset_consumer_group_offsets(
            vc.id,
            "idle-group",
            "team-app-dev.orders",
            OffsetResetType::Timestamp,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StreamgateError::Validation { .. }));
    // Validation happens before any gateway traffic.
    assert!(gateway.pushed_configs().is_empty());

    svc.reset_consumer_group_offsets(
        vc.id,
        "idle-group",
        "team-app-dev.orders",
        OffsetResetType::Timestamp,
        Some(Utc::now()),
    )
    .await
    .unwrap();
}
