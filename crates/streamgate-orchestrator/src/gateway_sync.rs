//! Gateway resync adapter for admin operations.
//!
//! The admin gateway keeps virtual-cluster configuration in memory
//! only, so every admin operation re-pushes the current configuration
//! first. A failed push is a `SyncFailure`; a failure of the admin
//! operation itself maps to the distinct `Gateway` variant.

use chrono::{DateTime, Utc};
use streamgate_core::error::{StreamgateError, StreamgateResult};
use streamgate_core::gateway::{
    AdminGateway, ConsumerGroupDetail, ConsumerGroupSummary, GatewayError, OffsetResetType,
    PartitionOffset, VirtualClusterGatewayConfig,
};
use streamgate_core::models::virtual_cluster::{VirtualCluster, VirtualClusterStatus};
use streamgate_core::repository::VirtualClusterRepository;
use tracing::debug;
use uuid::Uuid;

fn operation_error(operation: &str, e: GatewayError) -> StreamgateError {
    StreamgateError::Gateway {
        operation: operation.to_string(),
        detail: e.to_string(),
    }
}

pub struct GatewaySyncService<V, G>
where
    V: VirtualClusterRepository,
    G: AdminGateway,
{
    vc_repo: V,
    gateway: G,
}

impl<V, G> GatewaySyncService<V, G>
where
    V: VirtualClusterRepository,
    G: AdminGateway,
{
    pub fn new(vc_repo: V, gateway: G) -> Self {
        Self { vc_repo, gateway }
    }

    /// Push the cluster's current configuration to the gateway and
    /// return the cluster record.
    async fn ensure_synced(&self, virtual_cluster_id: Uuid) -> StreamgateResult<VirtualCluster> {
        let cluster = self.vc_repo.get_by_id(virtual_cluster_id).await?;

        let read_only = match cluster.status {
            VirtualClusterStatus::Active => false,
            VirtualClusterStatus::ReadOnly => true,
            other => {
                return Err(StreamgateError::ResourceNotReady {
                    resource: format!("virtual cluster {}", cluster.prefix),
                    state: format!("{other:?}"),
                });
            }
        };
        let bootstrap_servers = cluster.bootstrap_servers.clone().ok_or_else(|| {
            StreamgateError::ResourceNotReady {
                resource: format!("virtual cluster {}", cluster.prefix),
                state: "missing bootstrap servers".into(),
            }
        })?;

        self.gateway
            .upsert_virtual_cluster(VirtualClusterGatewayConfig {
                virtual_cluster_id: cluster.id,
                bootstrap_servers,
                prefix: cluster.prefix.clone(),
                read_only,
            })
            .await
            .map_err(|e| StreamgateError::SyncFailure {
                operation: "gateway-config-sync".into(),
                detail: e.to_string(),
            })?;

        debug!(virtual_cluster_id = %cluster.id, "gateway configuration synced");
        Ok(cluster)
    }

    pub async fn list_consumer_groups(
        &self,
        virtual_cluster_id: Uuid,
    ) -> StreamgateResult<Vec<ConsumerGroupSummary>> {
        let cluster = self.ensure_synced(virtual_cluster_id).await?;
        self.gateway
            .list_consumer_groups(cluster.id)
            .await
            .map_err(|e| operation_error("list-consumer-groups", e))
    }

    pub async fn describe_consumer_group(
        &self,
        virtual_cluster_id: Uuid,
        group_id: &str,
    ) -> StreamgateResult<ConsumerGroupDetail> {
        let cluster = self.ensure_synced(virtual_cluster_id).await?;
        self.gateway
            .describe_consumer_group(cluster.id, group_id)
            .await
            .map_err(|e| operation_error("describe-consumer-group", e))
    }

    /// Reset a consumer group's offsets for one topic. The gateway
    /// rejects groups with active members; the per-partition offsets
    /// after the reset are returned.
    pub async fn reset_consumer_group_offsets(
        &self,
        virtual_cluster_id: Uuid,
        group_id: &str,
        topic: &str,
        reset_type: OffsetResetType,
        timestamp: Option<DateTime<Utc>>,
    ) -> StreamgateResult<Vec<PartitionOffset>> {
        if reset_type == OffsetResetType::Timestamp && timestamp.is_none() {
            return Err(StreamgateError::Validation {
                message: "timestamp reset requires a timestamp".into(),
            });
        }

        let cluster = self.ensure_synced(virtual_cluster_id).await?;
        self.gateway
            .reset_consumer_group_offsets(cluster.id, group_id, topic, reset_type, timestamp)
            .await
            .map_err(|e| operation_error("reset-consumer-group-offsets", e))
    }
}
