//! Admin gateway RPC contract.
//!
//! The administrative gateway holds virtual-cluster configuration in
//! memory only, so the configuration must be re-pushed (keyed by
//! virtual-cluster ID) before any admin operation that depends on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Configuration pushed to the gateway ahead of admin operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualClusterGatewayConfig {
    pub virtual_cluster_id: Uuid,
    pub bootstrap_servers: String,
    /// Namespace prefix applied to topics and consumer groups.
    pub prefix: String,
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerGroupSummary {
    pub group_id: String,
    pub state: String,
    pub members: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionOffset {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub lag: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerGroupDetail {
    pub summary: ConsumerGroupSummary,
    pub offsets: Vec<PartitionOffset>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OffsetResetType {
    Earliest,
    Latest,
    Timestamp,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    #[error("gateway rejected the request: {0}")]
    Rejected(String),

    #[error("consumer group not found: {0}")]
    GroupNotFound(String),

    /// Offset resets require the group to have no active members.
    #[error("consumer group has {members} active member(s)")]
    GroupNotEmpty { members: u32 },
}

pub trait AdminGateway: Send + Sync {
    /// Idempotent "ensure synced" push of the cluster configuration.
    fn upsert_virtual_cluster(
        &self,
        config: VirtualClusterGatewayConfig,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn list_consumer_groups(
        &self,
        virtual_cluster_id: Uuid,
    ) -> impl Future<Output = Result<Vec<ConsumerGroupSummary>, GatewayError>> + Send;

    fn describe_consumer_group(
        &self,
        virtual_cluster_id: Uuid,
        group_id: &str,
    ) -> impl Future<Output = Result<ConsumerGroupDetail, GatewayError>> + Send;

    /// Returns the per-partition offsets after the reset.
    fn reset_consumer_group_offsets(
        &self,
        virtual_cluster_id: Uuid,
        group_id: &str,
        topic: &str,
        reset_type: OffsetResetType,
        timestamp: Option<DateTime<Utc>>,
    ) -> impl Future<Output = Result<Vec<PartitionOffset>, GatewayError>> + Send;
}
