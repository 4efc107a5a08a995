//! SurrealDB repository implementations.

mod application;
mod audit;
mod quota;
mod request;
mod service_account;
mod support;
mod topic;
mod topic_share;
mod virtual_cluster;
mod workspace;

pub use application::SurrealApplicationRepository;
pub use audit::SurrealAuditLogRepository;
pub use quota::SurrealQuotaOverrideRepository;
pub use request::SurrealApplicationRequestRepository;
pub use service_account::SurrealServiceAccountRepository;
pub use topic::SurrealTopicRepository;
pub use topic_share::SurrealTopicShareRepository;
pub use virtual_cluster::SurrealVirtualClusterRepository;
pub use workspace::SurrealWorkspaceRepository;
