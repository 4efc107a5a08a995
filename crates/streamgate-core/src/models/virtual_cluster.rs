//! Virtual cluster domain model.
//!
//! A virtual cluster is a logically isolated namespace (topic and
//! consumer-group prefix) within a physical streaming cluster, scoped
//! to one application and one environment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Environment {
    Dev,
    Stage,
    Prod,
}

impl Environment {
    pub fn all() -> [Environment; 3] {
        [Environment::Dev, Environment::Stage, Environment::Prod]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Stage => "stage",
            Environment::Prod => "prod",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VirtualClusterStatus {
    Provisioning,
    Active,
    ReadOnly,
    Deleting,
    Deleted,
}

/// One per (application, environment). Only `Active` clusters accept
/// new topics or service accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualCluster {
    pub id: Uuid,
    pub application_id: Uuid,
    /// Denormalized from the application for access checks without a
    /// second lookup.
    pub workspace_id: Uuid,
    pub environment: Environment,
    /// Namespace prefix on the physical cluster, derived from
    /// workspace slug, application slug, and environment.
    pub prefix: String,
    /// Set once provisioning reports the cluster's coordinates.
    pub bootstrap_servers: Option<String>,
    pub status: VirtualClusterStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVirtualCluster {
    pub application_id: Uuid,
    pub workspace_id: Uuid,
    pub environment: Environment,
    pub prefix: String,
}
