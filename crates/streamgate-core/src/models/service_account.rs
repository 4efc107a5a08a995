//! Service account domain model.
//!
//! A service account is a credential (username + password) scoped to
//! one virtual cluster, used by client applications to produce and
//! consume. Only its own manager mutates these records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ServiceAccountStatus {
    Active,
    Revoked,
}

/// Named permission bundle applied at the gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PermissionTemplate {
    Produce,
    Consume,
    ProduceConsume,
    /// Permissions are taken verbatim from `custom_permissions`.
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccount {
    pub id: Uuid,
    pub virtual_cluster_id: Uuid,
    /// Denormalized from the virtual cluster for access checks.
    pub workspace_id: Uuid,
    pub name: String,
    /// Derived deterministically from the cluster prefix and name;
    /// globally unique.
    pub username: String,
    /// Argon2id hash. The plaintext is returned to the caller exactly
    /// once, on successful creation or rotation, and never stored.
    pub password_hash: String,
    pub permission_template: PermissionTemplate,
    pub custom_permissions: Vec<String>,
    pub status: ServiceAccountStatus,
    pub last_rotated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repository-level creation record; username and hash are already
/// derived by the credential manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceAccount {
    pub virtual_cluster_id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub permission_template: PermissionTemplate,
    pub custom_permissions: Vec<String>,
}

/// Read-only projection that never exposes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountView {
    pub id: Uuid,
    pub virtual_cluster_id: Uuid,
    pub name: String,
    pub username: String,
    pub permission_template: PermissionTemplate,
    pub custom_permissions: Vec<String>,
    pub status: ServiceAccountStatus,
    pub last_rotated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<ServiceAccount> for ServiceAccountView {
    fn from(sa: ServiceAccount) -> Self {
        Self {
            id: sa.id,
            virtual_cluster_id: sa.virtual_cluster_id,
            name: sa.name,
            username: sa.username,
            permission_template: sa.permission_template,
            custom_permissions: sa.custom_permissions,
            status: sa.status,
            last_rotated_at: sa.last_rotated_at,
            created_at: sa.created_at,
        }
    }
}
