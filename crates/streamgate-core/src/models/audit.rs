//! Audit log domain model (append-only).
//!
//! Privileged operations — quota override changes, trusted-principal
//! creations, approval decisions — leave an attribution trail here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActorKind {
    User,
    TrustedService,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    /// `Actor::audit_id()` of the principal.
    pub actor: String,
    pub actor_kind: ActorKind,
    pub action: String,
    pub resource: Option<String>,
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditLogEntry {
    pub actor: String,
    pub actor_kind: ActorKind,
    pub action: String,
    pub resource: Option<String>,
    pub metadata: serde_json::Value,
}
