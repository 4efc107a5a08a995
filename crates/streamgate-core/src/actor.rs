//! Principals acting against the control plane.
//!
//! Every operation is attributed to an [`Actor`]: either a human user
//! (optionally a platform administrator) or a named trusted service
//! principal. Trusted services carry their own audit trail instead of
//! a bypass flag threaded through call sites.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The principal performing an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Actor {
    User {
        id: Uuid,
        /// Platform administrators may act on any workspace and on
        /// platform-tier approvals.
        platform_admin: bool,
    },
    /// A trusted internal service (e.g. the approval workflow acting
    /// on a finalized request). Identified by a stable name for audit
    /// attribution.
    TrustedService { name: String },
}

impl Actor {
    pub fn user(id: Uuid) -> Self {
        Actor::User {
            id,
            platform_admin: false,
        }
    }

    pub fn platform_admin(id: Uuid) -> Self {
        Actor::User {
            id,
            platform_admin: true,
        }
    }

    pub fn trusted(name: impl Into<String>) -> Self {
        Actor::TrustedService { name: name.into() }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Actor::User { id, .. } => Some(*id),
            Actor::TrustedService { .. } => None,
        }
    }

    pub fn is_platform_admin(&self) -> bool {
        matches!(
            self,
            Actor::User {
                platform_admin: true,
                ..
            }
        )
    }

    pub fn is_trusted_service(&self) -> bool {
        matches!(self, Actor::TrustedService { .. })
    }

    /// Stable identifier for audit log attribution.
    pub fn audit_id(&self) -> String {
        match self {
            Actor::User { id, .. } => id.to_string(),
            Actor::TrustedService { name } => format!("service:{name}"),
        }
    }
}

/// Role of a member within a workspace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WorkspaceRole {
    Owner,
    Admin,
    Member,
}

impl WorkspaceRole {
    /// Owners and admins may manage applications, credentials,
    /// approvals, and shares for their workspace.
    pub fn is_admin(&self) -> bool {
        matches!(self, WorkspaceRole::Owner | WorkspaceRole::Admin)
    }
}

/// Status of a workspace membership.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MemberStatus {
    Active,
    Inactive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trusted_service_audit_id_is_prefixed() {
        let actor = Actor::trusted("approval-workflow");
        assert_eq!(actor.audit_id(), "service:approval-workflow");
        assert!(actor.is_trusted_service());
        assert!(actor.user_id().is_none());
    }

    #[test]
    fn platform_admin_flag() {
        let id = Uuid::new_v4();
        assert!(Actor::platform_admin(id).is_platform_admin());
        assert!(!Actor::user(id).is_platform_admin());
    }

    #[test]
    fn admin_roles() {
        assert!(WorkspaceRole::Owner.is_admin());
        assert!(WorkspaceRole::Admin.is_admin());
        assert!(!WorkspaceRole::Member.is_admin());
    }
}
