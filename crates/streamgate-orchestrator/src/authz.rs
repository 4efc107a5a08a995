//! Authorization policy.
//!
//! Decisions are pure functions over the acting principal and an
//! already-fetched workspace membership, so every rule is testable
//! without a database. Platform administrators and trusted service
//! principals pass workspace-scoped checks; trusted principals leave
//! their trail in the audit log instead.

use streamgate_core::actor::{Actor, MemberStatus};
use streamgate_core::error::{StreamgateError, StreamgateResult};
use streamgate_core::models::workspace::WorkspaceMember;
use streamgate_core::repository::WorkspaceRepository;
use uuid::Uuid;

/// Fetch the actor's membership in a workspace, mapping "not a
/// member" to `None`. Trusted services and other non-user principals
/// have no membership.
pub async fn membership_of<W: WorkspaceRepository>(
    repo: &W,
    workspace_id: Uuid,
    actor: &Actor,
) -> StreamgateResult<Option<WorkspaceMember>> {
    let Some(user_id) = actor.user_id() else {
        return Ok(None);
    };
    match repo.get_member(workspace_id, user_id).await {
        Ok(m) => Ok(Some(m)),
        Err(StreamgateError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// The actor must be an active member of the workspace.
pub fn ensure_active_member(
    actor: &Actor,
    membership: Option<&WorkspaceMember>,
) -> StreamgateResult<()> {
    if actor.is_platform_admin() || actor.is_trusted_service() {
        return Ok(());
    }
    match membership {
        Some(m) if m.status == MemberStatus::Active => Ok(()),
        Some(_) => Err(StreamgateError::Unauthorized {
            reason: "membership is inactive".into(),
        }),
        None => Err(StreamgateError::Unauthorized {
            reason: "not a member of this workspace".into(),
        }),
    }
}

/// The actor must be an active owner or admin of the workspace.
pub fn ensure_workspace_admin(
    actor: &Actor,
    membership: Option<&WorkspaceMember>,
) -> StreamgateResult<()> {
    ensure_active_member(actor, membership)?;
    if actor.is_platform_admin() || actor.is_trusted_service() {
        return Ok(());
    }
    match membership {
        Some(m) if m.role.is_admin() => Ok(()),
        _ => Err(StreamgateError::Unauthorized {
            reason: "workspace owner or admin role required".into(),
        }),
    }
}

/// The actor must be a platform administrator.
pub fn ensure_platform_admin(actor: &Actor) -> StreamgateResult<()> {
    if actor.is_platform_admin() {
        Ok(())
    } else {
        Err(StreamgateError::Unauthorized {
            reason: "platform administrator required".into(),
        })
    }
}
