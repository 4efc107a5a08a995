//! SurrealDB implementation of [`WorkspaceRepository`].

use chrono::{DateTime, Utc};
use streamgate_core::actor::{MemberStatus, WorkspaceRole};
use streamgate_core::error::StreamgateResult;
use streamgate_core::models::workspace::{CreateWorkspace, Workspace, WorkspaceMember};
use streamgate_core::repository::{PaginatedResult, Pagination, WorkspaceRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{CountRow, parse_uuid};
use crate::error::DbError;

fn parse_role(s: &str) -> Result<WorkspaceRole, DbError> {
    match s {
        "Owner" => Ok(WorkspaceRole::Owner),
        "Admin" => Ok(WorkspaceRole::Admin),
        "Member" => Ok(WorkspaceRole::Member),
        other => Err(DbError::Decode(format!("unknown role: {other}"))),
    }
}

fn role_to_str(role: WorkspaceRole) -> &'static str {
    match role {
        WorkspaceRole::Owner => "Owner",
        WorkspaceRole::Admin => "Admin",
        WorkspaceRole::Member => "Member",
    }
}

fn parse_member_status(s: &str) -> Result<MemberStatus, DbError> {
    match s {
        "Active" => Ok(MemberStatus::Active),
        "Inactive" => Ok(MemberStatus::Inactive),
        other => Err(DbError::Decode(format!("unknown member status: {other}"))),
    }
}

fn member_status_to_str(status: MemberStatus) -> &'static str {
    match status {
        MemberStatus::Active => "Active",
        MemberStatus::Inactive => "Inactive",
    }
}

#[derive(Debug, SurrealValue)]
struct WorkspaceRow {
    record_id: String,
    name: String,
    slug: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl WorkspaceRow {
    fn try_into_workspace(self) -> Result<Workspace, DbError> {
        Ok(Workspace {
            id: parse_uuid(&self.record_id, "workspace")?,
            name: self.name,
            slug: self.slug,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct MemberRow {
    workspace_id: String,
    user_id: String,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl MemberRow {
    fn try_into_member(self) -> Result<WorkspaceMember, DbError> {
        Ok(WorkspaceMember {
            workspace_id: parse_uuid(&self.workspace_id, "workspace")?,
            user_id: parse_uuid(&self.user_id, "user")?,
            role: parse_role(&self.role)?,
            status: parse_member_status(&self.status)?,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Workspace repository.
#[derive(Clone)]
pub struct SurrealWorkspaceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealWorkspaceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> WorkspaceRepository for SurrealWorkspaceRepository<C> {
    async fn create(&self, input: CreateWorkspace) -> StreamgateResult<Workspace> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('workspace', $id) SET \
                 name = $name, \
                 slug = $slug \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<WorkspaceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workspace".into(),
            id: id_str,
        })?;

        Ok(row.try_into_workspace()?)
    }

    async fn get_by_id(&self, id: Uuid) -> StreamgateResult<Workspace> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('workspace', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WorkspaceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workspace".into(),
            id: id_str,
        })?;

        Ok(row.try_into_workspace()?)
    }

    async fn get_by_slug(&self, slug: &str) -> StreamgateResult<Workspace> {
        let slug_owned = slug.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM workspace \
                 WHERE slug = $slug",
            )
            .bind(("slug", slug_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WorkspaceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workspace".into(),
            id: format!("slug={slug_owned}"),
        })?;

        Ok(row.try_into_workspace()?)
    }

    async fn list(&self, pagination: Pagination) -> StreamgateResult<PaginatedResult<Workspace>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM workspace GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM workspace \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WorkspaceRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_workspace())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn add_member(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
        status: MemberStatus,
    ) -> StreamgateResult<WorkspaceMember> {
        let result = self
            .db
            .query(
                "CREATE workspace_member SET \
                 workspace_id = $workspace_id, \
                 user_id = $user_id, \
                 role = $role, \
                 status = $status",
            )
            .bind(("workspace_id", workspace_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .bind(("role", role_to_str(role).to_string()))
            .bind(("status", member_status_to_str(status).to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workspace_member".into(),
            id: user_id.to_string(),
        })?;

        Ok(row.try_into_member()?)
    }

    async fn get_member(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> StreamgateResult<WorkspaceMember> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM workspace_member \
                 WHERE workspace_id = $workspace_id \
                 AND user_id = $user_id",
            )
            .bind(("workspace_id", workspace_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workspace_member".into(),
            id: user_id.to_string(),
        })?;

        Ok(row.try_into_member()?)
    }

    async fn list_admins(&self, workspace_id: Uuid) -> StreamgateResult<Vec<WorkspaceMember>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM workspace_member \
                 WHERE workspace_id = $workspace_id \
                 AND status = 'Active' \
                 AND role IN ['Owner', 'Admin']",
            )
            .bind(("workspace_id", workspace_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let members = rows
            .into_iter()
            .map(|row| row.try_into_member())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(members)
    }
}
