//! SurrealDB implementation of [`ApplicationRequestRepository`].

use chrono::{DateTime, Utc};
use streamgate_core::error::StreamgateResult;
use streamgate_core::models::request::{
    ApplicationRequest, CreateApplicationRequest, PlatformAction, RejectionTier, RequestStatus,
};
use streamgate_core::repository::{ApplicationRequestRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{CountRow, parse_uuid};
use crate::error::DbError;

fn parse_status(s: &str) -> Result<RequestStatus, DbError> {
    match s {
        "PendingWorkspace" => Ok(RequestStatus::PendingWorkspace),
        "PendingPlatform" => Ok(RequestStatus::PendingPlatform),
        "Approved" => Ok(RequestStatus::Approved),
        "Rejected" => Ok(RequestStatus::Rejected),
        other => Err(DbError::Decode(format!("unknown request status: {other}"))),
    }
}

fn parse_platform_action(s: &str) -> Result<PlatformAction, DbError> {
    match s {
        "ApprovedSingle" => Ok(PlatformAction::ApprovedSingle),
        "IncreasedQuota" => Ok(PlatformAction::IncreasedQuota),
        other => Err(DbError::Decode(format!("unknown platform action: {other}"))),
    }
}

fn platform_action_to_str(action: PlatformAction) -> &'static str {
    match action {
        PlatformAction::ApprovedSingle => "ApprovedSingle",
        PlatformAction::IncreasedQuota => "IncreasedQuota",
    }
}

fn parse_tier(s: &str) -> Result<RejectionTier, DbError> {
    match s {
        "Workspace" => Ok(RejectionTier::Workspace),
        "Platform" => Ok(RejectionTier::Platform),
        other => Err(DbError::Decode(format!("unknown rejection tier: {other}"))),
    }
}

fn tier_to_str(tier: RejectionTier) -> &'static str {
    match tier {
        RejectionTier::Workspace => "Workspace",
        RejectionTier::Platform => "Platform",
    }
}

#[derive(Debug, SurrealValue)]
struct RequestRow {
    record_id: String,
    workspace_id: String,
    requested_by: String,
    name: String,
    slug: String,
    description: Option<String>,
    status: String,
    workspace_actor: Option<String>,
    workspace_acted_at: Option<DateTime<Utc>>,
    platform_actor: Option<String>,
    platform_acted_at: Option<DateTime<Utc>>,
    platform_action: Option<String>,
    rejected_tier: Option<String>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RequestRow {
    fn try_into_request(self) -> Result<ApplicationRequest, DbError> {
        Ok(ApplicationRequest {
            id: parse_uuid(&self.record_id, "application_request")?,
            workspace_id: parse_uuid(&self.workspace_id, "workspace")?,
            requested_by: parse_uuid(&self.requested_by, "user")?,
            name: self.name,
            slug: self.slug,
            description: self.description,
            status: parse_status(&self.status)?,
            workspace_actor: self
                .workspace_actor
                .as_deref()
                .map(|s| parse_uuid(s, "user"))
                .transpose()?,
            workspace_acted_at: self.workspace_acted_at,
            platform_actor: self
                .platform_actor
                .as_deref()
                .map(|s| parse_uuid(s, "user"))
                .transpose()?,
            platform_acted_at: self.platform_acted_at,
            platform_action: self
                .platform_action
                .as_deref()
                .map(parse_platform_action)
                .transpose()?,
            rejected_tier: self.rejected_tier.as_deref().map(parse_tier).transpose()?,
            rejection_reason: self.rejection_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the ApplicationRequest repository.
#[derive(Clone)]
pub struct SurrealApplicationRequestRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealApplicationRequestRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn take_one(
        &self,
        result: surrealdb::IndexedResults,
        id: &str,
    ) -> Result<ApplicationRequest, DbError> {
        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;
        let rows: Vec<RequestRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "application_request".into(),
            id: id.to_string(),
        })?;
        row.try_into_request()
    }
}

impl<C: Connection> ApplicationRequestRepository for SurrealApplicationRequestRepository<C> {
    async fn create(&self, input: CreateApplicationRequest) -> StreamgateResult<ApplicationRequest> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('application_request', $id) SET \
                 workspace_id = $workspace_id, \
                 requested_by = $requested_by, \
                 name = $name, \
                 slug = $slug, \
                 description = $description, \
                 status = 'PendingWorkspace', \
                 workspace_actor = NONE, \
                 workspace_acted_at = NONE, \
                 platform_actor = NONE, \
                 platform_acted_at = NONE, \
                 platform_action = NONE, \
                 rejected_tier = NONE, \
                 rejection_reason = NONE \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("workspace_id", input.workspace_id.to_string()))
            .bind(("requested_by", input.requested_by.to_string()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        Ok(self.take_one(result, &id_str).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> StreamgateResult<ApplicationRequest> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('application_request', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        Ok(self.take_one(result, &id_str).await?)
    }

    async fn set_workspace_approved(
        &self,
        id: Uuid,
        actor_id: Uuid,
    ) -> StreamgateResult<ApplicationRequest> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('application_request', $id) SET \
                 status = 'PendingPlatform', \
                 workspace_actor = $actor, \
                 workspace_acted_at = time::now(), \
                 updated_at = time::now() \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("actor", actor_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(self.take_one(result, &id_str).await?)
    }

    async fn set_platform_approved(
        &self,
        id: Uuid,
        actor_id: Uuid,
        action: PlatformAction,
    ) -> StreamgateResult<ApplicationRequest> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('application_request', $id) SET \
                 status = 'Approved', \
                 platform_actor = $actor, \
                 platform_acted_at = time::now(), \
                 platform_action = $action, \
                 updated_at = time::now() \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("actor", actor_id.to_string()))
            .bind(("action", platform_action_to_str(action).to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(self.take_one(result, &id_str).await?)
    }

    async fn set_rejected(
        &self,
        id: Uuid,
        tier: RejectionTier,
        actor_id: Uuid,
        reason: Option<String>,
    ) -> StreamgateResult<ApplicationRequest> {
        let id_str = id.to_string();
        let actor_field = match tier {
            RejectionTier::Workspace => "workspace_actor",
            RejectionTier::Platform => "platform_actor",
        };
        let acted_field = match tier {
            RejectionTier::Workspace => "workspace_acted_at",
            RejectionTier::Platform => "platform_acted_at",
        };

        let query = format!(
            "UPDATE type::record('application_request', $id) SET \
             status = 'Rejected', \
             rejected_tier = $tier, \
             rejection_reason = $reason, \
             {actor_field} = $actor, \
             {acted_field} = time::now(), \
             updated_at = time::now() \
             RETURN meta::id(id) AS record_id, *"
        );

        let result = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("tier", tier_to_str(tier).to_string()))
            .bind(("reason", reason))
            .bind(("actor", actor_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(self.take_one(result, &id_str).await?)
    }

    async fn delete(&self, id: Uuid) -> StreamgateResult<()> {
        self.db
            .query("DELETE type::record('application_request', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        Ok(())
    }

    async fn list_by_workspace(
        &self,
        workspace_id: Uuid,
        pagination: Pagination,
    ) -> StreamgateResult<PaginatedResult<ApplicationRequest>> {
        let workspace_id_str = workspace_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM application_request \
                 WHERE workspace_id = $workspace_id GROUP ALL",
            )
            .bind(("workspace_id", workspace_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM application_request \
                 WHERE workspace_id = $workspace_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("workspace_id", workspace_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RequestRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_request())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
