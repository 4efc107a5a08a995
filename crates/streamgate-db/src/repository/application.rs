//! SurrealDB implementation of [`ApplicationRepository`].

use chrono::{DateTime, Utc};
use streamgate_core::error::StreamgateResult;
use streamgate_core::models::application::{
    Application, ApplicationStatus, CreateApplication, ProvisioningDetails, ProvisioningStatus,
};
use streamgate_core::repository::{ApplicationRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{CountRow, parse_uuid};
use crate::error::DbError;

fn parse_status(s: &str) -> Result<ApplicationStatus, DbError> {
    match s {
        "Active" => Ok(ApplicationStatus::Active),
        "Decommissioning" => Ok(ApplicationStatus::Decommissioning),
        "Deleted" => Ok(ApplicationStatus::Deleted),
        other => Err(DbError::Decode(format!("unknown application status: {other}"))),
    }
}

fn status_to_str(status: ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Active => "Active",
        ApplicationStatus::Decommissioning => "Decommissioning",
        ApplicationStatus::Deleted => "Deleted",
    }
}

fn parse_provisioning(s: &str) -> Result<ProvisioningStatus, DbError> {
    match s {
        "Pending" => Ok(ProvisioningStatus::Pending),
        "InProgress" => Ok(ProvisioningStatus::InProgress),
        "Completed" => Ok(ProvisioningStatus::Completed),
        "Partial" => Ok(ProvisioningStatus::Partial),
        "Failed" => Ok(ProvisioningStatus::Failed),
        other => Err(DbError::Decode(format!(
            "unknown provisioning status: {other}"
        ))),
    }
}

fn provisioning_to_str(status: ProvisioningStatus) -> &'static str {
    match status {
        ProvisioningStatus::Pending => "Pending",
        ProvisioningStatus::InProgress => "InProgress",
        ProvisioningStatus::Completed => "Completed",
        ProvisioningStatus::Partial => "Partial",
        ProvisioningStatus::Failed => "Failed",
    }
}

#[derive(Debug, SurrealValue)]
struct ApplicationRow {
    record_id: String,
    workspace_id: String,
    name: String,
    slug: String,
    description: Option<String>,
    status: String,
    provisioning_status: String,
    provisioning_details: String,
    provisioning_workflow_id: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ApplicationRow {
    fn try_into_application(self) -> Result<Application, DbError> {
        let details: ProvisioningDetails = serde_json::from_str(&self.provisioning_details)
            .map_err(|e| DbError::Decode(format!("invalid provisioning details: {e}")))?;
        Ok(Application {
            id: parse_uuid(&self.record_id, "application")?,
            workspace_id: parse_uuid(&self.workspace_id, "workspace")?,
            name: self.name,
            slug: self.slug,
            description: self.description,
            status: parse_status(&self.status)?,
            provisioning_status: parse_provisioning(&self.provisioning_status)?,
            provisioning_details: details,
            provisioning_workflow_id: self.provisioning_workflow_id,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Application repository.
#[derive(Clone)]
pub struct SurrealApplicationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealApplicationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ApplicationRepository for SurrealApplicationRepository<C> {
    async fn create(&self, input: CreateApplication) -> StreamgateResult<Application> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('application', $id) SET \
                 workspace_id = $workspace_id, \
                 name = $name, \
                 slug = $slug, \
                 description = $description, \
                 status = 'Active', \
                 provisioning_status = 'Pending', \
                 provisioning_details = '{}', \
                 provisioning_workflow_id = NONE, \
                 created_by = $created_by \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("workspace_id", input.workspace_id.to_string()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .bind(("description", input.description))
            .bind(("created_by", input.created_by))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<ApplicationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "application".into(),
            id: id_str,
        })?;

        Ok(row.try_into_application()?)
    }

    async fn get_by_id(&self, id: Uuid) -> StreamgateResult<Application> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('application', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ApplicationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "application".into(),
            id: id_str,
        })?;

        Ok(row.try_into_application()?)
    }

    async fn count_non_deleted(&self, workspace_id: Uuid) -> StreamgateResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM application \
                 WHERE workspace_id = $workspace_id \
                 AND status != 'Deleted' GROUP ALL",
            )
            .bind(("workspace_id", workspace_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn slug_in_use(&self, workspace_id: Uuid, slug: &str) -> StreamgateResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM application \
                 WHERE workspace_id = $workspace_id \
                 AND slug = $slug \
                 AND status != 'Deleted' GROUP ALL",
            )
            .bind(("workspace_id", workspace_id.to_string()))
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn set_status(&self, id: Uuid, status: ApplicationStatus) -> StreamgateResult<()> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('application', $id) SET \
                 status = $status, \
                 updated_at = time::now() \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", status_to_str(status).to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;
        let rows: Vec<ApplicationRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "application".into(),
                id: id_str,
            }
            .into());
        }
        Ok(())
    }

    async fn set_provisioning_started(&self, id: Uuid, workflow_id: &str) -> StreamgateResult<()> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('application', $id) SET \
                 provisioning_status = 'InProgress', \
                 provisioning_workflow_id = $workflow_id, \
                 provisioning_details = '{}', \
                 updated_at = time::now() \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("workflow_id", workflow_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;
        let rows: Vec<ApplicationRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "application".into(),
                id: id_str,
            }
            .into());
        }
        Ok(())
    }

    async fn set_provisioning_outcome(
        &self,
        id: Uuid,
        status: ProvisioningStatus,
        details: &ProvisioningDetails,
    ) -> StreamgateResult<()> {
        let id_str = id.to_string();
        let details_json = serde_json::to_string(details)
            .map_err(|e| DbError::Decode(format!("provisioning details encode: {e}")))?;

        let result = self
            .db
            .query(
                "UPDATE type::record('application', $id) SET \
                 provisioning_status = $status, \
                 provisioning_details = $details, \
                 updated_at = time::now() \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", provisioning_to_str(status).to_string()))
            .bind(("details", details_json))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;
        let rows: Vec<ApplicationRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "application".into(),
                id: id_str,
            }
            .into());
        }
        Ok(())
    }

    async fn list_by_workspace(
        &self,
        workspace_id: Uuid,
        pagination: Pagination,
    ) -> StreamgateResult<PaginatedResult<Application>> {
        let workspace_id_str = workspace_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM application \
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
                "SELECT meta::id(id) AS record_id, * FROM application \
                 WHERE workspace_id = $workspace_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("workspace_id", workspace_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ApplicationRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_application())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
