//! SurrealDB implementation of [`QuotaOverrideRepository`].

use chrono::{DateTime, Utc};
use streamgate_core::error::StreamgateResult;
use streamgate_core::models::workspace::QuotaOverride;
use streamgate_core::repository::QuotaOverrideRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct QuotaOverrideRow {
    workspace_id: String,
    application_quota: u32,
    updated_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl QuotaOverrideRow {
    fn try_into_override(self) -> Result<QuotaOverride, DbError> {
        Ok(QuotaOverride {
            workspace_id: parse_uuid(&self.workspace_id, "workspace")?,
            application_quota: self.application_quota,
            updated_by: self.updated_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the quota override repository.
#[derive(Clone)]
pub struct SurrealQuotaOverrideRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealQuotaOverrideRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> QuotaOverrideRepository for SurrealQuotaOverrideRepository<C> {
    async fn get(&self, workspace_id: Uuid) -> StreamgateResult<Option<QuotaOverride>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM quota_override \
                 WHERE workspace_id = $workspace_id",
            )
            .bind(("workspace_id", workspace_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<QuotaOverrideRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_override()?)),
            None => Ok(None),
        }
    }

    async fn upsert(
        &self,
        workspace_id: Uuid,
        application_quota: u32,
        updated_by: &str,
    ) -> StreamgateResult<QuotaOverride> {
        let workspace_id_str = workspace_id.to_string();

        // The workspace_id column carries a unique index, so the
        // keyed UPSERT touches at most one row.
        let result = self
            .db
            .query(
                "UPSERT type::record('quota_override', $workspace_id) SET \
                 workspace_id = $workspace_id, \
                 application_quota = $application_quota, \
                 updated_by = $updated_by, \
                 updated_at = time::now()",
            )
            .bind(("workspace_id", workspace_id_str.clone()))
            .bind(("application_quota", application_quota))
            .bind(("updated_by", updated_by.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<QuotaOverrideRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "quota_override".into(),
            id: workspace_id_str,
        })?;

        Ok(row.try_into_override()?)
    }
}
