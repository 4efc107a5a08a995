//! SurrealDB implementation of [`AuditLogRepository`].
//!
//! The audit table is append-only; the schema denies UPDATE and DELETE
//! so the repository only exposes `append` and `list`.

use chrono::{DateTime, Utc};
use streamgate_core::error::StreamgateResult;
use streamgate_core::models::audit::{ActorKind, AuditLogEntry, CreateAuditLogEntry};
use streamgate_core::repository::{AuditLogRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{CountRow, parse_uuid};
use crate::error::DbError;

fn parse_actor_kind(s: &str) -> Result<ActorKind, DbError> {
    match s {
        "User" => Ok(ActorKind::User),
        "TrustedService" => Ok(ActorKind::TrustedService),
        other => Err(DbError::Decode(format!("unknown actor kind: {other}"))),
    }
}

fn actor_kind_to_str(kind: ActorKind) -> &'static str {
    match kind {
        ActorKind::User => "User",
        ActorKind::TrustedService => "TrustedService",
    }
}

#[derive(Debug, SurrealValue)]
struct AuditLogRow {
    record_id: String,
    actor: String,
    actor_kind: String,
    action: String,
    resource: Option<String>,
    metadata: String,
    timestamp: DateTime<Utc>,
}

impl AuditLogRow {
    fn try_into_entry(self) -> Result<AuditLogEntry, DbError> {
        let metadata: serde_json::Value = serde_json::from_str(&self.metadata)
            .map_err(|e| DbError::Decode(format!("invalid audit metadata: {e}")))?;
        Ok(AuditLogEntry {
            id: parse_uuid(&self.record_id, "audit_log")?,
            actor: self.actor,
            actor_kind: parse_actor_kind(&self.actor_kind)?,
            action: self.action,
            resource: self.resource,
            metadata,
            timestamp: self.timestamp,
        })
    }
}

/// SurrealDB implementation of the append-only audit log.
#[derive(Clone)]
pub struct SurrealAuditLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AuditLogRepository for SurrealAuditLogRepository<C> {
    async fn append(&self, input: CreateAuditLogEntry) -> StreamgateResult<AuditLogEntry> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let metadata = serde_json::to_string(&input.metadata)
            .map_err(|e| DbError::Decode(format!("audit metadata encode: {e}")))?;

        let result = self
            .db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 actor = $actor, \
                 actor_kind = $actor_kind, \
                 action = $action, \
                 resource = $resource, \
                 metadata = $metadata, \
                 timestamp = time::now() \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("actor", input.actor))
            .bind(("actor_kind", actor_kind_to_str(input.actor_kind).to_string()))
            .bind(("action", input.action))
            .bind(("resource", input.resource))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<AuditLogRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "audit_log".into(),
            id: id_str,
        })?;

        Ok(row.try_into_entry()?)
    }

    async fn list(
        &self,
        pagination: Pagination,
    ) -> StreamgateResult<PaginatedResult<AuditLogEntry>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM audit_log GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM audit_log \
                 ORDER BY timestamp DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AuditLogRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
