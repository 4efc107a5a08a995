//! SurrealDB implementation of [`TopicShareRepository`].

use chrono::{DateTime, Utc};
use streamgate_core::error::StreamgateResult;
use streamgate_core::models::topic::{AccessLevel, CreateTopicShare, ShareStatus, TopicShare};
use streamgate_core::repository::TopicShareRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::parse_uuid;
use crate::error::DbError;

fn parse_status(s: &str) -> Result<ShareStatus, DbError> {
    match s {
        "Pending" => Ok(ShareStatus::Pending),
        "Approved" => Ok(ShareStatus::Approved),
        "Rejected" => Ok(ShareStatus::Rejected),
        "Revoked" => Ok(ShareStatus::Revoked),
        other => Err(DbError::Decode(format!("unknown share status: {other}"))),
    }
}

fn status_to_str(status: ShareStatus) -> &'static str {
    match status {
        ShareStatus::Pending => "Pending",
        ShareStatus::Approved => "Approved",
        ShareStatus::Rejected => "Rejected",
        ShareStatus::Revoked => "Revoked",
    }
}

fn parse_access_level(s: &str) -> Result<AccessLevel, DbError> {
    match s {
        "Read" => Ok(AccessLevel::Read),
        "Write" => Ok(AccessLevel::Write),
        "ReadWrite" => Ok(AccessLevel::ReadWrite),
        other => Err(DbError::Decode(format!("unknown access level: {other}"))),
    }
}

fn access_level_to_str(level: AccessLevel) -> &'static str {
    match level {
        AccessLevel::Read => "Read",
        AccessLevel::Write => "Write",
        AccessLevel::ReadWrite => "ReadWrite",
    }
}

#[derive(Debug, SurrealValue)]
struct TopicShareRow {
    record_id: String,
    topic_id: String,
    owning_workspace_id: String,
    requesting_workspace_id: String,
    access_level: String,
    reason: String,
    status: String,
    expires_at: Option<DateTime<Utc>>,
    decided_by: Option<String>,
    decided_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TopicShareRow {
    fn try_into_share(self) -> Result<TopicShare, DbError> {
        Ok(TopicShare {
            id: parse_uuid(&self.record_id, "topic_share")?,
            topic_id: parse_uuid(&self.topic_id, "topic")?,
            owning_workspace_id: parse_uuid(&self.owning_workspace_id, "workspace")?,
            requesting_workspace_id: parse_uuid(&self.requesting_workspace_id, "workspace")?,
            access_level: parse_access_level(&self.access_level)?,
            reason: self.reason,
            status: parse_status(&self.status)?,
            expires_at: self.expires_at,
            decided_by: self.decided_by,
            decided_at: self.decided_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the TopicShare repository.
#[derive(Clone)]
pub struct SurrealTopicShareRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTopicShareRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    fn rows_to_shares(rows: Vec<TopicShareRow>) -> Result<Vec<TopicShare>, DbError> {
        rows.into_iter().map(|row| row.try_into_share()).collect()
    }
}

impl<C: Connection> TopicShareRepository for SurrealTopicShareRepository<C> {
    async fn create(&self, input: CreateTopicShare) -> StreamgateResult<TopicShare> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('topic_share', $id) SET \
                 topic_id = $topic_id, \
                 owning_workspace_id = $owning_workspace_id, \
                 requesting_workspace_id = $requesting_workspace_id, \
                 access_level = $access_level, \
                 reason = $reason, \
                 status = 'Pending', \
                 expires_at = NONE, \
                 decided_by = NONE, \
                 decided_at = NONE \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("topic_id", input.topic_id.to_string()))
            .bind(("owning_workspace_id", input.owning_workspace_id.to_string()))
            .bind((
                "requesting_workspace_id",
                input.requesting_workspace_id.to_string(),
            ))
            .bind(("access_level", access_level_to_str(input.access_level).to_string()))
            .bind(("reason", input.reason))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<TopicShareRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "topic_share".into(),
            id: id_str,
        })?;

        Ok(row.try_into_share()?)
    }

    async fn get_by_id(&self, id: Uuid) -> StreamgateResult<TopicShare> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('topic_share', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TopicShareRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "topic_share".into(),
            id: id_str,
        })?;

        Ok(row.try_into_share()?)
    }

    async fn find_active(
        &self,
        topic_id: Uuid,
        requesting_workspace_id: Uuid,
    ) -> StreamgateResult<Option<TopicShare>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM topic_share \
                 WHERE topic_id = $topic_id \
                 AND requesting_workspace_id = $requesting_workspace_id \
                 AND status IN ['Pending', 'Approved'] \
                 LIMIT 1",
            )
            .bind(("topic_id", topic_id.to_string()))
            .bind((
                "requesting_workspace_id",
                requesting_workspace_id.to_string(),
            ))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TopicShareRow> = result.take(0).map_err(DbError::from)?;
        let share = rows
            .into_iter()
            .next()
            .map(|row| row.try_into_share())
            .transpose()?;

        Ok(share)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ShareStatus,
        decided_by: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> StreamgateResult<TopicShare> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('topic_share', $id) SET \
                 status = $status, \
                 decided_by = $decided_by, \
                 decided_at = time::now(), \
                 expires_at = $expires_at, \
                 updated_at = time::now() \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", status_to_str(status).to_string()))
            .bind(("decided_by", decided_by.map(|s| s.to_string())))
            .bind(("expires_at", expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;
        let rows: Vec<TopicShareRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "topic_share".into(),
            id: id_str,
        })?;

        Ok(row.try_into_share()?)
    }

    async fn list_by_topic(&self, topic_id: Uuid) -> StreamgateResult<Vec<TopicShare>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM topic_share \
                 WHERE topic_id = $topic_id \
                 ORDER BY created_at ASC",
            )
            .bind(("topic_id", topic_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TopicShareRow> = result.take(0).map_err(DbError::from)?;
        Ok(Self::rows_to_shares(rows)?)
    }

    async fn list_by_requesting_workspace(
        &self,
        workspace_id: Uuid,
    ) -> StreamgateResult<Vec<TopicShare>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM topic_share \
                 WHERE requesting_workspace_id = $workspace_id \
                 ORDER BY created_at ASC",
            )
            .bind(("workspace_id", workspace_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TopicShareRow> = result.take(0).map_err(DbError::from)?;
        Ok(Self::rows_to_shares(rows)?)
    }
}
