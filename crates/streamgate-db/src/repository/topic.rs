//! SurrealDB implementation of [`TopicRepository`].

use chrono::{DateTime, Utc};
use streamgate_core::error::StreamgateResult;
use streamgate_core::models::topic::{AutoApprovePolicy, CreateTopic, Topic, TopicVisibility};
use streamgate_core::repository::{PaginatedResult, Pagination, TopicRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{CountRow, parse_uuid};
use crate::error::DbError;

fn parse_visibility(s: &str) -> Result<TopicVisibility, DbError> {
    match s {
        "Private" => Ok(TopicVisibility::Private),
        "Workspace" => Ok(TopicVisibility::Workspace),
        "Discoverable" => Ok(TopicVisibility::Discoverable),
        "Public" => Ok(TopicVisibility::Public),
        other => Err(DbError::Decode(format!("unknown visibility: {other}"))),
    }
}

fn visibility_to_str(visibility: TopicVisibility) -> &'static str {
    match visibility {
        TopicVisibility::Private => "Private",
        TopicVisibility::Workspace => "Workspace",
        TopicVisibility::Discoverable => "Discoverable",
        TopicVisibility::Public => "Public",
    }
}

#[derive(Debug, SurrealValue)]
struct TopicRow {
    record_id: String,
    virtual_cluster_id: String,
    workspace_id: String,
    name: String,
    visibility: String,
    partitions: u32,
    retention_ms: Option<i64>,
    auto_approve: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TopicRow {
    fn try_into_topic(self) -> Result<Topic, DbError> {
        let auto_approve: Option<AutoApprovePolicy> = self
            .auto_approve
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| DbError::Decode(format!("invalid auto-approve policy: {e}")))?;
        Ok(Topic {
            id: parse_uuid(&self.record_id, "topic")?,
            virtual_cluster_id: parse_uuid(&self.virtual_cluster_id, "virtual_cluster")?,
            workspace_id: parse_uuid(&self.workspace_id, "workspace")?,
            name: self.name,
            visibility: parse_visibility(&self.visibility)?,
            partitions: self.partitions,
            retention_ms: self.retention_ms,
            auto_approve,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Topic repository.
#[derive(Clone)]
pub struct SurrealTopicRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTopicRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TopicRepository for SurrealTopicRepository<C> {
    async fn create(&self, input: CreateTopic) -> StreamgateResult<Topic> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let auto_approve = input
            .auto_approve
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DbError::Decode(format!("auto-approve policy encode: {e}")))?;

        let result = self
            .db
            .query(
                "CREATE type::record('topic', $id) SET \
                 virtual_cluster_id = $virtual_cluster_id, \
                 workspace_id = $workspace_id, \
                 name = $name, \
                 visibility = $visibility, \
                 partitions = $partitions, \
                 retention_ms = $retention_ms, \
                 auto_approve = $auto_approve \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("virtual_cluster_id", input.virtual_cluster_id.to_string()))
            .bind(("workspace_id", input.workspace_id.to_string()))
            .bind(("name", input.name))
            .bind(("visibility", visibility_to_str(input.visibility).to_string()))
            .bind(("partitions", input.partitions))
            .bind(("retention_ms", input.retention_ms))
            .bind(("auto_approve", auto_approve))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<TopicRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "topic".into(),
            id: id_str,
        })?;

        Ok(row.try_into_topic()?)
    }

    async fn get_by_id(&self, id: Uuid) -> StreamgateResult<Topic> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('topic', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TopicRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "topic".into(),
            id: id_str,
        })?;

        Ok(row.try_into_topic()?)
    }

    async fn list_by_virtual_cluster(
        &self,
        virtual_cluster_id: Uuid,
    ) -> StreamgateResult<Vec<Topic>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM topic \
                 WHERE virtual_cluster_id = $virtual_cluster_id \
                 ORDER BY name ASC",
            )
            .bind(("virtual_cluster_id", virtual_cluster_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TopicRow> = result.take(0).map_err(DbError::from)?;
        let topics = rows
            .into_iter()
            .map(|row| row.try_into_topic())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(topics)
    }

    async fn search_catalog(
        &self,
        query: Option<&str>,
        pagination: Pagination,
    ) -> StreamgateResult<PaginatedResult<Topic>> {
        let name_filter = query.map(|q| q.to_string()).unwrap_or_default();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM topic \
                 WHERE visibility IN ['Discoverable', 'Public'] \
                 AND ($filter = '' OR string::contains(name, $filter)) \
                 GROUP ALL",
            )
            .bind(("filter", name_filter.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM topic \
                 WHERE visibility IN ['Discoverable', 'Public'] \
                 AND ($filter = '' OR string::contains(name, $filter)) \
                 ORDER BY name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("filter", name_filter))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TopicRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_topic())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
