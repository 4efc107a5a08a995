//! SurrealDB implementation of [`VirtualClusterRepository`].

use chrono::{DateTime, Utc};
use streamgate_core::error::StreamgateResult;
use streamgate_core::models::virtual_cluster::{
    CreateVirtualCluster, Environment, VirtualCluster, VirtualClusterStatus,
};
use streamgate_core::repository::VirtualClusterRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::parse_uuid;
use crate::error::DbError;

fn parse_environment(s: &str) -> Result<Environment, DbError> {
    match s {
        "Dev" => Ok(Environment::Dev),
        "Stage" => Ok(Environment::Stage),
        "Prod" => Ok(Environment::Prod),
        other => Err(DbError::Decode(format!("unknown environment: {other}"))),
    }
}

fn environment_to_str(env: Environment) -> &'static str {
    match env {
        Environment::Dev => "Dev",
        Environment::Stage => "Stage",
        Environment::Prod => "Prod",
    }
}

fn parse_status(s: &str) -> Result<VirtualClusterStatus, DbError> {
    match s {
        "Provisioning" => Ok(VirtualClusterStatus::Provisioning),
        "Active" => Ok(VirtualClusterStatus::Active),
        "ReadOnly" => Ok(VirtualClusterStatus::ReadOnly),
        "Deleting" => Ok(VirtualClusterStatus::Deleting),
        "Deleted" => Ok(VirtualClusterStatus::Deleted),
        other => Err(DbError::Decode(format!(
            "unknown virtual cluster status: {other}"
        ))),
    }
}

fn status_to_str(status: VirtualClusterStatus) -> &'static str {
    match status {
        VirtualClusterStatus::Provisioning => "Provisioning",
        VirtualClusterStatus::Active => "Active",
        VirtualClusterStatus::ReadOnly => "ReadOnly",
        VirtualClusterStatus::Deleting => "Deleting",
        VirtualClusterStatus::Deleted => "Deleted",
    }
}

#[derive(Debug, SurrealValue)]
struct VirtualClusterRow {
    record_id: String,
    application_id: String,
    workspace_id: String,
    environment: String,
    prefix: String,
    bootstrap_servers: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VirtualClusterRow {
    fn try_into_cluster(self) -> Result<VirtualCluster, DbError> {
        Ok(VirtualCluster {
            id: parse_uuid(&self.record_id, "virtual_cluster")?,
            application_id: parse_uuid(&self.application_id, "application")?,
            workspace_id: parse_uuid(&self.workspace_id, "workspace")?,
            environment: parse_environment(&self.environment)?,
            prefix: self.prefix,
            bootstrap_servers: self.bootstrap_servers,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the VirtualCluster repository.
#[derive(Clone)]
pub struct SurrealVirtualClusterRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealVirtualClusterRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> VirtualClusterRepository for SurrealVirtualClusterRepository<C> {
    async fn create(&self, input: CreateVirtualCluster) -> StreamgateResult<VirtualCluster> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('virtual_cluster', $id) SET \
                 application_id = $application_id, \
                 workspace_id = $workspace_id, \
                 environment = $environment, \
                 prefix = $prefix, \
                 bootstrap_servers = NONE, \
                 status = 'Provisioning' \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("application_id", input.application_id.to_string()))
            .bind(("workspace_id", input.workspace_id.to_string()))
            .bind(("environment", environment_to_str(input.environment).to_string()))
            .bind(("prefix", input.prefix))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<VirtualClusterRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "virtual_cluster".into(),
            id: id_str,
        })?;

        Ok(row.try_into_cluster()?)
    }

    async fn get_by_id(&self, id: Uuid) -> StreamgateResult<VirtualCluster> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('virtual_cluster', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<VirtualClusterRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "virtual_cluster".into(),
            id: id_str,
        })?;

        Ok(row.try_into_cluster()?)
    }

    async fn list_by_application(
        &self,
        application_id: Uuid,
    ) -> StreamgateResult<Vec<VirtualCluster>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM virtual_cluster \
                 WHERE application_id = $application_id \
                 ORDER BY environment ASC",
            )
            .bind(("application_id", application_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<VirtualClusterRow> = result.take(0).map_err(DbError::from)?;
        let clusters = rows
            .into_iter()
            .map(|row| row.try_into_cluster())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(clusters)
    }

    async fn set_status(&self, id: Uuid, status: VirtualClusterStatus) -> StreamgateResult<()> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('virtual_cluster', $id) SET \
                 status = $status, \
                 updated_at = time::now() \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", status_to_str(status).to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;
        let rows: Vec<VirtualClusterRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "virtual_cluster".into(),
                id: id_str,
            }
            .into());
        }
        Ok(())
    }

    async fn mark_active(&self, id: Uuid, bootstrap_servers: &str) -> StreamgateResult<()> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('virtual_cluster', $id) SET \
                 status = 'Active', \
                 bootstrap_servers = $bootstrap_servers, \
                 updated_at = time::now() \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("bootstrap_servers", bootstrap_servers.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;
        let rows: Vec<VirtualClusterRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "virtual_cluster".into(),
                id: id_str,
            }
            .into());
        }
        Ok(())
    }
}
