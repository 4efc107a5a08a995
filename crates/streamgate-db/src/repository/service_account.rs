//! SurrealDB implementation of [`ServiceAccountRepository`].

use chrono::{DateTime, Utc};
use streamgate_core::error::StreamgateResult;
use streamgate_core::models::service_account::{
    CreateServiceAccount, PermissionTemplate, ServiceAccount, ServiceAccountStatus,
};
use streamgate_core::repository::ServiceAccountRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{CountRow, parse_uuid};
use crate::error::DbError;

fn parse_status(s: &str) -> Result<ServiceAccountStatus, DbError> {
    match s {
        "Active" => Ok(ServiceAccountStatus::Active),
        "Revoked" => Ok(ServiceAccountStatus::Revoked),
        other => Err(DbError::Decode(format!(
            "unknown service account status: {other}"
        ))),
    }
}

fn status_to_str(status: ServiceAccountStatus) -> &'static str {
    match status {
        ServiceAccountStatus::Active => "Active",
        ServiceAccountStatus::Revoked => "Revoked",
    }
}

fn parse_template(s: &str) -> Result<PermissionTemplate, DbError> {
    match s {
        "Produce" => Ok(PermissionTemplate::Produce),
        "Consume" => Ok(PermissionTemplate::Consume),
        "ProduceConsume" => Ok(PermissionTemplate::ProduceConsume),
        "Custom" => Ok(PermissionTemplate::Custom),
        other => Err(DbError::Decode(format!(
            "unknown permission template: {other}"
        ))),
    }
}

fn template_to_str(template: PermissionTemplate) -> &'static str {
    match template {
        PermissionTemplate::Produce => "Produce",
        PermissionTemplate::Consume => "Consume",
        PermissionTemplate::ProduceConsume => "ProduceConsume",
        PermissionTemplate::Custom => "Custom",
    }
}

#[derive(Debug, SurrealValue)]
struct ServiceAccountRow {
    record_id: String,
    virtual_cluster_id: String,
    workspace_id: String,
    name: String,
    username: String,
    password_hash: String,
    permission_template: String,
    custom_permissions: Vec<String>,
    status: String,
    last_rotated_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ServiceAccountRow {
    fn try_into_service_account(self) -> Result<ServiceAccount, DbError> {
        Ok(ServiceAccount {
            id: parse_uuid(&self.record_id, "service_account")?,
            virtual_cluster_id: parse_uuid(&self.virtual_cluster_id, "virtual_cluster")?,
            workspace_id: parse_uuid(&self.workspace_id, "workspace")?,
            name: self.name,
            username: self.username,
            password_hash: self.password_hash,
            permission_template: parse_template(&self.permission_template)?,
            custom_permissions: self.custom_permissions,
            status: parse_status(&self.status)?,
            last_rotated_at: self.last_rotated_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the ServiceAccount repository.
#[derive(Clone)]
pub struct SurrealServiceAccountRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealServiceAccountRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ServiceAccountRepository for SurrealServiceAccountRepository<C> {
    async fn create(&self, input: CreateServiceAccount) -> StreamgateResult<ServiceAccount> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('service_account', $id) SET \
                 virtual_cluster_id = $virtual_cluster_id, \
                 workspace_id = $workspace_id, \
                 name = $name, \
                 username = $username, \
                 password_hash = $password_hash, \
                 permission_template = $permission_template, \
                 custom_permissions = $custom_permissions, \
                 status = 'Active', \
                 last_rotated_at = time::now() \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("virtual_cluster_id", input.virtual_cluster_id.to_string()))
            .bind(("workspace_id", input.workspace_id.to_string()))
            .bind(("name", input.name))
            .bind(("username", input.username))
            .bind(("password_hash", input.password_hash))
            .bind((
                "permission_template",
                template_to_str(input.permission_template).to_string(),
            ))
            .bind(("custom_permissions", input.custom_permissions))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<ServiceAccountRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "service_account".into(),
            id: id_str,
        })?;

        Ok(row.try_into_service_account()?)
    }

    async fn get_by_id(&self, id: Uuid) -> StreamgateResult<ServiceAccount> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('service_account', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ServiceAccountRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "service_account".into(),
            id: id_str,
        })?;

        Ok(row.try_into_service_account()?)
    }

    async fn username_in_use(&self, username: &str) -> StreamgateResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM service_account \
                 WHERE username = $username GROUP ALL",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        password_hash: &str,
        last_rotated_at: DateTime<Utc>,
    ) -> StreamgateResult<()> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('service_account', $id) SET \
                 password_hash = $password_hash, \
                 last_rotated_at = $last_rotated_at, \
                 updated_at = time::now() \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("password_hash", password_hash.to_string()))
            .bind(("last_rotated_at", last_rotated_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;
        let rows: Vec<ServiceAccountRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "service_account".into(),
                id: id_str,
            }
            .into());
        }
        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: ServiceAccountStatus) -> StreamgateResult<()> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('service_account', $id) SET \
                 status = $status, \
                 updated_at = time::now() \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", status_to_str(status).to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;
        let rows: Vec<ServiceAccountRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "service_account".into(),
                id: id_str,
            }
            .into());
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StreamgateResult<()> {
        self.db
            .query("DELETE type::record('service_account', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        Ok(())
    }

    async fn list_by_virtual_cluster(
        &self,
        virtual_cluster_id: Uuid,
    ) -> StreamgateResult<Vec<ServiceAccount>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM service_account \
                 WHERE virtual_cluster_id = $virtual_cluster_id \
                 ORDER BY created_at ASC",
            )
            .bind(("virtual_cluster_id", virtual_cluster_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ServiceAccountRow> = result.take(0).map_err(DbError::from)?;
        let accounts = rows
            .into_iter()
            .map(|row| row.try_into_service_account())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(accounts)
    }
}
