//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. Nested structures
//! (provisioning details, auto-approve policies, audit metadata) are
//! stored as JSON strings so rows round-trip through plain columns.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Workspaces (tenant boundary)
-- =======================================================================
DEFINE TABLE workspace SCHEMAFULL;
DEFINE FIELD name ON TABLE workspace TYPE string;
DEFINE FIELD slug ON TABLE workspace TYPE string;
DEFINE FIELD created_at ON TABLE workspace TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE workspace TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_workspace_slug ON TABLE workspace COLUMNS slug UNIQUE;

-- =======================================================================
-- Workspace membership
-- =======================================================================
DEFINE TABLE workspace_member SCHEMAFULL;
DEFINE FIELD workspace_id ON TABLE workspace_member TYPE string;
DEFINE FIELD user_id ON TABLE workspace_member TYPE string;
DEFINE FIELD role ON TABLE workspace_member TYPE string \
    ASSERT $value IN ['Owner', 'Admin', 'Member'];
DEFINE FIELD status ON TABLE workspace_member TYPE string \
    ASSERT $value IN ['Active', 'Inactive'];
DEFINE FIELD created_at ON TABLE workspace_member TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_member_workspace_user ON TABLE workspace_member \
    COLUMNS workspace_id, user_id UNIQUE;

-- =======================================================================
-- Quota overrides (at most one per workspace)
-- =======================================================================
DEFINE TABLE quota_override SCHEMAFULL;
DEFINE FIELD workspace_id ON TABLE quota_override TYPE string;
DEFINE FIELD application_quota ON TABLE quota_override TYPE int \
    ASSERT $value >= 1;
DEFINE FIELD updated_by ON TABLE quota_override TYPE string;
DEFINE FIELD created_at ON TABLE quota_override TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE quota_override TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_quota_workspace ON TABLE quota_override \
    COLUMNS workspace_id UNIQUE;

-- =======================================================================
-- Applications (workspace scope)
-- =======================================================================
DEFINE TABLE application SCHEMAFULL;
DEFINE FIELD workspace_id ON TABLE application TYPE string;
DEFINE FIELD name ON TABLE application TYPE string;
DEFINE FIELD slug ON TABLE application TYPE string;
DEFINE FIELD description ON TABLE application TYPE option<string>;
DEFINE FIELD status ON TABLE application TYPE string \
    ASSERT $value IN ['Active', 'Decommissioning', 'Deleted'];
DEFINE FIELD provisioning_status ON TABLE application TYPE string \
    ASSERT $value IN ['Pending', 'InProgress', 'Completed', \
    'Partial', 'Failed'];
-- JSON-encoded map of environment -> outcome.
DEFINE FIELD provisioning_details ON TABLE application TYPE string \
    DEFAULT '{}';
DEFINE FIELD provisioning_workflow_id ON TABLE application \
    TYPE option<string>;
DEFINE FIELD created_by ON TABLE application TYPE string;
DEFINE FIELD created_at ON TABLE application TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE application TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_application_workspace ON TABLE application \
    COLUMNS workspace_id;

-- =======================================================================
-- Virtual clusters (one per application/environment)
-- =======================================================================
DEFINE TABLE virtual_cluster SCHEMAFULL;
DEFINE FIELD application_id ON TABLE virtual_cluster TYPE string;
DEFINE FIELD workspace_id ON TABLE virtual_cluster TYPE string;
DEFINE FIELD environment ON TABLE virtual_cluster TYPE string \
    ASSERT $value IN ['Dev', 'Stage', 'Prod'];
DEFINE FIELD prefix ON TABLE virtual_cluster TYPE string;
DEFINE FIELD bootstrap_servers ON TABLE virtual_cluster \
    TYPE option<string>;
DEFINE FIELD status ON TABLE virtual_cluster TYPE string \
    ASSERT $value IN ['Provisioning', 'Active', 'ReadOnly', \
    'Deleting', 'Deleted'];
DEFINE FIELD created_at ON TABLE virtual_cluster TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE virtual_cluster TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_vc_application_env ON TABLE virtual_cluster \
    COLUMNS application_id, environment UNIQUE;

-- =======================================================================
-- Service accounts (virtual-cluster scope)
-- =======================================================================
DEFINE TABLE service_account SCHEMAFULL;
DEFINE FIELD virtual_cluster_id ON TABLE service_account TYPE string;
DEFINE FIELD workspace_id ON TABLE service_account TYPE string;
DEFINE FIELD name ON TABLE service_account TYPE string;
DEFINE FIELD username ON TABLE service_account TYPE string;
DEFINE FIELD password_hash ON TABLE service_account TYPE string;
DEFINE FIELD permission_template ON TABLE service_account TYPE string \
    ASSERT $value IN ['Produce', 'Consume', 'ProduceConsume', \
    'Custom'];
DEFINE FIELD custom_permissions ON TABLE service_account TYPE array;
DEFINE FIELD custom_permissions.* ON TABLE service_account TYPE string;
DEFINE FIELD status ON TABLE service_account TYPE string \
    ASSERT $value IN ['Active', 'Revoked'];
DEFINE FIELD last_rotated_at ON TABLE service_account TYPE datetime;
DEFINE FIELD created_at ON TABLE service_account TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE service_account TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_sa_username ON TABLE service_account \
    COLUMNS username UNIQUE;
DEFINE INDEX idx_sa_cluster ON TABLE service_account \
    COLUMNS virtual_cluster_id;

-- =======================================================================
-- Application requests (dual-tier approval)
-- =======================================================================
DEFINE TABLE application_request SCHEMAFULL;
DEFINE FIELD workspace_id ON TABLE application_request TYPE string;
DEFINE FIELD requested_by ON TABLE application_request TYPE string;
DEFINE FIELD name ON TABLE application_request TYPE string;
DEFINE FIELD slug ON TABLE application_request TYPE string;
DEFINE FIELD description ON TABLE application_request \
    TYPE option<string>;
DEFINE FIELD status ON TABLE application_request TYPE string \
    ASSERT $value IN ['PendingWorkspace', 'PendingPlatform', \
    'Approved', 'Rejected'];
DEFINE FIELD workspace_actor ON TABLE application_request \
    TYPE option<string>;
DEFINE FIELD workspace_acted_at ON TABLE application_request \
    TYPE option<datetime>;
DEFINE FIELD platform_actor ON TABLE application_request \
    TYPE option<string>;
DEFINE FIELD platform_acted_at ON TABLE application_request \
    TYPE option<datetime>;
DEFINE FIELD platform_action ON TABLE application_request \
    TYPE option<string> \
    ASSERT $value = NONE OR $value IN ['ApprovedSingle', \
    'IncreasedQuota'];
DEFINE FIELD rejected_tier ON TABLE application_request \
    TYPE option<string> \
    ASSERT $value = NONE OR $value IN ['Workspace', 'Platform'];
DEFINE FIELD rejection_reason ON TABLE application_request \
    TYPE option<string>;
DEFINE FIELD created_at ON TABLE application_request TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE application_request TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_request_workspace ON TABLE application_request \
    COLUMNS workspace_id;

-- =======================================================================
-- Topics (virtual-cluster scope)
-- =======================================================================
DEFINE TABLE topic SCHEMAFULL;
DEFINE FIELD virtual_cluster_id ON TABLE topic TYPE string;
DEFINE FIELD workspace_id ON TABLE topic TYPE string;
DEFINE FIELD name ON TABLE topic TYPE string;
DEFINE FIELD visibility ON TABLE topic TYPE string \
    ASSERT $value IN ['Private', 'Workspace', 'Discoverable', \
    'Public'];
DEFINE FIELD partitions ON TABLE topic TYPE int;
DEFINE FIELD retention_ms ON TABLE topic TYPE option<int>;
-- JSON-encoded auto-approve policy, if any.
DEFINE FIELD auto_approve ON TABLE topic TYPE option<string>;
DEFINE FIELD created_at ON TABLE topic TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE topic TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_topic_cluster_name ON TABLE topic \
    COLUMNS virtual_cluster_id, name UNIQUE;
DEFINE INDEX idx_topic_visibility ON TABLE topic COLUMNS visibility;

-- =======================================================================
-- Topic shares (cross-workspace grants)
-- =======================================================================
DEFINE TABLE topic_share SCHEMAFULL;
DEFINE FIELD topic_id ON TABLE topic_share TYPE string;
DEFINE FIELD owning_workspace_id ON TABLE topic_share TYPE string;
DEFINE FIELD requesting_workspace_id ON TABLE topic_share TYPE string;
DEFINE FIELD access_level ON TABLE topic_share TYPE string \
    ASSERT $value IN ['Read', 'Write', 'ReadWrite'];
DEFINE FIELD reason ON TABLE topic_share TYPE string;
DEFINE FIELD status ON TABLE topic_share TYPE string \
    ASSERT $value IN ['Pending', 'Approved', 'Rejected', 'Revoked'];
DEFINE FIELD expires_at ON TABLE topic_share TYPE option<datetime>;
DEFINE FIELD decided_by ON TABLE topic_share TYPE option<string>;
DEFINE FIELD decided_at ON TABLE topic_share TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE topic_share TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE topic_share TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_share_topic ON TABLE topic_share COLUMNS topic_id;
DEFINE INDEX idx_share_requester ON TABLE topic_share \
    COLUMNS requesting_workspace_id;

-- =======================================================================
-- Audit log (append-only)
-- =======================================================================
DEFINE TABLE audit_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD actor ON TABLE audit_log TYPE string;
DEFINE FIELD actor_kind ON TABLE audit_log TYPE string \
    ASSERT $value IN ['User', 'TrustedService'];
DEFINE FIELD action ON TABLE audit_log TYPE string;
DEFINE FIELD resource ON TABLE audit_log TYPE option<string>;
-- JSON-encoded structured context.
DEFINE FIELD metadata ON TABLE audit_log TYPE string DEFAULT '{}';
DEFINE FIELD timestamp ON TABLE audit_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_time ON TABLE audit_log COLUMNS timestamp;
DEFINE INDEX idx_audit_actor ON TABLE audit_log COLUMNS actor;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
