//! Shared row-conversion helpers.

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

pub(crate) fn parse_uuid(value: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub total: u64,
}
