//! Tagged entity references.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reference to another entity: the ID is always present, and an
/// expanded payload may be attached when the query depth warrants it.
/// Consumers branch on `expanded` being present, never on the runtime
/// shape of the field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRef<T> {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded: Option<Box<T>>,
}

impl<T> EntityRef<T> {
    pub fn id_only(id: Uuid) -> Self {
        Self { id, expanded: None }
    }

    pub fn expanded(id: Uuid, value: T) -> Self {
        Self {
            id,
            expanded: Some(Box::new(value)),
        }
    }
}
