//! Notification sink contract.
//!
//! Notifications are fired to a named template with structured
//! context. Delivery failures are logged by the caller and never block
//! the triggering operation.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationTemplate {
    ApprovalNeeded,
    RequestApproved,
    RequestRejected,
}

impl NotificationTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationTemplate::ApprovalNeeded => "approval-needed",
            NotificationTemplate::RequestApproved => "request-approved",
            NotificationTemplate::RequestRejected => "request-rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationRecipient {
    User(Uuid),
    WorkspaceAdmins(Uuid),
    PlatformAdmins,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub template: NotificationTemplate,
    pub recipient: NotificationRecipient,
    pub context: serde_json::Value,
}

#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotificationError(pub String);

pub trait NotificationSink: Send + Sync {
    fn send(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;
}
