use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ActorRole, AuditAction, ResourceType};

/// An append-only record of a mutation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AuditEvent {
    pub id: String,
    pub programme_id: Option<String>,
    pub actor_id: String,
    pub actor_role: ActorRole,
    pub action: AuditAction,
    pub resource_type: ResourceType,
    pub resource_id: Option<String>,
    /// Action-specific payload. See `audit_detail` for the typed shapes.
    pub meta: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}
