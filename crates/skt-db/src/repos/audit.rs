//! Audit trail repository.
//!
//! Append-only audit events recording every mutation. Supports dynamic
//! filtering, newest first.

use serde::Serialize;

use skt_core::entities::AuditEvent;
use skt_core::enums::{ActorRole, AuditAction, ResourceType};
use skt_core::ids::PREFIX_AUDIT;

use crate::error::DatabaseError;
use crate::helpers::{fmt_ts, get_opt_string, now, parse_datetime, parse_enum, parse_json};
use crate::service::SktService;

/// Actor id recorded when a request names nobody.
pub const SYSTEM_ACTOR: &str = "system";

/// Who performed a mutation, and from where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Actor {
    /// A programme manager with no request metadata.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: ActorRole::ProgrammeManager,
            ip_address: None,
            user_agent: None,
        }
    }

    /// A programme manager named by an optional request field, falling back
    /// to `fallback`.
    pub fn named_or(id: Option<&str>, fallback: &str) -> Self {
        Self::new(id.filter(|s| !s.is_empty()).unwrap_or(fallback))
    }

    /// The service itself, for work done by background jobs and the seeder.
    #[must_use]
    pub fn system() -> Self {
        Self {
            id: SYSTEM_ACTOR.to_string(),
            role: ActorRole::System,
            ip_address: None,
            user_agent: None,
        }
    }

    #[must_use]
    pub fn with_request_meta(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }
}

/// What an audit event records, before it gets an id and timestamp.
pub(crate) struct AuditRecord<'a, M: Serialize> {
    pub programme_id: Option<&'a str>,
    pub action: AuditAction,
    pub resource_type: ResourceType,
    pub resource_id: Option<&'a str>,
    pub meta: M,
}

/// Filter criteria for audit queries.
#[derive(Debug, Default)]
pub struct AuditFilter {
    pub programme_id: Option<String>,
    pub actor_id: Option<String>,
    pub action: Option<AuditAction>,
    pub resource_type: Option<ResourceType>,
    pub limit: Option<u32>,
}

const SELECT_COLS: &str = "id, programme_id, actor_id, actor_role, action, resource_type, \
     resource_id, meta, ip_address, user_agent, created_at";

fn row_to_audit(row: &libsql::Row) -> Result<AuditEvent, DatabaseError> {
    Ok(AuditEvent {
        id: row.get(0)?,
        programme_id: get_opt_string(row, 1)?,
        actor_id: row.get(2)?,
        actor_role: parse_enum(&row.get::<String>(3)?)?,
        action: parse_enum(&row.get::<String>(4)?)?,
        resource_type: parse_enum(&row.get::<String>(5)?)?,
        resource_id: get_opt_string(row, 6)?,
        meta: parse_json(&row.get::<String>(7)?)?,
        ip_address: get_opt_string(row, 8)?,
        user_agent: get_opt_string(row, 9)?,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
    })
}

impl SktService {
    /// Append an audit event. Called by every mutation method.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the INSERT fails.
    pub async fn append_audit(&self, event: &AuditEvent) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "INSERT INTO audit_events (id, programme_id, actor_id, actor_role, action, resource_type, resource_id, meta, ip_address, user_agent, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                libsql::params![
                    event.id.as_str(),
                    event.programme_id.as_deref(),
                    event.actor_id.as_str(),
                    event.actor_role.as_str(),
                    event.action.as_str(),
                    event.resource_type.as_str(),
                    event.resource_id.as_deref(),
                    event.meta.to_string(),
                    event.ip_address.as_deref(),
                    event.user_agent.as_deref(),
                    fmt_ts(event.created_at)
                ],
            )
            .await?;
        Ok(())
    }

    /// Build and append an audit event for `actor`.
    pub(crate) async fn record_audit<M: Serialize>(
        &self,
        actor: &Actor,
        record: AuditRecord<'_, M>,
    ) -> Result<AuditEvent, DatabaseError> {
        let event = AuditEvent {
            id: self.db().generate_id(PREFIX_AUDIT).await?,
            programme_id: record.programme_id.map(String::from),
            actor_id: actor.id.clone(),
            actor_role: actor.role,
            action: record.action,
            resource_type: record.resource_type,
            resource_id: record.resource_id.map(String::from),
            meta: serde_json::to_value(&record.meta)?,
            ip_address: actor.ip_address.clone(),
            user_agent: actor.user_agent.clone(),
            created_at: now(),
        };
        self.append_audit(&event).await?;
        tracing::debug!(action = %event.action, resource = ?event.resource_id, actor = %event.actor_id, "audit event recorded");
        Ok(event)
    }

    /// Query audit events with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditEvent>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref pid) = filter.programme_id {
            params.push(libsql::Value::Text(pid.clone()));
            conditions.push(format!("programme_id = ?{}", params.len()));
        }
        if let Some(ref actor) = filter.actor_id {
            params.push(libsql::Value::Text(actor.clone()));
            conditions.push(format!("actor_id = ?{}", params.len()));
        }
        if let Some(ref action) = filter.action {
            params.push(libsql::Value::Text(action.as_str().to_string()));
            conditions.push(format!("action = ?{}", params.len()));
        }
        if let Some(ref rt) = filter.resource_type {
            params.push(libsql::Value::Text(rt.as_str().to_string()));
            conditions.push(format!("resource_type = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(100);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM audit_events {where_clause}
             ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut events = Vec::new();
        while let Some(row) = rows.next().await? {
            events.push(row_to_audit(&row)?);
        }
        Ok(events)
    }
}
