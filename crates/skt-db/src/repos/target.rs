//! Programme target repository.

use skt_core::audit_detail::TargetDetail;
use skt_core::entities::ProgrammeTarget;
use skt_core::enums::{AuditAction, ResourceType};
use skt_core::ids::PREFIX_TARGET;
use skt_core::validation::NewTarget;

use crate::error::DatabaseError;
use crate::helpers::{fmt_ts, is_unique_violation, now, parse_datetime, parse_enum};
use crate::repos::audit::{Actor, AuditRecord};
use crate::service::SktService;

const SELECT_COLS: &str = "id, programme_id, metric, target_value, created_at";

fn row_to_target(row: &libsql::Row) -> Result<ProgrammeTarget, DatabaseError> {
    Ok(ProgrammeTarget {
        id: row.get(0)?,
        programme_id: row.get(1)?,
        metric: parse_enum(&row.get::<String>(2)?)?,
        target_value: row.get(3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

impl SktService {
    /// Add a target to a programme. Each metric may be targeted once.
    pub async fn add_target(
        &self,
        programme_id: &str,
        new: NewTarget,
        actor: &Actor,
    ) -> Result<ProgrammeTarget, DatabaseError> {
        self.get_programme(programme_id).await?;

        let now = now();
        let id = self.db().generate_id(PREFIX_TARGET).await?;
        let result = self
            .db()
            .conn()
            .execute(
                "INSERT INTO programme_targets (id, programme_id, metric, target_value, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    id.as_str(),
                    programme_id,
                    new.metric.as_str(),
                    new.target_value,
                    fmt_ts(now)
                ],
            )
            .await;
        match result {
            Err(e) if is_unique_violation(&e) => {
                return Err(DatabaseError::Validation(format!(
                    "Target for metric {} already exists for this programme",
                    new.metric
                )));
            }
            other => {
                other?;
            }
        }

        let target = ProgrammeTarget {
            id: id.clone(),
            programme_id: programme_id.to_string(),
            metric: new.metric,
            target_value: new.target_value,
            created_at: now,
        };

        self.record_audit(
            actor,
            AuditRecord {
                programme_id: Some(programme_id),
                action: AuditAction::AddTarget,
                resource_type: ResourceType::Target,
                resource_id: Some(&id),
                meta: TargetDetail {
                    metric: target.metric,
                    target_value: target.target_value,
                },
            },
        )
        .await?;

        Ok(target)
    }

    /// Targets of a programme, oldest first.
    pub async fn list_targets(&self, programme_id: &str) -> Result<Vec<ProgrammeTarget>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM programme_targets WHERE programme_id = ?1
                     ORDER BY created_at ASC, rowid ASC"
                ),
                [programme_id],
            )
            .await?;
        let mut targets = Vec::new();
        while let Some(row) = rows.next().await? {
            targets.push(row_to_target(&row)?);
        }
        Ok(targets)
    }
}
