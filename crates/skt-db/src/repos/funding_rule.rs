//! Funding rule repository.

use skt_core::audit_detail::FundingRuleDetail;
use skt_core::entities::FundingRule;
use skt_core::enums::{AuditAction, ResourceType};
use skt_core::ids::PREFIX_FUNDING_RULE;
use skt_core::validation::NewFundingRule;

use crate::error::DatabaseError;
use crate::helpers::{fmt_ts, get_bool, now, parse_datetime, parse_enum, parse_json, to_json_text};
use crate::repos::audit::{Actor, AuditRecord};
use crate::service::SktService;

const SELECT_COLS: &str =
    "id, programme_id, rule_type, amount, currency, conditions, active, created_at, updated_at";

fn row_to_funding_rule(row: &libsql::Row) -> Result<FundingRule, DatabaseError> {
    Ok(FundingRule {
        id: row.get(0)?,
        programme_id: row.get(1)?,
        rule_type: parse_enum(&row.get::<String>(2)?)?,
        amount: row.get(3)?,
        currency: row.get(4)?,
        conditions: parse_json(&row.get::<String>(5)?)?,
        active: get_bool(row, 6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        updated_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

impl SktService {
    pub async fn add_funding_rule(
        &self,
        programme_id: &str,
        new: NewFundingRule,
        actor: &Actor,
    ) -> Result<FundingRule, DatabaseError> {
        self.get_programme(programme_id).await?;

        let now = now();
        let id = self.db().generate_id(PREFIX_FUNDING_RULE).await?;
        self.db()
            .conn()
            .execute(
                "INSERT INTO funding_rules (id, programme_id, rule_type, amount, currency, conditions, active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                libsql::params![
                    id.as_str(),
                    programme_id,
                    new.rule_type.as_str(),
                    new.amount,
                    new.currency.as_str(),
                    to_json_text(&new.conditions)?,
                    i64::from(new.active),
                    fmt_ts(now),
                    fmt_ts(now)
                ],
            )
            .await?;

        let rule = FundingRule {
            id: id.clone(),
            programme_id: programme_id.to_string(),
            rule_type: new.rule_type,
            amount: new.amount,
            currency: new.currency,
            conditions: new.conditions,
            active: new.active,
            created_at: now,
            updated_at: now,
        };

        self.record_audit(
            actor,
            AuditRecord {
                programme_id: Some(programme_id),
                action: AuditAction::AddFundingRule,
                resource_type: ResourceType::FundingRule,
                resource_id: Some(&id),
                meta: FundingRuleDetail {
                    rule_type: rule.rule_type,
                    amount: rule.amount,
                },
            },
        )
        .await?;

        Ok(rule)
    }

    /// Funding rules of a programme, oldest first. `active_only` hides
    /// deactivated rules.
    pub async fn list_funding_rules(
        &self,
        programme_id: &str,
        active_only: bool,
    ) -> Result<Vec<FundingRule>, DatabaseError> {
        let filter = if active_only { " AND active = 1" } else { "" };
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM funding_rules WHERE programme_id = ?1{filter}
                     ORDER BY created_at ASC, rowid ASC"
                ),
                [programme_id],
            )
            .await?;
        let mut rules = Vec::new();
        while let Some(row) = rows.next().await? {
            rules.push(row_to_funding_rule(&row)?);
        }
        Ok(rules)
    }
}
