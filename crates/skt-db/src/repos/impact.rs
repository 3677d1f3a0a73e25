//! Impact queries: dashboard KPIs, district breakdown, trends, and cost
//! projections.
//!
//! Counting happens in SQL with `GROUP BY`; medians are computed in Rust from
//! the fetched column via `skt_core::impact`.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use skt_core::enums::{BeneficiaryStatus, FundingRuleType, TargetMetric};
use skt_core::impact::{
    DashboardWindow, UNASSIGNED_DISTRICT, median, round2, target_percentage, trend_statuses,
};
use skt_core::responses::{
    Breakdown, CostKpis, CostLine, Dashboard, DashboardKpis, DistrictBreakdown, KpiProgress,
    MedianKpi, StatusCounts, TrendPoint, ValueKpi,
};

use crate::error::DatabaseError;
use crate::helpers::{fmt_ts, get_u64, now, parse_enum};
use crate::repos::beneficiary::BeneficiaryScope;
use crate::service::SktService;

/// Currency reported for the projected total.
const REPORTING_CURRENCY: &str = "INR";

/// Widest trend window, one century.
pub const MAX_TREND_DAYS: u32 = 36_500;

impl SktService {
    /// Dashboard for a programme. `scope` narrows every figure by district
    /// and institution; its status is ignored.
    pub async fn impact_dashboard(
        &self,
        programme_id: &str,
        window: DashboardWindow,
        scope: &BeneficiaryScope,
    ) -> Result<Dashboard, DatabaseError> {
        self.get_programme(programme_id).await?;
        let scope = BeneficiaryScope {
            status: None,
            ..scope.clone()
        };

        let targets: HashMap<TargetMetric, f64> = self
            .list_targets(programme_id)
            .await?
            .into_iter()
            .map(|t| (t.metric, t.target_value))
            .collect();
        let target = |metric| targets.get(&metric).copied().unwrap_or(0.0);
        let kpi = |value: u64, metric| KpiProgress {
            value,
            target: target(metric),
            percentage: target_percentage(value, target(metric)),
        };

        let counts = self.status_counts(programme_id, &scope).await?;

        let mut scores = self
            .scoped_column(
                programme_id,
                &scope,
                "SELECT p.last_skillscore FROM progress_records p
                 JOIN beneficiaries b ON b.id = p.beneficiary_id
                 WHERE b.programme_id = ?1 AND p.last_skillscore IS NOT NULL",
            )
            .await?;
        let mut ctcs = self
            .scoped_column(
                programme_id,
                &scope,
                "SELECT pl.ctc FROM placement_records pl
                 JOIN beneficiaries b ON b.id = pl.beneficiary_id
                 WHERE b.programme_id = ?1 AND pl.ctc IS NOT NULL",
            )
            .await?;

        let kpis = DashboardKpis {
            trained: kpi(counts.trained(), TargetMetric::Trained),
            certified: kpi(counts.certified, TargetMetric::Certified),
            placed: kpi(counts.placed, TargetMetric::Placed),
            skillscore_uplift: MedianKpi {
                median: median(&mut scores).map_or(0.0, round2),
            },
            median_ctc: ValueKpi {
                value: median(&mut ctcs).map_or(0.0, f64::round),
            },
        };

        let by_district = self.district_breakdown(programme_id, &scope).await?;
        let trends = self
            .trend_points(programme_id, &scope, None, window.start(now()))
            .await?;

        Ok(Dashboard {
            period: window.as_str().to_string(),
            kpis,
            breakdown: Breakdown { by_district },
            trends,
        })
    }

    /// Projected payouts of the programme's active funding rules.
    pub async fn cost_kpis(&self, programme_id: &str) -> Result<CostKpis, DatabaseError> {
        self.get_programme(programme_id).await?;
        let rules = self.list_funding_rules(programme_id, true).await?;
        let counts = self
            .status_counts(programme_id, &BeneficiaryScope::default())
            .await?;

        let cost_breakdown: Vec<CostLine> = rules
            .into_iter()
            .map(|rule| {
                let eligible_count = match rule.rule_type {
                    FundingRuleType::PerCert => counts.certified,
                    FundingRuleType::PerPlacement | FundingRuleType::RetentionBonus => {
                        counts.placed
                    }
                };
                #[allow(clippy::cast_precision_loss)]
                let total_potential = eligible_count as f64 * rule.amount;
                CostLine {
                    rule_type: rule.rule_type,
                    amount_per_unit: rule.amount,
                    eligible_count,
                    total_potential,
                    currency: rule.currency,
                }
            })
            .collect();
        let total_potential_cost = cost_breakdown.iter().map(|l| l.total_potential).sum();

        Ok(CostKpis {
            cost_breakdown,
            total_potential_cost,
            currency: REPORTING_CURRENCY.to_string(),
        })
    }

    /// Daily enrolment counts over the last `days` days for the statuses a
    /// metric names (`TRAINED`, `CERTIFIED`, `PLACED`; anything else counts
    /// everyone).
    pub async fn trends(
        &self,
        programme_id: &str,
        metric: &str,
        days: u32,
    ) -> Result<Vec<TrendPoint>, DatabaseError> {
        if days > MAX_TREND_DAYS {
            return Err(DatabaseError::Validation(format!(
                "\"days\" must be less than or equal to {MAX_TREND_DAYS}"
            )));
        }
        self.get_programme(programme_id).await?;
        let start = now()
            .checked_sub_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| DatabaseError::Validation("\"days\" is out of range".into()))?;
        self.trend_points(
            programme_id,
            &BeneficiaryScope::default(),
            trend_statuses(metric),
            start,
        )
        .await
    }

    /// Beneficiary counts per status within `scope`.
    pub async fn status_counts(
        &self,
        programme_id: &str,
        scope: &BeneficiaryScope,
    ) -> Result<StatusCounts, DatabaseError> {
        let mut params: Vec<libsql::Value> = vec![programme_id.into()];
        let scope_clause = scope.and_clause("", &mut params);
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT status, COUNT(*) FROM beneficiaries
                     WHERE programme_id = ?1{scope_clause} GROUP BY status"
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut counts = StatusCounts::default();
        while let Some(row) = rows.next().await? {
            let status: BeneficiaryStatus = parse_enum(&row.get::<String>(0)?)?;
            counts.add(status, get_u64(&row, 1)?);
        }
        Ok(counts)
    }

    /// Values of the single REAL column `sql` selects, with the scope applied
    /// to its `b.` beneficiary join.
    async fn scoped_column(
        &self,
        programme_id: &str,
        scope: &BeneficiaryScope,
        sql: &str,
    ) -> Result<Vec<f64>, DatabaseError> {
        let mut params: Vec<libsql::Value> = vec![programme_id.into()];
        let scope_clause = scope.and_clause("b.", &mut params);
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("{sql}{scope_clause}"),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut values = Vec::new();
        while let Some(row) = rows.next().await? {
            values.push(row.get::<f64>(0)?);
        }
        Ok(values)
    }

    async fn district_breakdown(
        &self,
        programme_id: &str,
        scope: &BeneficiaryScope,
    ) -> Result<Vec<DistrictBreakdown>, DatabaseError> {
        let mut params: Vec<libsql::Value> =
            vec![programme_id.into(), UNASSIGNED_DISTRICT.into()];
        let scope_clause = scope.and_clause("", &mut params);
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT coalesce(nullif(district, ''), ?2) AS code,
                            SUM(status = 'CERTIFIED'), SUM(status = 'PLACED')
                     FROM beneficiaries
                     WHERE programme_id = ?1 AND status IN ('CERTIFIED', 'PLACED'){scope_clause}
                     GROUP BY code
                     ORDER BY 2 DESC, code ASC"
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut breakdown = Vec::new();
        while let Some(row) = rows.next().await? {
            breakdown.push(DistrictBreakdown {
                code: row.get(0)?,
                certified: get_u64(&row, 1)?,
                placed: get_u64(&row, 2)?,
            });
        }
        Ok(breakdown)
    }

    async fn trend_points(
        &self,
        programme_id: &str,
        scope: &BeneficiaryScope,
        statuses: Option<&[BeneficiaryStatus]>,
        start: DateTime<Utc>,
    ) -> Result<Vec<TrendPoint>, DatabaseError> {
        let mut params: Vec<libsql::Value> = vec![programme_id.into(), fmt_ts(start).into()];
        let mut scope_clause = scope.and_clause("", &mut params);
        if let Some(statuses) = statuses {
            let mut placeholders = Vec::with_capacity(statuses.len());
            for status in statuses {
                params.push(status.as_str().into());
                placeholders.push(format!("?{}", params.len()));
            }
            scope_clause.push_str(&format!(" AND status IN ({})", placeholders.join(", ")));
        }

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT substr(enrolled_at, 1, 10) AS day, COUNT(*) FROM beneficiaries
                     WHERE programme_id = ?1 AND enrolled_at >= ?2{scope_clause}
                     GROUP BY day ORDER BY day ASC"
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut points = Vec::new();
        while let Some(row) = rows.next().await? {
            points.push(TrendPoint {
                date: row.get(0)?,
                count: get_u64(&row, 1)?,
            });
        }
        Ok(points)
    }
}
