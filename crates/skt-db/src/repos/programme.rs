//! Programme repository: CRUD with JSON-array filters.

use skt_core::audit_detail::{ProgrammeChangesDetail, ProgrammeDetail};
use skt_core::entities::Programme;
use skt_core::enums::{AuditAction, ProgrammeStatus, ResourceType, SponsorType};
use skt_core::ids::PREFIX_PROGRAMME;
use skt_core::responses::{Page, PageRequest, Pagination};
use skt_core::validation::{NewProgramme, check_programme_dates};

use crate::error::DatabaseError;
use crate::helpers::{
    fmt_ts, get_opt_string, get_u64, is_unique_violation, now, parse_datetime, parse_enum,
    parse_json, sql_int, to_json_text,
};
use crate::repos::audit::{Actor, AuditRecord};
use crate::service::SktService;
use crate::updates::programme::ProgrammeUpdate;

const SELECT_COLS: &str = "id, sponsor_type, name, code, description, start_date, end_date, \
     sectors, districts, created_by, status, created_at, updated_at";

fn row_to_programme(row: &libsql::Row) -> Result<Programme, DatabaseError> {
    Ok(Programme {
        id: row.get(0)?,
        sponsor_type: parse_enum(&row.get::<String>(1)?)?,
        name: row.get(2)?,
        code: row.get(3)?,
        description: get_opt_string(row, 4)?,
        start_date: parse_datetime(&row.get::<String>(5)?)?,
        end_date: parse_datetime(&row.get::<String>(6)?)?,
        sectors: parse_json(&row.get::<String>(7)?)?,
        districts: parse_json(&row.get::<String>(8)?)?,
        created_by: row.get(9)?,
        status: parse_enum(&row.get::<String>(10)?)?,
        created_at: parse_datetime(&row.get::<String>(11)?)?,
        updated_at: parse_datetime(&row.get::<String>(12)?)?,
    })
}

fn duplicate_code(code: &str) -> DatabaseError {
    DatabaseError::Validation(format!("Programme code '{code}' already exists"))
}

/// Filter criteria for programme listings.
#[derive(Debug, Default, Clone)]
pub struct ProgrammeFilter {
    pub sponsor_type: Option<SponsorType>,
    /// Matches programmes whose `sectors` contain this value.
    pub sector: Option<String>,
    /// Matches programmes whose `districts` contain this value.
    pub district: Option<String>,
    pub status: Option<ProgrammeStatus>,
}

impl ProgrammeFilter {
    fn where_clause(&self, params: &mut Vec<libsql::Value>) -> String {
        let mut conditions = Vec::new();
        if let Some(sponsor) = self.sponsor_type {
            params.push(sponsor.as_str().into());
            conditions.push(format!("sponsor_type = ?{}", params.len()));
        }
        if let Some(ref sector) = self.sector {
            params.push(sector.clone().into());
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM json_each(programmes.sectors) WHERE json_each.value = ?{})",
                params.len()
            ));
        }
        if let Some(ref district) = self.district {
            params.push(district.clone().into());
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM json_each(programmes.districts) WHERE json_each.value = ?{})",
                params.len()
            ));
        }
        if let Some(status) = self.status {
            params.push(status.as_str().into());
            conditions.push(format!("status = ?{}", params.len()));
        }
        if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        }
    }
}

impl SktService {
    pub async fn create_programme(&self, new: NewProgramme) -> Result<Programme, DatabaseError> {
        let now = now();
        let id = self.db().generate_id(PREFIX_PROGRAMME).await?;

        let result = self
            .db()
            .conn()
            .execute(
                "INSERT INTO programmes (id, sponsor_type, name, code, description, start_date, end_date, sectors, districts, created_by, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                libsql::params![
                    id.as_str(),
                    new.sponsor_type.as_str(),
                    new.name.as_str(),
                    new.code.as_str(),
                    new.description.as_deref(),
                    fmt_ts(new.start_date),
                    fmt_ts(new.end_date),
                    to_json_text(&new.sectors)?,
                    to_json_text(&new.districts)?,
                    new.created_by.as_str(),
                    new.status.as_str(),
                    fmt_ts(now),
                    fmt_ts(now)
                ],
            )
            .await;
        match result {
            Err(e) if is_unique_violation(&e) => return Err(duplicate_code(&new.code)),
            other => {
                other?;
            }
        }

        let programme = Programme {
            id: id.clone(),
            sponsor_type: new.sponsor_type,
            name: new.name,
            code: new.code,
            description: new.description,
            start_date: new.start_date,
            end_date: new.end_date,
            sectors: new.sectors,
            districts: new.districts,
            created_by: new.created_by,
            status: new.status,
            created_at: now,
            updated_at: now,
        };

        self.record_audit(
            &Actor::new(programme.created_by.clone()),
            AuditRecord {
                programme_id: Some(&id),
                action: AuditAction::CreateProgramme,
                resource_type: ResourceType::Programme,
                resource_id: Some(&id),
                meta: ProgrammeDetail {
                    programme_name: programme.name.clone(),
                    programme_code: programme.code.clone(),
                },
            },
        )
        .await?;

        tracing::info!(programme = %id, code = %programme.code, "programme created");
        Ok(programme)
    }

    /// Fetch a programme, or `NotFound("Programme not found")`.
    pub async fn get_programme(&self, id: &str) -> Result<Programme, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM programmes WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("Programme"))?;
        row_to_programme(&row)
    }

    /// List programmes newest first.
    pub async fn list_programmes(
        &self,
        filter: &ProgrammeFilter,
        page: PageRequest,
    ) -> Result<Page<Programme>, DatabaseError> {
        let mut params: Vec<libsql::Value> = Vec::new();
        let where_clause = filter.where_clause(&mut params);

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT COUNT(*) FROM programmes {where_clause}"),
                libsql::params_from_iter(params.clone()),
            )
            .await?;
        let total = match rows.next().await? {
            Some(row) => get_u64(&row, 0)?,
            None => 0,
        };

        let sql = format!(
            "SELECT {SELECT_COLS} FROM programmes {where_clause}
             ORDER BY created_at DESC, rowid DESC LIMIT {} OFFSET {}",
            page.limit,
            sql_int(page.offset())
        );
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_programme(&row)?);
        }

        Ok(Page {
            items,
            pagination: Pagination::new(page.page, page.limit, total),
        })
    }

    /// Every programme, newest first. Used by the seeder and CLI.
    pub async fn all_programmes(&self, filter: &ProgrammeFilter) -> Result<Vec<Programme>, DatabaseError> {
        let mut params: Vec<libsql::Value> = Vec::new();
        let where_clause = filter.where_clause(&mut params);
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM programmes {where_clause} ORDER BY created_at DESC, rowid DESC"
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_programme(&row)?);
        }
        Ok(items)
    }

    /// Apply a partial update. The resulting date pair must stay ordered.
    pub async fn update_programme(
        &self,
        programme_id: &str,
        update: ProgrammeUpdate,
        actor: &Actor,
    ) -> Result<Programme, DatabaseError> {
        let current = self.get_programme(programme_id).await?;
        if update.is_empty() {
            return Ok(current);
        }

        let start = update.start_date.unwrap_or(current.start_date);
        let end = update.end_date.unwrap_or(current.end_date);
        check_programme_dates(start, end)?;

        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1usize;

        if let Some(sponsor) = update.sponsor_type {
            sets.push(format!("sponsor_type = ?{idx}"));
            params.push(sponsor.as_str().into());
            idx += 1;
        }
        if let Some(ref name) = update.name {
            sets.push(format!("name = ?{idx}"));
            params.push(name.clone().into());
            idx += 1;
        }
        if let Some(ref code) = update.code {
            sets.push(format!("code = ?{idx}"));
            params.push(code.clone().into());
            idx += 1;
        }
        if let Some(ref description) = update.description {
            sets.push(format!("description = ?{idx}"));
            params.push(description.clone().map_or(libsql::Value::Null, Into::into));
            idx += 1;
        }
        if let Some(start_date) = update.start_date {
            sets.push(format!("start_date = ?{idx}"));
            params.push(fmt_ts(start_date).into());
            idx += 1;
        }
        if let Some(end_date) = update.end_date {
            sets.push(format!("end_date = ?{idx}"));
            params.push(fmt_ts(end_date).into());
            idx += 1;
        }
        if let Some(ref sectors) = update.sectors {
            sets.push(format!("sectors = ?{idx}"));
            params.push(to_json_text(sectors)?.into());
            idx += 1;
        }
        if let Some(ref districts) = update.districts {
            sets.push(format!("districts = ?{idx}"));
            params.push(to_json_text(districts)?.into());
            idx += 1;
        }
        if let Some(status) = update.status {
            sets.push(format!("status = ?{idx}"));
            params.push(status.as_str().into());
            idx += 1;
        }

        sets.push(format!("updated_at = ?{idx}"));
        params.push(fmt_ts(now()).into());
        idx += 1;

        params.push(programme_id.into());
        let sql = format!("UPDATE programmes SET {} WHERE id = ?{idx}", sets.join(", "));
        match self
            .db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await
        {
            Err(e) if is_unique_violation(&e) => {
                return Err(duplicate_code(update.code.as_deref().unwrap_or_default()));
            }
            other => {
                other?;
            }
        }

        let updated = self.get_programme(programme_id).await?;

        self.record_audit(
            actor,
            AuditRecord {
                programme_id: Some(programme_id),
                action: AuditAction::UpdateProgramme,
                resource_type: ResourceType::Programme,
                resource_id: Some(programme_id),
                meta: ProgrammeChangesDetail {
                    changes: serde_json::to_value(&update)?,
                },
            },
        )
        .await?;

        Ok(updated)
    }

    /// Delete a programme with its targets and funding rules. Beneficiaries,
    /// bundles, and export jobs are kept.
    pub async fn delete_programme(
        &self,
        programme_id: &str,
        actor: &Actor,
    ) -> Result<Programme, DatabaseError> {
        let programme = self.get_programme(programme_id).await?;

        let conn = self.db().conn();
        conn.execute(
            "DELETE FROM programme_targets WHERE programme_id = ?1",
            [programme_id],
        )
        .await?;
        conn.execute(
            "DELETE FROM funding_rules WHERE programme_id = ?1",
            [programme_id],
        )
        .await?;
        conn.execute("DELETE FROM programmes WHERE id = ?1", [programme_id])
            .await?;

        self.record_audit(
            actor,
            AuditRecord {
                programme_id: Some(programme_id),
                action: AuditAction::DeleteProgramme,
                resource_type: ResourceType::Programme,
                resource_id: Some(programme_id),
                meta: ProgrammeDetail {
                    programme_name: programme.name.clone(),
                    programme_code: programme.code.clone(),
                },
            },
        )
        .await?;

        tracing::info!(programme = %programme_id, "programme deleted");
        Ok(programme)
    }
}
