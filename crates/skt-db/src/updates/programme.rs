//! Programme update builder.

use chrono::{DateTime, Utc};
use serde::Serialize;
use skt_core::enums::{ProgrammeStatus, SponsorType};
use skt_core::validation::ProgrammeChanges;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProgrammeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor_type: Option<SponsorType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sectors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub districts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProgrammeStatus>,
}

impl ProgrammeUpdate {
    /// Whether no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.sponsor_type.is_none()
            && self.name.is_none()
            && self.code.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.sectors.is_none()
            && self.districts.is_none()
            && self.status.is_none()
    }
}

impl From<ProgrammeChanges> for ProgrammeUpdate {
    fn from(changes: ProgrammeChanges) -> Self {
        Self {
            sponsor_type: changes.sponsor_type,
            name: changes.name,
            code: changes.code,
            // An empty description clears it.
            description: changes
                .description
                .map(|d| if d.is_empty() { None } else { Some(d) }),
            start_date: changes.start_date,
            end_date: changes.end_date,
            sectors: changes.sectors,
            districts: changes.districts,
            status: changes.status,
        }
    }
}

pub struct ProgrammeUpdateBuilder(ProgrammeUpdate);

impl ProgrammeUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ProgrammeUpdate::default())
    }

    #[must_use]
    pub const fn sponsor_type(mut self, sponsor_type: SponsorType) -> Self {
        self.0.sponsor_type = Some(sponsor_type);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.0.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.0.description = Some(description);
        self
    }

    #[must_use]
    pub const fn start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.0.start_date = Some(start_date);
        self
    }

    #[must_use]
    pub const fn end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.0.end_date = Some(end_date);
        self
    }

    #[must_use]
    pub fn sectors(mut self, sectors: Vec<String>) -> Self {
        self.0.sectors = Some(sectors);
        self
    }

    #[must_use]
    pub fn districts(mut self, districts: Vec<String>) -> Self {
        self.0.districts = Some(districts);
        self
    }

    #[must_use]
    pub const fn status(mut self, status: ProgrammeStatus) -> Self {
        self.0.status = Some(status);
        self
    }

    #[must_use]
    pub fn build(self) -> ProgrammeUpdate {
        self.0
    }
}

impl Default for ProgrammeUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
