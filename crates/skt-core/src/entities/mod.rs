//! Entity structs for all SkillTrack domain objects.
//!
//! Each entity maps to a table in the libSQL database (see `skt-db/migrations`).
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON roundtrip
//! and schema validation.

mod audit;
mod beneficiary;
mod evidence;
mod export_job;
mod funding_rule;
mod placement;
mod programme;
mod progress;
mod target;

pub use audit::AuditEvent;
pub use beneficiary::Beneficiary;
pub use evidence::{EvidenceBundle, EvidenceItem};
pub use export_job::{ExportFilters, ExportJob};
pub use funding_rule::FundingRule;
pub use placement::PlacementRecord;
pub use programme::Programme;
pub use progress::{Milestone, ProgressRecord};
pub use target::ProgrammeTarget;
