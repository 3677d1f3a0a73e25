use schemars::{Schema, schema_for};
use skt_core::entities::{
    AuditEvent, Beneficiary, EvidenceBundle, ExportJob, FundingRule, PlacementRecord, Programme,
    ProgrammeTarget, ProgressRecord,
};
use skt_core::responses::{BeneficiaryDetail, CostKpis, Dashboard, ImportReport};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SchemaArgs;
use crate::output::output;

/// Type names accepted by `skt schema`.
pub const SCHEMA_TYPES: &[&str] = &[
    "programme",
    "target",
    "funding-rule",
    "beneficiary",
    "beneficiary-detail",
    "progress",
    "placement",
    "evidence-bundle",
    "export-job",
    "audit-event",
    "dashboard",
    "cost-kpis",
    "import-report",
];

/// JSON Schema for a type name. Underscores and case are forgiven.
pub fn schema_for_type(type_name: &str) -> Option<Schema> {
    let schema = match type_name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
        "programme" => schema_for!(Programme),
        "target" => schema_for!(ProgrammeTarget),
        "funding-rule" => schema_for!(FundingRule),
        "beneficiary" => schema_for!(Beneficiary),
        "beneficiary-detail" => schema_for!(BeneficiaryDetail),
        "progress" => schema_for!(ProgressRecord),
        "placement" => schema_for!(PlacementRecord),
        "evidence-bundle" => schema_for!(EvidenceBundle),
        "export-job" => schema_for!(ExportJob),
        "audit-event" => schema_for!(AuditEvent),
        "dashboard" => schema_for!(Dashboard),
        "cost-kpis" => schema_for!(CostKpis),
        "import-report" => schema_for!(ImportReport),
        _ => return None,
    };
    Some(schema)
}

/// Handle `skt schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let schema = schema_for_type(&args.type_name).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown type '{}'; expected one of: {}",
            args.type_name,
            SCHEMA_TYPES.join(", ")
        )
    })?;
    output(&schema, flags.format)
}

#[cfg(test)]
mod tests {
    use super::{SCHEMA_TYPES, schema_for_type};

    #[test]
    fn every_listed_type_has_a_schema() {
        for name in SCHEMA_TYPES {
            assert!(schema_for_type(name).is_some(), "missing schema for {name}");
        }
    }

    #[test]
    fn names_are_normalized() {
        let schema = schema_for_type("Export_Job").expect("export job schema");
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["title"], "ExportJob");
        assert!(json["properties"].get("include_pii").is_some());
    }

    #[test]
    fn unknown_type_is_none() {
        assert!(schema_for_type("session").is_none());
    }
}
