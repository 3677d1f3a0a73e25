//! Serde roundtrip and JsonSchema validation tests for all entity types.

use chrono::{Duration, Utc};
use schemars::schema_for;
use skt_core::audit_detail::{
    BulkImportDetail, EvidenceRequestedDetail, ProgrammeDetail, StatusChangedDetail,
};
use skt_core::entities::*;
use skt_core::enums::*;
use skt_core::responses::*;

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            // Serde roundtrip
            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(
                recovered,
                val,
                "serde roundtrip failed for {}",
                stringify!($ty)
            );

            // Schema validation
            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

fn beneficiary() -> Beneficiary {
    Beneficiary {
        id: "ben-0a1b2c3d".into(),
        learner_id: "LEARNER001".into(),
        programme_id: "prg-a3f8b2c1".into(),
        institution_id: Some("ITI-PUNE".into()),
        cohort_code: Some("C-2025-01".into()),
        district: Some("Pune".into()),
        enrolled_at: Utc::now(),
        eligibility: serde_json::json!({"age": 21, "bpl": true}),
        status: BeneficiaryStatus::Certified,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

roundtrip_and_validate!(
    programme_roundtrip,
    Programme,
    Programme {
        id: "prg-a3f8b2c1".into(),
        sponsor_type: SponsorType::Gov,
        name: "Pune Skilling Drive".into(),
        code: "PSD25".into(),
        description: Some("Retail and IT skilling".into()),
        start_date: Utc::now(),
        end_date: Utc::now() + Duration::days(180),
        sectors: vec!["IT".into(), "Retail".into()],
        districts: vec!["Pune".into(), "Mumbai".into()],
        created_by: "mgr-1".into(),
        status: ProgrammeStatus::Active,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    target_roundtrip,
    ProgrammeTarget,
    ProgrammeTarget {
        id: "tgt-11223344".into(),
        programme_id: "prg-a3f8b2c1".into(),
        metric: TargetMetric::Retention90d,
        target_value: 250.0,
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    funding_rule_roundtrip,
    FundingRule,
    FundingRule {
        id: "fnd-55667788".into(),
        programme_id: "prg-a3f8b2c1".into(),
        rule_type: FundingRuleType::PerPlacement,
        amount: 7500.0,
        currency: "INR".into(),
        conditions: serde_json::json!({"min_ctc": 180_000}),
        active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(beneficiary_roundtrip, Beneficiary, beneficiary());

roundtrip_and_validate!(
    progress_roundtrip,
    ProgressRecord,
    ProgressRecord {
        id: "prr-99aabbcc".into(),
        beneficiary_id: "ben-0a1b2c3d".into(),
        training_pct: 85.5,
        last_assessment_id: Some("asm-1".into()),
        last_skillscore: Some(72.25),
        last_updated: Utc::now(),
        milestones: vec![Milestone {
            milestone_type: MilestoneType::AssessmentPassed,
            achieved_at: Utc::now(),
            metadata: serde_json::json!({"score": 72.25}),
        }],
    }
);

roundtrip_and_validate!(
    placement_roundtrip,
    PlacementRecord,
    PlacementRecord {
        id: "plc-ddeeff00".into(),
        beneficiary_id: "ben-0a1b2c3d".into(),
        job_id: Some("JOB-7".into()),
        employer_id: Some("EMP-3".into()),
        offer_date: Some(Utc::now()),
        join_date: None,
        ctc: Some(240_000.0),
        currency: "INR".into(),
        location: Some("Pune".into()),
        retained_30d: true,
        retained_90d: false,
        status: PlacementStatus::Joined,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    evidence_bundle_roundtrip,
    EvidenceBundle,
    EvidenceBundle {
        id: "evb-12345678".into(),
        programme_id: "prg-a3f8b2c1".into(),
        beneficiary_id: None,
        bundle_type: EvidenceType::Full,
        items: vec![EvidenceItem {
            kind: EvidenceItemKind::ProgrammeInfo,
            url: "programme_prg-a3f8b2c1.json".into(),
            ts: Utc::now(),
            checksum: Some("d41d8cd98f00b204e9800998ecf8427e".into()),
        }],
        generated_at: Utc::now(),
        requested_by: "mgr-1".into(),
        expires_at: Utc::now() + Duration::days(7),
        status: EvidenceStatus::Ready,
        download_count: 2,
        file_size: Some(1024),
        error_message: None,
    }
);

roundtrip_and_validate!(
    export_job_roundtrip,
    ExportJob,
    ExportJob {
        id: "exp-87654321".into(),
        programme_id: "prg-a3f8b2c1".into(),
        format: ExportFormat::Nsdc,
        destination: ExportDestination::Api,
        status: ExportStatus::Completed,
        requested_by: "mgr-1".into(),
        requested_at: Utc::now(),
        completed_at: Some(Utc::now()),
        file_path: Some("exports/nsdc_export_PSD25_1736000000000.json".into()),
        error_message: None,
        filters: ExportFilters {
            status: Some(BeneficiaryStatus::Placed),
            district: Some("Pune".into()),
            institution: None,
        },
        include_pii: true,
    }
);

roundtrip_and_validate!(
    audit_event_roundtrip,
    AuditEvent,
    AuditEvent {
        id: "aud-a1b2c3d4".into(),
        programme_id: Some("prg-a3f8b2c1".into()),
        actor_id: "mgr-1".into(),
        actor_role: ActorRole::ProgrammeManager,
        action: AuditAction::UpdateBeneficiaryStatus,
        resource_type: ResourceType::Beneficiary,
        resource_id: Some("ben-0a1b2c3d".into()),
        meta: serde_json::to_value(StatusChangedDetail {
            old_status: BeneficiaryStatus::Training,
            new_status: BeneficiaryStatus::Certified,
        })
        .unwrap(),
        ip_address: Some("127.0.0.1".into()),
        user_agent: None,
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    beneficiary_detail_roundtrip,
    BeneficiaryDetail,
    BeneficiaryDetail {
        beneficiary: beneficiary(),
        progress_record: None,
        placement_record: None,
    }
);

roundtrip_and_validate!(
    dashboard_roundtrip,
    Dashboard,
    Dashboard {
        period: "30d".into(),
        kpis: DashboardKpis {
            trained: KpiProgress {
                value: 3,
                target: 10.0,
                percentage: 30.0,
            },
            certified: KpiProgress {
                value: 2,
                target: 0.0,
                percentage: 0.0,
            },
            placed: KpiProgress {
                value: 1,
                target: 4.0,
                percentage: 25.0,
            },
            skillscore_uplift: MedianKpi { median: 64.5 },
            median_ctc: ValueKpi { value: 210_000.0 },
        },
        breakdown: Breakdown {
            by_district: vec![DistrictBreakdown {
                code: "Pune".into(),
                certified: 1,
                placed: 1,
            }],
        },
        trends: vec![TrendPoint {
            date: "2025-01-02".into(),
            count: 1,
        }],
    }
);

roundtrip_and_validate!(
    cost_kpis_roundtrip,
    CostKpis,
    CostKpis {
        cost_breakdown: vec![CostLine {
            rule_type: FundingRuleType::PerCert,
            amount_per_unit: 5000.0,
            eligible_count: 2,
            total_potential: 10_000.0,
            currency: "INR".into(),
        }],
        total_potential_cost: 10_000.0,
        currency: "INR".into(),
    }
);

roundtrip_and_validate!(
    import_report_roundtrip,
    ImportReport,
    ImportReport {
        total: 3,
        successful: 2,
        failed: 1,
        errors: vec![ImportRowError {
            row: 2,
            error: "learner_id is required".into(),
            data: serde_json::Map::new(),
        }],
    }
);

roundtrip_and_validate!(
    programme_detail_roundtrip,
    ProgrammeDetail,
    ProgrammeDetail {
        programme_name: "Pune Skilling Drive".into(),
        programme_code: "PSD25".into(),
    }
);

roundtrip_and_validate!(
    bulk_import_detail_roundtrip,
    BulkImportDetail,
    BulkImportDetail {
        total_rows: 10,
        successful: 9,
        failed: 1,
        filename: "learners.csv".into(),
    }
);

roundtrip_and_validate!(
    evidence_requested_detail_roundtrip,
    EvidenceRequestedDetail,
    EvidenceRequestedDetail {
        bundle_type: EvidenceType::Attendance,
        beneficiary_id: Some("ben-0a1b2c3d".into()),
        expires_in_days: 7,
    }
);

#[test]
fn evidence_bundle_uses_type_key() {
    let item = EvidenceItem {
        kind: EvidenceItemKind::PlacementRecord,
        url: "placement_ben-1.json".into(),
        ts: Utc::now(),
        checksum: None,
    };
    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["type"], "PLACEMENT_RECORD");
}

#[test]
fn beneficiary_detail_flattens_beneficiary() {
    let detail = BeneficiaryDetail {
        beneficiary: beneficiary(),
        progress_record: None,
        placement_record: None,
    };
    let json = serde_json::to_value(&detail).unwrap();
    assert_eq!(json["learner_id"], "LEARNER001");
    assert!(json["progress_record"].is_null());
}

#[test]
fn export_filters_omit_unset_fields() {
    let json = serde_json::to_value(ExportFilters::default()).unwrap();
    assert_eq!(json, serde_json::json!({}));
}
