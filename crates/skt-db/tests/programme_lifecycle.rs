//! End-to-end flow through the service layer: a programme is set up, learners
//! are imported and progress, and the impact, evidence, export, and audit
//! views reflect it.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use skt_core::entities::ExportFilters;
use skt_core::enums::{
    AuditAction, BeneficiaryStatus, EvidenceStatus, EvidenceType, ExportDestination, ExportFormat,
    ExportSchedule, ExportStatus, MilestoneType,
};
use skt_core::impact::DashboardWindow;
use skt_core::responses::PageRequest;
use skt_core::validation::{
    FundingRuleRequest, NewEvidenceBundle, NewExportJob, PlacementRequest, ProgrammeRequest,
    ProgressUpdate, TargetRequest,
};
use skt_db::jobs::{spawn_evidence_bundle, spawn_export_job};
use skt_db::repos::audit::{Actor, AuditFilter};
use skt_db::repos::beneficiary::{BeneficiaryFilter, BeneficiaryScope};
use skt_db::service::SktService;

const LEARNERS: &str = "\
learner_id,institution_id,cohort_code,district
LEARNER001,ITI-PUNE,C1,Pune
LEARNER002,ITI-PUNE,C1,Pune
LEARNER003,ITI-MUM,C2,Mumbai
,ITI-MUM,C2,Mumbai
LEARNER001,ITI-PUNE,C1,Pune
";

async fn service() -> Arc<SktService> {
    Arc::new(SktService::new_local(":memory:").await.unwrap())
}

fn manager() -> Actor {
    Actor::new("mgr-1")
}

#[tokio::test]
async fn programme_lifecycle() {
    let svc = service().await;

    let programme = svc
        .create_programme(
            ProgrammeRequest {
                sponsor_type: Some("CSR".into()),
                name: Some("Maharashtra Retail Skilling".into()),
                code: Some("MRS25".into()),
                start_date: Some("2025-01-01".into()),
                end_date: Some("2025-12-31".into()),
                sectors: Some(vec!["Retail".into()]),
                districts: Some(vec!["Pune".into(), "Mumbai".into()]),
                created_by: Some("mgr-1".into()),
                ..ProgrammeRequest::default()
            }
            .validate()
            .unwrap(),
        )
        .await
        .unwrap();

    for (metric, value) in [("TRAINED", 3.0), ("PLACED", 2.0)] {
        let target = TargetRequest {
            metric: Some(metric.into()),
            target_value: Some(value),
            ..TargetRequest::default()
        }
        .validate()
        .unwrap();
        svc.add_target(&programme.id, target, &manager()).await.unwrap();
    }
    let rule = FundingRuleRequest {
        rule_type: Some("PER_PLACEMENT".into()),
        amount: Some(7500.0),
        ..FundingRuleRequest::default()
    }
    .validate()
    .unwrap();
    svc.add_funding_rule(&programme.id, rule, &manager()).await.unwrap();

    // Import: three new learners, one missing id, one duplicate.
    let report = svc
        .import_beneficiaries_csv(&programme.id, LEARNERS.as_bytes(), "learners.csv", &manager())
        .await
        .unwrap();
    assert_eq!((report.total, report.successful, report.failed), (5, 3, 2));

    let page = svc
        .list_beneficiaries(
            &programme.id,
            &BeneficiaryFilter::default(),
            PageRequest { page: 1, limit: 10 },
        )
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 3);
    let id_of = |learner: &str| {
        page.items
            .iter()
            .find(|b| b.beneficiary.learner_id == learner)
            .map(|b| b.beneficiary.id.clone())
            .unwrap()
    };
    let (first, second, third) = (id_of("LEARNER001"), id_of("LEARNER002"), id_of("LEARNER003"));

    // Progress moves learners along; a placement closes one out.
    svc.update_progress(
        &first,
        ProgressUpdate {
            training_pct: Some(100.0),
            last_skillscore: Some(81.0),
            milestone: Some((MilestoneType::Certified, serde_json::json!({}))),
            ..ProgressUpdate::default()
        },
        &manager(),
    )
    .await
    .unwrap();
    svc.update_progress(
        &second,
        ProgressUpdate {
            training_pct: Some(40.0),
            milestone: Some((MilestoneType::TrainingStarted, serde_json::json!({}))),
            ..ProgressUpdate::default()
        },
        &manager(),
    )
    .await
    .unwrap();
    let (placement, _) = PlacementRequest {
        ctc: Some(216_000.0),
        join_date: Some("2025-06-01".into()),
        status: Some("JOINED".into()),
        ..PlacementRequest::default()
    }
    .validate()
    .unwrap();
    svc.add_placement(&third, placement, &manager()).await.unwrap();

    let detail = svc.get_beneficiary(&first).await.unwrap();
    assert_eq!(detail.beneficiary.status, BeneficiaryStatus::Certified);
    assert_eq!(detail.progress_record.unwrap().milestones.len(), 1);

    // Impact.
    let dashboard = svc
        .impact_dashboard(&programme.id, DashboardWindow::Month, &BeneficiaryScope::default())
        .await
        .unwrap();
    assert_eq!(dashboard.kpis.trained.value, 3);
    assert_eq!(dashboard.kpis.trained.percentage, 100.0);
    assert_eq!(dashboard.kpis.placed.percentage, 50.0);
    assert_eq!(dashboard.kpis.skillscore_uplift.median, 81.0);
    assert_eq!(dashboard.kpis.median_ctc.value, 216_000.0);
    assert_eq!(dashboard.breakdown.by_district.len(), 2);

    let costs = svc.cost_kpis(&programme.id).await.unwrap();
    assert_eq!(costs.total_potential_cost, 7500.0);

    // Evidence and export jobs run in the background.
    let bundle = svc
        .request_evidence_bundle(
            &programme.id,
            NewEvidenceBundle {
                bundle_type: EvidenceType::Full,
                beneficiary_id: None,
                requested_by: "mgr-1".into(),
                expires_in_days: 7,
            },
            &manager(),
        )
        .await
        .unwrap();
    spawn_evidence_bundle(Arc::clone(&svc), bundle.id.clone())
        .await
        .unwrap();
    let download = svc
        .download_evidence_bundle(&bundle.id, &Actor::named_or(None, "anonymous"))
        .await
        .unwrap();
    assert_eq!(download.download_count, 1);
    let ready = svc.get_evidence_bundle(&bundle.id).await.unwrap();
    assert_eq!(ready.status, EvidenceStatus::Ready);
    // Programme info, then progress + beneficiary for each learner, plus one placement.
    assert_eq!(ready.items.len(), 1 + 3 * 2 + 1);

    let job = svc
        .create_export_job(
            &programme.id,
            NewExportJob {
                format: ExportFormat::Pmkvy,
                destination: ExportDestination::Api,
                filters: ExportFilters::default(),
                include_pii: true,
                schedule: ExportSchedule::Now,
                requested_by: "mgr-1".into(),
            },
            &manager(),
        )
        .await
        .unwrap();
    spawn_export_job(Arc::clone(&svc), job.id.clone()).await.unwrap();
    assert_eq!(
        svc.get_export_job(&job.id).await.unwrap().status,
        ExportStatus::Completed
    );
    let fetched = svc.export_download(&job.id, &manager()).await.unwrap();
    assert!(fetched.file_path.starts_with("exports/pmkvy_export_MRS25_"));

    // Every mutation left a trail.
    let events = svc
        .query_audit(&AuditFilter {
            programme_id: Some(programme.id.clone()),
            limit: Some(500),
            ..AuditFilter::default()
        })
        .await
        .unwrap();
    let count = |action: AuditAction| events.iter().filter(|e| e.action == action).count();
    assert_eq!(count(AuditAction::CreateProgramme), 1);
    assert_eq!(count(AuditAction::AddTarget), 2);
    assert_eq!(count(AuditAction::BulkImportBeneficiaries), 1);
    assert_eq!(count(AuditAction::UpdateProgress), 2);
    assert_eq!(count(AuditAction::AddPlacement), 1);
    assert_eq!(count(AuditAction::DownloadEvidenceBundle), 1);
    assert_eq!(count(AuditAction::DownloadExport), 1);

    // Deleting the programme takes its targets and rules with it.
    svc.delete_programme(&programme.id, &manager()).await.unwrap();
    assert!(svc.list_targets(&programme.id).await.unwrap().is_empty());
    assert!(svc.get_programme(&programme.id).await.is_err());
}
