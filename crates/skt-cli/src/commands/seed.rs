use anyhow::Context;
use serde::Serialize;
use skt_core::enums::BeneficiaryStatus;
use skt_core::validation::{NewBeneficiary, parse_date};
use skt_db::repos::audit::Actor;
use skt_db::repos::programme::ProgrammeFilter;
use skt_db::service::SktService;
use skt_db::updates::programme::ProgrammeUpdateBuilder;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SeedArgs;
use crate::output::output;

struct SampleLearner {
    learner_id: &'static str,
    status: BeneficiaryStatus,
    enrolled: &'static str,
    district: &'static str,
}

const SAMPLE_LEARNERS: [SampleLearner; 5] = [
    SampleLearner {
        learner_id: "LEARNER001",
        status: BeneficiaryStatus::Training,
        enrolled: "2025-01-01",
        district: "Pune",
    },
    SampleLearner {
        learner_id: "LEARNER002",
        status: BeneficiaryStatus::Certified,
        enrolled: "2025-01-02",
        district: "Pune",
    },
    SampleLearner {
        learner_id: "LEARNER003",
        status: BeneficiaryStatus::Placed,
        enrolled: "2025-01-03",
        district: "Mumbai",
    },
    SampleLearner {
        learner_id: "LEARNER004",
        status: BeneficiaryStatus::Training,
        enrolled: "2025-01-04",
        district: "Nashik",
    },
    SampleLearner {
        learner_id: "LEARNER005",
        status: BeneficiaryStatus::Certified,
        enrolled: "2025-01-05",
        district: "Mumbai",
    },
];

const SAMPLE_DISTRICTS: [&str; 3] = ["Pune", "Mumbai", "Nashik"];

#[derive(Debug, Serialize)]
pub struct SeedReport {
    pub programme_id: String,
    pub programme_name: String,
    pub removed: u64,
    pub created: usize,
    pub districts: Vec<String>,
}

/// Handle `skt seed`.
pub async fn handle(args: &SeedArgs, svc: &SktService, flags: &GlobalFlags) -> anyhow::Result<()> {
    let report = seed_programme(svc, args.programme.as_deref()).await?;
    output(&report, flags.format)
}

/// Replace the beneficiaries of `programme_id` (or of the oldest programme)
/// with the sample learners and point the programme at their districts.
pub async fn seed_programme(svc: &SktService, programme_id: Option<&str>) -> anyhow::Result<SeedReport> {
    let programme = match programme_id {
        Some(id) => svc.get_programme(id).await?,
        None => svc
            .all_programmes(&ProgrammeFilter::default())
            .await?
            .pop()
            .context("No programme found. Please create a programme first.")?,
    };
    tracing::info!(programme = %programme.name, "seeding sample beneficiaries");

    let removed = svc.clear_beneficiaries(&programme.id).await?;

    let actor = Actor::system();
    for sample in &SAMPLE_LEARNERS {
        let new = NewBeneficiary {
            status: sample.status,
            district: Some(sample.district.to_string()),
            enrolled_at: Some(parse_date("enrolled_at", sample.enrolled)?),
            ..NewBeneficiary::enrolled(sample.learner_id)
        };
        svc.create_beneficiary(&programme.id, new, &actor)
            .await
            .with_context(|| format!("failed to seed {}", sample.learner_id))?;
    }

    let districts = SAMPLE_DISTRICTS.iter().map(ToString::to_string).collect::<Vec<_>>();
    let update = ProgrammeUpdateBuilder::new().districts(districts.clone()).build();
    svc.update_programme(&programme.id, update, &actor).await?;

    Ok(SeedReport {
        programme_id: programme.id,
        programme_name: programme.name,
        removed,
        created: SAMPLE_LEARNERS.len(),
        districts,
    })
}
