use skt_core::enums::{ProgrammeStatus, SponsorType};
use skt_db::repos::programme::ProgrammeFilter;
use skt_db::service::SktService;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ProgrammesArgs;
use crate::commands::shared::parse::parse_enum;
use crate::output::output;

/// Handle `skt programmes`.
pub async fn handle(args: &ProgrammesArgs, svc: &SktService, flags: &GlobalFlags) -> anyhow::Result<()> {
    let filter = ProgrammeFilter {
        sponsor_type: args
            .sponsor
            .as_deref()
            .map(|value| parse_enum::<SponsorType>(value, "sponsor"))
            .transpose()?,
        status: args
            .status
            .as_deref()
            .map(|value| parse_enum::<ProgrammeStatus>(value, "status"))
            .transpose()?,
        ..ProgrammeFilter::default()
    };
    let programmes = svc.all_programmes(&filter).await?;
    output(&programmes, flags.format)
}
