use skt_core::entities::AuditEvent;
use skt_core::enums::AuditAction;
use skt_db::repos::audit::AuditFilter;
use skt_db::service::SktService;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::AuditArgs;
use crate::commands::shared::parse::parse_enum;
use crate::output::output;

/// Handle `skt audit`.
pub async fn handle(args: &AuditArgs, svc: &SktService, flags: &GlobalFlags) -> anyhow::Result<()> {
    let events = fetch(args, svc).await?;
    output(&events, flags.format)
}

pub async fn fetch(args: &AuditArgs, svc: &SktService) -> anyhow::Result<Vec<AuditEvent>> {
    let filter = AuditFilter {
        programme_id: args.programme.clone(),
        action: args
            .action
            .as_deref()
            .map(|value| parse_enum::<AuditAction>(value, "action"))
            .transpose()?,
        limit: Some(args.limit.max(1)),
        ..AuditFilter::default()
    };
    svc.query_audit(&filter).await.map_err(Into::into)
}
