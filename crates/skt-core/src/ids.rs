//! ID prefixes for every stored entity.
//!
//! IDs are generated as `{prefix}-{8 hex chars}` by `SktDb::generate_id`.

pub const PREFIX_PROGRAMME: &str = "prg";
pub const PREFIX_TARGET: &str = "tgt";
pub const PREFIX_FUNDING_RULE: &str = "fnd";
pub const PREFIX_BENEFICIARY: &str = "ben";
pub const PREFIX_PROGRESS: &str = "prr";
pub const PREFIX_PLACEMENT: &str = "plc";
pub const PREFIX_EVIDENCE: &str = "evb";
pub const PREFIX_EXPORT: &str = "exp";
pub const PREFIX_AUDIT: &str = "aud";

pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_PROGRAMME,
    PREFIX_TARGET,
    PREFIX_FUNDING_RULE,
    PREFIX_BENEFICIARY,
    PREFIX_PROGRESS,
    PREFIX_PLACEMENT,
    PREFIX_EVIDENCE,
    PREFIX_EXPORT,
    PREFIX_AUDIT,
];
