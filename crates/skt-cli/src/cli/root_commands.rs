use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Serve the REST API.
    Serve(ServeArgs),
    /// Replace a programme's beneficiaries with sample learners.
    Seed(SeedArgs),
    /// List programmes.
    Programmes(ProgrammesArgs),
    /// Query the audit trail.
    Audit(AuditArgs),
    /// Print the JSON Schema of an entity type.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct ServeArgs {
    /// Bind host (overrides server.host).
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port (overrides server.port).
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Clone, Debug, Args)]
pub struct SeedArgs {
    /// Programme to seed. Defaults to the oldest programme.
    #[arg(long)]
    pub programme: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct ProgrammesArgs {
    /// Filter by status (DRAFT, ACTIVE, COMPLETED, CANCELLED).
    #[arg(long)]
    pub status: Option<String>,

    /// Filter by sponsor type (GOV, CSR).
    #[arg(long)]
    pub sponsor: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    /// Only events of this programme.
    #[arg(long)]
    pub programme: Option<String>,

    /// Only events with this action, e.g. ADD_BENEFICIARY.
    #[arg(long)]
    pub action: Option<String>,

    /// Max events to return.
    #[arg(short, long, default_value_t = 50)]
    pub limit: u32,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Entity type, e.g. programme, beneficiary, export-job.
    pub type_name: String,
}
