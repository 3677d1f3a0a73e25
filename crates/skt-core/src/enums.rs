//! Status enums, entity types, and audit actions for SkillTrack.
//!
//! Every enum travels on the wire and in storage under its SCREAMING_SNAKE_CASE
//! name (`"PER_CERT"`, `"RETENTION_90D"`). The `wire_enum!` macro keeps the
//! serde name, `as_str()`, `Display`, and `FromStr` in lockstep.
//! Job status enums provide `allowed_next_states()` to enforce valid
//! transitions at the application layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Returned by `FromStr` when a string is not one of an enum's wire names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub value: String,
    pub expected: &'static [&'static str],
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' must be one of [{}]",
            self.value,
            self.expected.join(", ")
        )
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:tt),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire names, in declaration order.
            pub const WIRE_NAMES: &'static [&'static str] = &[$($wire),+];

            /// Return the string representation used on the wire and in SQL storage.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant {
                        value: s.to_string(),
                        expected: Self::WIRE_NAMES,
                    }),
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Programme
// ---------------------------------------------------------------------------

wire_enum! {
    /// Who funds a programme.
    SponsorType {
        Gov => "GOV",
        Csr => "CSR",
    }
}

wire_enum! {
    /// Lifecycle status of a programme. Changes are unrestricted.
    ProgrammeStatus {
        Draft => "DRAFT",
        Active => "ACTIVE",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

wire_enum! {
    /// Outcome metric a programme target is set against.
    TargetMetric {
        Trained => "TRAINED",
        Certified => "CERTIFIED",
        Placed => "PLACED",
        Retention90d => "RETENTION_90D",
        SkillscoreUplift => "SKILLSCORE_UPLIFT",
    }
}

wire_enum! {
    /// What a funding rule pays out for.
    FundingRuleType {
        PerCert => "PER_CERT",
        PerPlacement => "PER_PLACEMENT",
        RetentionBonus => "RETENTION_BONUS",
    }
}

// ---------------------------------------------------------------------------
// Beneficiary
// ---------------------------------------------------------------------------

wire_enum! {
    /// Status of a beneficiary within a programme.
    ///
    /// Changes are not restricted to a state machine: managers may set any
    /// status directly, and milestones move learners forward.
    BeneficiaryStatus {
        Enrolled => "ENROLLED",
        Training => "TRAINING",
        Certified => "CERTIFIED",
        Placed => "PLACED",
        Dropped => "DROPPED",
    }
}

impl BeneficiaryStatus {
    /// Statuses that count towards the `trained` KPI.
    pub const TRAINED: &'static [Self] = &[Self::Training, Self::Certified, Self::Placed];
}

wire_enum! {
    /// Milestone recorded against a progress record.
    MilestoneType {
        TrainingStarted => "TRAINING_STARTED",
        TrainingCompleted => "TRAINING_COMPLETED",
        AssessmentPassed => "ASSESSMENT_PASSED",
        Certified => "CERTIFIED",
        Placed => "PLACED",
    }
}

wire_enum! {
    /// Status of a placement offer.
    PlacementStatus {
        Offered => "OFFERED",
        Joined => "JOINED",
        Left => "LEFT",
        Retained => "RETAINED",
    }
}

// ---------------------------------------------------------------------------
// EvidenceBundle
// ---------------------------------------------------------------------------

wire_enum! {
    /// Kind of evidence bundle requested.
    EvidenceType {
        Proctor => "PROCTOR",
        Attendance => "ATTENDANCE",
        Credentials => "CREDENTIALS",
        Full => "FULL",
    }
}

wire_enum! {
    /// Status of an evidence bundle.
    ///
    /// ```text
    /// GENERATING → READY → EXPIRED
    ///            → FAILED
    /// ```
    EvidenceStatus {
        Generating => "GENERATING",
        Ready => "READY",
        Expired => "EXPIRED",
        Failed => "FAILED",
    }
}

impl EvidenceStatus {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Generating => &[Self::Ready, Self::Failed],
            Self::Ready => &[Self::Expired],
            Self::Expired | Self::Failed => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }
}

wire_enum! {
    /// Kind of record captured in an evidence bundle item.
    EvidenceItemKind {
        ProgrammeInfo => "PROGRAMME_INFO",
        ProgressRecord => "PROGRESS_RECORD",
        PlacementRecord => "PLACEMENT_RECORD",
        BeneficiaryInfo => "BENEFICIARY_INFO",
    }
}

// ---------------------------------------------------------------------------
// ExportJob
// ---------------------------------------------------------------------------

wire_enum! {
    /// Output format of an export job.
    ExportFormat {
        Csv => "CSV",
        Pdf => "PDF",
        Nsdc => "NSDC",
        Pmkvy => "PMKVY",
        State => "STATE",
    }
}

wire_enum! {
    /// Where an export is delivered.
    ExportDestination {
        Api => "API",
        Sftp => "SFTP",
        Email => "EMAIL",
    }
}

wire_enum! {
    /// When an export job should run.
    ExportSchedule {
        Now => "NOW",
        Later => "LATER",
    }
}

wire_enum! {
    /// Status of an export job.
    ///
    /// ```text
    /// PENDING → PROCESSING → COMPLETED
    ///         → FAILED     → FAILED
    /// ```
    ExportStatus {
        Pending => "PENDING",
        Processing => "PROCESSING",
        Completed => "COMPLETED",
        Failed => "FAILED",
    }
}

impl ExportStatus {
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Processing, Self::Failed],
            Self::Processing => &[Self::Completed, Self::Failed],
            Self::Completed | Self::Failed => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

wire_enum! {
    /// Mutation recorded in the audit trail.
    AuditAction {
        CreateProgramme => "CREATE_PROGRAMME",
        UpdateProgramme => "UPDATE_PROGRAMME",
        DeleteProgramme => "DELETE_PROGRAMME",
        AddTarget => "ADD_TARGET",
        AddFundingRule => "ADD_FUNDING_RULE",
        AddBeneficiary => "ADD_BENEFICIARY",
        UpdateBeneficiaryStatus => "UPDATE_BENEFICIARY_STATUS",
        BulkImportBeneficiaries => "BULK_IMPORT_BENEFICIARIES",
        UpdateProgress => "UPDATE_PROGRESS",
        AddPlacement => "ADD_PLACEMENT",
        GenerateEvidenceBundle => "GENERATE_EVIDENCE_BUNDLE",
        DownloadEvidenceBundle => "DOWNLOAD_EVIDENCE_BUNDLE",
        CreateExportJob => "CREATE_EXPORT_JOB",
        DownloadExport => "DOWNLOAD_EXPORT",
    }
}

wire_enum! {
    /// Kind of resource an audit event refers to.
    ResourceType {
        Programme => "PROGRAMME",
        Target => "TARGET",
        FundingRule => "FUNDING_RULE",
        Beneficiary => "BENEFICIARY",
        Progress => "PROGRESS",
        Placement => "PLACEMENT",
        EvidenceBundle => "EVIDENCE_BUNDLE",
        ExportJob => "EXPORT_JOB",
    }
}

wire_enum! {
    /// Role of the actor behind an audited mutation.
    ActorRole {
        ProgrammeManager => "PROGRAMME_MANAGER",
        System => "SYSTEM",
    }
}
