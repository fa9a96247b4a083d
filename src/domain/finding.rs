use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{BoundingBox, ChunkId, DocumentId};

/// A structured concern extracted from one chunk of the policy document.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub id: FindingId,
    pub document_id: DocumentId,
    pub chunk_id: ChunkId,
    pub category: ConcernCategory,
    pub severity: Severity,
    pub summary: String,
    pub recommendation: Option<String>,
    pub confidence: f32,
    pub page_start: u32,
    pub page_end: u32,
    pub region: BoundingBox,
    pub text_content: String,
    pub created_at: DateTime<Utc>,
}

impl Finding {
    pub fn pages_overlap(&self, other: &Self) -> bool {
        self.page_start <= other.page_end && other.page_start <= self.page_end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FindingId(Uuid);

impl FindingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for FindingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed taxonomy of policyholder concerns the analyzer detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConcernCategory {
    Exclusion,
    Limitation,
    WaitingPeriod,
    Deductible,
    Copayment,
    Coinsurance,
    PolicyholderDuty,
    RenewalRestriction,
    ClaimProcess,
    NetworkRestriction,
}

impl ConcernCategory {
    pub const ALL: [ConcernCategory; 10] = [
        ConcernCategory::Exclusion,
        ConcernCategory::Limitation,
        ConcernCategory::WaitingPeriod,
        ConcernCategory::Deductible,
        ConcernCategory::Copayment,
        ConcernCategory::Coinsurance,
        ConcernCategory::PolicyholderDuty,
        ConcernCategory::RenewalRestriction,
        ConcernCategory::ClaimProcess,
        ConcernCategory::NetworkRestriction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConcernCategory::Exclusion => "EXCLUSION",
            ConcernCategory::Limitation => "LIMITATION",
            ConcernCategory::WaitingPeriod => "WAITING_PERIOD",
            ConcernCategory::Deductible => "DEDUCTIBLE",
            ConcernCategory::Copayment => "COPAYMENT",
            ConcernCategory::Coinsurance => "COINSURANCE",
            ConcernCategory::PolicyholderDuty => "POLICYHOLDER_DUTY",
            ConcernCategory::RenewalRestriction => "RENEWAL_RESTRICTION",
            ConcernCategory::ClaimProcess => "CLAIM_PROCESS",
            ConcernCategory::NetworkRestriction => "NETWORK_RESTRICTION",
        }
    }

    /// Short description used when building the analyst prompt.
    pub fn description(&self) -> &'static str {
        match self {
            ConcernCategory::Exclusion => "Services/procedures not covered",
            ConcernCategory::Limitation => "Coverage caps and restrictions",
            ConcernCategory::WaitingPeriod => "Time delays before coverage",
            ConcernCategory::Deductible => "Out-of-pocket costs",
            ConcernCategory::Copayment => "Fixed payment amounts",
            ConcernCategory::Coinsurance => "Percentage cost sharing",
            ConcernCategory::PolicyholderDuty => "Required actions by insured",
            ConcernCategory::RenewalRestriction => "Policy renewal limitations",
            ConcernCategory::ClaimProcess => "Complex claim requirements",
            ConcernCategory::NetworkRestriction => "Provider network limitations",
        }
    }
}

impl FromStr for ConcernCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EXCLUSION" => Ok(ConcernCategory::Exclusion),
            "LIMITATION" => Ok(ConcernCategory::Limitation),
            "WAITING_PERIOD" => Ok(ConcernCategory::WaitingPeriod),
            "DEDUCTIBLE" => Ok(ConcernCategory::Deductible),
            "COPAYMENT" => Ok(ConcernCategory::Copayment),
            "COINSURANCE" => Ok(ConcernCategory::Coinsurance),
            "POLICYHOLDER_DUTY" => Ok(ConcernCategory::PolicyholderDuty),
            "RENEWAL_RESTRICTION" => Ok(ConcernCategory::RenewalRestriction),
            "CLAIM_PROCESS" => Ok(ConcernCategory::ClaimProcess),
            "NETWORK_RESTRICTION" => Ok(ConcernCategory::NetworkRestriction),
            _ => Err(format!("Invalid concern category: {}", s)),
        }
    }
}

impl fmt::Display for ConcernCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Finding severity. Variant order gives the domain ordering, so
/// `Severity::Low < Severity::Critical` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            _ => Err(format!("Invalid severity: {}", s)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
