use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a document's ingestion-to-findings run.
///
/// States only move forward through the pipeline stages, with `Failed`
/// reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisStatus {
    Pending,
    Extracting,
    Chunking,
    Embedding,
    Analyzing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "PENDING",
            AnalysisStatus::Extracting => "EXTRACTING",
            AnalysisStatus::Chunking => "CHUNKING",
            AnalysisStatus::Embedding => "EMBEDDING",
            AnalysisStatus::Analyzing => "ANALYZING",
            AnalysisStatus::Completed => "COMPLETED",
            AnalysisStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }

    /// Position in the forward progression. `Failed` sits outside the
    /// ordering and is handled separately by the tracker.
    pub fn rank(&self) -> u8 {
        match self {
            AnalysisStatus::Pending => 0,
            AnalysisStatus::Extracting => 1,
            AnalysisStatus::Chunking => 2,
            AnalysisStatus::Embedding => 3,
            AnalysisStatus::Analyzing => 4,
            AnalysisStatus::Completed => 5,
            AnalysisStatus::Failed => 6,
        }
    }
}

impl FromStr for AnalysisStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(AnalysisStatus::Pending),
            "EXTRACTING" => Ok(AnalysisStatus::Extracting),
            "CHUNKING" => Ok(AnalysisStatus::Chunking),
            "EMBEDDING" => Ok(AnalysisStatus::Embedding),
            "ANALYZING" => Ok(AnalysisStatus::Analyzing),
            "COMPLETED" => Ok(AnalysisStatus::Completed),
            "FAILED" => Ok(AnalysisStatus::Failed),
            _ => Err(format!("Invalid analysis status: {}", s)),
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
