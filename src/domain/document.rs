use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::AnalysisStatus;

/// Content-derived document identifier: lowercase hex SHA-256 of the
/// uploaded bytes. Re-uploading identical content yields the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn from_bytes(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Self(hex::encode(digest))
    }

    /// Parses an id received over the wire. Accepts only the exact shape
    /// `from_bytes` produces.
    pub fn parse(s: &str) -> Result<Self, String> {
        if s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()) {
            Ok(Self(s.to_string()))
        } else {
            Err(format!("invalid document id: {}", s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub filename: String,
    pub total_pages: u32,
    pub upload_date: DateTime<Utc>,
    pub status: AnalysisStatus,
    pub failure_reason: Option<String>,
    pub analysis_completed_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(id: DocumentId, filename: String) -> Self {
        Self {
            id,
            filename,
            total_pages: 0,
            upload_date: Utc::now(),
            status: AnalysisStatus::Pending,
            failure_reason: None,
            analysis_completed_at: None,
        }
    }
}
