use chrono::Utc;

use policylens::application::services::{Deduplicator, JaccardSimilarity, normalize_summary};
use policylens::domain::{
    BoundingBox, ChunkId, ConcernCategory, DocumentId, Finding, FindingId, Severity,
};

const THRESHOLD: f32 = 0.82;

fn finding(
    category: ConcernCategory,
    severity: Severity,
    summary: &str,
    confidence: f32,
    page_start: u32,
    page_end: u32,
) -> Finding {
    Finding {
        id: FindingId::new(),
        document_id: DocumentId::from_bytes(b"dedup test"),
        chunk_id: ChunkId::new(),
        category,
        severity,
        summary: summary.to_string(),
        recommendation: None,
        confidence,
        page_start,
        page_end,
        region: BoundingBox::new(0.0, 0.0, 100.0, 100.0),
        text_content: "clause text".to_string(),
        created_at: Utc::now(),
    }
}

fn deduplicator() -> Deduplicator {
    Deduplicator::new(Box::new(JaccardSimilarity), THRESHOLD)
}

#[test]
fn given_restyled_summary_when_normalizing_then_equal_to_plain_form() {
    assert_eq!(
        normalize_summary("  Cosmetic   surgery, is EXCLUDED!  "),
        "cosmetic surgery is excluded"
    );
}

#[test]
fn given_identical_normalized_summaries_when_deduplicating_then_one_survives() {
    let a = finding(
        ConcernCategory::Exclusion,
        Severity::High,
        "Cosmetic surgery is excluded.",
        0.9,
        2,
        3,
    );
    let b = finding(
        ConcernCategory::Exclusion,
        Severity::Medium,
        "cosmetic surgery is EXCLUDED",
        0.7,
        3,
        4,
    );

    let survivors = deduplicator().deduplicate(vec![a, b]);

    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].severity, Severity::High);
}

#[test]
fn given_highly_similar_summaries_when_deduplicating_then_merged() {
    // Nine of ten tokens shared: Jaccard well above the threshold.
    let a = finding(
        ConcernCategory::WaitingPeriod,
        Severity::High,
        "a waiting period of twelve months applies to all dental treatment",
        0.9,
        5,
        5,
    );
    let b = finding(
        ConcernCategory::WaitingPeriod,
        Severity::High,
        "a waiting period of twelve months applies to all dental work",
        0.6,
        5,
        6,
    );

    let survivors = deduplicator().deduplicate(vec![a, b]);

    assert_eq!(survivors.len(), 1);
    assert!((survivors[0].confidence - 0.9).abs() < 1e-6);
}

#[test]
fn given_same_summary_in_different_categories_when_deduplicating_then_both_survive() {
    let a = finding(
        ConcernCategory::Exclusion,
        Severity::High,
        "Treatment abroad is not covered",
        0.8,
        1,
        1,
    );
    let b = finding(
        ConcernCategory::Limitation,
        Severity::High,
        "Treatment abroad is not covered",
        0.8,
        1,
        1,
    );

    assert_eq!(deduplicator().deduplicate(vec![a, b]).len(), 2);
}

#[test]
fn given_same_summary_on_disjoint_pages_when_deduplicating_then_both_survive() {
    let a = finding(
        ConcernCategory::Deductible,
        Severity::Medium,
        "An annual deductible of 500 dollars applies",
        0.8,
        2,
        2,
    );
    let b = finding(
        ConcernCategory::Deductible,
        Severity::Medium,
        "An annual deductible of 500 dollars applies",
        0.8,
        9,
        9,
    );

    assert_eq!(deduplicator().deduplicate(vec![a, b]).len(), 2);
}

#[test]
fn given_dissimilar_summaries_when_deduplicating_then_both_survive() {
    let a = finding(
        ConcernCategory::ClaimProcess,
        Severity::Medium,
        "Claims must be filed within thirty days",
        0.8,
        4,
        4,
    );
    let b = finding(
        ConcernCategory::ClaimProcess,
        Severity::Medium,
        "Original receipts are required for reimbursement",
        0.8,
        4,
        4,
    );

    assert_eq!(deduplicator().deduplicate(vec![a, b]).len(), 2);
}

#[test]
fn given_any_arrival_order_when_deduplicating_then_same_survivor_wins() {
    let strong = finding(
        ConcernCategory::Exclusion,
        Severity::Critical,
        "Pre existing conditions are permanently excluded",
        0.95,
        1,
        2,
    );
    let weak = finding(
        ConcernCategory::Exclusion,
        Severity::Low,
        "pre existing conditions are permanently excluded",
        0.4,
        2,
        2,
    );

    let forward = deduplicator().deduplicate(vec![strong.clone(), weak.clone()]);
    let reversed = deduplicator().deduplicate(vec![weak, strong]);

    assert_eq!(forward.len(), 1);
    assert_eq!(reversed.len(), 1);
    assert_eq!(forward[0].severity, Severity::Critical);
    assert_eq!(reversed[0].severity, Severity::Critical);
}

#[test]
fn given_deduplicated_set_when_deduplicating_again_then_output_unchanged() {
    let candidates = vec![
        finding(
            ConcernCategory::Copayment,
            Severity::Medium,
            "A copayment applies to specialist visits",
            0.7,
            3,
            3,
        ),
        finding(
            ConcernCategory::Copayment,
            Severity::Medium,
            "a copayment applies to specialist visits",
            0.6,
            3,
            4,
        ),
        finding(
            ConcernCategory::NetworkRestriction,
            Severity::High,
            "Out of network providers are not reimbursed",
            0.9,
            7,
            7,
        ),
    ];

    let once = deduplicator().deduplicate(candidates);
    let twice = deduplicator().deduplicate(once.clone());

    assert_eq!(once.len(), twice.len());
    let ids_once: Vec<_> = once.iter().map(|f| f.id).collect();
    let ids_twice: Vec<_> = twice.iter().map(|f| f.id).collect();
    assert_eq!(ids_once, ids_twice);
}
