use chrono::Utc;

use policylens::domain::{
    AnalysisStatus, BlockId, BoundingBox, ConcernCategory, DocumentId, Embedding, Finding,
    FindingId, Severity,
};

#[test]
fn given_identical_bytes_when_deriving_document_id_then_ids_match() {
    let a = DocumentId::from_bytes(b"%PDF-1.4 policy content");
    let b = DocumentId::from_bytes(b"%PDF-1.4 policy content");

    assert_eq!(a, b);
    assert_eq!(a.as_str().len(), 64);
    assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn given_different_bytes_when_deriving_document_id_then_ids_differ() {
    let a = DocumentId::from_bytes(b"%PDF-1.4 policy one");
    let b = DocumentId::from_bytes(b"%PDF-1.4 policy two");

    assert_ne!(a, b);
}

#[test]
fn given_wire_id_when_parsing_then_only_exact_shape_accepted() {
    let valid = DocumentId::from_bytes(b"anything");
    assert!(DocumentId::parse(valid.as_str()).is_ok());

    assert!(DocumentId::parse("abc123").is_err());
    assert!(DocumentId::parse(&valid.as_str().to_uppercase()).is_err());
    assert!(DocumentId::parse(&format!("{}z", &valid.as_str()[..63])).is_err());
}

#[test]
fn given_status_strings_when_parsing_then_round_trips() {
    for status in [
        AnalysisStatus::Pending,
        AnalysisStatus::Extracting,
        AnalysisStatus::Chunking,
        AnalysisStatus::Embedding,
        AnalysisStatus::Analyzing,
        AnalysisStatus::Completed,
        AnalysisStatus::Failed,
    ] {
        let parsed: AnalysisStatus = status.as_str().parse().unwrap();
        assert_eq!(parsed, status);
    }

    assert!("UNKNOWN".parse::<AnalysisStatus>().is_err());
}

#[test]
fn given_pipeline_stages_when_comparing_ranks_then_order_is_strictly_forward() {
    let stages = [
        AnalysisStatus::Pending,
        AnalysisStatus::Extracting,
        AnalysisStatus::Chunking,
        AnalysisStatus::Embedding,
        AnalysisStatus::Analyzing,
        AnalysisStatus::Completed,
    ];

    for pair in stages.windows(2) {
        assert!(pair[0].rank() < pair[1].rank());
    }
}

#[test]
fn given_terminal_statuses_when_checking_then_only_completed_and_failed_are_terminal() {
    assert!(AnalysisStatus::Completed.is_terminal());
    assert!(AnalysisStatus::Failed.is_terminal());
    assert!(!AnalysisStatus::Pending.is_terminal());
    assert!(!AnalysisStatus::Analyzing.is_terminal());
}

#[test]
fn given_page_and_index_when_building_block_id_then_format_is_deterministic() {
    let id = BlockId::new(2, 5);
    assert_eq!(id.to_string(), "page_2_block_5");
    assert_eq!(BlockId::new(2, 5), id);
}

#[test]
fn given_two_boxes_when_computing_union_then_result_covers_both() {
    let a = BoundingBox::new(10.0, 10.0, 50.0, 30.0);
    let b = BoundingBox::new(40.0, 5.0, 80.0, 25.0);

    let union = a.union(&b);

    assert_eq!(union.as_array(), [10.0, 5.0, 80.0, 30.0]);
}

#[test]
fn given_severities_when_comparing_then_critical_outranks_low() {
    assert!(Severity::Critical > Severity::High);
    assert!(Severity::High > Severity::Medium);
    assert!(Severity::Medium > Severity::Low);
}

#[test]
fn given_taxonomy_when_listing_then_ten_categories_round_trip() {
    assert_eq!(ConcernCategory::ALL.len(), 10);

    for category in ConcernCategory::ALL {
        let parsed: ConcernCategory = category.as_str().parse().unwrap();
        assert_eq!(parsed, category);
    }

    assert!("SOMETHING_ELSE".parse::<ConcernCategory>().is_err());
}

#[test]
fn given_identical_vectors_when_scoring_cosine_then_similarity_is_one() {
    let a = Embedding::new(vec![0.5, 0.2, 0.8]);
    let b = Embedding::new(vec![0.5, 0.2, 0.8]);

    assert!((a.cosine_similarity(&b) - 1.0).abs() < 1e-6);
}

#[test]
fn given_orthogonal_vectors_when_scoring_cosine_then_similarity_is_zero() {
    let a = Embedding::new(vec![1.0, 0.0]);
    let b = Embedding::new(vec![0.0, 1.0]);

    assert!(a.cosine_similarity(&b).abs() < 1e-6);
}

#[test]
fn given_mismatched_dimensions_when_scoring_cosine_then_similarity_is_zero() {
    let a = Embedding::new(vec![1.0, 0.0]);
    let b = Embedding::new(vec![1.0, 0.0, 0.0]);

    assert_eq!(a.cosine_similarity(&b), 0.0);
}

fn finding_on_pages(page_start: u32, page_end: u32) -> Finding {
    Finding {
        id: FindingId::new(),
        document_id: DocumentId::from_bytes(b"doc"),
        chunk_id: policylens::domain::ChunkId::new(),
        category: ConcernCategory::Exclusion,
        severity: Severity::High,
        summary: "Cosmetic procedures are excluded".to_string(),
        recommendation: None,
        confidence: 0.8,
        page_start,
        page_end,
        region: BoundingBox::new(0.0, 0.0, 100.0, 100.0),
        text_content: "text".to_string(),
        created_at: Utc::now(),
    }
}

#[test]
fn given_overlapping_page_ranges_when_checking_then_overlap_detected() {
    let a = finding_on_pages(1, 3);
    let b = finding_on_pages(3, 5);
    let c = finding_on_pages(4, 6);

    assert!(a.pages_overlap(&b));
    assert!(b.pages_overlap(&a));
    assert!(!a.pages_overlap(&c));
}
