use policylens::application::services::BlockChunker;
use policylens::domain::{BoundingBox, DocumentId, TextBlock};

fn block(page: u32, index: usize, text: &str) -> TextBlock {
    let offset = index as f32 * 20.0;
    TextBlock::new(
        page,
        index,
        BoundingBox::new(10.0, offset, 100.0, offset + 15.0),
        text.to_string(),
    )
}

fn doc_id() -> DocumentId {
    DocumentId::from_bytes(b"chunker test document")
}

#[test]
fn given_no_blocks_when_chunking_then_yields_no_chunks() {
    let chunker = BlockChunker::new(100, 1);
    let id = doc_id();

    assert_eq!(chunker.chunks(&id, &[]).count(), 0);
}

#[test]
fn given_blocks_under_budget_when_chunking_then_single_chunk_holds_all() {
    let chunker = BlockChunker::new(500, 1);
    let id = doc_id();
    let blocks = vec![
        block(1, 0, "Coverage begins after enrollment."),
        block(1, 1, "Premiums are due monthly."),
    ];

    let chunks: Vec<_> = chunker.chunks(&id, &blocks).collect();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].block_ids.len(), 2);
    assert!(chunks[0].text.contains("Coverage begins"));
    assert!(chunks[0].text.contains("Premiums are due"));
}

#[test]
fn given_blocks_over_budget_when_chunking_then_every_block_lands_in_a_chunk() {
    let chunker = BlockChunker::new(8, 0);
    let id = doc_id();
    let blocks: Vec<_> = (0..6)
        .map(|i| block(1, i, "pre existing conditions are not covered"))
        .collect();

    let chunks: Vec<_> = chunker.chunks(&id, &blocks).collect();

    assert!(chunks.len() > 1);
    let covered: Vec<_> = chunks.iter().flat_map(|c| c.block_ids.clone()).collect();
    for b in &blocks {
        assert!(covered.contains(&b.id), "block {} missing from chunks", b.id);
    }
}

#[test]
fn given_single_block_over_budget_when_chunking_then_block_forms_oversized_chunk() {
    let chunker = BlockChunker::new(3, 1);
    let id = doc_id();
    let blocks = vec![block(
        1,
        0,
        "This exclusion clause is far longer than the configured token budget allows",
    )];

    let chunks: Vec<_> = chunker.chunks(&id, &blocks).collect();

    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].token_count > 3);
}

#[test]
fn given_overlap_configured_when_chunking_then_consecutive_chunks_share_blocks() {
    // Each block is well under budget but two of them exceed it, so every
    // chunk breaks after one new block and carries one back.
    let chunker = BlockChunker::new(10, 1);
    let id = doc_id();
    let blocks: Vec<_> = (0..4)
        .map(|i| block(1, i, "waiting period applies to all dental work"))
        .collect();

    let chunks: Vec<_> = chunker.chunks(&id, &blocks).collect();

    assert!(chunks.len() >= 2);
    for pair in chunks.windows(2) {
        let last_of_prev = pair[0].block_ids.last().unwrap();
        assert!(
            pair[1].block_ids.contains(last_of_prev),
            "no shared block between consecutive chunks"
        );
    }
}

#[test]
fn given_blocks_across_pages_when_chunking_then_chunk_carries_page_range_and_bbox_union() {
    let chunker = BlockChunker::new(500, 0);
    let id = doc_id();
    let blocks = vec![block(1, 0, "Clause one."), block(2, 1, "Clause two.")];

    let chunks: Vec<_> = chunker.chunks(&id, &blocks).collect();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].page_start, 1);
    assert_eq!(chunks[0].page_end, 2);

    let expected = blocks[0].bbox.union(&blocks[1].bbox);
    assert_eq!(chunks[0].region.as_array(), expected.as_array());
}

#[test]
fn given_same_blocks_when_iterating_twice_then_partition_is_identical() {
    let chunker = BlockChunker::new(12, 1);
    let id = doc_id();
    let blocks: Vec<_> = (0..5)
        .map(|i| block(1, i, "copayment of forty dollars applies per visit"))
        .collect();

    let first: Vec<Vec<_>> = chunker
        .chunks(&id, &blocks)
        .map(|c| c.block_ids)
        .collect();
    let second: Vec<Vec<_>> = chunker
        .chunks(&id, &blocks)
        .map(|c| c.block_ids)
        .collect();

    assert_eq!(first, second);
}
