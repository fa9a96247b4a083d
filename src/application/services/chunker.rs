use crate::domain::{Chunk, ChunkId, DocumentId, TextBlock};

use super::token_counter::count_tokens;

/// Merges ordered text blocks into analysis-sized chunks.
///
/// Blocks are atomic: a chunk boundary never splits a block, and a single
/// block over the token budget forms its own oversized chunk. Consecutive
/// chunks share the trailing `overlap_blocks` blocks of their predecessor,
/// so every block belongs to at least one chunk and block order is
/// preserved throughout.
pub struct BlockChunker {
    max_tokens: usize,
    overlap_blocks: usize,
}

impl BlockChunker {
    pub fn new(max_tokens: usize, overlap_blocks: usize) -> Self {
        Self {
            max_tokens: max_tokens.max(1),
            overlap_blocks,
        }
    }

    /// Lazy, restartable view over the chunking of `blocks`. Nothing is
    /// computed until the iterator is driven, and iterating twice yields
    /// the same partition (chunk ids aside).
    pub fn chunks<'a>(
        &'a self,
        document_id: &'a DocumentId,
        blocks: &'a [TextBlock],
    ) -> ChunkIter<'a> {
        ChunkIter {
            chunker: self,
            document_id,
            blocks,
            next_start: 0,
        }
    }
}

pub struct ChunkIter<'a> {
    chunker: &'a BlockChunker,
    document_id: &'a DocumentId,
    blocks: &'a [TextBlock],
    next_start: usize,
}

impl Iterator for ChunkIter<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let start = self.next_start;
        if start >= self.blocks.len() {
            return None;
        }

        let mut end = start;
        let mut tokens = 0usize;
        while end < self.blocks.len() {
            let block_tokens = count_tokens(&self.blocks[end].text);
            if end > start && tokens + block_tokens > self.chunker.max_tokens {
                break;
            }
            tokens += block_tokens;
            end += 1;
        }

        self.next_start = if end >= self.blocks.len() {
            self.blocks.len()
        } else {
            // Carry trailing blocks into the next chunk, but always
            // advance past at least one new block.
            end.saturating_sub(self.chunker.overlap_blocks).max(start + 1)
        };

        Some(build_chunk(self.document_id, &self.blocks[start..end]))
    }
}

fn build_chunk(document_id: &DocumentId, members: &[TextBlock]) -> Chunk {
    let mut region = members[0].bbox;
    let mut page_start = members[0].page_num;
    let mut page_end = members[0].page_num;

    for block in &members[1..] {
        region = region.union(&block.bbox);
        page_start = page_start.min(block.page_num);
        page_end = page_end.max(block.page_num);
    }

    let text = members
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let token_count = count_tokens(&text);

    Chunk {
        id: ChunkId::new(),
        document_id: document_id.clone(),
        block_ids: members.iter().map(|b| b.id.clone()).collect(),
        text,
        region,
        page_start,
        page_end,
        token_count,
    }
}
