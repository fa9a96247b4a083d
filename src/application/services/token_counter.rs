use std::sync::LazyLock;

use tiktoken_rs::CoreBPE;

// Chunk budgets are measured in cl100k tokens so the chunker counts the
// same units the completion endpoint does.
static CL100K: LazyLock<CoreBPE> = LazyLock::new(|| {
    tiktoken_rs::cl100k_base().expect("failed to load cl100k_base vocabulary")
});

pub fn count_tokens(text: &str) -> usize {
    CL100K.encode_with_special_tokens(text).len()
}
