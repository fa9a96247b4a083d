use policylens::infrastructure::pdf::sanitize_block_text;

#[test]
fn given_text_with_fi_ligature_when_sanitizing_then_decomposes_to_fi() {
    let input = "beneﬁt deﬁnitions";
    assert_eq!(sanitize_block_text(input), "benefit definitions");
}

#[test]
fn given_text_with_hyphenated_line_break_when_sanitizing_then_merges_word() {
    let input = "this treatment is ex-\ncluded";
    assert_eq!(sanitize_block_text(input), "this treatment is excluded");
}

#[test]
fn given_text_with_intentional_hyphen_when_sanitizing_then_preserves_hyphen() {
    let input = "out-of-network providers";
    assert_eq!(sanitize_block_text(input), "out-of-network providers");
}

#[test]
fn given_text_with_newlines_when_sanitizing_then_collapses_to_single_spaces() {
    let input = "clause one\n\nclause two\tclause   three";
    assert_eq!(sanitize_block_text(input), "clause one clause two clause three");
}

#[test]
fn given_padded_text_when_sanitizing_then_edges_trimmed() {
    assert_eq!(sanitize_block_text("  deductible applies \n"), "deductible applies");
}

#[test]
fn given_empty_text_when_sanitizing_then_returns_empty() {
    assert_eq!(sanitize_block_text(""), "");
    assert_eq!(sanitize_block_text("  \n\t "), "");
}
