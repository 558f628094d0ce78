//! `docqa summarize` and `docqa keywords`.

use anyhow::Result;
use std::path::Path;

use docqa_core::analysis::{keyword_scores, summarize};
use docqa_core::assistant::DOCUMENT_EMPTY_MESSAGE;

use crate::extract::load_document;

pub fn run_summarize(document: &Path, sentences: usize) -> Result<()> {
    let text = load_document(document)?;
    let summary = summarize(&text, sentences);
    if summary.is_empty() {
        println!("{}", DOCUMENT_EMPTY_MESSAGE);
    } else {
        println!("{}", summary);
    }
    Ok(())
}

pub fn run_keywords(document: &Path, top: usize, json: bool) -> Result<()> {
    let text = load_document(document)?;
    let keywords = keyword_scores(&text, top);

    if json {
        println!("{}", serde_json::to_string_pretty(&keywords)?);
        return Ok(());
    }

    if keywords.is_empty() {
        println!("{}", DOCUMENT_EMPTY_MESSAGE);
        return Ok(());
    }
    for (rank, kw) in keywords.iter().enumerate() {
        println!("{:>3}. {:<24} {:.3}", rank + 1, kw.term, kw.score);
    }
    Ok(())
}
