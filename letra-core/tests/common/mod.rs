//! Shared test utilities for letra tests.
//!
//! Provides helper functions for:
//! - Building token lists from words
//! - Locating expressions in whitespace-tokenized lines
//! - Creating small inline test corpora from YAML

#![allow(dead_code)]

use letra_core::{MatchSpan, MemoryStore, Token, TokenLine, find_span, parse_corpus};
use once_cell::sync::Lazy;

// ============================================================================
// Token Helpers
// ============================================================================

/// Tokens for `words`, numbered from position 1.
pub fn tokens(words: &[&str]) -> Vec<Token> {
    TokenLine::from_words(words.iter().copied()).into_tokens()
}

/// Tokens with explicit positions.
pub fn positioned(words: &[(&str, u32)]) -> Vec<Token> {
    words
        .iter()
        .map(|(text, position)| Token::new(*text, *position))
        .collect()
}

/// Locate `expression` in `line`, tokenizing the line on whitespace.
pub fn find(line: &str, expression: &str) -> Option<(u32, u32)> {
    let tokens = TokenLine::from_words(line.split_whitespace());
    find_span(line, expression, &tokens).map(Into::into)
}

pub fn span(start: u32, end: u32) -> MatchSpan {
    MatchSpan::new(start, end).expect("test span should be ordered")
}

// ============================================================================
// Inline Corpus Helpers
// ============================================================================

/// Create a small test corpus from inline YAML.
///
/// # Example
/// ```ignore
/// let store = corpus(r#"
/// songs:
///   - id: s1
///     title: Uno
/// "#);
/// ```
pub fn corpus(yaml: &str) -> MemoryStore {
    parse_corpus(yaml).expect("Test corpus YAML should be valid")
}

/// Two songs: one with phrase and slang hits, one with nothing to find.
pub const SAMPLE_CORPUS: &str = r#"
songs:
  - id: s1
    title: Pa' la casa
  - id: s2
    title: Bajo la lluvia
lines:
  - id: s1-l1
    song: s1
    section: verse-1
    order: 1
    text: "Tú tienes que irte pa' la casa ahora"
  - id: s1-l2
    song: s1
    section: verse-1
    order: 2
    text: "Eso no tiene que ver con nada"
  - id: s1-l3
    song: s1
    section: chorus
    order: 3
    text: "eh-eh-eh"
    skippable: true
  - id: s1-l4
    song: s1
    section: chorus
    order: 4
    text: "Y yo me voy pa' la casa, mami"
  - id: s2-l1
    song: s2
    section: verse-1
    order: 1
    text: "No voy a casar a nadie"
phrases:
  - id: p-casa
    text: "pa' la casa"
    songs: [s1]
  - id: p-ver
    text: "tener que ver"
    songs: [s1]
  - id: p-razon
    text: "tener razón"
    songs: [s1, s2]
slang:
  - id: x-pa
    text: "pa'"
    songs: [s1]
  - id: x-casa
    text: "casa"
    songs: [s2]
"#;

pub static SAMPLE: Lazy<MemoryStore> = Lazy::new(|| corpus(SAMPLE_CORPUS));

/// A fresh copy of the sample corpus.
pub fn sample() -> MemoryStore {
    SAMPLE.clone()
}
