//! Locating catalogued expressions inside tokenized lines.
//!
//! Matching runs in two stages:
//! 1. A coarse containment check on the raw line text. The expression must
//!    appear delimited by non-word characters (or the ends of the line), so
//!    `casa` is rejected inside `casar`. Apostrophes in the expression are
//!    optional, so `pa'` is found in both `pa' la casa` and `pa la casa`.
//! 2. Alignment against the line's tokens, which produces the span.
//!
//! Words shorter than [`SHORT_WORD_LEN`] characters only ever match a token
//! exactly. A single short word skips stage 1 entirely.
//!
//! The two stages normalize differently (stage 1 keeps punctuation, stage 2
//! strips it), so a line can pass stage 1 and still fail to align. That is
//! reported as not found like any other miss.

use crate::normalize::{APOSTROPHES, Normalizer, is_apostrophe, normalize_loose};
use crate::span::MatchSpan;
use crate::token::{Expression, Token, TokenLine};

/// Words with fewer characters than this are matched exactly.
pub const SHORT_WORD_LEN: usize = 3;

/// Finds where an expression occurs in a tokenized line.
///
/// A `Locator` holds only policy (normalizer and short-word length), so a
/// single value can be shared freely between threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    normalizer: Normalizer,
    short_word_len: usize,
}

impl Default for Locator {
    fn default() -> Self {
        Self::new()
    }
}

/// A token's normalized text alongside its original position.
struct Normalized {
    text: String,
    position: u32,
}

impl Locator {
    pub const fn new() -> Self {
        Self {
            normalizer: Normalizer::new(),
            short_word_len: SHORT_WORD_LEN,
        }
    }

    pub const fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub const fn with_short_word_len(mut self, short_word_len: usize) -> Self {
        self.short_word_len = short_word_len;
        self
    }

    pub fn short_word_len(&self) -> usize {
        self.short_word_len
    }

    /// Find the span of `expression_text` within a line.
    ///
    /// `tokens` must be in position order. Returns the leftmost match, or
    /// `None` when the expression does not occur (including when the line,
    /// the token list or the expression is empty).
    ///
    /// # Example
    ///
    /// ```
    /// use letra_core::{Locator, MatchSpan, TokenLine};
    ///
    /// let line = "Tú tienes que irte pa' la casa ahora";
    /// let tokens = TokenLine::from_words(line.split_whitespace());
    /// let span = Locator::new().find(line, "pa' la casa", &tokens);
    /// assert_eq!(span, Some(MatchSpan::new(5, 7).unwrap()));
    /// ```
    pub fn find(
        &self,
        line_text: &str,
        expression_text: &str,
        tokens: &[Token],
    ) -> Option<MatchSpan> {
        if line_text.trim().is_empty() || tokens.is_empty() {
            return None;
        }

        let words: Vec<String> = expression_text
            .split_whitespace()
            .map(|word| self.normalizer.for_matching(word))
            .filter(|word| !word.is_empty())
            .collect();

        let normalized: Vec<Normalized> = tokens
            .iter()
            .map(|token| Normalized {
                text: self.normalizer.for_matching(&token.text),
                position: token.position,
            })
            .collect();

        match words.as_slice() {
            [] => None,
            [target] => {
                if !self.is_short(target) && !self.contains_delimited(line_text, expression_text) {
                    return None;
                }
                normalized
                    .iter()
                    .find(|token| self.words_match(target, &token.text))
                    .map(|token| MatchSpan::single(token.position))
            }
            _ => {
                if !self.contains_delimited(line_text, expression_text) {
                    return None;
                }
                normalized
                    .windows(words.len())
                    .find(|window| {
                        window
                            .iter()
                            .zip(&words)
                            .all(|(token, word)| self.words_match(word, &token.text))
                    })
                    .and_then(|window| MatchSpan::covering(window.iter().map(|t| t.position)))
            }
        }
    }

    /// Typed form of [`Locator::find`].
    pub fn locate(
        &self,
        line_text: &str,
        expression: &Expression,
        tokens: &TokenLine,
    ) -> Option<MatchSpan> {
        self.find(line_text, expression.as_str(), tokens)
    }

    /// Coarse check that `expression_text` occurs in `line_text` as whole
    /// words, with apostrophes in the expression treated as optional.
    ///
    /// Scans start positions left to right and stops at the first hit, so a
    /// line that begins with the expression costs one comparison pass.
    pub fn contains_delimited(&self, line_text: &str, expression_text: &str) -> bool {
        let expression = normalize_loose(expression_text);
        if expression.is_empty() {
            return false;
        }

        let parts: Vec<&str> = expression.split(is_apostrophe).collect();
        let line = normalize_loose(line_text);

        let mut previous: Option<char> = None;
        for (offset, c) in line.char_indices() {
            if previous.is_none_or(|p| !is_word_char(p)) && matches_at(&line[offset..], &parts) {
                return true;
            }
            previous = Some(c);
        }
        previous.is_none_or(|p| !is_word_char(p)) && matches_at("", &parts)
    }

    fn is_short(&self, word: &str) -> bool {
        word.chars().count() < self.short_word_len
    }

    fn words_match(&self, expression_word: &str, token_word: &str) -> bool {
        if expression_word == token_word {
            return true;
        }
        !self.is_short(expression_word) && contraction_equivalent(expression_word, token_word)
    }
}

/// Word characters for boundary purposes: letters, digits and `_`.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether `text` starts with `parts` joined by optional apostrophes and
/// followed by a non-word character or the end of the text.
fn matches_at(text: &str, parts: &[&str]) -> bool {
    // Offsets into `text` reachable after the parts consumed so far.
    let mut offsets = vec![0];
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            let skipped: Vec<usize> = offsets
                .iter()
                .filter_map(|&offset| {
                    text[offset..]
                        .chars()
                        .next()
                        .filter(|c| is_apostrophe(*c))
                        .map(|c| offset + c.len_utf8())
                })
                .collect();
            offsets.extend(skipped);
        }
        offsets.retain(|&offset| text[offset..].starts_with(part));
        for offset in &mut offsets {
            *offset += part.len();
        }
        offsets.sort_unstable();
        offsets.dedup();
        if offsets.is_empty() {
            return false;
        }
    }
    offsets
        .iter()
        .any(|&offset| text[offset..].chars().next().is_none_or(|c| !is_word_char(c)))
}

/// `pa'` and `pa` are the same word.
fn contraction_equivalent(a: &str, b: &str) -> bool {
    a.trim_end_matches(APOSTROPHES) == b || b.trim_end_matches(APOSTROPHES) == a
}

/// [`Locator::find`] with the default policy.
pub fn find_span(line_text: &str, expression_text: &str, tokens: &[Token]) -> Option<MatchSpan> {
    Locator::new().find(line_text, expression_text, tokens)
}
