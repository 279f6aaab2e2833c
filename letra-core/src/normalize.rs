//! Text normalization for expression matching.
//!
//! Two comparison forms are produced:
//! - [`normalize_loose`]: trimmed, lowercased, NFC-composed. Punctuation is
//!   kept, so it is used for the line-level containment check.
//! - [`normalize_for_matching`]: the loose form with apostrophes and the
//!   stop punctuation removed. Used for token-level comparison, where
//!   contractions such as `pa'` and `to’` must equal `pa` and `to`.

use unicode_normalization::UnicodeNormalization;

/// Apostrophe characters treated as interchangeable (and optional).
pub const APOSTROPHES: &[char] = &['\'', '\u{2019}'];

/// Punctuation removed by [`normalize_for_matching`].
pub const STOP_PUNCTUATION: &[char] = &['¿', '?', '¡', '!', '.', ',', ';', ':'];

/// Returns true for either apostrophe character.
pub fn is_apostrophe(c: char) -> bool {
    APOSTROPHES.contains(&c)
}

/// Lowercase and NFC-compose `text`, trimming surrounding whitespace.
pub fn normalize_loose(text: &str) -> String {
    text.trim().to_lowercase().nfc().collect()
}

/// Normalize `text` with the default punctuation set.
pub fn normalize_for_matching(text: &str) -> String {
    Normalizer::new().for_matching(text)
}

/// Canonicalizes text for comparison.
///
/// Carries the punctuation set stripped by [`Normalizer::for_matching`].
/// Everything in this crate uses [`Normalizer::new`]; a different set only
/// matters when reproducing data produced with another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    punctuation: &'static [char],
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub const fn new() -> Self {
        Self {
            punctuation: STOP_PUNCTUATION,
        }
    }

    /// Use a custom punctuation set instead of [`STOP_PUNCTUATION`].
    pub const fn with_punctuation(punctuation: &'static [char]) -> Self {
        Self { punctuation }
    }

    /// The loose form with apostrophes and punctuation removed.
    pub fn for_matching(&self, text: &str) -> String {
        normalize_loose(text)
            .chars()
            .filter(|c| !is_apostrophe(*c) && !self.punctuation.contains(c))
            .collect()
    }
}
