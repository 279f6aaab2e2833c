//! Tokens and expressions: the typed inputs of the locator.
//!
//! Tokens come from an external tokenizer with their positions already
//! assigned. Nothing in this crate renumbers them.

use std::ops::Deref;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One word of a tokenized line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Token {
    pub text: String,
    pub position: u32,
}

impl Token {
    pub fn new(text: impl Into<String>, position: u32) -> Self {
        Self {
            text: text.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("duplicate token position {0}")]
    DuplicatePosition(u32),

    #[error("token position {position} follows position {previous}; positions must increase")]
    OutOfOrder { previous: u32, position: u32 },
}

/// The tokens of a single line, ordered by strictly increasing position.
///
/// Positions do not have to be contiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenLine {
    tokens: Vec<Token>,
}

impl TokenLine {
    pub fn new(tokens: Vec<Token>) -> Result<Self, TokenError> {
        for pair in tokens.windows(2) {
            let (previous, position) = (pair[0].position, pair[1].position);
            if position == previous {
                return Err(TokenError::DuplicatePosition(position));
            }
            if position < previous {
                return Err(TokenError::OutOfOrder { previous, position });
            }
        }
        Ok(Self { tokens })
    }

    /// Number words from position 1, in order.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens = words
            .into_iter()
            .zip(1..)
            .map(|(word, position)| Token::new(word, position))
            .collect();
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    /// Tokens whose positions fall inside `span`.
    pub fn within(&self, span: crate::MatchSpan) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(move |t| span.contains(t.position))
    }
}

impl Deref for TokenLine {
    type Target = [Token];

    fn deref(&self) -> &[Token] {
        &self.tokens
    }
}

impl TryFrom<Vec<Token>> for TokenLine {
    type Error = TokenError;

    fn try_from(tokens: Vec<Token>) -> Result<Self, Self::Error> {
        Self::new(tokens)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    #[error("expression has no words")]
    Empty,
}

/// A phrase or slang term: one or more whitespace-separated words.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression {
    text: String,
}

impl Expression {
    pub fn new(text: impl Into<String>) -> Result<Self, ExpressionError> {
        let text = text.into();
        if text.split_whitespace().next().is_none() {
            return Err(ExpressionError::Empty);
        }
        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl FromStr for Expression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatchSpan;

    #[test]
    fn test_token_line_accepts_gaps() {
        let line = TokenLine::new(vec![Token::new("dale", 2), Token::new("mami", 5)]).unwrap();
        assert_eq!(line.len(), 2);
    }

    #[test]
    fn test_token_line_rejects_duplicates() {
        let result = TokenLine::new(vec![Token::new("a", 1), Token::new("b", 1)]);
        assert_eq!(result, Err(TokenError::DuplicatePosition(1)));
    }

    #[test]
    fn test_token_line_rejects_decreasing_positions() {
        let result = TokenLine::new(vec![Token::new("a", 3), Token::new("b", 2)]);
        assert_eq!(
            result,
            Err(TokenError::OutOfOrder {
                previous: 3,
                position: 2
            })
        );
    }

    #[test]
    fn test_from_words_numbers_from_one() {
        let line = TokenLine::from_words("pa' la casa".split_whitespace());
        let positions: Vec<u32> = line.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert_eq!(line[0].text, "pa'");
    }

    #[test]
    fn test_within_span() {
        let line = TokenLine::from_words(["tú", "tienes", "que", "irte"]);
        let words: Vec<&str> = line
            .within(MatchSpan::new(2, 3).unwrap())
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(words, vec!["tienes", "que"]);
    }

    #[test]
    fn test_expression_requires_a_word() {
        assert_eq!(Expression::new("   "), Err(ExpressionError::Empty));
        let expr: Expression = "tener  que ver".parse().unwrap();
        assert_eq!(expr.as_str(), "tener  que ver");
    }
}
