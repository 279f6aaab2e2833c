use std::fmt;

/// Inclusive range of token positions covered by a located expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchSpan {
    pub start_position: u32,
    pub end_position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpanError {
    #[error("span start {start} is after span end {end}")]
    Reversed { start: u32, end: u32 },
}

impl MatchSpan {
    pub fn new(start_position: u32, end_position: u32) -> Result<Self, SpanError> {
        if start_position > end_position {
            return Err(SpanError::Reversed {
                start: start_position,
                end: end_position,
            });
        }
        Ok(Self {
            start_position,
            end_position,
        })
    }

    /// A span covering exactly one token.
    pub fn single(position: u32) -> Self {
        Self {
            start_position: position,
            end_position: position,
        }
    }

    /// Smallest span covering every position, or `None` when empty.
    pub fn covering(positions: impl IntoIterator<Item = u32>) -> Option<Self> {
        positions.into_iter().fold(None, |span, position| match span {
            None => Some(Self::single(position)),
            Some(Self {
                start_position,
                end_position,
            }) => Some(Self {
                start_position: start_position.min(position),
                end_position: end_position.max(position),
            }),
        })
    }

    pub fn contains(&self, position: u32) -> bool {
        (self.start_position..=self.end_position).contains(&position)
    }
}

impl From<MatchSpan> for (u32, u32) {
    fn from(span: MatchSpan) -> Self {
        (span.start_position, span.end_position)
    }
}

impl fmt::Display for MatchSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_position, self.end_position)
    }
}
