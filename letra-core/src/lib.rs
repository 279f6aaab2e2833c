pub mod backfill;
pub mod catalog;
#[cfg(feature = "serde")]
pub mod io;
pub mod locate;
pub mod normalize;
pub mod span;
pub mod token;

// Re-exports for convenience
pub use locate::{Locator, SHORT_WORD_LEN, find_span};
pub use normalize::{Normalizer, normalize_for_matching, normalize_loose};
pub use span::{MatchSpan, SpanError};
pub use token::{Expression, ExpressionError, Token, TokenError, TokenLine};

pub use catalog::{
    CatalogEntry, ExpressionCatalog, ExpressionKind, MemoryStore, Occurrence, OccurrenceWriter,
    Song, SongLine, StoreError, new_id,
};

pub use backfill::{Backfill, BackfillReport, SongReport};

#[cfg(feature = "serde")]
pub use io::{IoError, load_corpus, parse_corpus, save_corpus, serialize_corpus};
