//! Corpus records and the storage collaborators the backfill runs against.
//!
//! The backfill never talks to a database directly. It reads through
//! [`ExpressionCatalog`] and writes through [`OccurrenceWriter`], so any
//! backend (the in-memory [`MemoryStore`], a YAML file, a remote service)
//! can be passed in.

use std::collections::HashSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::span::MatchSpan;
use crate::token::TokenLine;

/// Generate a new unique ID.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Which catalog an expression belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExpressionKind {
    /// An idiomatic multi-word phrase ("tener que ver").
    Phrase,
    /// A slang term, often a contraction ("pa'").
    Slang,
}

impl ExpressionKind {
    pub const ALL: [ExpressionKind; 2] = [ExpressionKind::Phrase, ExpressionKind::Slang];
}

impl fmt::Display for ExpressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionKind::Phrase => f.write_str("phrase"),
            ExpressionKind::Slang => f.write_str("slang"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub id: String,
    pub title: String,
}

impl Song {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// One line of a song, with the tokens produced for it upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongLine {
    pub id: String,
    pub song_id: String,
    pub section_id: String,
    /// Order of the line within the song.
    pub order: u32,
    pub text: String,
    /// Pure vocalizations ("eh-eh-eh") are flagged upstream and never scanned.
    pub skippable: bool,
    pub tokens: TokenLine,
}

impl SongLine {
    /// A non-skippable line whose tokens are its whitespace-separated words.
    pub fn new(
        id: impl Into<String>,
        song_id: impl Into<String>,
        order: u32,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        Self {
            id: id.into(),
            song_id: song_id.into(),
            section_id: String::new(),
            order,
            tokens: TokenLine::from_words(text.split_whitespace()),
            text,
            skippable: false,
        }
    }

    pub fn with_section(mut self, section_id: impl Into<String>) -> Self {
        self.section_id = section_id.into();
        self
    }

    pub fn with_tokens(mut self, tokens: TokenLine) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn skippable(mut self, skippable: bool) -> Self {
        self.skippable = skippable;
        self
    }
}

/// A catalogued phrase or slang term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: String,
    pub text: String,
    pub kind: ExpressionKind,
}

impl CatalogEntry {
    pub fn phrase(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind: ExpressionKind::Phrase,
        }
    }

    pub fn slang(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind: ExpressionKind::Slang,
        }
    }
}

/// A recorded location of a catalog entry within a song line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub id: String,
    pub kind: ExpressionKind,
    pub expression_id: String,
    pub line_id: String,
    pub song_id: String,
    pub section_id: String,
    pub span: MatchSpan,
}

impl Occurrence {
    pub fn new(entry: &CatalogEntry, line: &SongLine, span: MatchSpan) -> Self {
        Self {
            id: new_id(),
            kind: entry.kind,
            expression_id: entry.id.clone(),
            line_id: line.id.clone(),
            song_id: line.song_id.clone(),
            section_id: line.section_id.clone(),
            span,
        }
    }

    /// The `(expression_id, line_id)` pair used for resume checks.
    pub fn key(&self) -> (String, String) {
        (self.expression_id.clone(), self.line_id.clone())
    }
}

/// Errors that can occur during storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown song: '{0}'")]
    UnknownSong(String),

    #[error("unknown {kind} entry: '{id}'")]
    UnknownEntry { kind: ExpressionKind, id: String },

    #[error("{kind} '{expression_id}' is already recorded on line '{line_id}'")]
    DuplicateOccurrence {
        kind: ExpressionKind,
        expression_id: String,
        line_id: String,
    },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Read side of the corpus.
pub trait ExpressionCatalog {
    /// All songs, ordered by title.
    fn songs(&self) -> Result<Vec<Song>, StoreError>;

    /// Catalog entries of `kind` linked to a song.
    fn expressions_for_song(
        &self,
        song_id: &str,
        kind: ExpressionKind,
    ) -> Result<Vec<CatalogEntry>, StoreError>;

    /// Non-skippable lines of a song, ordered by line order.
    fn lines_for_song(&self, song_id: &str) -> Result<Vec<SongLine>, StoreError>;

    /// `(expression_id, line_id)` pairs already recorded for a song.
    fn existing_occurrences(
        &self,
        song_id: &str,
        kind: ExpressionKind,
    ) -> Result<HashSet<(String, String)>, StoreError>;
}

/// Write side of the corpus.
pub trait OccurrenceWriter {
    /// Record a batch of occurrences. A batch is all-or-nothing.
    fn insert_occurrences(&mut self, records: Vec<Occurrence>) -> Result<(), StoreError>;
}

/// In-memory corpus. Also the backing store of the YAML corpus file.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    songs: Vec<Song>,
    lines: Vec<SongLine>,
    entries: Vec<CatalogEntry>,
    /// `(song_id, entry kind, entry_id)`
    links: HashSet<(String, ExpressionKind, String)>,
    occurrences: Vec<Occurrence>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_song(&mut self, song: Song) {
        self.songs.push(song);
    }

    pub fn add_line(&mut self, line: SongLine) -> Result<(), StoreError> {
        self.require_song(&line.song_id)?;
        self.lines.push(line);
        Ok(())
    }

    pub fn add_entry(&mut self, entry: CatalogEntry) {
        self.entries.push(entry);
    }

    /// Link a catalog entry to a song.
    pub fn link(
        &mut self,
        song_id: &str,
        kind: ExpressionKind,
        entry_id: &str,
    ) -> Result<(), StoreError> {
        self.require_song(song_id)?;
        if self.find_entry(kind, entry_id).is_none() {
            return Err(StoreError::UnknownEntry {
                kind,
                id: entry_id.to_string(),
            });
        }
        self.links
            .insert((song_id.to_string(), kind, entry_id.to_string()));
        Ok(())
    }

    /// Songs in insertion order.
    pub fn all_songs(&self) -> &[Song] {
        &self.songs
    }

    /// Lines in insertion order, skippable ones included.
    pub fn all_lines(&self) -> &[SongLine] {
        &self.lines
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    pub fn find_song(&self, id: &str) -> Option<&Song> {
        self.songs.iter().find(|s| s.id == id)
    }

    pub fn find_line(&self, id: &str) -> Option<&SongLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn find_entry(&self, kind: ExpressionKind, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.kind == kind && e.id == id)
    }

    /// IDs of the songs an entry is linked to, in song insertion order.
    pub fn linked_songs(&self, kind: ExpressionKind, entry_id: &str) -> Vec<&str> {
        self.songs
            .iter()
            .filter(|s| {
                self.links
                    .contains(&(s.id.clone(), kind, entry_id.to_string()))
            })
            .map(|s| s.id.as_str())
            .collect()
    }

    fn require_song(&self, song_id: &str) -> Result<(), StoreError> {
        match self.find_song(song_id) {
            Some(_) => Ok(()),
            None => Err(StoreError::UnknownSong(song_id.to_string())),
        }
    }
}

impl ExpressionCatalog for MemoryStore {
    fn songs(&self) -> Result<Vec<Song>, StoreError> {
        let mut songs = self.songs.clone();
        songs.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(songs)
    }

    fn expressions_for_song(
        &self,
        song_id: &str,
        kind: ExpressionKind,
    ) -> Result<Vec<CatalogEntry>, StoreError> {
        self.require_song(song_id)?;
        Ok(self
            .entries
            .iter()
            .filter(|e| {
                e.kind == kind
                    && self
                        .links
                        .contains(&(song_id.to_string(), kind, e.id.clone()))
            })
            .cloned()
            .collect())
    }

    fn lines_for_song(&self, song_id: &str) -> Result<Vec<SongLine>, StoreError> {
        self.require_song(song_id)?;
        let mut lines: Vec<SongLine> = self
            .lines
            .iter()
            .filter(|l| l.song_id == song_id && !l.skippable)
            .cloned()
            .collect();
        lines.sort_by_key(|l| l.order);
        Ok(lines)
    }

    fn existing_occurrences(
        &self,
        song_id: &str,
        kind: ExpressionKind,
    ) -> Result<HashSet<(String, String)>, StoreError> {
        Ok(self
            .occurrences
            .iter()
            .filter(|o| o.song_id == song_id && o.kind == kind)
            .map(Occurrence::key)
            .collect())
    }
}

impl OccurrenceWriter for MemoryStore {
    fn insert_occurrences(&mut self, records: Vec<Occurrence>) -> Result<(), StoreError> {
        let mut seen: HashSet<(ExpressionKind, String, String)> = self
            .occurrences
            .iter()
            .map(|o| (o.kind, o.expression_id.clone(), o.line_id.clone()))
            .collect();

        for record in &records {
            self.require_song(&record.song_id)?;
            if !seen.insert((record.kind, record.expression_id.clone(), record.line_id.clone())) {
                return Err(StoreError::DuplicateOccurrence {
                    kind: record.kind,
                    expression_id: record.expression_id.clone(),
                    line_id: record.line_id.clone(),
                });
            }
        }

        self.occurrences.extend(records);
        Ok(())
    }
}
