//! Corpus I/O module for loading and saving corpora to disk.
//!
//! A corpus is a single YAML file holding songs, their tokenized lines, the
//! phrase and slang catalogs, and the occurrences recorded so far. It is
//! loaded into a [`MemoryStore`] and written back after a backfill.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::{
    CatalogEntry, ExpressionKind, MemoryStore, Occurrence, OccurrenceWriter, Song, SongLine,
    StoreError, new_id,
};
use crate::span::{MatchSpan, SpanError};
use crate::token::{Token, TokenError, TokenLine};

/// Error type for I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("failed to read file: {0}")]
    ReadFile(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("invalid tokens on line '{line}': {source}")]
    InvalidTokens {
        line: String,
        #[source]
        source: TokenError,
    },

    #[error("invalid span on occurrence '{occurrence}': {source}")]
    InvalidSpan {
        occurrence: String,
        #[source]
        source: SpanError,
    },

    #[error("duplicate {kind} id: '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    #[error("'{owner}' refers to unknown song '{song}'")]
    UnknownSong { owner: String, song: String },

    #[error("'{owner}' refers to unknown line '{line}'")]
    UnknownLine { owner: String, line: String },

    #[error("'{owner}' refers to unknown {kind} '{expression}'")]
    UnknownExpression {
        owner: String,
        kind: ExpressionKind,
        expression: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// Data Transfer Objects (DTOs) for YAML serialization
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SongDto {
    #[serde(default = "new_id")]
    pub id: String,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LineDto {
    #[serde(default = "new_id")]
    pub id: String,
    pub song: String,
    #[serde(default)]
    pub section: String,
    pub order: u32,
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skippable: bool,
    /// Tokens as produced by the tokenizer, ordered by position. When
    /// omitted, the whitespace-separated words of `text` numbered from 1.
    #[serde(default)]
    pub tokens: Option<Vec<Token>>,
}

/// DTO for a phrase or slang catalog entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct EntryDto {
    #[serde(default = "new_id")]
    pub id: String,
    pub text: String,
    /// IDs of the songs this entry is linked to.
    #[serde(default)]
    pub songs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OccurrenceDto {
    #[serde(default = "new_id")]
    pub id: String,
    pub kind: ExpressionKind,
    pub expression: String,
    pub line: String,
    pub song: String,
    #[serde(default)]
    pub section: String,
    pub start: u32,
    pub end: u32,
}

/// DTO for a complete corpus (single-file format).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CorpusDto {
    #[serde(default)]
    pub songs: Vec<SongDto>,
    #[serde(default)]
    pub lines: Vec<LineDto>,
    #[serde(default)]
    pub phrases: Vec<EntryDto>,
    #[serde(default)]
    pub slang: Vec<EntryDto>,
    #[serde(default)]
    pub occurrences: Vec<OccurrenceDto>,
}

// ============================================================================
// Conversion: DTO -> Domain types
// ============================================================================

impl LineDto {
    fn try_into_line(self) -> Result<SongLine, IoError> {
        let tokens = match self.tokens {
            Some(tokens) => TokenLine::new(tokens).map_err(|source| IoError::InvalidTokens {
                line: self.id.clone(),
                source,
            })?,
            None => TokenLine::from_words(self.text.split_whitespace()),
        };
        Ok(SongLine {
            id: self.id,
            song_id: self.song,
            section_id: self.section,
            order: self.order,
            text: self.text,
            skippable: self.skippable,
            tokens,
        })
    }
}

impl OccurrenceDto {
    fn try_into_occurrence(self) -> Result<Occurrence, IoError> {
        let span = MatchSpan::new(self.start, self.end).map_err(|source| IoError::InvalidSpan {
            occurrence: self.id.clone(),
            source,
        })?;
        Ok(Occurrence {
            id: self.id,
            kind: self.kind,
            expression_id: self.expression,
            line_id: self.line,
            song_id: self.song,
            section_id: self.section,
            span,
        })
    }
}

impl TryFrom<CorpusDto> for MemoryStore {
    type Error = IoError;

    fn try_from(corpus: CorpusDto) -> Result<Self, Self::Error> {
        let mut store = MemoryStore::new();

        check_unique("song", corpus.songs.iter().map(|s| &s.id))?;
        check_unique("line", corpus.lines.iter().map(|l| &l.id))?;
        check_unique("phrase", corpus.phrases.iter().map(|e| &e.id))?;
        check_unique("slang", corpus.slang.iter().map(|e| &e.id))?;
        check_unique("occurrence", corpus.occurrences.iter().map(|o| &o.id))?;

        for song in corpus.songs {
            store.add_song(Song::new(song.id, song.title));
        }

        for line in corpus.lines {
            if store.find_song(&line.song).is_none() {
                return Err(IoError::UnknownSong {
                    owner: line.id,
                    song: line.song,
                });
            }
            store.add_line(line.try_into_line()?)?;
        }

        for (kind, entries) in [
            (ExpressionKind::Phrase, corpus.phrases),
            (ExpressionKind::Slang, corpus.slang),
        ] {
            for entry in entries {
                store.add_entry(CatalogEntry {
                    id: entry.id.clone(),
                    text: entry.text,
                    kind,
                });
                for song in entry.songs {
                    if store.find_song(&song).is_none() {
                        return Err(IoError::UnknownSong {
                            owner: entry.id,
                            song,
                        });
                    }
                    store.link(&song, kind, &entry.id)?;
                }
            }
        }

        let occurrences = corpus
            .occurrences
            .into_iter()
            .map(|dto| {
                let occurrence = dto.try_into_occurrence()?;
                check_references(&store, &occurrence)?;
                Ok(occurrence)
            })
            .collect::<Result<Vec<_>, IoError>>()?;
        store.insert_occurrences(occurrences)?;

        Ok(store)
    }
}

fn check_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a String>,
) -> Result<(), IoError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(IoError::DuplicateId {
                kind,
                id: id.clone(),
            });
        }
    }
    Ok(())
}

/// An occurrence must point at a song, line and entry already in the store.
fn check_references(store: &MemoryStore, occurrence: &Occurrence) -> Result<(), IoError> {
    if store.find_song(&occurrence.song_id).is_none() {
        return Err(IoError::UnknownSong {
            owner: occurrence.id.clone(),
            song: occurrence.song_id.clone(),
        });
    }
    if store.find_line(&occurrence.line_id).is_none() {
        return Err(IoError::UnknownLine {
            owner: occurrence.id.clone(),
            line: occurrence.line_id.clone(),
        });
    }
    if store
        .find_entry(occurrence.kind, &occurrence.expression_id)
        .is_none()
    {
        return Err(IoError::UnknownExpression {
            owner: occurrence.id.clone(),
            kind: occurrence.kind,
            expression: occurrence.expression_id.clone(),
        });
    }
    Ok(())
}

// ============================================================================
// Conversion: Domain types -> DTO
// ============================================================================

impl From<&SongLine> for LineDto {
    fn from(line: &SongLine) -> Self {
        LineDto {
            id: line.id.clone(),
            song: line.song_id.clone(),
            section: line.section_id.clone(),
            order: line.order,
            text: line.text.clone(),
            skippable: line.skippable,
            tokens: Some(line.tokens.to_vec()),
        }
    }
}

impl From<&Occurrence> for OccurrenceDto {
    fn from(occurrence: &Occurrence) -> Self {
        OccurrenceDto {
            id: occurrence.id.clone(),
            kind: occurrence.kind,
            expression: occurrence.expression_id.clone(),
            line: occurrence.line_id.clone(),
            song: occurrence.song_id.clone(),
            section: occurrence.section_id.clone(),
            start: occurrence.span.start_position,
            end: occurrence.span.end_position,
        }
    }
}

impl From<&MemoryStore> for CorpusDto {
    fn from(store: &MemoryStore) -> Self {
        let entries = |kind: ExpressionKind| -> Vec<EntryDto> {
            store
                .entries()
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| EntryDto {
                    id: e.id.clone(),
                    text: e.text.clone(),
                    songs: store
                        .linked_songs(kind, &e.id)
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                })
                .collect()
        };

        CorpusDto {
            songs: store
                .all_songs()
                .iter()
                .map(|s| SongDto {
                    id: s.id.clone(),
                    title: s.title.clone(),
                })
                .collect(),
            lines: store.all_lines().iter().map(Into::into).collect(),
            phrases: entries(ExpressionKind::Phrase),
            slang: entries(ExpressionKind::Slang),
            occurrences: store.occurrences().iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Corpus file I/O
// ============================================================================

/// Load a corpus from a YAML file.
pub fn load_corpus(path: &Path) -> Result<MemoryStore, IoError> {
    let content = fs::read_to_string(path)?;
    parse_corpus(&content)
}

/// Save a corpus to a YAML file, replacing its previous contents.
pub fn save_corpus(store: &MemoryStore, path: &Path) -> Result<(), IoError> {
    let content = serialize_corpus(store)?;
    fs::write(path, content)?;
    Ok(())
}

/// Parse a corpus from a YAML string.
pub fn parse_corpus(yaml: &str) -> Result<MemoryStore, IoError> {
    let corpus: CorpusDto = serde_yaml_ng::from_str(yaml)?;
    corpus.try_into()
}

/// Serialize a corpus to a YAML string.
pub fn serialize_corpus(store: &MemoryStore) -> Result<String, IoError> {
    let corpus: CorpusDto = store.into();
    Ok(serde_yaml_ng::to_string(&corpus)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ExpressionCatalog;
    use tempfile::tempdir;

    const TEST_CORPUS_YAML: &str = r#"
songs:
  - id: s1
    title: Pa' la casa
lines:
  - id: l1
    song: s1
    section: verse-1
    order: 1
    text: "Tú tienes que irte pa' la casa ahora"
    tokens:
      - { text: "Tú", position: 1 }
      - { text: tienes, position: 2 }
      - { text: que, position: 3 }
      - { text: irte, position: 4 }
      - { text: "pa'", position: 5 }
      - { text: la, position: 6 }
      - { text: casa, position: 7 }
      - { text: ahora, position: 8 }
  - id: l2
    song: s1
    section: chorus
    order: 2
    text: "eh-eh-eh"
    skippable: true
phrases:
  - id: p1
    text: "pa' la casa"
    songs: [s1]
slang:
  - id: x1
    text: "pa'"
    songs: [s1]
occurrences:
  - id: o1
    kind: slang
    expression: x1
    line: l1
    song: s1
    section: verse-1
    start: 5
    end: 5
"#;

    fn make_test_store() -> MemoryStore {
        parse_corpus(TEST_CORPUS_YAML).expect("TEST_CORPUS_YAML should be valid")
    }

    #[test]
    fn test_parse_corpus() {
        let store = make_test_store();

        assert_eq!(store.all_songs().len(), 1);
        assert_eq!(store.all_lines().len(), 2);
        assert_eq!(store.all_lines()[0].tokens.len(), 8);
        assert!(store.all_lines()[1].skippable);
        assert_eq!(store.entries().len(), 2);
        assert_eq!(store.linked_songs(ExpressionKind::Phrase, "p1"), vec!["s1"]);
        assert_eq!(store.occurrences().len(), 1);
        assert_eq!(store.occurrences()[0].span, MatchSpan::single(5));
    }

    #[test]
    fn test_corpus_round_trip() {
        let store = make_test_store();

        let yaml = serialize_corpus(&store).unwrap();
        let loaded = parse_corpus(&yaml).unwrap();

        assert_eq!(loaded.all_songs(), store.all_songs());
        assert_eq!(loaded.all_lines(), store.all_lines());
        assert_eq!(loaded.entries(), store.entries());
        assert_eq!(loaded.occurrences(), store.occurrences());
        assert_eq!(loaded.linked_songs(ExpressionKind::Slang, "x1"), vec!["s1"]);
    }

    #[test]
    fn test_corpus_file_round_trip() {
        let store = make_test_store();
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.yml");

        save_corpus(&store, &path).unwrap();
        let loaded = load_corpus(&path).unwrap();

        assert_eq!(loaded.occurrences(), store.occurrences());
        assert_eq!(loaded.lines_for_song("s1").unwrap().len(), 1);
    }

    #[test]
    fn test_ids_auto_generated_when_missing() {
        let yaml = r#"
songs:
  - id: s1
    title: Sin nombre
lines:
  - song: s1
    order: 1
    text: hola
  - song: s1
    order: 2
    text: "sin tokens"
    tokens: []
phrases:
  - text: "tener que ver"
"#;

        let store = parse_corpus(yaml).unwrap();
        assert!(!store.all_lines()[0].id.is_empty());
        assert!(!store.entries()[0].id.is_empty());
        assert_eq!(store.all_lines()[0].tokens.len(), 1);
        assert!(store.all_lines()[1].tokens.is_empty());
    }

    #[test]
    fn test_duplicate_id_error() {
        let yaml = r#"
songs:
  - id: s1
    title: Uno
  - id: s1
    title: Dos
"#;

        let result = parse_corpus(yaml);
        assert!(matches!(result, Err(IoError::DuplicateId { kind: "song", id }) if id == "s1"));
    }

    #[test]
    fn test_invalid_tokens_error() {
        let yaml = r#"
songs:
  - id: s1
    title: Uno
lines:
  - id: l1
    song: s1
    order: 1
    text: "dale mami"
    tokens:
      - { text: dale, position: 2 }
      - { text: mami, position: 1 }
"#;

        let result = parse_corpus(yaml);
        assert!(matches!(
            result,
            Err(IoError::InvalidTokens {
                line,
                source: TokenError::OutOfOrder { .. }
            }) if line == "l1"
        ));
    }

    #[test]
    fn test_unknown_song_error() {
        let yaml = r#"
songs:
  - id: s1
    title: Uno
slang:
  - id: x1
    text: "pa'"
    songs: [s9]
"#;

        let result = parse_corpus(yaml);
        assert!(matches!(
            result,
            Err(IoError::UnknownSong { owner, song }) if owner == "x1" && song == "s9"
        ));
    }

    #[test]
    fn test_reversed_occurrence_span_error() {
        let yaml = r#"
songs:
  - id: s1
    title: Uno
occurrences:
  - id: o1
    kind: phrase
    expression: p1
    line: l1
    song: s1
    start: 4
    end: 2
"#;

        let result = parse_corpus(yaml);
        assert!(matches!(
            result,
            Err(IoError::InvalidSpan { occurrence, .. }) if occurrence == "o1"
        ));
    }

    #[test]
    fn test_duplicate_occurrence_id_error() {
        let extra =
            "  - { id: o1, kind: phrase, expression: p1, line: l1, song: s1, start: 5, end: 7 }\n";
        let yaml = TEST_CORPUS_YAML.replace("occurrences:\n", &format!("occurrences:\n{extra}"));

        let result = parse_corpus(&yaml);
        assert!(matches!(
            result,
            Err(IoError::DuplicateId { kind: "occurrence", id }) if id == "o1"
        ));
    }

    #[test]
    fn test_occurrence_unknown_song_error() {
        let yaml = TEST_CORPUS_YAML.replace(
            "    song: s1\n    section: verse-1\n    start",
            "    song: s9\n    section: verse-1\n    start",
        );

        let result = parse_corpus(&yaml);
        assert!(matches!(
            result,
            Err(IoError::UnknownSong { owner, song }) if owner == "o1" && song == "s9"
        ));
    }

    #[test]
    fn test_occurrence_unknown_line_error() {
        let yaml = TEST_CORPUS_YAML.replace("    line: l1\n", "    line: l7\n");

        let result = parse_corpus(&yaml);
        assert!(matches!(
            result,
            Err(IoError::UnknownLine { owner, line }) if owner == "o1" && line == "l7"
        ));
    }

    #[test]
    fn test_occurrence_unknown_expression_error() {
        // x1 exists, but as slang rather than a phrase.
        let yaml = TEST_CORPUS_YAML.replace("    kind: slang\n", "    kind: phrase\n");

        let result = parse_corpus(&yaml);
        assert!(matches!(
            result,
            Err(IoError::UnknownExpression { owner, kind: ExpressionKind::Phrase, expression })
                if owner == "o1" && expression == "x1"
        ));
    }
}
