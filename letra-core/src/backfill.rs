//! Occurrence backfill.
//!
//! Runs the locator over every (line, catalogued expression) pair of a song
//! and records the spans it finds. Pairs that are already recorded are
//! skipped, so an interrupted run can simply be started again.
//!
//! Failures never abort the whole run: they are collected into the song's
//! report and the next song is processed.

use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::catalog::{
    CatalogEntry, ExpressionCatalog, ExpressionKind, Occurrence, OccurrenceWriter, Song, SongLine,
    StoreError,
};
use crate::locate::Locator;

/// Outcome of backfilling a single song.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SongReport {
    pub title: String,
    pub phrase_occurrences: usize,
    pub slang_occurrences: usize,
    /// Phrases linked to the song but found on none of its lines.
    pub phrases_not_found: Vec<String>,
    /// Slang terms linked to the song but found on none of its lines.
    pub slang_not_found: Vec<String>,
    pub errors: Vec<String>,
}

impl SongReport {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn occurrences(&self, kind: ExpressionKind) -> usize {
        match kind {
            ExpressionKind::Phrase => self.phrase_occurrences,
            ExpressionKind::Slang => self.slang_occurrences,
        }
    }

    pub fn not_found(&self, kind: ExpressionKind) -> &[String] {
        match kind {
            ExpressionKind::Phrase => &self.phrases_not_found,
            ExpressionKind::Slang => &self.slang_not_found,
        }
    }

    fn record(&mut self, kind: ExpressionKind, count: usize, not_found: Vec<String>) {
        match kind {
            ExpressionKind::Phrase => {
                self.phrase_occurrences = count;
                self.phrases_not_found = not_found;
            }
            ExpressionKind::Slang => {
                self.slang_occurrences = count;
                self.slang_not_found = not_found;
            }
        }
    }
}

/// Totals over a whole backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BackfillReport {
    pub songs_processed: usize,
    pub phrase_occurrences: usize,
    pub slang_occurrences: usize,
    /// Not-found phrase texts across all songs, without repeats.
    pub phrases_not_found: Vec<String>,
    /// Not-found slang texts across all songs, without repeats.
    pub slang_not_found: Vec<String>,
    pub errors: Vec<String>,
    pub songs: Vec<SongReport>,
}

impl BackfillReport {
    pub fn total_occurrences(&self) -> usize {
        self.phrase_occurrences + self.slang_occurrences
    }

    fn absorb(&mut self, song: SongReport) {
        self.songs_processed += 1;
        self.phrase_occurrences += song.phrase_occurrences;
        self.slang_occurrences += song.slang_occurrences;
        push_unique(&mut self.phrases_not_found, &song.phrases_not_found);
        push_unique(&mut self.slang_not_found, &song.slang_not_found);
        self.errors.extend(song.errors.iter().cloned());
        self.songs.push(song);
    }
}

fn push_unique(into: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !into.contains(item) {
            into.push(item.clone());
        }
    }
}

/// Working state for one kind of expression while a song is scanned.
struct Pass {
    kind: ExpressionKind,
    entries: Vec<CatalogEntry>,
    existing: HashSet<(String, String)>,
    found: HashSet<String>,
    records: Vec<Occurrence>,
}

/// Backfill driver.
#[derive(Debug, Clone, Default)]
pub struct Backfill {
    locator: Locator,
    dry_run: bool,
}

impl Backfill {
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            dry_run: false,
        }
    }

    /// Locate and report without writing anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Backfill every song, or only those whose title contains
    /// `title_filter` (case-insensitive).
    ///
    /// Only a failure to list the songs is returned as an error; everything
    /// else ends up in the report.
    pub fn run<S>(
        &self,
        store: &mut S,
        title_filter: Option<&str>,
    ) -> Result<BackfillReport, StoreError>
    where
        S: ExpressionCatalog + OccurrenceWriter,
    {
        let filter = title_filter.map(str::to_lowercase);
        let songs: Vec<Song> = store
            .songs()?
            .into_iter()
            .filter(|song| match &filter {
                Some(f) => song.title.to_lowercase().contains(f.as_str()),
                None => true,
            })
            .collect();

        let mut report = BackfillReport::default();
        for (i, song) in songs.iter().enumerate() {
            log::info!("processing song {} of {}: {}", i + 1, songs.len(), song.title);
            let song_report = self.process_song(store, song);
            if song_report.errors.is_empty() {
                log::info!(
                    "{}: {} phrases, {} slang",
                    song.title,
                    song_report.phrase_occurrences,
                    song_report.slang_occurrences
                );
            }
            report.absorb(song_report);
        }

        Ok(report)
    }

    /// Backfill a single song.
    pub fn process_song<S>(&self, store: &mut S, song: &Song) -> SongReport
    where
        S: ExpressionCatalog + OccurrenceWriter,
    {
        let mut report = SongReport::new(&song.title);

        let mut passes = Vec::with_capacity(ExpressionKind::ALL.len());
        for kind in ExpressionKind::ALL {
            match store.expressions_for_song(&song.id, kind) {
                Ok(entries) => passes.push(Pass {
                    kind,
                    entries,
                    existing: HashSet::new(),
                    found: HashSet::new(),
                    records: Vec::new(),
                }),
                Err(e) => {
                    fail(&mut report, format!("failed to get {kind} entries: {e}"));
                    return report;
                }
            }
        }

        let lines = match store.lines_for_song(&song.id) {
            Ok(lines) => lines,
            Err(e) => {
                fail(&mut report, format!("failed to get lines: {e}"));
                return report;
            }
        };
        if lines.is_empty() {
            return report;
        }

        for pass in &mut passes {
            pass.existing = store
                .existing_occurrences(&song.id, pass.kind)
                .unwrap_or_else(|e| {
                    log::warn!(
                        "{}: cannot load existing {} occurrences: {e}",
                        song.title,
                        pass.kind
                    );
                    HashSet::new()
                });
        }

        for line in lines.iter().filter(|l| !l.text.trim().is_empty()) {
            for pass in &mut passes {
                self.scan_line(line, pass);
            }
        }

        for pass in passes {
            let count = pass.records.len();
            let count = if count == 0 || self.dry_run {
                count
            } else {
                match store.insert_occurrences(pass.records) {
                    Ok(()) => count,
                    Err(e) => {
                        let message = format!("failed to insert {} occurrences: {e}", pass.kind);
                        fail(&mut report, message);
                        0
                    }
                }
            };

            let not_found = pass
                .entries
                .iter()
                .filter(|e| !pass.found.contains(&e.id))
                .map(|e| e.text.clone())
                .collect();
            report.record(pass.kind, count, not_found);
        }

        report
    }

    fn scan_line(&self, line: &SongLine, pass: &mut Pass) {
        for entry in &pass.entries {
            if pass.existing.contains(&(entry.id.clone(), line.id.clone())) {
                pass.found.insert(entry.id.clone());
                continue;
            }

            if let Some(span) = self.locator.find(&line.text, &entry.text, &line.tokens) {
                log::debug!("{} {:?} at {span} on line {}", entry.kind, entry.text, line.id);
                pass.records.push(Occurrence::new(entry, line, span));
                pass.found.insert(entry.id.clone());
            }
        }
    }
}

fn fail(report: &mut SongReport, message: String) {
    log::warn!("{}: {message}", report.title);
    report.errors.push(message);
}
