//! Reading state on disk: per-book positions and bookmarks in `state.json`,
//! display preferences in `preferences.json`.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::{
    config,
    types::{Book, BookRecord, Bookmark, ReaderPreferences, ReadingPosition},
};

const STATE_FILE: &str = "state.json";
const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    /// Store under the per-user config directory.
    pub fn open_default() -> Option<Self> {
        config::config_root().map(Self::at)
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_position(&self, book_id: &Uuid) -> Option<ReadingPosition> {
        self.record(book_id).map(|r| r.position)
    }

    pub fn save_position(&self, book: &Book, position: ReadingPosition) -> io::Result<()> {
        self.update_record(book, |record| record.position = position)
    }

    pub fn bookmarks(&self, book_id: &Uuid) -> Vec<Bookmark> {
        self.record(book_id)
            .map(|r| r.bookmarks)
            .unwrap_or_default()
    }

    /// Adds `bookmark`, replacing one already at the same position.
    pub fn add_bookmark(&self, book: &Book, bookmark: Bookmark) -> io::Result<()> {
        self.update_record(book, |record| {
            record.bookmarks.retain(|b| b.position != bookmark.position);
            record.bookmarks.push(bookmark);
            record.bookmarks.sort_by_key(|b| b.position);
        })
    }

    /// Returns whether a bookmark was removed.
    pub fn remove_bookmark(&self, book_id: &Uuid, position: ReadingPosition) -> io::Result<bool> {
        let mut records = self.load_records();
        let Some(record) = records.iter_mut().find(|r| r.book_id == *book_id) else {
            return Ok(false);
        };
        let before = record.bookmarks.len();
        record.bookmarks.retain(|b| b.position != position);
        if record.bookmarks.len() == before {
            return Ok(false);
        }
        self.write_json(STATE_FILE, &records)?;
        Ok(true)
    }

    /// Most recently saved books first.
    pub fn recent_books(&self, limit: usize) -> Vec<BookRecord> {
        let mut records = self.load_records();
        records.sort_by_key(|r| std::cmp::Reverse(parse_timestamp(&r.saved_at)));
        records.truncate(limit);
        records
    }

    pub fn load_preferences(&self) -> ReaderPreferences {
        self.read_json(PREFERENCES_FILE).unwrap_or_default()
    }

    pub fn save_preferences(&self, prefs: &ReaderPreferences) -> io::Result<()> {
        self.write_json(PREFERENCES_FILE, prefs)
    }

    fn record(&self, book_id: &Uuid) -> Option<BookRecord> {
        self.load_records()
            .into_iter()
            .find(|r| r.book_id == *book_id)
    }

    fn load_records(&self) -> Vec<BookRecord> {
        self.read_json(STATE_FILE).unwrap_or_default()
    }

    fn update_record(&self, book: &Book, apply: impl FnOnce(&mut BookRecord)) -> io::Result<()> {
        let mut records = self.load_records();
        let index = match records.iter().position(|r| r.book_id == book.id) {
            Some(i) => i,
            None => {
                records.push(BookRecord {
                    book_id: book.id,
                    title: book.title.clone(),
                    source_link: book.source_link.clone(),
                    position: ReadingPosition::default(),
                    bookmarks: Vec::new(),
                    saved_at: String::new(),
                });
                records.len() - 1
            }
        };
        let record = &mut records[index];
        apply(record);
        record.title = book.title.clone();
        record.saved_at = Utc::now().to_rfc3339();
        self.write_json(STATE_FILE, &records)
    }

    // Missing or unreadable files read as absent.
    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let data = fs::read(self.root.join(name)).ok()?;
        match serde_json::from_slice(&data) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("ignoring corrupt {}: {}", name, err);
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        let s = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut f = fs::File::create(self.root.join(name))?;
        f.write_all(s.as_bytes())
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
