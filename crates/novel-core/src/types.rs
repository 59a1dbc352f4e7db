use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Normalized chapter body, shared between the cache, the session and workers.
pub type ChapterText = Arc<str>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub source_link: String,
    pub ordinal_index: usize,
}

/// One anchor of a table-of-contents page, before it is numbered into a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterLink {
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub source_link: String,
    chapters: Vec<Chapter>,
}

impl Book {
    pub fn new(
        title: impl Into<String>,
        author: Option<String>,
        source_link: impl Into<String>,
        links: Vec<ChapterLink>,
    ) -> Self {
        let source_link = source_link.into();
        Self {
            id: Self::id_for_link(&source_link),
            title: title.into(),
            author,
            source_link,
            chapters: number_links(links, 0),
        }
    }

    /// Stable identifier for a book hosted at `source_link`.
    pub fn id_for_link(source_link: &str) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_URL, source_link.as_bytes())
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.chapters.len().checked_sub(1)
    }

    pub fn replace_chapters(&mut self, links: Vec<ChapterLink>) {
        self.chapters = number_links(links, 0);
    }

    pub fn append_chapters(&mut self, links: Vec<ChapterLink>) {
        let start = self.chapters.len();
        self.chapters.extend(number_links(links, start));
    }
}

fn number_links(links: Vec<ChapterLink>, start: usize) -> Vec<Chapter> {
    links
        .into_iter()
        .enumerate()
        .map(|(i, link)| Chapter {
            title: link.title,
            source_link: link.link,
            ordinal_index: start + i,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReadingPosition {
    pub chapter_index: usize,
    pub page_index: usize,
}

impl ReadingPosition {
    pub fn new(chapter_index: usize, page_index: usize) -> Self {
        Self {
            chapter_index,
            page_index,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub position: ReadingPosition,
    pub chapter_title: String,
    pub excerpt: String,
    pub created_at: String,
}

impl Bookmark {
    pub fn new(
        position: ReadingPosition,
        chapter_title: impl Into<String>,
        excerpt: impl Into<String>,
    ) -> Self {
        Self {
            position,
            chapter_title: chapter_title.into(),
            excerpt: excerpt.into(),
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    #[default]
    Paper,
    Sepia,
    Green,
    Night,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderPreferences {
    pub font_family: String,
    pub font_size: f32,
    pub background: Background,
}

impl Default for ReaderPreferences {
    fn default() -> Self {
        Self {
            font_family: "serif".into(),
            font_size: 18.0,
            background: Background::Paper,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRecord {
    pub book_id: Uuid,
    pub title: String,
    pub source_link: String,
    pub position: ReadingPosition,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
    pub saved_at: String,
}
