//! Where chapter text comes from: a byte [`Fetcher`] plus the site's
//! [`SiteProfile`], glued to the extractor and normalizer.

mod error;
mod http;


use crate::config::SiteProfile;
use crate::extract::{self, parse_book_info, parse_chapter_list};
use crate::normalize::normalize;
use crate::types::{Book, Chapter, ChapterLink, ChapterText};

pub use error::{LoadError, NetworkError};
pub use http::HttpFetcher;

/// Raw byte transport. Implementations are shared with worker threads.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, NetworkError>;
}

impl<F: Fetcher + ?Sized> Fetcher for std::sync::Arc<F> {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        (**self).fetch(url)
    }
}

pub struct ChapterSource {
    fetcher: Box<dyn Fetcher>,
    profile: SiteProfile,
}

impl ChapterSource {
    pub fn new(fetcher: impl Fetcher + 'static, profile: SiteProfile) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            profile,
        }
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    pub fn fetch_html(&self, url: &str) -> Result<String, NetworkError> {
        let bytes = self.fetcher.fetch(url)?;
        String::from_utf8(bytes).map_err(|err| NetworkError::Decode(format!("{}: {}", url, err)))
    }

    /// Fetch, extract and normalize one chapter.
    pub fn load_text(&self, chapter: &Chapter) -> Result<ChapterText, LoadError> {
        let html = self.fetch_html(&chapter.source_link)?;
        let extracted = extract::extract(&html, &chapter.title, &self.profile)?;
        let text = normalize(&extracted, &chapter.title);
        log::debug!(
            "chapter {} `{}`: {} bytes normalized",
            chapter.ordinal_index,
            chapter.title,
            text.len()
        );
        Ok(ChapterText::from(text))
    }

    pub fn list_chapters(&self, book_url: &str) -> Result<Vec<ChapterLink>, LoadError> {
        let html = self.fetch_html(book_url)?;
        Ok(parse_chapter_list(&html, book_url, &self.profile)?)
    }

    /// Reads title, author and chapter list from a book's index page.
    pub fn open_book(&self, book_url: &str) -> Result<Book, LoadError> {
        let html = self.fetch_html(book_url)?;
        let info = parse_book_info(&html, &self.profile)?;
        let links = parse_chapter_list(&html, book_url, &self.profile)?;
        let title = info.title.unwrap_or_else(|| book_url.to_string());
        log::info!("opened `{}` with {} chapters", title, links.len());
        Ok(Book::new(title, info.author, book_url, links))
    }

    /// Whether `title` is the site's "expand all chapters" pseudo-entry.
    pub fn is_placeholder(&self, title: &str) -> bool {
        let placeholder = self.profile.expand_placeholder.as_str();
        !placeholder.is_empty() && title.contains(placeholder)
    }
}
