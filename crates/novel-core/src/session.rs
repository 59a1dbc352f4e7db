//! Reading session controller.
//!
//! A [`ReadingSession`] owns one open book: its chapter list, the preload
//! cache, the pages of the current chapter and the reading position. All
//! mutation happens on the thread that owns the session; workers report back
//! through [`ReadingSession::poll`].

mod events;
mod navigation;

#[cfg(test)]
mod tests;

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::{self, FetchPurpose, PreloadCache};
use crate::config::{PreloadConfig, ReaderConfig};
use crate::dispatch::{FetchDispatcher, FetchJob, FetchOutcome, PreparedChapter};
use crate::layout::{paginate, LayoutParameters, Page, Pagination, TextMeasurer};
use crate::source::{ChapterSource, LoadError};
use crate::types::{Book, ChapterLink, ChapterText, ReadingPosition};

pub use events::{PageTurn, SessionError, SessionEvent, SessionState};
use events::Subscribers;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub preload: PreloadConfig,
    /// Open at `initial_position` instead of the first chapter.
    pub restore_progress: bool,
    pub initial_position: Option<ReadingPosition>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            preload: PreloadConfig::default(),
            restore_progress: true,
            initial_position: None,
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &ReaderConfig) -> Self {
        Self {
            preload: config.preload,
            restore_progress: config.restore_progress,
            initial_position: None,
        }
    }

    pub fn with_position(mut self, position: Option<ReadingPosition>) -> Self {
        self.initial_position = position;
        self
    }
}

/// Page to land on once a chapter's pages are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadIntent {
    /// Entered by paging forward past the previous chapter's end.
    Forward,
    /// Entered by paging back before the next chapter's start.
    Backward,
    /// Initial load with a saved page.
    Restore(usize),
    Jump,
}

impl LoadIntent {
    pub(crate) fn landing_page(self, pagination: &Pagination) -> usize {
        match self {
            LoadIntent::Forward | LoadIntent::Jump => 0,
            LoadIntent::Backward => pagination.last_index(),
            LoadIntent::Restore(page) => pagination.clamp_index(page),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingLoad {
    chapter: usize,
    intent: LoadIntent,
}

pub struct ReadingSession {
    book: Book,
    source: Arc<ChapterSource>,
    measurer: Arc<dyn TextMeasurer>,
    layout: LayoutParameters,
    options: SessionOptions,
    cache: PreloadCache,
    dispatcher: FetchDispatcher,
    subscribers: Subscribers,
    state: SessionState,
    current_chapter: usize,
    page_index: usize,
    pagination: Option<Pagination>,
    current_text: Option<ChapterText>,
    pending: Option<PendingLoad>,
    last_intent: LoadIntent,
    generation: u64,
    progress: f32,
}

impl ReadingSession {
    pub fn new(
        book: Book,
        source: Arc<ChapterSource>,
        measurer: Arc<dyn TextMeasurer>,
        layout: LayoutParameters,
        options: SessionOptions,
    ) -> Self {
        let cache = PreloadCache::new(options.preload.ahead, options.preload.behind);
        let dispatcher = FetchDispatcher::new(Arc::clone(&source), Arc::clone(&measurer));
        Self {
            book,
            source,
            measurer,
            layout,
            options,
            cache,
            dispatcher,
            subscribers: Subscribers::default(),
            state: SessionState::Idle,
            current_chapter: 0,
            page_index: 0,
            pagination: None,
            current_text: None,
            pending: None,
            last_intent: LoadIntent::Jump,
            generation: 0,
            progress: 0.0,
        }
    }

    /// Starts the initial load: the saved position when progress restore is
    /// on and the position is valid, otherwise the first readable chapter.
    pub fn open(&mut self) -> Result<(), SessionError> {
        let saved = self
            .options
            .initial_position
            .filter(|_| self.options.restore_progress)
            .filter(|pos| pos.chapter_index < self.book.chapter_count());
        if let Some(pos) = saved {
            // A saved placeholder entry resolves to the next readable chapter,
            // whose pages the saved page index says nothing about.
            if let Some(target) = self.first_readable_from(pos.chapter_index) {
                let intent = if target == pos.chapter_index {
                    LoadIntent::Restore(pos.page_index)
                } else {
                    LoadIntent::Jump
                };
                log::info!(
                    "restoring `{}` at chapter {} page {}",
                    self.book.title,
                    target,
                    pos.page_index
                );
                self.start_load(target, intent);
                return Ok(());
            }
        }
        let first = self.first_readable_from(0).ok_or(SessionError::EmptyBook)?;
        self.start_load(first, LoadIntent::Jump);
        Ok(())
    }

    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        self.subscribers.subscribe()
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn layout(&self) -> &LayoutParameters {
        &self.layout
    }

    pub fn cache(&self) -> &PreloadCache {
        &self.cache
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Fetching { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SessionState::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn current_chapter_index(&self) -> usize {
        self.current_chapter
    }

    pub fn chapter_title(&self) -> Option<&str> {
        self.book
            .chapter(self.current_chapter)
            .map(|c| c.title.as_str())
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    /// Page texts of the current chapter; empty while nothing is loaded.
    pub fn current_pages(&self) -> Vec<&str> {
        self.pagination
            .as_ref()
            .map(Pagination::texts)
            .unwrap_or_default()
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.pagination.as_ref()?.page(self.page_index)
    }

    pub fn current_page_index(&self) -> usize {
        self.page_index
    }

    /// Zero while the current chapter is not loaded.
    pub fn total_pages(&self) -> usize {
        self.pagination
            .as_ref()
            .map(Pagination::total_pages)
            .unwrap_or(0)
    }

    pub fn position(&self) -> ReadingPosition {
        ReadingPosition::new(self.current_chapter, self.page_index)
    }

    /// Position within the chapter, `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Opening text of the current page, at most `max_chars` characters, for
    /// bookmark labels.
    pub fn current_excerpt(&self, max_chars: usize) -> Option<String> {
        let page = self.current_page()?;
        let excerpt: String = page
            .text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(max_chars)
            .collect();
        Some(excerpt)
    }

    /// Starts loading `index` and lands on its first page.
    pub fn load_chapter(&mut self, index: usize) -> Result<(), SessionError> {
        self.check_index(index)?;
        self.start_load(index, LoadIntent::Jump);
        Ok(())
    }

    /// Reloads the current chapter, landing where the failed load would have.
    pub fn retry_load_current_chapter(&mut self) -> Result<(), SessionError> {
        self.check_index(self.current_chapter)?;
        log::info!("retrying chapter {}", self.current_chapter);
        self.start_load(self.current_chapter, self.last_intent);
        Ok(())
    }

    /// Switches to a new layout. Only the current chapter is re-paginated;
    /// the page index is clamped into the new range.
    pub fn set_layout(&mut self, layout: LayoutParameters) {
        if layout == self.layout {
            return;
        }
        self.layout = layout;
        let Some(text) = self.current_text.clone() else {
            return;
        };
        let pagination = self.paginate_current(&text);
        self.page_index = pagination.clamp_index(self.page_index);
        log::debug!(
            "re-paginated chapter {} into {} pages",
            self.current_chapter,
            pagination.total_pages()
        );
        self.pagination = Some(pagination);
        self.emit_pages_ready();
        self.after_navigation();
    }

    /// Installs a refreshed chapter list. The current chapter is clamped into
    /// the new list and the preload cache starts over.
    pub fn refresh_chapters(&mut self, links: Vec<ChapterLink>) -> Result<(), SessionError> {
        let previous_link = self
            .book
            .chapter(self.current_chapter)
            .map(|c| c.source_link.clone());
        self.book.replace_chapters(links);
        self.generation += 1;
        self.cache.clear();

        let Some(last) = self.book.last_index() else {
            self.pending = None;
            self.pagination = None;
            self.current_text = None;
            self.state = SessionState::Idle;
            return Err(SessionError::EmptyBook);
        };
        let clamped = self.current_chapter.min(last);
        let same_chapter = clamped == self.current_chapter
            && self.book.chapter(clamped).map(|c| &c.source_link) == previous_link.as_ref();

        if same_chapter && self.state == SessionState::Ready {
            log::debug!("chapter list refreshed; current chapter unchanged");
            self.after_load();
        } else {
            self.start_load(clamped, LoadIntent::Jump);
        }
        Ok(())
    }

    /// Applies every finished worker result without blocking. Returns how many
    /// were handled.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        while let Some(outcome) = self.dispatcher.try_recv() {
            self.handle_outcome(outcome);
            handled += 1;
        }
        handled
    }

    /// Blocks until the current chapter is no longer loading or `timeout`
    /// passes. Returns whether the load finished (successfully or not).
    pub fn wait_for_load(&mut self, timeout: Duration) -> bool {
        self.poll();
        let deadline = Instant::now() + timeout;
        while self.is_loading() {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };
            match self.dispatcher.recv_timeout(remaining) {
                Some(outcome) => self.handle_outcome(outcome),
                None => return !self.is_loading(),
            }
        }
        true
    }

    /// Blocks until no fetch is in flight or `timeout` passes.
    pub fn wait_until_idle(&mut self, timeout: Duration) -> bool {
        self.poll();
        let deadline = Instant::now() + timeout;
        while self.is_loading() || self.cache.in_flight_count() > 0 {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };
            match self.dispatcher.recv_timeout(remaining) {
                Some(outcome) => self.handle_outcome(outcome),
                None => return !self.is_loading() && self.cache.in_flight_count() == 0,
            }
        }
        true
    }

    fn check_index(&self, index: usize) -> Result<(), SessionError> {
        let len = self.book.chapter_count();
        if index >= len {
            return Err(SessionError::InvalidChapterIndex { index, len });
        }
        Ok(())
    }

    /// Idle/Ready/Error -> Fetching. A cache hit finishes right away; a miss
    /// joins a running fetch for the same chapter or starts one.
    pub(crate) fn start_load(&mut self, index: usize, intent: LoadIntent) {
        if let Some(previous) = self.pending {
            if previous.chapter != index {
                log::debug!(
                    "load of chapter {} superseded by chapter {}",
                    previous.chapter,
                    index
                );
            }
        }
        self.current_chapter = index;
        self.page_index = 0;
        self.pagination = None;
        self.current_text = None;
        self.last_intent = intent;
        self.pending = Some(PendingLoad {
            chapter: index,
            intent,
        });
        self.state = SessionState::Fetching { chapter: index };
        self.subscribers.emit(SessionEvent::Loading { chapter: index });

        if let Some(text) = self.cache.get(index) {
            log::debug!("chapter {} served from cache", index);
            self.finish_load(index, text, None);
            return;
        }
        self.fetch_foreground(index);
    }

    /// Starts the fetch the reader is waiting on, or joins the one running.
    fn fetch_foreground(&mut self, index: usize) {
        if !self.cache.begin_fetch(index, FetchPurpose::Foreground) {
            log::debug!("chapter {} already in flight; waiting for it", index);
            return;
        }
        let Some(chapter) = self.book.chapter(index).cloned() else {
            self.cache.finish_fetch(index);
            return;
        };
        log::info!("loading chapter {} `{}`", index, chapter.title);
        let job = FetchJob {
            chapter,
            generation: self.generation,
            layout: Some(self.layout.clone()),
        };
        if let Err(err) = self.dispatcher.spawn(job) {
            self.cache.finish_fetch(index);
            self.fail_load(index, err);
        }
    }

    fn handle_outcome(&mut self, outcome: FetchOutcome) {
        let index = outcome.chapter_index;
        if outcome.generation != self.generation {
            // Its fetch was still tracked; a reader waiting on this index
            // needs a fresh one against the current chapter list.
            self.cache.finish_fetch(index);
            log::debug!("dropping chapter {} from a replaced chapter list", index);
            if self.pending.map(|p| p.chapter) == Some(index) {
                self.fetch_foreground(index);
            } else if self.state == SessionState::Ready {
                self.schedule_preload();
            }
            return;
        }
        let purpose = self.cache.finish_fetch(index);
        let is_target = self.pending.map(|p| p.chapter) == Some(index);

        match outcome.result {
            Ok(PreparedChapter { text, pages }) => {
                if is_target {
                    self.cache.put(index, text.clone());
                    self.finish_load(index, text, pages);
                } else if self.in_window(index) {
                    self.cache.put(index, text);
                } else {
                    log::debug!(
                        "discarding chapter {} ({:?}); reader moved to {}",
                        index,
                        purpose,
                        self.current_chapter
                    );
                }
            }
            Err(err) => {
                if is_target {
                    self.fail_load(index, err);
                } else {
                    log::warn!("preload of chapter {} failed: {}", index, err);
                }
            }
        }
    }

    /// Fetching -> Ready.
    fn finish_load(
        &mut self,
        index: usize,
        text: ChapterText,
        pages: Option<(LayoutParameters, Pagination)>,
    ) {
        let intent = self
            .pending
            .take()
            .map(|p| p.intent)
            .unwrap_or(LoadIntent::Jump);
        let pagination = match pages {
            Some((layout, pagination)) if layout == self.layout => pagination,
            _ => self.paginate_current(&text),
        };
        self.page_index = intent.landing_page(&pagination);
        log::info!(
            "chapter {} ready: {} pages, showing page {}",
            index,
            pagination.total_pages(),
            self.page_index
        );
        self.pagination = Some(pagination);
        self.current_text = Some(text);
        self.state = SessionState::Ready;
        self.emit_pages_ready();
        self.after_load();
    }

    /// Fetching -> Error.
    fn fail_load(&mut self, index: usize, err: LoadError) {
        log::warn!("chapter {} failed to load: {}", index, err);
        self.pending = None;
        let message = err.to_string();
        let retryable = err.is_retryable();
        self.state = SessionState::Error {
            chapter: index,
            message: message.clone(),
            retryable,
        };
        self.subscribers.emit(SessionEvent::LoadFailed {
            chapter: index,
            message,
            retryable,
        });
    }

    fn after_load(&mut self) {
        if let Some(last) = self.book.last_index() {
            let PreloadConfig { ahead, behind } = self.options.preload;
            self.cache
                .reconcile_window(self.current_chapter, last, ahead, behind);
        }
        self.after_navigation();
    }

    /// Progress update and preloading, after every successful move.
    pub(crate) fn after_navigation(&mut self) {
        let total = self.total_pages();
        self.progress = progress_fraction(self.page_index, total);
        self.subscribers.emit(SessionEvent::ProgressChanged {
            chapter: self.current_chapter,
            page_index: self.page_index,
            fraction: self.progress,
        });
        self.schedule_preload();
    }

    fn schedule_preload(&mut self) {
        let Some(last) = self.book.last_index() else {
            return;
        };
        let ahead = self.options.preload.ahead;
        let book = &self.book;
        let source = &self.source;
        let dispatcher = &self.dispatcher;
        let generation = self.generation;
        self.cache.schedule_preload(
            self.current_chapter,
            last,
            ahead,
            |i| book.chapter(i).map_or(true, |c| source.is_placeholder(&c.title)),
            |i| {
                let Some(chapter) = book.chapter(i).cloned() else {
                    return false;
                };
                let job = FetchJob {
                    chapter,
                    generation,
                    layout: None,
                };
                match dispatcher.spawn(job) {
                    Ok(()) => true,
                    Err(err) => {
                        log::warn!("preload of chapter {} not started: {}", i, err);
                        false
                    }
                }
            },
        );
    }

    fn in_window(&self, index: usize) -> bool {
        let Some(last) = self.book.last_index() else {
            return false;
        };
        let PreloadConfig { ahead, behind } = self.options.preload;
        cache::window(self.current_chapter, last, ahead, behind).contains(&index)
    }

    fn paginate_current(&self, text: &str) -> Pagination {
        let title = self.chapter_title().unwrap_or_default();
        paginate(text, &self.layout, title, self.measurer.as_ref())
    }

    fn emit_pages_ready(&mut self) {
        let total_pages = self.total_pages();
        self.subscribers.emit(SessionEvent::PagesReady {
            chapter: self.current_chapter,
            total_pages,
            page_index: self.page_index,
        });
    }

    pub(crate) fn is_readable(&self, index: usize) -> bool {
        self.book
            .chapter(index)
            .is_some_and(|c| !self.source.is_placeholder(&c.title))
    }

    pub(crate) fn first_readable_from(&self, index: usize) -> Option<usize> {
        (index..self.book.chapter_count()).find(|&i| self.is_readable(i))
    }
}

/// `page / max(total - 1, 1)`; zero when nothing is loaded.
pub(crate) fn progress_fraction(page_index: usize, total_pages: usize) -> f32 {
    if total_pages == 0 {
        return 0.0;
    }
    let span = total_pages.saturating_sub(1).max(1);
    (page_index as f32 / span as f32).clamp(0.0, 1.0)
}
