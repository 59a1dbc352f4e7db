use std::sync::mpsc::{self, Receiver, Sender};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing requested yet.
    Idle,
    Fetching { chapter: usize },
    Ready,
    /// The last load failed; the message stays until a retry. `retryable` is
    /// false when the page itself is unusable.
    Error {
        chapter: usize,
        message: String,
        retryable: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Loading {
        chapter: usize,
    },
    PagesReady {
        chapter: usize,
        total_pages: usize,
        page_index: usize,
    },
    LoadFailed {
        chapter: usize,
        message: String,
        retryable: bool,
    },
    ProgressChanged {
        chapter: usize,
        page_index: usize,
        fraction: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("chapter {index} is out of range (book has {len})")]
    InvalidChapterIndex { index: usize, len: usize },
    #[error("book has no readable chapters")]
    EmptyBook,
}

/// What a page-turn request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTurn {
    /// Moved within the chapter to this page.
    Page(usize),
    /// Crossed into this chapter; its pages arrive with the load.
    Chapter(usize),
    AtStart,
    AtEnd,
    /// No pages are loaded to turn.
    NotReady,
}

#[derive(Default)]
pub(crate) struct Subscribers {
    senders: Vec<Sender<SessionEvent>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.senders.push(tx);
        rx
    }

    /// Sends to every live subscriber and forgets the ones that hung up.
    pub(crate) fn emit(&mut self, event: SessionEvent) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
